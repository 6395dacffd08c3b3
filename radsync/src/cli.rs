//! # radsync CLI Interface (Module)
//!
//! This module implements the CLI surface for radsync: command parsing,
//! per-instance orchestration, and user-visible logging. All reconciliation
//! logic (configuration model, diff planner, sync engine) lives in the
//! `radsync-core` crate; this module is strictly CLI glue.
//!
//! - Entry struct [`Cli`] defines the user-facing options and subcommands.
//! - The async entrypoint [`run`] is extracted from `main` so integration
//!   tests can invoke it programmatically.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use radsync_core::config::ResolvedInstance;
use radsync_core::sync::synchronise;
use tracing::{info, warn};

use crate::api::RadarrClient;
use crate::load_config::load_config;
use crate::secrets::resolve_secrets;

/// CLI for radsync: converge Radarr instances onto a declarative configuration.
#[derive(Parser)]
#[clap(
    name = "radsync",
    version,
    about = "Sync declarative YAML configuration into Radarr instances"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Synchronize every configured instance using the given config file
    Sync {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Compute and log the plan without applying any change
        #[clap(long)]
        dry_run: bool,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Sync { config, dry_run } => {
            let document = load_config(config)?;
            let instances = document.radarr.resolve_instances();
            info!(
                command = "sync",
                instances = instances.len(),
                dry_run,
                "starting synchronisation"
            );
            for instance in &instances {
                sync_instance(instance, dry_run).await?;
            }
            Ok(())
        }
    }
}

async fn sync_instance(instance: &ResolvedInstance, dry_run: bool) -> Result<()> {
    info!(
        instance = %instance.name,
        url = %instance.host_url(),
        "connecting to instance"
    );
    let secrets = resolve_secrets(instance)
        .await
        .map_err(|e| anyhow::anyhow!("instance {:?}: {e}", instance.name))?;

    let client = RadarrClient::new(&secrets.host_url, secrets.api_key.expose())
        .map_err(|e| anyhow::anyhow!("instance {:?}: {e}", instance.name))?;
    let status = client
        .probe()
        .await
        .map_err(|e| anyhow::anyhow!("instance {:?}: {e}", instance.name))?;
    info!(instance = %instance.name, version = %status.version, "connected");

    if instance.settings.deletes_unmanaged() && !dry_run {
        warn!(
            instance = %instance.name,
            "delete_unmanaged is enabled: remote resources configured manually or by \
             other applications will be removed"
        );
    }

    match synchronise(&instance.settings, &client, dry_run).await {
        Ok(report) => {
            for section in &report.sections {
                info!(
                    instance = %instance.name,
                    section = section.section,
                    created = section.created,
                    updated = section.updated,
                    deleted = section.deleted,
                    unchanged = section.unchanged,
                    unmanaged = section.unmanaged,
                    "section synchronised"
                );
            }
            if !report.changed() {
                info!(instance = %instance.name, "instance already converged");
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!(instance = %instance.name, error = %e, "synchronisation failed");
            Err(anyhow::anyhow!("instance {:?}: {e}", instance.name))
        }
    }
}
