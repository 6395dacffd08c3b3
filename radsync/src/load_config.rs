//! `load_config` module: loads a user-authored YAML configuration file into
//! the typed [`ConfigDocument`] model from `radsync-core`.
//!
//! This is the only place where untrusted YAML is parsed. Secrets are NOT
//! required here; the API key of an instance may be omitted and is resolved
//! later (environment variable, then unauthenticated auto-retrieval) by the
//! `secrets` module.
//!
//! # Errors
//! All errors use `anyhow::Error` for context-rich diagnostics and are
//! surfaced at the CLI boundary.

use std::fs;
use std::path::Path;

use anyhow::Result;
use radsync_core::config::ConfigDocument;
use tracing::{error, info};

/// Load and validate a YAML config file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ConfigDocument> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let document: ConfigDocument = match serde_yaml::from_str(&config_content) {
        Ok(document) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            document
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    // Structural validation beyond what deserialization enforces, for every
    // resolved instance (instance settings can differ from the global block).
    for instance in document.radarr.resolve_instances() {
        if let Err(message) = instance.settings.validate() {
            error!(instance = %instance.name, error = %message, "Invalid configuration");
            return Err(anyhow::anyhow!(
                "Invalid configuration for instance {:?}: {message}",
                instance.name
            ));
        }
    }

    Ok(document)
}
