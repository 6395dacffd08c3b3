//! Secrets resolution for an instance.
//!
//! The API key is looked up in order:
//!   1. `api_key` in the configuration file,
//!   2. the `RADARR_API_KEY` environment variable,
//!   3. unauthenticated retrieval from the instance's `initialize.json`
//!      (works when Radarr authentication is disabled for local addresses).

use radsync_core::config::{ApiKey, ResolvedInstance};
use radsync_core::contract::ApiError;
use serde::Deserialize;
use tracing::{debug, info};

/// Resolved connection secrets for one instance.
#[derive(Debug, Clone)]
pub struct Secrets {
    pub host_url: String,
    pub api_key: ApiKey,
}

/// Resolve the secrets of an instance, fetching the API key from the instance
/// itself as a last resort.
pub async fn resolve_secrets(instance: &ResolvedInstance) -> Result<Secrets, ApiError> {
    let host_url = instance.host_url();
    let api_key = match configured_api_key(instance) {
        Some(api_key) => api_key,
        None => {
            info!(
                instance = %instance.name,
                "no API key configured, attempting unauthenticated retrieval"
            );
            let raw = fetch_initialize_json(&host_url).await?;
            ApiKey::try_from(raw)?
        }
    };
    Ok(Secrets { host_url, api_key })
}

/// The API key from the config file or the environment, if either is set.
fn configured_api_key(instance: &ResolvedInstance) -> Option<ApiKey> {
    if let Some(api_key) = &instance.api_key {
        debug!(instance = %instance.name, "using API key from configuration");
        return Some(api_key.clone());
    }
    match std::env::var("RADARR_API_KEY") {
        Ok(raw) if !raw.is_empty() => match ApiKey::try_from(raw) {
            Ok(api_key) => {
                debug!(instance = %instance.name, "using API key from RADARR_API_KEY");
                Some(api_key)
            }
            Err(message) => {
                tracing::warn!(
                    instance = %instance.name,
                    error = %message,
                    "ignoring invalid RADARR_API_KEY"
                );
                None
            }
        },
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitializeJson {
    api_key: String,
}

async fn fetch_initialize_json(host_url: &str) -> Result<String, ApiError> {
    let url = format!("{host_url}/initialize.json");
    let response = reqwest::Client::new().get(&url).send().await?;
    check_initialize_status(&url, response.status())?;
    let body: InitializeJson = response.json().await?;
    Ok(body.api_key)
}

/// An unauthorized response means the instance has authentication enabled, so
/// unauthenticated key retrieval can never work; tell the user what to do
/// instead of reporting a bare status code.
fn check_initialize_status(url: &str, status: reqwest::StatusCode) -> Result<(), ApiError> {
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(format!(
            "unable to retrieve the API key from {url}: the instance requires \
             authentication; disable authentication for local addresses, or set \
             api_key in the configuration or the RADARR_API_KEY environment variable"
        )
        .into());
    }
    if !status.is_success() {
        return Err(format!("GET {url} failed with status {status}").into());
    }
    Ok(())
}
