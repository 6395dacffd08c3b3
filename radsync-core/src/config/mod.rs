//! Desired-state configuration model.
//!
//! This is the typed form of the user-authored YAML document. Each settings
//! section holds named definitions; names are the reconciliation keys and are
//! unique by construction (map keying). The loose-YAML-to-model boundary lives
//! in the `radsync` crate's `load_config`; everything here assumes structured
//! input.

pub mod custom_formats;
pub mod download_clients;
pub mod indexers;
pub mod metadata;
pub mod notifications;
pub mod quality_profiles;
pub mod tags;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Deserialize;

use crate::contract::ApiError;
use crate::remote::FieldResource;

pub use custom_formats::{Condition, ConditionImpl, CustomFormat, CustomFormatsSettings};
pub use download_clients::{DownloadClient, DownloadClientsSettings};
pub use indexers::{Indexer, IndexersSettings};
pub use metadata::MetadataSettings;
pub use notifications::{Notification, NotificationTriggers, NotificationsSettings};
pub use quality_profiles::{QualityEntry, QualityProfile, QualityProfilesSettings};
pub use tags::TagsSettings;

pub(crate) fn default_true() -> bool {
    true
}

/// Communication protocol for reaching an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Http,
    Https,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Http => write!(f, "http"),
            Protocol::Https => write!(f, "https"),
        }
    }
}

/// A Radarr API key: exactly 32 characters. Redacted in debug output.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct ApiKey(String);

impl ApiKey {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ApiKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        if trimmed.len() != 32 {
            return Err(format!(
                "API key must be exactly 32 characters, got {}",
                trimmed.len()
            ));
        }
        Ok(ApiKey(trimmed.to_string()))
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey(********)")
    }
}

/// Root of the configuration document.
///
/// ```yaml
/// radarr:
///   hostname: "radarr.example.com"
///   port: 7878
///   settings: { ... }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigDocument {
    pub radarr: Config,
}

/// The `radarr` block: connection defaults, global settings, and optional
/// per-instance overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub global: InstanceConfig,
    /// Instance-specific configuration. When empty, the global block itself
    /// describes a single instance.
    #[serde(default)]
    pub instances: BTreeMap<String, InstanceConfig>,
}

/// Connection parameters and settings for one instance. All fields are
/// optional so an instance block can fall back to the global block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstanceConfig {
    pub hostname: Option<String>,
    pub port: Option<u16>,
    pub protocol: Option<Protocol>,
    /// If unset, `RADARR_API_KEY` and then unauthenticated auto-retrieval are
    /// tried at secrets resolution time.
    pub api_key: Option<ApiKey>,
    pub settings: Option<Settings>,
}

/// One fully-resolved instance, ready for secrets resolution and sync.
#[derive(Debug, Clone)]
pub struct ResolvedInstance {
    pub name: String,
    pub hostname: String,
    pub port: u16,
    pub protocol: Protocol,
    pub api_key: Option<ApiKey>,
    pub settings: Settings,
}

impl ResolvedInstance {
    pub fn host_url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.hostname, self.port)
    }
}

impl Config {
    /// Flatten the global/instances structure into concrete instances.
    ///
    /// Connection fields fall back to the global block. An instance without an
    /// explicit hostname defaults to its instance name, matching the
    /// single-instance default hostname of `radarr`. A `settings` block on an
    /// instance replaces the global one wholesale.
    pub fn resolve_instances(&self) -> Vec<ResolvedInstance> {
        if self.instances.is_empty() {
            return vec![self.resolve_one("radarr", &InstanceConfig::default())];
        }
        self.instances
            .iter()
            .map(|(name, instance)| self.resolve_one(name, instance))
            .collect()
    }

    fn resolve_one(&self, name: &str, instance: &InstanceConfig) -> ResolvedInstance {
        ResolvedInstance {
            name: name.to_string(),
            hostname: instance
                .hostname
                .clone()
                .or_else(|| self.global.hostname.clone())
                .unwrap_or_else(|| name.to_string()),
            port: instance.port.or(self.global.port).unwrap_or(7878),
            protocol: instance
                .protocol
                .or(self.global.protocol)
                .unwrap_or_default(),
            api_key: instance
                .api_key
                .clone()
                .or_else(|| self.global.api_key.clone()),
            settings: instance
                .settings
                .clone()
                .or_else(|| self.global.settings.clone())
                .unwrap_or_default(),
        }
    }
}

/// All settings sections for one instance.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub tags: TagsSettings,
    pub download_clients: DownloadClientsSettings,
    pub indexers: IndexersSettings,
    pub notifications: NotificationsSettings,
    pub custom_formats: CustomFormatsSettings,
    pub quality_profiles: QualityProfilesSettings,
    pub metadata: MetadataSettings,
}

impl Settings {
    /// Every tag label referenced anywhere in this settings tree. Referenced
    /// labels are created on the remote before any section is reconciled.
    pub fn referenced_tag_labels(&self) -> BTreeSet<String> {
        let mut labels: BTreeSet<String> = self.tags.definitions.iter().cloned().collect();
        for indexer in self.indexers.definitions.values() {
            labels.extend(indexer.tags.iter().cloned());
        }
        for client in self.download_clients.definitions.values() {
            labels.extend(client.tags.iter().cloned());
        }
        for notification in self.notifications.definitions.values() {
            labels.extend(notification.tags.iter().cloned());
        }
        labels
    }

    /// Whether any section would delete unmanaged remote resources.
    pub fn deletes_unmanaged(&self) -> bool {
        self.indexers.delete_unmanaged
            || self.download_clients.delete_unmanaged
            || self.notifications.delete_unmanaged
            || self.custom_formats.delete_unmanaged
            || self.quality_profiles.delete_unmanaged
    }

    /// Structural validation beyond what deserialization enforces.
    pub fn validate(&self) -> Result<(), String> {
        for (name, indexer) in &self.indexers.definitions {
            indexer.validate(name)?;
        }
        for (name, client) in &self.download_clients.definitions {
            client.validate(name)?;
        }
        for (name, profile) in &self.quality_profiles.definitions {
            profile.validate(name)?;
        }
        Ok(())
    }
}

/// Name/id translation context for encoding definitions into API resources
/// and decoding API resources back into definitions.
#[derive(Debug, Clone, Default)]
pub struct EncodeContext {
    tag_ids: BTreeMap<String, i64>,
    tag_labels: BTreeMap<i64, String>,
    download_client_ids: BTreeMap<String, i64>,
    download_client_names: BTreeMap<i64, String>,
}

impl EncodeContext {
    pub fn new(
        tag_ids: BTreeMap<String, i64>,
        download_client_ids: BTreeMap<String, i64>,
    ) -> Self {
        let tag_labels = tag_ids.iter().map(|(k, v)| (*v, k.clone())).collect();
        let download_client_names = download_client_ids
            .iter()
            .map(|(k, v)| (*v, k.clone()))
            .collect();
        EncodeContext {
            tag_ids,
            tag_labels,
            download_client_ids,
            download_client_names,
        }
    }

    pub fn set_download_clients(&mut self, download_client_ids: BTreeMap<String, i64>) {
        self.download_client_names = download_client_ids
            .iter()
            .map(|(k, v)| (*v, k.clone()))
            .collect();
        self.download_client_ids = download_client_ids;
    }

    /// Encode tag labels into a sorted id list. Every referenced label must
    /// already exist on the remote.
    pub fn encode_tags(&self, labels: &[String]) -> Result<Vec<i64>, ApiError> {
        let mut ids = Vec::with_capacity(labels.len());
        for label in labels {
            match self.tag_ids.get(label) {
                Some(id) => ids.push(*id),
                None => return Err(format!("unknown tag label: {label:?}").into()),
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    /// Decode remote tag ids into labels, skipping ids without a known label.
    pub fn decode_tags(&self, ids: &[i64]) -> Vec<String> {
        let mut labels: Vec<String> = ids
            .iter()
            .filter_map(|id| self.tag_labels.get(id).cloned())
            .collect();
        labels.sort();
        labels
    }

    /// Encode a download client name reference; 0 means "any client".
    pub fn encode_download_client(&self, name: Option<&str>) -> Result<i64, ApiError> {
        match name {
            None => Ok(0),
            Some(name) => self
                .download_client_ids
                .get(name)
                .copied()
                .ok_or_else(|| format!("unknown download client: {name:?}").into()),
        }
    }

    pub fn decode_download_client(&self, id: i64) -> Option<String> {
        if id == 0 {
            return None;
        }
        self.download_client_names.get(&id).cloned()
    }
}

/// A named, typed definition inside a field-resource section (indexers,
/// download clients, notification connections).
///
/// `decode` returns `None` for implementations this tool does not model; the
/// planner then treats the remote resource as unmanaged or force-updates it.
pub trait Definition: Sized + Clone + PartialEq {
    /// Radarr implementation name backing this definition.
    fn implementation(&self) -> &'static str;

    /// Rebuild a definition from a remote resource.
    fn decode(resource: &FieldResource, ctx: &EncodeContext) -> Option<Self>;

    /// Write this definition's attributes and field values into a resource
    /// (a schema template on create, the live resource on update).
    fn encode_into(&self, resource: &mut FieldResource, ctx: &EncodeContext)
        -> Result<(), ApiError>;
}
