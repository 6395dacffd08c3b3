//! Download client settings.
//!
//! ```yaml
//! download_clients:
//!   delete_unmanaged: false
//!   definitions:
//!     Transmission:
//!       type: "transmission"
//!       host: "transmission"
//!       port: 9091
//!       category: "radarr"
//! ```
//!
//! Modelled implementations: Transmission, qBittorrent and SABnzbd. Remote
//! clients of other types are treated as unmanaged.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::json;

use super::{default_true, Definition, EncodeContext};
use crate::contract::ApiError;
use crate::remote::FieldResource;

fn default_client_priority() -> u32 {
    1
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DownloadClientsSettings {
    /// Delete remote download clients not declared here.
    pub delete_unmanaged: bool,
    pub definitions: BTreeMap<String, DownloadClient>,
}

/// One download client definition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DownloadClient {
    #[serde(default = "default_true")]
    pub enable: bool,
    /// Client priority. 1 is highest; clients with equal priority rotate.
    #[serde(default = "default_client_priority")]
    pub priority: u32,
    /// Remove completed downloads from the client's history.
    #[serde(default = "default_true")]
    pub remove_completed: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub implementation: DownloadClientImpl,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DownloadClientImpl {
    Transmission(TorrentClientHost),
    Qbittorrent(TorrentClientHost),
    Sabnzbd(SabnzbdClient),
}

/// Host parameters shared by the torrent client implementations.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TorrentClientHost {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub use_ssl: bool,
    #[serde(default)]
    pub url_base: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Category to attach to grabs from Radarr.
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SabnzbdClient {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub use_ssl: bool,
    #[serde(default)]
    pub url_base: Option<String>,
    pub api_key: String,
    #[serde(default)]
    pub category: Option<String>,
}

impl DownloadClient {
    pub(crate) fn validate(&self, name: &str) -> Result<(), String> {
        if self.priority < 1 {
            return Err(format!(
                "download client {name:?}: priority must be 1 or greater"
            ));
        }
        Ok(())
    }
}

fn optional_field(resource: &FieldResource, name: &str) -> Option<String> {
    resource.field_string(name).filter(|s| !s.is_empty())
}

fn decode_torrent_host(resource: &FieldResource) -> Option<TorrentClientHost> {
    Some(TorrentClientHost {
        host: resource.field_string("host")?,
        port: resource.field_i64("port", 0) as u16,
        use_ssl: resource.field_bool("useSsl", false),
        url_base: optional_field(resource, "urlBase"),
        username: optional_field(resource, "username"),
        password: optional_field(resource, "password"),
        category: optional_field(resource, "movieCategory"),
    })
}

fn encode_torrent_host(resource: &mut FieldResource, host: &TorrentClientHost) {
    resource.set_field("host", json!(host.host));
    resource.set_field("port", json!(host.port));
    resource.set_field("useSsl", json!(host.use_ssl));
    resource.set_field("urlBase", json!(host.url_base.clone().unwrap_or_default()));
    resource.set_field("username", json!(host.username.clone().unwrap_or_default()));
    resource.set_field("password", json!(host.password.clone().unwrap_or_default()));
    resource.set_field(
        "movieCategory",
        json!(host.category.clone().unwrap_or_default()),
    );
}

impl Definition for DownloadClient {
    fn implementation(&self) -> &'static str {
        match self.implementation {
            DownloadClientImpl::Transmission(_) => "Transmission",
            DownloadClientImpl::Qbittorrent(_) => "QBittorrent",
            DownloadClientImpl::Sabnzbd(_) => "Sabnzbd",
        }
    }

    fn decode(resource: &FieldResource, ctx: &EncodeContext) -> Option<Self> {
        let implementation = if resource.is_implementation("Transmission") {
            DownloadClientImpl::Transmission(decode_torrent_host(resource)?)
        } else if resource.is_implementation("QBittorrent") {
            DownloadClientImpl::Qbittorrent(decode_torrent_host(resource)?)
        } else if resource.is_implementation("Sabnzbd") {
            DownloadClientImpl::Sabnzbd(SabnzbdClient {
                host: resource.field_string("host")?,
                port: resource.field_i64("port", 0) as u16,
                use_ssl: resource.field_bool("useSsl", false),
                url_base: optional_field(resource, "urlBase"),
                api_key: resource.field_string("apiKey").unwrap_or_default(),
                category: optional_field(resource, "movieCategory"),
            })
        } else {
            return None;
        };

        Some(DownloadClient {
            enable: resource.attr_bool("enable", true),
            priority: resource.attr_i64("priority", 1) as u32,
            remove_completed: resource.attr_bool("removeCompletedDownloads", true),
            tags: ctx.decode_tags(&resource.tags),
            implementation,
        })
    }

    fn encode_into(
        &self,
        resource: &mut FieldResource,
        ctx: &EncodeContext,
    ) -> Result<(), ApiError> {
        resource.set_attr("enable", json!(self.enable));
        resource.set_attr("priority", json!(self.priority));
        resource.set_attr("removeCompletedDownloads", json!(self.remove_completed));
        resource.tags = ctx.encode_tags(&self.tags)?;

        match &self.implementation {
            DownloadClientImpl::Transmission(host) | DownloadClientImpl::Qbittorrent(host) => {
                encode_torrent_host(resource, host);
            }
            DownloadClientImpl::Sabnzbd(sabnzbd) => {
                resource.set_field("host", json!(sabnzbd.host));
                resource.set_field("port", json!(sabnzbd.port));
                resource.set_field("useSsl", json!(sabnzbd.use_ssl));
                resource.set_field(
                    "urlBase",
                    json!(sabnzbd.url_base.clone().unwrap_or_default()),
                );
                resource.set_field("apiKey", json!(sabnzbd.api_key));
                resource.set_field(
                    "movieCategory",
                    json!(sabnzbd.category.clone().unwrap_or_default()),
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transmission_round_trips_through_resource_encoding() {
        let definition: DownloadClient = serde_json::from_value(serde_json::json!({
            "type": "transmission",
            "host": "transmission",
            "port": 9091,
            "category": "radarr"
        }))
        .unwrap();
        let ctx = EncodeContext::default();

        let mut resource = FieldResource {
            implementation: "Transmission".to_string(),
            ..FieldResource::default()
        };
        definition.encode_into(&mut resource, &ctx).unwrap();
        assert!(resource.attr_bool("enable", false));
        assert_eq!(resource.field_i64("port", 0), 9091);

        let decoded = DownloadClient::decode(&resource, &ctx).expect("transmission decodes");
        assert_eq!(decoded, definition);
    }

    #[test]
    fn sabnzbd_requires_api_key_in_config() {
        let result: Result<DownloadClient, _> = serde_json::from_value(serde_json::json!({
            "type": "sabnzbd",
            "host": "sabnzbd",
            "port": 8080
        }));
        assert!(result.is_err());
    }
}
