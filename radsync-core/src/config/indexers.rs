//! Indexer settings.
//!
//! ```yaml
//! indexers:
//!   delete_unmanaged: false
//!   definitions:
//!     Nyaa:                    # Indexer name in Radarr.
//!       type: "nyaa"           # Selects the implementation.
//!       enable_rss: true
//!       priority: 25
//!       download_client: null
//!       tags:
//!         - "example"
//!       website_url: "https://nyaa.example.com"
//! ```
//!
//! Common fields apply to every indexer type; the `type` discriminator picks
//! the implementation-specific variant. Representative implementations are
//! modelled (Newznab, Torznab, Nyaa); remote indexers of other types are
//! treated as unmanaged.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;
use serde_json::{json, Value};

use super::{default_true, Definition, EncodeContext};
use crate::contract::ApiError;
use crate::remote::FieldResource;

fn default_priority() -> u8 {
    25
}

fn default_api_path() -> String {
    "/api".to_string()
}

fn default_movie_categories() -> BTreeSet<i64> {
    // Movies-SD, Movies-HD, Movies-UHD, Movies-Bluray
    [2030, 2040, 2045, 2050].into_iter().collect()
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct IndexersSettings {
    /// Delete remote indexers not declared here. Off by default; enabling it
    /// removes indexers managed by other applications (e.g. Prowlarr).
    pub delete_unmanaged: bool,
    pub definitions: BTreeMap<String, Indexer>,
}

/// One indexer definition: fields common to all types plus a typed variant.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Indexer {
    /// Use this indexer to watch for wanted and missing releases via RSS.
    #[serde(default = "default_true")]
    pub enable_rss: bool,
    /// Use this indexer for automatic searches, including Search on Add.
    #[serde(default = "default_true")]
    pub enable_automatic_search: bool,
    /// Use this indexer for manual interactive searches.
    #[serde(default = "default_true")]
    pub enable_interactive_search: bool,
    /// Release tiebreaker priority. 1 is highest, 50 is lowest.
    #[serde(default = "default_priority")]
    pub priority: u8,
    /// Name of the download client to use for grabs from this indexer.
    /// `null` means any enabled client.
    #[serde(default)]
    pub download_client: Option<String>,
    /// Only use this indexer for movies with at least one matching tag.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub implementation: IndexerImpl,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IndexerImpl {
    Newznab(NewznabIndexer),
    Torznab(TorznabIndexer),
    Nyaa(NyaaIndexer),
}

/// A Newznab-compatible Usenet indexing site.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewznabIndexer {
    pub url: String,
    /// Newznab API endpoint, usually `/api`.
    #[serde(default = "default_api_path")]
    pub api_path: String,
    pub api_key: String,
    /// Newznab categories to monitor. Empty disables category filtering.
    #[serde(default = "default_movie_categories")]
    pub categories: BTreeSet<i64>,
    #[serde(default)]
    pub additional_parameters: Option<String>,
}

/// A Torznab-compatible torrent indexing site.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TorznabIndexer {
    pub base_url: String,
    #[serde(default = "default_api_path")]
    pub api_path: String,
    pub api_key: String,
    #[serde(default = "default_movie_categories")]
    pub categories: BTreeSet<i64>,
    /// Minimum number of seeders before grabbing a release.
    #[serde(default = "default_minimum_seeders")]
    pub minimum_seeders: u32,
    /// Seed ratio a torrent should reach before stopping.
    #[serde(default)]
    pub seed_ratio: Option<f64>,
    /// Minutes a torrent should be seeded before stopping.
    #[serde(default)]
    pub seed_time: Option<u32>,
}

fn default_minimum_seeders() -> u32 {
    1
}

/// The Nyaa anime torrent tracker.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NyaaIndexer {
    pub website_url: String,
    #[serde(default = "default_nyaa_parameters")]
    pub additional_parameters: Option<String>,
    #[serde(default = "default_minimum_seeders")]
    pub minimum_seeders: u32,
    #[serde(default)]
    pub seed_ratio: Option<f64>,
    #[serde(default)]
    pub seed_time: Option<u32>,
}

fn default_nyaa_parameters() -> Option<String> {
    Some("&cats=1_0&filter=1".to_string())
}

impl Indexer {
    pub(crate) fn validate(&self, name: &str) -> Result<(), String> {
        if !(1..=50).contains(&self.priority) {
            return Err(format!(
                "indexer {name:?}: priority must be between 1 and 50, got {}",
                self.priority
            ));
        }
        Ok(())
    }
}

fn categories_value(categories: &BTreeSet<i64>) -> Value {
    Value::Array(categories.iter().map(|c| json!(c)).collect())
}

fn decode_categories(resource: &FieldResource, name: &str) -> BTreeSet<i64> {
    resource.field_i64_array(name).into_iter().collect()
}

fn decode_optional_string(resource: &FieldResource, name: &str) -> Option<String> {
    resource.field_string(name).filter(|s| !s.is_empty())
}

impl Definition for Indexer {
    fn implementation(&self) -> &'static str {
        match self.implementation {
            IndexerImpl::Newznab(_) => "Newznab",
            IndexerImpl::Torznab(_) => "Torznab",
            IndexerImpl::Nyaa(_) => "Nyaa",
        }
    }

    fn decode(resource: &FieldResource, ctx: &EncodeContext) -> Option<Self> {
        let implementation = if resource.is_implementation("Newznab") {
            IndexerImpl::Newznab(NewznabIndexer {
                url: resource.field_string("baseUrl")?,
                api_path: resource
                    .field_string("apiPath")
                    .unwrap_or_else(default_api_path),
                api_key: resource.field_string("apiKey").unwrap_or_default(),
                categories: decode_categories(resource, "categories"),
                additional_parameters: decode_optional_string(resource, "additionalParameters"),
            })
        } else if resource.is_implementation("Torznab") {
            IndexerImpl::Torznab(TorznabIndexer {
                base_url: resource.field_string("baseUrl")?,
                api_path: resource
                    .field_string("apiPath")
                    .unwrap_or_else(default_api_path),
                api_key: resource.field_string("apiKey").unwrap_or_default(),
                categories: decode_categories(resource, "categories"),
                minimum_seeders: resource.field_i64("minimumSeeders", 1) as u32,
                seed_ratio: resource.field_f64("seedCriteria.seedRatio"),
                seed_time: resource
                    .field_value("seedCriteria.seedTime")
                    .and_then(Value::as_i64)
                    .map(|v| v as u32),
            })
        } else if resource.is_implementation("Nyaa") {
            IndexerImpl::Nyaa(NyaaIndexer {
                website_url: resource.field_string("websiteUrl")?,
                additional_parameters: decode_optional_string(resource, "additionalParameters"),
                minimum_seeders: resource.field_i64("minimumSeeders", 1) as u32,
                seed_ratio: resource.field_f64("seedCriteria.seedRatio"),
                seed_time: resource
                    .field_value("seedCriteria.seedTime")
                    .and_then(Value::as_i64)
                    .map(|v| v as u32),
            })
        } else {
            return None;
        };

        Some(Indexer {
            enable_rss: resource.attr_bool("enableRss", true),
            enable_automatic_search: resource.attr_bool("enableAutomaticSearch", true),
            enable_interactive_search: resource.attr_bool("enableInteractiveSearch", true),
            priority: resource.attr_i64("priority", 25) as u8,
            download_client: ctx.decode_download_client(resource.attr_i64("downloadClientId", 0)),
            tags: ctx.decode_tags(&resource.tags),
            implementation,
        })
    }

    fn encode_into(
        &self,
        resource: &mut FieldResource,
        ctx: &EncodeContext,
    ) -> Result<(), ApiError> {
        resource.set_attr("enableRss", json!(self.enable_rss));
        resource.set_attr("enableAutomaticSearch", json!(self.enable_automatic_search));
        resource.set_attr(
            "enableInteractiveSearch",
            json!(self.enable_interactive_search),
        );
        resource.set_attr("priority", json!(self.priority));
        resource.set_attr(
            "downloadClientId",
            json!(ctx.encode_download_client(self.download_client.as_deref())?),
        );
        resource.tags = ctx.encode_tags(&self.tags)?;

        match &self.implementation {
            IndexerImpl::Newznab(newznab) => {
                resource.set_field("baseUrl", json!(newznab.url));
                resource.set_field("apiPath", json!(newznab.api_path));
                resource.set_field("apiKey", json!(newznab.api_key));
                resource.set_field("categories", categories_value(&newznab.categories));
                resource.set_field(
                    "additionalParameters",
                    json!(newznab.additional_parameters.clone().unwrap_or_default()),
                );
            }
            IndexerImpl::Torznab(torznab) => {
                resource.set_field("baseUrl", json!(torznab.base_url));
                resource.set_field("apiPath", json!(torznab.api_path));
                resource.set_field("apiKey", json!(torznab.api_key));
                resource.set_field("categories", categories_value(&torznab.categories));
                resource.set_field("minimumSeeders", json!(torznab.minimum_seeders));
                resource.set_field("seedCriteria.seedRatio", json!(torznab.seed_ratio));
                resource.set_field("seedCriteria.seedTime", json!(torznab.seed_time));
            }
            IndexerImpl::Nyaa(nyaa) => {
                resource.set_field("websiteUrl", json!(nyaa.website_url));
                resource.set_field(
                    "additionalParameters",
                    json!(nyaa.additional_parameters.clone().unwrap_or_default()),
                );
                resource.set_field("minimumSeeders", json!(nyaa.minimum_seeders));
                resource.set_field("seedCriteria.seedRatio", json!(nyaa.seed_ratio));
                resource.set_field("seedCriteria.seedTime", json!(nyaa.seed_time));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn ctx() -> EncodeContext {
        EncodeContext::new(
            BTreeMap::from([("anime".to_string(), 3)]),
            BTreeMap::from([("transmission".to_string(), 7)]),
        )
    }

    fn nyaa() -> Indexer {
        serde_json::from_value(serde_json::json!({
            "type": "nyaa",
            "website_url": "https://nyaa.example.com",
            "priority": 10,
            "download_client": "transmission",
            "tags": ["anime"]
        }))
        .unwrap()
    }

    #[test]
    fn nyaa_round_trips_through_resource_encoding() {
        let definition = nyaa();
        let mut resource = FieldResource {
            implementation: "Nyaa".to_string(),
            ..FieldResource::default()
        };
        definition.encode_into(&mut resource, &ctx()).unwrap();

        assert_eq!(resource.tags, vec![3]);
        assert_eq!(resource.attr_i64("downloadClientId", 0), 7);
        assert_eq!(
            resource.field_string("websiteUrl").as_deref(),
            Some("https://nyaa.example.com")
        );

        let decoded = Indexer::decode(&resource, &ctx()).expect("nyaa decodes");
        assert_eq!(decoded, definition);
    }

    #[test]
    fn unknown_implementation_decodes_to_none() {
        let resource = FieldResource {
            implementation: "HDBits".to_string(),
            ..FieldResource::default()
        };
        assert!(Indexer::decode(&resource, &ctx()).is_none());
    }

    #[test]
    fn unknown_download_client_reference_fails_encoding() {
        let mut definition = nyaa();
        definition.download_client = Some("missing".to_string());
        let mut resource = FieldResource::default();
        let err = definition.encode_into(&mut resource, &ctx()).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn priority_out_of_range_is_rejected() {
        let mut definition = nyaa();
        definition.priority = 51;
        assert!(definition.validate("Nyaa").is_err());
        definition.priority = 50;
        assert!(definition.validate("Nyaa").is_ok());
    }
}
