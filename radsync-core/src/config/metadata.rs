//! Metadata consumer settings.
//!
//! Unlike the other sections, metadata consumers are fixed resources on the
//! remote: one per supported media-center format, always present. They are
//! updated in place, never created or deleted, and `delete_unmanaged` does not
//! apply. A consumer left out of the configuration is not touched.
//!
//! ```yaml
//! metadata:
//!   kodi_emby:
//!     enable: true
//!     movie_metadata: true
//!   wdtv:
//!     enable: false
//! ```

use serde::Deserialize;
use serde_json::json;

use crate::remote::FieldResource;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MetadataSettings {
    /// Kodi (XBMC) / Emby `.nfo` metadata.
    pub kodi_emby: Option<KodiEmbyMetadata>,
    pub roksbox: Option<RoksboxMetadata>,
    pub wdtv: Option<WdtvMetadata>,
}

impl MetadataSettings {
    pub fn is_empty(&self) -> bool {
        self.kodi_emby.is_none() && self.roksbox.is_none() && self.wdtv.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct KodiEmbyMetadata {
    pub enable: bool,
    pub movie_metadata: bool,
    /// Include the TMDB URL inside the `.nfo` file.
    pub movie_metadata_url: bool,
    pub movie_images: bool,
    /// Name the metadata file `<movie>.nfo` instead of `movie.nfo`.
    pub use_movie_nfo: bool,
}

impl Default for KodiEmbyMetadata {
    fn default() -> Self {
        KodiEmbyMetadata {
            enable: false,
            movie_metadata: true,
            movie_metadata_url: false,
            movie_images: true,
            use_movie_nfo: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RoksboxMetadata {
    pub enable: bool,
    pub movie_metadata: bool,
    pub movie_images: bool,
}

impl Default for RoksboxMetadata {
    fn default() -> Self {
        RoksboxMetadata {
            enable: false,
            movie_metadata: true,
            movie_images: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WdtvMetadata {
    pub enable: bool,
    pub movie_metadata: bool,
    pub movie_images: bool,
}

impl Default for WdtvMetadata {
    fn default() -> Self {
        WdtvMetadata {
            enable: false,
            movie_metadata: true,
            movie_images: true,
        }
    }
}

/// A metadata consumer that can be synced against its remote resource.
pub trait MetadataConsumer: Sized + PartialEq {
    /// Radarr implementation name of the backing resource.
    const IMPLEMENTATION: &'static str;
    /// Section key, for logging.
    const KEY: &'static str;

    fn decode(resource: &FieldResource) -> Self;
    fn encode_into(&self, resource: &mut FieldResource);
}

impl MetadataConsumer for KodiEmbyMetadata {
    const IMPLEMENTATION: &'static str = "XbmcMetadata";
    const KEY: &'static str = "kodi_emby";

    fn decode(resource: &FieldResource) -> Self {
        KodiEmbyMetadata {
            enable: resource.attr_bool("enable", false),
            movie_metadata: resource.field_bool("movieMetadata", true),
            movie_metadata_url: resource.field_bool("movieMetadataURL", false),
            movie_images: resource.field_bool("movieImages", true),
            use_movie_nfo: resource.field_bool("useMovieNfo", false),
        }
    }

    fn encode_into(&self, resource: &mut FieldResource) {
        resource.set_attr("enable", json!(self.enable));
        resource.set_field("movieMetadata", json!(self.movie_metadata));
        resource.set_field("movieMetadataURL", json!(self.movie_metadata_url));
        resource.set_field("movieImages", json!(self.movie_images));
        resource.set_field("useMovieNfo", json!(self.use_movie_nfo));
    }
}

impl MetadataConsumer for RoksboxMetadata {
    const IMPLEMENTATION: &'static str = "RoksboxMetadata";
    const KEY: &'static str = "roksbox";

    fn decode(resource: &FieldResource) -> Self {
        RoksboxMetadata {
            enable: resource.attr_bool("enable", false),
            movie_metadata: resource.field_bool("movieMetadata", true),
            movie_images: resource.field_bool("movieImages", true),
        }
    }

    fn encode_into(&self, resource: &mut FieldResource) {
        resource.set_attr("enable", json!(self.enable));
        resource.set_field("movieMetadata", json!(self.movie_metadata));
        resource.set_field("movieImages", json!(self.movie_images));
    }
}

impl MetadataConsumer for WdtvMetadata {
    const IMPLEMENTATION: &'static str = "WdtvMetadata";
    const KEY: &'static str = "wdtv";

    fn decode(resource: &FieldResource) -> Self {
        WdtvMetadata {
            enable: resource.attr_bool("enable", false),
            movie_metadata: resource.field_bool("movieMetadata", true),
            movie_images: resource.field_bool("movieImages", true),
        }
    }

    fn encode_into(&self, resource: &mut FieldResource) {
        resource.set_attr("enable", json!(self.enable));
        resource.set_field("movieMetadata", json!(self.movie_metadata));
        resource.set_field("movieImages", json!(self.movie_images));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kodi_round_trips_through_resource_encoding() {
        let settings = KodiEmbyMetadata {
            enable: true,
            use_movie_nfo: true,
            ..KodiEmbyMetadata::default()
        };
        let mut resource = FieldResource {
            implementation: "XbmcMetadata".to_string(),
            ..FieldResource::default()
        };
        settings.encode_into(&mut resource);
        assert_eq!(KodiEmbyMetadata::decode(&resource), settings);
    }

    #[test]
    fn omitted_consumers_leave_section_empty() {
        let settings: MetadataSettings = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(settings.is_empty());

        let settings: MetadataSettings =
            serde_json::from_value(serde_json::json!({"wdtv": {"enable": true}})).unwrap();
        assert!(!settings.is_empty());
        assert!(settings.wdtv.unwrap().enable);
    }
}
