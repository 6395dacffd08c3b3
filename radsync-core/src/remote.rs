//! Wire types for the Radarr v3 REST API.
//!
//! Indexers, download clients, notification connections and metadata consumers
//! all share one resource shape: a handful of typed top-level attributes plus a
//! `fields` array carrying the implementation-specific values. [`FieldResource`]
//! models that shape, keeping every attribute it does not understand in a
//! flattened map so that schema templates survive a decode/encode round trip
//! untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Response of `GET /api/v3/system/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub version: String,
    #[serde(default)]
    pub instance_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A Radarr tag. Tags are referenced by id everywhere else in the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagResource {
    pub id: i64,
    pub label: String,
}

/// One entry of a resource's `fields` array.
///
/// Schema endpoints return fields with presentation metadata (label, help
/// text, select options). That metadata must be sent back verbatim on create,
/// so anything beyond `name` and `value` is preserved in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceField {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Shared resource shape for indexers, download clients, notification
/// connections and metadata consumers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldResource {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub implementation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_contract: Option<String>,
    #[serde(default)]
    pub fields: Vec<ResourceField>,
    #[serde(default)]
    pub tags: Vec<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FieldResource {
    /// Whether this resource is of the given implementation. Radarr reports
    /// implementation names in PascalCase; comparison is case-insensitive.
    pub fn is_implementation(&self, implementation: &str) -> bool {
        self.implementation.eq_ignore_ascii_case(implementation)
    }

    /// Look up a field value by name.
    pub fn field_value(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .and_then(|f| f.value.as_ref())
    }

    /// Set a field value by name, appending the field if the resource does not
    /// carry it yet (metadata-less fields only occur outside schema templates).
    pub fn set_field(&mut self, name: &str, value: Value) {
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(field) => field.value = Some(value),
            None => self.fields.push(ResourceField {
                name: name.to_string(),
                value: Some(value),
                extra: Map::new(),
            }),
        }
    }

    /// Look up a top-level attribute outside the typed set.
    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Set a top-level attribute outside the typed set.
    pub fn set_attr(&mut self, key: &str, value: Value) {
        self.extra.insert(key.to_string(), value);
    }

    pub fn attr_bool(&self, key: &str, default: bool) -> bool {
        self.attr(key).and_then(Value::as_bool).unwrap_or(default)
    }

    pub fn attr_i64(&self, key: &str, default: i64) -> i64 {
        self.attr(key).and_then(Value::as_i64).unwrap_or(default)
    }

    pub fn field_bool(&self, name: &str, default: bool) -> bool {
        self.field_value(name)
            .and_then(Value::as_bool)
            .unwrap_or(default)
    }

    pub fn field_i64(&self, name: &str, default: i64) -> i64 {
        self.field_value(name)
            .and_then(Value::as_i64)
            .unwrap_or(default)
    }

    pub fn field_f64(&self, name: &str) -> Option<f64> {
        self.field_value(name).and_then(Value::as_f64)
    }

    pub fn field_string(&self, name: &str) -> Option<String> {
        self.field_value(name)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Decode a field holding an array of integers (e.g. Newznab categories).
    pub fn field_i64_array(&self, name: &str) -> Vec<i64> {
        self.field_value(name)
            .and_then(Value::as_array)
            .map(|values| values.iter().filter_map(Value::as_i64).collect())
            .unwrap_or_default()
    }

    /// Select options carried by a schema field, as (value, name) pairs.
    /// Empty for fields without a selection.
    pub fn field_select_options(&self, name: &str) -> Vec<(i64, String)> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .and_then(|f| f.extra.get("selectOptions"))
            .and_then(Value::as_array)
            .map(|options| {
                options
                    .iter()
                    .filter_map(|option| {
                        let value = option.get("value")?.as_i64()?;
                        let name = option.get("name")?.as_str()?;
                        Some((value, name.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Decode a field holding an array of strings (e.g. email recipients).
    pub fn field_string_array(&self, name: &str) -> Vec<String> {
        self.field_value(name)
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A quality known to the remote instance, as nested inside quality
/// definitions and profile items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityResource {
    pub id: i64,
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response entry of `GET /api/v3/qualitydefinition`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityDefinitionResource {
    pub quality: QualityResource,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Resource shape for `/api/v3/customformat`. The specifications reuse the
/// field-resource shape: implementation plus a `fields` array, with condition
/// attributes (`negate`, `required`) preserved in the flattened map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFormatResource {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub include_custom_format_when_renaming: bool,
    #[serde(default)]
    pub specifications: Vec<FieldResource>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response entry of `GET /api/v3/language`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageResource {
    pub id: i64,
    pub name: String,
}

/// Item of a quality profile: either a single quality or a named group of
/// qualities sharing one priority level.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityProfileItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<QualityResource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<QualityProfileItem>,
    pub allowed: bool,
}

/// Custom format score entry within a quality profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileFormatItem {
    pub format: i64,
    pub name: String,
    pub score: i64,
}

/// Resource shape for `/api/v3/qualityprofile`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityProfileResource {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub upgrade_allowed: bool,
    pub cutoff: i64,
    pub items: Vec<QualityProfileItem>,
    #[serde(default)]
    pub format_items: Vec<ProfileFormatItem>,
    #[serde(default)]
    pub min_format_score: i64,
    #[serde(default)]
    pub cutoff_format_score: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<LanguageResource>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Index a tag list into a label -> id map.
pub fn tag_ids_by_label(tags: &[TagResource]) -> BTreeMap<String, i64> {
    tags.iter()
        .map(|tag| (tag.label.clone(), tag.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_resource_round_trips_unknown_attributes() {
        let raw = json!({
            "id": 7,
            "name": "Nyaa",
            "implementation": "Nyaa",
            "configContract": "NyaaSettings",
            "enableRss": true,
            "priority": 25,
            "fields": [
                {"name": "websiteUrl", "value": "https://nyaa.example.com", "label": "Website URL"}
            ],
            "tags": [1, 2]
        });
        let resource: FieldResource = serde_json::from_value(raw.clone()).unwrap();
        assert!(resource.is_implementation("nyaa"));
        assert_eq!(
            resource.field_string("websiteUrl").as_deref(),
            Some("https://nyaa.example.com")
        );
        assert!(resource.attr_bool("enableRss", false));

        let encoded = serde_json::to_value(&resource).unwrap();
        assert_eq!(encoded["enableRss"], json!(true));
        assert_eq!(encoded["fields"][0]["label"], json!("Website URL"));
    }

    #[test]
    fn set_field_appends_when_missing() {
        let mut resource = FieldResource::default();
        resource.set_field("apiKey", json!("secret"));
        resource.set_field("apiKey", json!("rotated"));
        assert_eq!(resource.fields.len(), 1);
        assert_eq!(resource.field_string("apiKey").as_deref(), Some("rotated"));
    }
}
