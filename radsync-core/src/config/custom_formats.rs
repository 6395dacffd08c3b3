//! Custom format settings.
//!
//! ```yaml
//! custom_formats:
//!   delete_unmanaged: false
//!   definitions:
//!     Freeleech:
//!       conditions:
//!         freeleech:
//!           type: "release_title"
//!           regex: "\\bfreeleech\\b"
//!     Remaster:
//!       include_when_renaming: true
//!       conditions:
//!         bluray:
//!           type: "source"
//!           source: "BLURAY"
//!           required: true
//! ```
//!
//! A custom format is a named set of conditions; quality profiles then score
//! formats by name. Formats are reconciled before quality profiles so newly
//! declared formats can be referenced immediately. The conditions of a
//! managed format are replaced wholesale on update.
//!
//! Resolution and source conditions are written by name; the API wants the
//! numeric value, which the condition schema's select options provide.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::json;

use crate::contract::ApiError;
use crate::remote::{CustomFormatResource, FieldResource};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CustomFormatsSettings {
    /// Delete remote custom formats not declared here. A format still scored
    /// by a quality profile cannot be deleted; the API rejects the call.
    pub delete_unmanaged: bool,
    pub definitions: BTreeMap<String, CustomFormat>,
}

/// One custom format: a named set of release-matching conditions.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CustomFormat {
    /// Make the format available in the `{Custom Formats}` renaming template.
    pub include_when_renaming: bool,
    pub conditions: BTreeMap<String, Condition>,
}

/// One condition: negate/required flags common to all types, plus a typed
/// variant selected by `type`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Condition {
    /// Match releases that do NOT meet this condition.
    #[serde(default)]
    pub negate: bool,
    /// The format only applies when this condition matches.
    #[serde(default)]
    pub required: bool,
    #[serde(flatten)]
    pub implementation: ConditionImpl,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConditionImpl {
    /// Case-insensitive regex against the release title.
    ReleaseTitle { regex: String },
    ReleaseGroup { regex: String },
    Edition { regex: String },
    /// Resolution name, e.g. `1080p`. Matched against the schema's options.
    Resolution {
        #[serde(deserialize_with = "lowercase")]
        resolution: String,
    },
    /// Source name, e.g. `BLURAY`. Matched against the schema's options.
    Source {
        #[serde(deserialize_with = "uppercase")]
        source: String,
    },
    /// Release size bounds in gigabytes.
    Size {
        #[serde(default)]
        min: f64,
        max: f64,
    },
}

// Select-option names are matched case-insensitively; normalizing at parse
// time keeps local and decoded remote conditions comparable.
fn lowercase<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(String::deserialize(deserializer)?.to_lowercase())
}

fn uppercase<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(String::deserialize(deserializer)?.to_uppercase())
}

impl ConditionImpl {
    fn implementation(&self) -> &'static str {
        match self {
            ConditionImpl::ReleaseTitle { .. } => "ReleaseTitleSpecification",
            ConditionImpl::ReleaseGroup { .. } => "ReleaseGroupSpecification",
            ConditionImpl::Edition { .. } => "EditionSpecification",
            ConditionImpl::Resolution { .. } => "ResolutionSpecification",
            ConditionImpl::Source { .. } => "SourceSpecification",
            ConditionImpl::Size { .. } => "SizeSpecification",
        }
    }
}

fn schema_for<'a>(
    schemas: &'a [FieldResource],
    implementation: &str,
) -> Result<&'a FieldResource, ApiError> {
    schemas
        .iter()
        .find(|schema| schema.is_implementation(implementation))
        .ok_or_else(|| {
            format!("remote instance offers no condition schema for {implementation:?}").into()
        })
}

/// Translate a select-option name (resolution, source) to its API value.
fn option_value(schema: &FieldResource, name: &str) -> Result<i64, ApiError> {
    let options = schema.field_select_options("value");
    for (value, option_name) in &options {
        if option_name.eq_ignore_ascii_case(name) {
            return Ok(*value);
        }
    }
    let supported: Vec<&str> = options.iter().map(|(_, name)| name.as_str()).collect();
    Err(format!("unknown option {name:?}, supported: {supported:?}").into())
}

fn option_name(schema: &FieldResource, value: i64) -> Option<String> {
    schema
        .field_select_options("value")
        .into_iter()
        .find(|(option_value, _)| *option_value == value)
        .map(|(_, name)| name)
}

fn encode_condition(
    name: &str,
    condition: &Condition,
    schemas: &[FieldResource],
) -> Result<FieldResource, ApiError> {
    let schema = schema_for(schemas, condition.implementation.implementation())?;
    let mut spec = schema.clone();
    spec.name = name.to_string();
    spec.set_attr("negate", json!(condition.negate));
    spec.set_attr("required", json!(condition.required));
    match &condition.implementation {
        ConditionImpl::ReleaseTitle { regex }
        | ConditionImpl::ReleaseGroup { regex }
        | ConditionImpl::Edition { regex } => {
            spec.set_field("value", json!(regex));
        }
        ConditionImpl::Resolution { resolution } => {
            spec.set_field("value", json!(option_value(schema, resolution)?));
        }
        ConditionImpl::Source { source } => {
            spec.set_field("value", json!(option_value(schema, source)?));
        }
        ConditionImpl::Size { min, max } => {
            spec.set_field("min", json!(min));
            spec.set_field("max", json!(max));
        }
    }
    Ok(spec)
}

fn decode_condition(spec: &FieldResource, schemas: &[FieldResource]) -> Option<Condition> {
    let implementation = if spec.is_implementation("ReleaseTitleSpecification") {
        ConditionImpl::ReleaseTitle {
            regex: spec.field_string("value")?,
        }
    } else if spec.is_implementation("ReleaseGroupSpecification") {
        ConditionImpl::ReleaseGroup {
            regex: spec.field_string("value")?,
        }
    } else if spec.is_implementation("EditionSpecification") {
        ConditionImpl::Edition {
            regex: spec.field_string("value")?,
        }
    } else if spec.is_implementation("ResolutionSpecification") {
        let schema = schemas
            .iter()
            .find(|schema| schema.is_implementation("ResolutionSpecification"))?;
        ConditionImpl::Resolution {
            resolution: option_name(schema, spec.field_i64("value", -1))?.to_lowercase(),
        }
    } else if spec.is_implementation("SourceSpecification") {
        let schema = schemas
            .iter()
            .find(|schema| schema.is_implementation("SourceSpecification"))?;
        ConditionImpl::Source {
            source: option_name(schema, spec.field_i64("value", -1))?.to_uppercase(),
        }
    } else if spec.is_implementation("SizeSpecification") {
        ConditionImpl::Size {
            min: spec.field_f64("min").unwrap_or(0.0),
            max: spec.field_f64("max")?,
        }
    } else {
        return None;
    };

    Some(Condition {
        negate: spec.attr_bool("negate", false),
        required: spec.attr_bool("required", false),
        implementation,
    })
}

/// Encode a format into the full API resource shape, conditions in name order.
pub fn encode_format(
    name: &str,
    format: &CustomFormat,
    schemas: &[FieldResource],
) -> Result<CustomFormatResource, ApiError> {
    let mut specifications = Vec::with_capacity(format.conditions.len());
    for (condition_name, condition) in &format.conditions {
        specifications.push(encode_condition(condition_name, condition, schemas)?);
    }
    Ok(CustomFormatResource {
        id: 0,
        name: name.to_string(),
        include_custom_format_when_renaming: format.include_when_renaming,
        specifications,
        extra: Default::default(),
    })
}

/// Rebuild the local format shape from a remote resource. Returns `None` when
/// any condition uses an unmodelled implementation; such formats plan as
/// unmanaged (or are force-updated when a definition shares their name).
pub fn decode_format(
    resource: &CustomFormatResource,
    schemas: &[FieldResource],
) -> Option<CustomFormat> {
    let mut conditions = BTreeMap::new();
    for spec in &resource.specifications {
        conditions.insert(spec.name.clone(), decode_condition(spec, schemas)?);
    }
    Some(CustomFormat {
        include_when_renaming: resource.include_custom_format_when_renaming,
        conditions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schemas() -> Vec<FieldResource> {
        serde_json::from_value(serde_json::json!([
            {
                "implementation": "ReleaseTitleSpecification",
                "fields": [{"name": "value", "label": "Regular Expression"}]
            },
            {
                "implementation": "SourceSpecification",
                "fields": [{
                    "name": "value",
                    "selectOptions": [
                        {"value": 5, "name": "DVD"},
                        {"value": 7, "name": "WEBDL"},
                        {"value": 9, "name": "Bluray"}
                    ]
                }]
            },
            {
                "implementation": "SizeSpecification",
                "fields": [{"name": "min"}, {"name": "max"}]
            }
        ]))
        .unwrap()
    }

    fn format() -> CustomFormat {
        serde_json::from_value(serde_json::json!({
            "include_when_renaming": true,
            "conditions": {
                "freeleech": {"type": "release_title", "regex": "\\bfreeleech\\b"},
                "bluray": {"type": "source", "source": "bluray", "required": true},
                "not-huge": {"type": "size", "max": 40.0, "negate": false}
            }
        }))
        .unwrap()
    }

    #[test]
    fn format_round_trips_through_resource_encoding() {
        let definition = format();
        let resource = encode_format("Quality Release", &definition, &schemas()).unwrap();
        assert_eq!(resource.name, "Quality Release");
        assert!(resource.include_custom_format_when_renaming);
        assert_eq!(resource.specifications.len(), 3);

        // Source names encode to the schema's numeric option value.
        let source = resource
            .specifications
            .iter()
            .find(|spec| spec.is_implementation("SourceSpecification"))
            .unwrap();
        assert_eq!(source.field_i64("value", 0), 9);
        assert!(source.attr_bool("required", false));

        let decoded = decode_format(&resource, &schemas()).expect("format decodes");
        assert_eq!(decoded, definition);
    }

    #[test]
    fn source_names_normalize_case_at_parse_time() {
        let definition = format();
        match &definition.conditions["bluray"].implementation {
            ConditionImpl::Source { source } => assert_eq!(source, "BLURAY"),
            other => panic!("expected source condition, got {other:?}"),
        }
    }

    #[test]
    fn unknown_select_option_fails_encoding() {
        let definition: CustomFormat = serde_json::from_value(serde_json::json!({
            "conditions": {"cam": {"type": "source", "source": "CAMRIP"}}
        }))
        .unwrap();
        let err = encode_format("Bad", &definition, &schemas()).unwrap_err();
        assert!(err.to_string().contains("CAMRIP"));
    }

    #[test]
    fn unmodelled_condition_decodes_to_none() {
        let resource: CustomFormatResource = serde_json::from_value(serde_json::json!({
            "id": 5,
            "name": "Anime",
            "specifications": [
                {"name": "raws", "implementation": "LanguageSpecification",
                 "fields": [{"name": "value", "value": 10}]}
            ]
        }))
        .unwrap();
        assert!(decode_format(&resource, &schemas()).is_none());
    }
}
