//! Quality profile settings.
//!
//! ```yaml
//! quality_profiles:
//!   definitions:
//!     SD:
//!       upgrades_allowed: true
//!       upgrade_until_quality: "Bluray-480p"
//!       qualities:
//!         - "Bluray-480p"
//!         - "DVD"
//!         - name: "WEB 480p"
//!           members:
//!             - "WEBDL-480p"
//!             - "WEBRip-480p"
//!       custom_formats:
//!         "Some Format": 100
//!       language: "English"
//! ```
//!
//! The quality listed first has the highest priority. Groups give several
//! qualities the same priority level. Qualities not listed are disabled.
//!
//! The Radarr API wants the full quality universe in every profile (disabled
//! entries included, lowest priority first), so encoding needs the instance's
//! quality definitions, custom formats and languages; see [`QualityContext`].

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Deserializer};

use crate::contract::ApiError;
use crate::remote::{
    LanguageResource, ProfileFormatItem, QualityProfileItem, QualityProfileResource,
    QualityResource,
};

/// Group ids are synthetic; Radarr only requires them to not collide with
/// quality ids.
const GROUP_ID_BASE: i64 = 1000;

fn default_language() -> String {
    "English".to_string()
}

/// Scores of zero are equivalent to not listing the format at all; they are
/// dropped at parse time so local and decoded remote profiles compare equal.
fn deserialize_format_scores<'de, D>(deserializer: D) -> Result<BTreeMap<String, i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let scores = BTreeMap::<String, i64>::deserialize(deserializer)?;
    Ok(scores.into_iter().filter(|(_, score)| *score != 0).collect())
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct QualityProfilesSettings {
    /// Delete remote quality profiles not declared here. A profile still in
    /// use by a movie cannot be deleted; the API rejects the call.
    pub delete_unmanaged: bool,
    pub definitions: BTreeMap<String, QualityProfile>,
}

/// One entry of the ordered quality list: a single quality, or a named group
/// sharing one priority level.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum QualityEntry {
    Name(String),
    Group { name: String, members: BTreeSet<String> },
}

impl QualityEntry {
    pub fn name(&self) -> &str {
        match self {
            QualityEntry::Name(name) => name,
            QualityEntry::Group { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QualityProfile {
    /// Upgrade media automatically when a higher-priority quality becomes
    /// available.
    #[serde(default)]
    pub upgrades_allowed: bool,
    /// Quality to stop upgrading at. Required when upgrades are allowed.
    #[serde(default)]
    pub upgrade_until_quality: Option<String>,
    /// Enabled qualities, highest priority first.
    pub qualities: Vec<QualityEntry>,
    /// Custom format scores by format name. Unlisted formats score zero.
    #[serde(default, deserialize_with = "deserialize_format_scores")]
    pub custom_formats: BTreeMap<String, i64>,
    /// Minimum total format score a release needs to be downloaded.
    #[serde(default)]
    pub minimum_custom_format_score: i64,
    /// Stop format-score upgrades once this score is reached.
    #[serde(default)]
    pub upgrade_until_custom_format_score: i64,
    #[serde(default = "default_language")]
    pub language: String,
}

impl QualityProfile {
    pub(crate) fn validate(&self, name: &str) -> Result<(), String> {
        if self.qualities.is_empty() {
            return Err(format!(
                "quality profile {name:?}: at least one quality must be enabled"
            ));
        }
        let mut seen = BTreeSet::new();
        for entry in &self.qualities {
            if !seen.insert(entry.name().to_string()) {
                return Err(format!(
                    "quality profile {name:?}: duplicate quality entry {:?}",
                    entry.name()
                ));
            }
            if let QualityEntry::Group { name: group, members } = entry {
                if members.is_empty() {
                    return Err(format!(
                        "quality profile {name:?}: group {group:?} has no members"
                    ));
                }
                for member in members {
                    if !seen.insert(member.clone()) {
                        return Err(format!(
                            "quality profile {name:?}: quality {member:?} listed more than once"
                        ));
                    }
                }
            }
        }
        match (&self.upgrade_until_quality, self.upgrades_allowed) {
            (Some(target), true) => {
                if !self.qualities.iter().any(|entry| entry.name() == target) {
                    return Err(format!(
                        "quality profile {name:?}: upgrade_until_quality {target:?} \
                         is not in the qualities list"
                    ));
                }
            }
            (None, true) => {
                return Err(format!(
                    "quality profile {name:?}: upgrade_until_quality is required \
                     when upgrades_allowed is enabled"
                ));
            }
            (Some(_), false) => {
                return Err(format!(
                    "quality profile {name:?}: upgrade_until_quality has no effect \
                     when upgrades_allowed is disabled"
                ));
            }
            (None, false) => {}
        }
        Ok(())
    }
}

/// Remote lookup tables needed to encode a profile.
#[derive(Debug, Clone, Default)]
pub struct QualityContext {
    /// Quality name -> resource, from the quality definition list.
    pub qualities: BTreeMap<String, QualityResource>,
    /// Custom format name -> id.
    pub formats: BTreeMap<String, i64>,
    /// Language name -> id.
    pub languages: BTreeMap<String, i64>,
}

impl QualityContext {
    fn quality(&self, name: &str) -> Result<&QualityResource, ApiError> {
        self.qualities
            .get(name)
            .ok_or_else(|| format!("unknown quality name: {name:?}").into())
    }
}

/// Encode the profile into the full API resource shape.
///
/// The API lists items lowest priority first, so the user-facing order is
/// reversed, and every quality the instance knows must appear (disabled
/// entries come first, i.e. at the lowest priority).
pub fn encode_profile(
    name: &str,
    profile: &QualityProfile,
    ctx: &QualityContext,
) -> Result<QualityProfileResource, ApiError> {
    let mut used: BTreeSet<String> = BTreeSet::new();
    let mut enabled: Vec<QualityProfileItem> = Vec::new();
    let mut cutoff: Option<i64> = None;
    let highest = profile
        .qualities
        .first()
        .ok_or_else(|| format!("quality profile {name:?}: at least one quality must be enabled"))?;
    let cutoff_target = profile
        .upgrade_until_quality
        .as_deref()
        .unwrap_or_else(|| highest.name());

    for (index, entry) in profile.qualities.iter().enumerate() {
        let item = match entry {
            QualityEntry::Name(quality_name) => {
                used.insert(quality_name.clone());
                QualityProfileItem {
                    quality: Some(ctx.quality(quality_name)?.clone()),
                    allowed: true,
                    ..QualityProfileItem::default()
                }
            }
            QualityEntry::Group { name: group_name, members } => {
                let mut group_items = Vec::with_capacity(members.len());
                for member in members {
                    used.insert(member.clone());
                    group_items.push(QualityProfileItem {
                        quality: Some(ctx.quality(member)?.clone()),
                        allowed: true,
                        ..QualityProfileItem::default()
                    });
                }
                QualityProfileItem {
                    id: Some(GROUP_ID_BASE + index as i64),
                    name: Some(group_name.clone()),
                    items: group_items,
                    allowed: true,
                    ..QualityProfileItem::default()
                }
            }
        };
        if entry.name() == cutoff_target {
            cutoff = Some(match &item.id {
                Some(group_id) => *group_id,
                None => item.quality.as_ref().map(|q| q.id).unwrap_or_default(),
            });
        }
        enabled.push(item);
    }

    let cutoff = cutoff
        .ok_or_else(|| format!("cutoff quality {cutoff_target:?} not found in profile"))?;

    // Disabled qualities fill the bottom of the list, ordered by id.
    let mut disabled: Vec<&QualityResource> = ctx
        .qualities
        .values()
        .filter(|quality| !used.contains(&quality.name))
        .collect();
    disabled.sort_by_key(|quality| quality.id);

    let mut items: Vec<QualityProfileItem> = disabled
        .into_iter()
        .map(|quality| QualityProfileItem {
            quality: Some(quality.clone()),
            allowed: false,
            ..QualityProfileItem::default()
        })
        .collect();
    items.extend(enabled.into_iter().rev());

    let mut format_items: Vec<ProfileFormatItem> = Vec::with_capacity(ctx.formats.len());
    for (format_name, format_id) in &ctx.formats {
        format_items.push(ProfileFormatItem {
            format: *format_id,
            name: format_name.clone(),
            score: profile.custom_formats.get(format_name).copied().unwrap_or(0),
        });
    }
    for format_name in profile.custom_formats.keys() {
        if !ctx.formats.contains_key(format_name) {
            return Err(format!("unknown custom format: {format_name:?}").into());
        }
    }

    let language_id = ctx
        .languages
        .get(&profile.language)
        .copied()
        .ok_or_else(|| format!("unknown language: {:?}", profile.language))?;

    Ok(QualityProfileResource {
        id: 0,
        name: name.to_string(),
        upgrade_allowed: profile.upgrades_allowed,
        cutoff,
        items,
        format_items,
        min_format_score: profile.minimum_custom_format_score,
        cutoff_format_score: profile.upgrade_until_custom_format_score,
        language: Some(LanguageResource {
            id: language_id,
            name: profile.language.clone(),
        }),
        extra: Default::default(),
    })
}

/// Rebuild the local profile shape from a remote resource. Returns `None` for
/// structurally unexpected resources (no enabled qualities).
pub fn decode_profile(resource: &QualityProfileResource) -> Option<QualityProfile> {
    let mut qualities: Vec<QualityEntry> = Vec::new();
    let mut cutoff_name: Option<String> = None;

    // Remote order is lowest priority first.
    for item in resource.items.iter().rev() {
        if !item.allowed {
            continue;
        }
        let entry = match (&item.name, &item.quality) {
            (Some(group_name), _) if !item.items.is_empty() => QualityEntry::Group {
                name: group_name.clone(),
                members: item
                    .items
                    .iter()
                    .filter_map(|member| member.quality.as_ref().map(|q| q.name.clone()))
                    .collect(),
            },
            (_, Some(quality)) => QualityEntry::Name(quality.name.clone()),
            _ => continue,
        };
        let item_id = item
            .id
            .or_else(|| item.quality.as_ref().map(|quality| quality.id));
        if item_id == Some(resource.cutoff) {
            cutoff_name = Some(entry.name().to_string());
        }
        qualities.push(entry);
    }

    if qualities.is_empty() {
        return None;
    }

    Some(QualityProfile {
        upgrades_allowed: resource.upgrade_allowed,
        upgrade_until_quality: if resource.upgrade_allowed {
            cutoff_name
        } else {
            None
        },
        qualities,
        custom_formats: resource
            .format_items
            .iter()
            .filter(|item| item.score != 0)
            .map(|item| (item.name.clone(), item.score))
            .collect(),
        minimum_custom_format_score: resource.min_format_score,
        upgrade_until_custom_format_score: resource.cutoff_format_score,
        language: resource
            .language
            .as_ref()
            .map(|language| language.name.clone())
            .unwrap_or_else(default_language),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> QualityContext {
        let qualities = [
            (1, "SDTV"),
            (2, "DVD"),
            (8, "WEBDL-480p"),
            (12, "WEBRip-480p"),
            (20, "Bluray-480p"),
        ]
        .into_iter()
        .map(|(id, name)| {
            (
                name.to_string(),
                QualityResource {
                    id,
                    name: name.to_string(),
                    extra: Default::default(),
                },
            )
        })
        .collect();
        QualityContext {
            qualities,
            formats: BTreeMap::from([("Freeleech".to_string(), 4)]),
            languages: BTreeMap::from([("English".to_string(), 1)]),
        }
    }

    fn profile() -> QualityProfile {
        serde_json::from_value(serde_json::json!({
            "upgrades_allowed": true,
            "upgrade_until_quality": "Bluray-480p",
            "qualities": [
                "Bluray-480p",
                {"name": "WEB 480p", "members": ["WEBDL-480p", "WEBRip-480p"]},
                "DVD"
            ],
            "custom_formats": {"Freeleech": 25}
        }))
        .unwrap()
    }

    #[test]
    fn encode_reverses_order_and_appends_disabled_qualities() {
        let resource = encode_profile("SD", &profile(), &context()).unwrap();

        // SDTV is not enabled: it must appear first (lowest priority),
        // disallowed.
        assert_eq!(resource.items[0].quality.as_ref().unwrap().name, "SDTV");
        assert!(!resource.items[0].allowed);

        // Highest priority entry comes last.
        let last = resource.items.last().unwrap();
        assert_eq!(last.quality.as_ref().unwrap().name, "Bluray-480p");
        assert!(last.allowed);
        assert_eq!(resource.cutoff, 20);

        let group = resource
            .items
            .iter()
            .find(|item| item.name.as_deref() == Some("WEB 480p"))
            .expect("group encoded");
        assert_eq!(group.items.len(), 2);
        assert_eq!(group.id, Some(GROUP_ID_BASE + 1));

        // All known formats are scored; unlisted ones get zero.
        assert_eq!(resource.format_items.len(), 1);
        assert_eq!(resource.format_items[0].score, 25);
    }

    #[test]
    fn decode_round_trips_encoded_profile() {
        let original = profile();
        let resource = encode_profile("SD", &original, &context()).unwrap();
        let decoded = decode_profile(&resource).expect("profile decodes");
        assert_eq!(decoded, original);
    }

    #[test]
    fn group_cutoff_uses_group_id() {
        let mut p = profile();
        p.upgrade_until_quality = Some("WEB 480p".to_string());
        let resource = encode_profile("SD", &p, &context()).unwrap();
        assert_eq!(resource.cutoff, GROUP_ID_BASE + 1);
        let decoded = decode_profile(&resource).unwrap();
        assert_eq!(decoded.upgrade_until_quality.as_deref(), Some("WEB 480p"));
    }

    #[test]
    fn encoding_without_qualities_fails_instead_of_panicking() {
        let mut p = profile();
        p.upgrade_until_quality = None;
        p.qualities.clear();
        let err = encode_profile("SD", &p, &context()).unwrap_err();
        assert!(err.to_string().contains("at least one quality"));
    }

    #[test]
    fn unknown_quality_name_fails_encoding() {
        let mut p = profile();
        p.qualities.push(QualityEntry::Name("Bluray-2160p".into()));
        let err = encode_profile("SD", &p, &context()).unwrap_err();
        assert!(err.to_string().contains("Bluray-2160p"));
    }

    #[test]
    fn validation_rejects_inconsistent_upgrade_settings() {
        let mut p = profile();
        assert!(p.validate("SD").is_ok());

        p.upgrade_until_quality = Some("SDTV".to_string());
        assert!(p.validate("SD").is_err());

        p.upgrade_until_quality = None;
        assert!(p.validate("SD").is_err());

        p.upgrades_allowed = false;
        assert!(p.validate("SD").is_ok());

        p.qualities.clear();
        assert!(p.validate("SD").is_err());
    }

    #[test]
    fn zero_scores_are_dropped_at_parse_time() {
        let p: QualityProfile = serde_json::from_value(serde_json::json!({
            "qualities": ["DVD"],
            "custom_formats": {"Freeleech": 0}
        }))
        .unwrap();
        assert!(p.custom_formats.is_empty());
    }
}
