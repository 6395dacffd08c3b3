//! Tag settings.
//!
//! Tags only carry a label. Labels referenced by other sections are created
//! automatically; this section exists so labels can also be declared up front.
//! Tags are never deleted: other applications and the instance itself share
//! them by label, so removal is out of scope.

use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TagsSettings {
    /// Tag labels to ensure exist on the remote instance.
    pub definitions: Vec<String>,
}
