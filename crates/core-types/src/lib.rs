//! Shared identifiers and the canonical field/plan data model.
//!
//! Everything the scanner produces and the planner consumes lives here so
//! that the locator, interaction, verification and flow crates all speak the
//! same vocabulary without re-deriving it from markup.

pub mod field;
pub mod plan;
pub mod text;

pub use field::{
    ControlType, CurrentValue, FieldDescriptor, FieldOption, SelectorHints, SemanticHint,
};
pub use plan::{FillAction, FillPlanItem, FillValue};
pub use text::{normalize_text, normalize_ws};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable-within-one-scan identifier for a form field.
///
/// Derived from the element's DOM id when present, otherwise generated from
/// the resolved label plus a salt so repeated labels stay distinct.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(pub String);

impl FieldId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate an id from a label the way the scanner does for elements
    /// that lack a usable DOM id.
    pub fn generated(label: &str) -> Self {
        let sanitized: String = label
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        let salt = Uuid::new_v4().simple().to_string();
        Self(format!("field_{}_{}", sanitized, &salt[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
