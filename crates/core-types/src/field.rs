//! Canonical field descriptors produced by the scanner.

use serde::{Deserialize, Serialize};

use crate::FieldId;

/// Structural category of an interactive control.
///
/// Computed once per field during the scan and carried on the descriptor;
/// every later stage (resolution, interaction, verification) consumes this
/// tag instead of re-deriving menu-ness from markup.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlType {
    Text,
    TextArea,
    RichText,
    NativeMenu,
    CustomMenu,
    Checkbox,
    Radio,
    File,
}

impl ControlType {
    /// Controls that expose a discrete option list rather than free text.
    pub fn is_menu(self) -> bool {
        matches!(self, ControlType::NativeMenu | ControlType::CustomMenu)
    }

    pub fn is_textual(self) -> bool {
        matches!(
            self,
            ControlType::Text | ControlType::TextArea | ControlType::RichText
        )
    }

    pub fn is_toggle(self) -> bool {
        matches!(self, ControlType::Checkbox | ControlType::Radio)
    }
}

/// Advisory semantic category inferred from label/placeholder/name keywords.
/// Never gates execution and never changes the control type.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticHint {
    Url,
    Email,
    Phone,
    Demographic,
    ShortNote,
    #[default]
    GeneralText,
}

/// One entry of a menu or radio-group option list.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
    pub value: String,
    pub text: String,
}

impl FieldOption {
    pub fn new(value: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            text: text.into(),
        }
    }
}

/// Best-effort CSS-style locator hints captured at scan time.
///
/// These are hints, not authoritative locators: the resolver must tolerate
/// their staleness, and when `generic` is set the primary selector matches
/// too broadly (bare `input` and friends) to be trusted for strict actions.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SelectorHints {
    pub primary: Option<String>,
    pub control: Option<String>,
    pub container: Option<String>,
    #[serde(default)]
    pub generic: bool,
}

/// Value observed on the control at scan time, used to recognize fields that
/// are already in the intended state before any interaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CurrentValue {
    Text(String),
    Many(Vec<String>),
    Checked(bool),
}

/// Canonical description of one interactive control, immutable once scanned.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub id: FieldId,
    pub label: String,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default)]
    pub name: String,
    pub control: ControlType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<FieldOption>,
    #[serde(default)]
    pub selectors: SelectorHints,
    #[serde(default)]
    pub hint: SemanticHint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<CurrentValue>,
}
