//! Fill-plan items supplied by the external planner.

use serde::{Deserialize, Serialize};

use crate::field::ControlType;
use crate::FieldId;

/// Intended interaction kind for one plan item.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillAction {
    Type,
    Select,
    Check,
    Radio,
    MultiSelect,
    Upload,
    Skip,
}

impl FillAction {
    /// Whether this action may legally target the given control family.
    /// A mismatched pair is a caller error, never silently reinterpreted.
    pub fn compatible_with(self, control: ControlType) -> bool {
        match self {
            FillAction::Type => control.is_textual(),
            FillAction::Select | FillAction::MultiSelect => control.is_menu(),
            FillAction::Check => matches!(control, ControlType::Checkbox),
            FillAction::Radio => matches!(control, ControlType::Radio),
            FillAction::Upload => matches!(control, ControlType::File),
            FillAction::Skip => true,
        }
    }

    /// Actions where a wrong-but-present element is worse than a miss; the
    /// resolver refuses generic selectors for these.
    pub fn is_strict(self) -> bool {
        matches!(
            self,
            FillAction::Select | FillAction::MultiSelect | FillAction::Check | FillAction::Radio
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            FillAction::Type => "type",
            FillAction::Select => "select",
            FillAction::Check => "check",
            FillAction::Radio => "radio",
            FillAction::MultiSelect => "multiselect",
            FillAction::Upload => "upload",
            FillAction::Skip => "skip",
        }
    }
}

/// Planner-supplied value; shape depends on the action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FillValue {
    Flag(bool),
    Text(String),
    Many(Vec<String>),
}

impl FillValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FillValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// All requested values, in order. Flags have no value payload.
    pub fn values(&self) -> Vec<String> {
        match self {
            FillValue::Text(s) => vec![s.clone()],
            FillValue::Many(v) => v.clone(),
            FillValue::Flag(_) => Vec::new(),
        }
    }

    /// Interpret the value as a desired toggle state. Check/radio plans come
    /// in as booleans or as loose truthy strings; anything unrecognized
    /// defaults to "checked" since that is what the planner asked for.
    pub fn as_flag(&self) -> bool {
        match self {
            FillValue::Flag(b) => *b,
            FillValue::Text(s) => !matches!(
                s.trim().to_lowercase().as_str(),
                "false" | "0" | "no" | "n" | "unchecked" | "off"
            ),
            FillValue::Many(_) => true,
        }
    }

    /// Canonical string used for tracker keys and display.
    pub fn canonical(&self) -> String {
        match self {
            FillValue::Text(s) => s.clone(),
            FillValue::Many(v) => v.join(", "),
            FillValue::Flag(b) => b.to_string(),
        }
    }
}

/// One intended interaction against a scanned field.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FillPlanItem {
    pub field_id: FieldId,
    pub action: FillAction,
    pub value: FillValue,
    /// True if this item is one of several simultaneous selections into the
    /// same multi-value control.
    #[serde(default)]
    pub multi: bool,
}

impl FillPlanItem {
    pub fn new(field_id: impl Into<String>, action: FillAction, value: FillValue) -> Self {
        Self {
            field_id: FieldId::new(field_id),
            action,
            value,
            multi: false,
        }
    }

    pub fn with_multi(mut self) -> Self {
        self.multi = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_compatibility_matrix() {
        assert!(FillAction::Type.compatible_with(ControlType::Text));
        assert!(FillAction::Type.compatible_with(ControlType::RichText));
        assert!(!FillAction::Type.compatible_with(ControlType::NativeMenu));
        assert!(FillAction::Select.compatible_with(ControlType::CustomMenu));
        assert!(!FillAction::Select.compatible_with(ControlType::Checkbox));
        assert!(FillAction::Check.compatible_with(ControlType::Checkbox));
        assert!(!FillAction::Check.compatible_with(ControlType::Radio));
        assert!(FillAction::Upload.compatible_with(ControlType::File));
        assert!(FillAction::Skip.compatible_with(ControlType::File));
    }

    #[test]
    fn flag_parsing_is_lenient() {
        assert!(FillValue::Text("yes".into()).as_flag());
        assert!(FillValue::Text("checked".into()).as_flag());
        assert!(!FillValue::Text("No".into()).as_flag());
        assert!(!FillValue::Flag(false).as_flag());
        assert!(FillValue::Text("anything else".into()).as_flag());
    }

    #[test]
    fn untagged_value_deserializes_all_shapes() {
        let t: FillValue = serde_json::from_str("\"United States\"").unwrap();
        assert_eq!(t.as_text(), Some("United States"));
        let m: FillValue = serde_json::from_str("[\"Rust\", \"Go\"]").unwrap();
        assert_eq!(m.values().len(), 2);
        let f: FillValue = serde_json::from_str("true").unwrap();
        assert!(f.as_flag());
    }
}
