//! Element snapshots and the DOM event vocabulary.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Opaque handle to a live element. Only valid against the page that
/// produced it; handles survive attribute mutation but not detachment.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

/// The minimum event vocabulary a page's own scripts expect from a real
/// user gesture: the mouse activation triple, value mutation events, and
/// focus bracketing.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomEvent {
    MouseDown,
    MouseUp,
    Click,
    Input,
    Change,
    Focus,
    Blur,
    KeyDown { key: String },
}

impl DomEvent {
    pub fn key_down(key: impl Into<String>) -> Self {
        DomEvent::KeyDown { key: key.into() }
    }
}

/// Computed style subset driving the visibility test.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StyleSnapshot {
    pub display: String,
    pub visibility: String,
    pub opacity: f32,
}

impl Default for StyleSnapshot {
    fn default() -> Self {
        Self {
            display: "block".into(),
            visibility: "visible".into(),
            opacity: 1.0,
        }
    }
}

/// Bounding-box subset driving the visibility test.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Point-in-time view of one element. Style is effective (an ancestor with
/// `display: none` renders the snapshot hidden).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ElementSnapshot {
    pub node: NodeId,
    pub tag: String,
    pub attrs: HashMap<String, String>,
    /// Full text content, descendants included, whitespace preserved.
    pub text: String,
    pub value: String,
    pub checked: bool,
    pub style: StyleSnapshot,
    pub rect: Rect,
}

impl ElementSnapshot {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(|s| s.as_str())
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id").filter(|s| !s.is_empty())
    }

    pub fn name(&self) -> Option<&str> {
        self.attr("name").filter(|s| !s.is_empty())
    }

    pub fn input_type(&self) -> String {
        self.attr("type").unwrap_or("text").to_lowercase()
    }

    pub fn placeholder(&self) -> &str {
        self.attr("placeholder").unwrap_or("")
    }

    pub fn role(&self) -> String {
        self.attr("role").unwrap_or("").to_lowercase()
    }

    pub fn classes(&self) -> Vec<&str> {
        self.attr("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn class_contains(&self, needle: &str) -> bool {
        self.attr("class")
            .map(|c| c.to_lowercase().contains(needle))
            .unwrap_or(false)
    }

    pub fn disabled(&self) -> bool {
        self.attrs.contains_key("disabled")
    }

    pub fn readonly(&self) -> bool {
        self.attrs.contains_key("readonly")
    }

    pub fn required(&self) -> bool {
        self.attrs.contains_key("required") || self.attr("aria-required") == Some("true")
    }

    pub fn content_editable(&self) -> bool {
        matches!(self.attr("contenteditable"), Some("") | Some("true"))
    }
}

/// One `<option>` of a native select.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OptionSnapshot {
    pub index: usize,
    pub value: String,
    pub text: String,
    pub selected: bool,
}
