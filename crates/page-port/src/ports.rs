use async_trait::async_trait;

use crate::errors::PageError;
use crate::model::{DomEvent, ElementSnapshot, NodeId, OptionSnapshot};

/// Everything the fill engine needs from a rendered page.
///
/// Selectors use the engine's own subset: tag, `#id`, `.class`, `[attr]`,
/// `[attr="v"]`, `[attr*="v"]`, compound simple selectors, comma lists and
/// `:nth-of-type(n)` over the match list. A real-browser adapter can pass
/// them straight to `querySelectorAll`.
#[async_trait]
pub trait PagePort: Send + Sync {
    /// Query matching elements in document order, optionally scoped to the
    /// subtree under `scope`.
    async fn query(&self, scope: Option<NodeId>, selector: &str)
        -> Result<Vec<NodeId>, PageError>;

    async fn snapshot(&self, node: NodeId) -> Result<ElementSnapshot, PageError>;

    async fn parent(&self, node: NodeId) -> Result<Option<NodeId>, PageError>;

    /// Nearest ancestor (the node itself included) matching the selector.
    async fn closest(&self, node: NodeId, selector: &str) -> Result<Option<NodeId>, PageError>;

    /// Preceding siblings, nearest first.
    async fn preceding_siblings(&self, node: NodeId) -> Result<Vec<NodeId>, PageError>;

    /// Options of a native `<select>`.
    async fn select_options(&self, node: NodeId) -> Result<Vec<OptionSnapshot>, PageError>;

    /// Set the control's value attribute-equivalent without firing events;
    /// the caller fires `input`/`change` explicitly, like a page script would
    /// observe from real typing.
    async fn set_value(&self, node: NodeId, value: &str) -> Result<(), PageError>;

    /// Replace the element's own text (content-editable surfaces).
    async fn set_inner_text(&self, node: NodeId, text: &str) -> Result<(), PageError>;

    /// Toggle one option of a native select.
    async fn set_option_selected(
        &self,
        node: NodeId,
        index: usize,
        selected: bool,
    ) -> Result<(), PageError>;

    /// Dispatch a user-equivalent event. Implementations mirror browser
    /// default actions (a click on a checkbox toggles it).
    async fn dispatch(&self, node: NodeId, event: DomEvent) -> Result<(), PageError>;

    async fn scroll_into_view(&self, node: NodeId) -> Result<(), PageError>;

    /// Current navigable URL; the tracker resets when it changes.
    async fn url(&self) -> Result<String, PageError>;
}
