//! Control-family classification.
//!
//! A decision list, first match wins. The classification is computed once
//! per field and carried on the descriptor; the resolver and interaction
//! layers consume it instead of re-deriving their own duck tests.

use formpilot_core_types::ControlType;
use formpilot_page_port::{ElementSnapshot, NodeId, PageError, PagePort};

/// Class fragments that mark a custom select widget's shell or control.
const MENU_CLASS_MARKERS: &[&str] = &["select__control", "react-select", "select2"];

/// Does this element expose a discrete option list rather than free text?
/// Used by the resolver to reject wrong-but-present candidates for Select
/// actions.
pub fn menu_like(snap: &ElementSnapshot) -> bool {
    snap.tag == "select"
        || snap.role() == "combobox"
        || snap.attr("aria-haspopup") == Some("listbox")
        || MENU_CLASS_MARKERS.iter().any(|m| snap.class_contains(m))
}

/// Nearest container that groups one form question with its label text.
pub async fn question_container(
    page: &dyn PagePort,
    node: NodeId,
) -> Result<Option<NodeId>, PageError> {
    page.closest(
        node,
        "fieldset, [class*=\"question\"], [data-testid*=\"question\"], [data-qa*=\"question\"]",
    )
    .await
}

async fn controls_a_listbox(page: &dyn PagePort, snap: &ElementSnapshot) -> Result<bool, PageError> {
    let Some(controls) = snap.attr("aria-controls") else {
        return Ok(false);
    };
    for target in page.query(None, &format!("[id=\"{controls}\"]")).await? {
        if page.snapshot(target).await?.role() == "listbox" {
            return Ok(true);
        }
    }
    Ok(false)
}

async fn inside_menu_shell(page: &dyn PagePort, node: NodeId) -> Result<bool, PageError> {
    let shell = page
        .closest(
            node,
            "[class*=\"select__control\"], [class*=\"react-select\"], [role=\"combobox\"]",
        )
        .await?;
    Ok(shell.is_some() && shell != Some(node))
}

pub async fn classify(
    page: &dyn PagePort,
    snap: &ElementSnapshot,
) -> Result<ControlType, PageError> {
    if snap.tag == "select" {
        return Ok(ControlType::NativeMenu);
    }
    let input_type = snap.input_type();
    if snap.tag == "input" {
        match input_type.as_str() {
            "checkbox" => return Ok(ControlType::Checkbox),
            "radio" => return Ok(ControlType::Radio),
            "file" => return Ok(ControlType::File),
            _ => {}
        }
    }
    if snap.tag == "textarea" {
        return Ok(ControlType::TextArea);
    }
    if snap.content_editable() || (snap.role() == "textbox" && snap.tag != "input") {
        return Ok(ControlType::RichText);
    }

    let custom_menu = snap.role() == "combobox"
        || snap.attr("aria-haspopup") == Some("listbox")
        || MENU_CLASS_MARKERS.iter().any(|m| snap.class_contains(m))
        || snap.placeholder().trim() == "Select..."
        || controls_a_listbox(page, snap).await?
        || inside_menu_shell(page, snap.node).await?;
    if custom_menu {
        return Ok(ControlType::CustomMenu);
    }
    Ok(ControlType::Text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use formpilot_core_types::ControlType;
    use formpilot_page_port::{MemoryPage, NodeSpec, PagePort};

    async fn classify_node(page: &MemoryPage, node: formpilot_page_port::NodeId) -> ControlType {
        let snap = page.snapshot(node).await.unwrap();
        classify(page, &snap).await.unwrap()
    }

    #[tokio::test]
    async fn native_controls_classify_by_tag_and_type() {
        let page = MemoryPage::new("x");
        let select = page.append(None, NodeSpec::new("select"));
        let area = page.append(None, NodeSpec::new("textarea"));
        let check = page.append(None, NodeSpec::new("input").attr("type", "checkbox"));
        let file = page.append(None, NodeSpec::new("input").attr("type", "file"));
        assert_eq!(classify_node(&page, select).await, ControlType::NativeMenu);
        assert_eq!(classify_node(&page, area).await, ControlType::TextArea);
        assert_eq!(classify_node(&page, check).await, ControlType::Checkbox);
        assert_eq!(classify_node(&page, file).await, ControlType::File);
    }

    #[tokio::test]
    async fn aria_controls_listbox_makes_a_custom_menu() {
        let page = MemoryPage::new("x");
        let input = page.append(
            None,
            NodeSpec::new("input").attr("aria-controls", "menu-1"),
        );
        let _menu = page.append(
            None,
            NodeSpec::new("ul").attr("id", "menu-1").attr("role", "listbox"),
        );
        assert_eq!(classify_node(&page, input).await, ControlType::CustomMenu);
    }

    #[tokio::test]
    async fn nesting_in_a_select_shell_makes_a_custom_menu() {
        let page = MemoryPage::new("x");
        let shell = page.append(None, NodeSpec::new("div").attr("class", "css-1 select__control"));
        let input = page.append(Some(shell), NodeSpec::new("input"));
        assert_eq!(classify_node(&page, input).await, ControlType::CustomMenu);
        let bare = page.append(None, NodeSpec::new("input"));
        assert_eq!(classify_node(&page, bare).await, ControlType::Text);
    }

    #[tokio::test]
    async fn rich_text_needs_editable_or_textbox_role() {
        let page = MemoryPage::new("x");
        let editable = page.append(None, NodeSpec::new("div").attr("contenteditable", "true"));
        let textbox = page.append(None, NodeSpec::new("div").attr("role", "textbox"));
        assert_eq!(classify_node(&page, editable).await, ControlType::RichText);
        assert_eq!(classify_node(&page, textbox).await, ControlType::RichText);
    }
}
