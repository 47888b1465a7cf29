//! Element resolution: turn a field id plus intended action back into a
//! live node, surviving the re-renders that invalidate scan-time handles.
//!
//! Resolution is strict for Select/Check/Radio (a wrong-but-present element
//! is worse than a miss) and lenient for Type/Upload. Strict misses return
//! `Ok(None)`, never a guess.

use formpilot_core_types::{ControlType, FieldDescriptor, FieldId, FillAction};
use formpilot_field_scanner::{menu_like, question_container};
use formpilot_page_port::{is_visible, ElementSnapshot, NodeId, PageError, PagePort};
use serde::Serialize;
use tracing::{debug, trace};

/// Which ladder rung produced the node, recorded for observability.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedVia {
    ControlSelector,
    ContainerMenu,
    DomId,
    NameAttr,
    PrimarySelector,
    FieldIdFallback,
}

#[derive(Clone, Copy, Debug)]
pub struct Resolution {
    pub node: NodeId,
    pub via: ResolvedVia,
}

const MENU_DESCENDANT: &str = "select, [role=\"combobox\"], [aria-haspopup=\"listbox\"], \
     [class*=\"select__control\"], [class*=\"react-select\"]";

fn wants_menu(action: FillAction) -> bool {
    matches!(action, FillAction::Select | FillAction::MultiSelect)
}

fn toggle_matches(snap: &ElementSnapshot, action: FillAction) -> bool {
    let input_type = snap.input_type();
    match action {
        FillAction::Check => snap.tag == "input" && input_type == "checkbox",
        FillAction::Radio => snap.tag == "input" && input_type == "radio",
        _ => true,
    }
}

async fn menu_in_container(
    page: &dyn PagePort,
    node: NodeId,
) -> Result<Option<NodeId>, PageError> {
    let Some(container) = question_container(page, node).await? else {
        return Ok(None);
    };
    for candidate in page.query(Some(container), MENU_DESCENDANT).await? {
        let snap = page.snapshot(candidate).await?;
        if is_visible(&snap) {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}

/// Validate one candidate for the intended action. Menu actions may swap the
/// candidate for a true menu-like descendant of its question container.
async fn validate(
    page: &dyn PagePort,
    node: NodeId,
    action: FillAction,
) -> Result<Option<NodeId>, PageError> {
    let snap = page.snapshot(node).await?;
    let file_input = snap.tag == "input" && snap.input_type() == "file";
    if !is_visible(&snap) && !file_input {
        return Ok(None);
    }
    if wants_menu(action) {
        if menu_like(&snap) {
            return Ok(Some(node));
        }
        return menu_in_container(page, node).await;
    }
    if !toggle_matches(&snap, action) {
        return Ok(None);
    }
    Ok(Some(node))
}

async fn try_selector(
    page: &dyn PagePort,
    selector: &str,
    action: FillAction,
) -> Result<Option<NodeId>, PageError> {
    let candidates = match page.query(None, selector).await {
        Ok(nodes) => nodes,
        Err(PageError::InvalidSelector { .. }) => {
            trace!(selector, "skipping unparseable selector hint");
            return Ok(None);
        }
        Err(e) => return Err(e),
    };
    for candidate in candidates {
        if let Some(node) = validate(page, candidate, action).await? {
            return Ok(Some(node));
        }
    }
    Ok(None)
}

pub async fn resolve(
    page: &dyn PagePort,
    field_id: &FieldId,
    action: FillAction,
    descriptor: Option<&FieldDescriptor>,
) -> Result<Option<Resolution>, PageError> {
    let strict = action.is_strict();

    if let Some(desc) = descriptor {
        if let Some(control) = desc.selectors.control.as_deref() {
            if !(strict && desc.selectors.generic) {
                if let Some(node) = try_selector(page, control, action).await? {
                    return Ok(Some(Resolution {
                        node,
                        via: ResolvedVia::ControlSelector,
                    }));
                }
            }
        }

        if wants_menu(action) || desc.control == ControlType::CustomMenu {
            if let Some(container) = desc.selectors.container.as_deref() {
                if let Some(found) = container_menu(page, container).await? {
                    return Ok(Some(Resolution {
                        node: found,
                        via: ResolvedVia::ContainerMenu,
                    }));
                }
            }
        }

        if let Some(node) = try_selector(page, &format!("[id=\"{}\"]", desc.id), action).await? {
            return Ok(Some(Resolution {
                node,
                via: ResolvedVia::DomId,
            }));
        }
        if !desc.name.is_empty() {
            if let Some(node) =
                try_selector(page, &format!("[name=\"{}\"]", desc.name), action).await?
            {
                return Ok(Some(Resolution {
                    node,
                    via: ResolvedVia::NameAttr,
                }));
            }
        }

        if let Some(primary) = desc.selectors.primary.as_deref() {
            if !(strict && desc.selectors.generic) {
                if let Some(node) = try_selector(page, primary, action).await? {
                    return Ok(Some(Resolution {
                        node,
                        via: ResolvedVia::PrimarySelector,
                    }));
                }
            }
        }
    }

    // Last rung: interpret the bare field id as id, name, then data-field-id.
    for selector in [
        format!("[id=\"{field_id}\"]"),
        format!("[name=\"{field_id}\"]"),
        format!("[data-field-id=\"{field_id}\"]"),
    ] {
        if let Some(node) = try_selector(page, &selector, action).await? {
            return Ok(Some(Resolution {
                node,
                via: ResolvedVia::FieldIdFallback,
            }));
        }
    }

    debug!(%field_id, ?action, strict, "no resolvable element");
    Ok(None)
}

async fn container_menu(
    page: &dyn PagePort,
    container_selector: &str,
) -> Result<Option<NodeId>, PageError> {
    let containers = match page.query(None, container_selector).await {
        Ok(nodes) => nodes,
        Err(PageError::InvalidSelector { .. }) => return Ok(None),
        Err(e) => return Err(e),
    };
    for container in containers {
        for candidate in page.query(Some(container), MENU_DESCENDANT).await? {
            if is_visible(&page.snapshot(candidate).await?) {
                return Ok(Some(candidate));
            }
        }
    }
    Ok(None)
}
