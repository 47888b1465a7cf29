//! Post-action checks: re-read the control and confirm the page took the
//! value. Text is exact after whitespace normalization; selections are
//! confirmed through the same fuzzy ladder the interaction used, because
//! custom widgets display a label that need not equal the requested string.

use formpilot_core_types::normalize_text;
use formpilot_page_port::{is_visible, NodeId, PageError, PagePort};
use tracing::debug;

use crate::matching::fuzzy_match;

/// Did a typed value land? Content-editable surfaces are read through their
/// text, everything else through the live value.
pub async fn verify_text(
    page: &dyn PagePort,
    node: NodeId,
    expected: &str,
) -> Result<bool, PageError> {
    let snap = page.snapshot(node).await?;
    let live = if snap.content_editable() || !matches!(snap.tag.as_str(), "input" | "textarea") {
        snap.text.clone()
    } else {
        snap.value.clone()
    };
    let ok = normalize_text(&live) == normalize_text(expected);
    if !ok {
        debug!(expected, live = %live, "text verification mismatch");
    }
    Ok(ok)
}

pub async fn verify_toggle(
    page: &dyn PagePort,
    node: NodeId,
    expected: bool,
) -> Result<bool, PageError> {
    Ok(page.snapshot(node).await?.checked == expected)
}

/// What the control currently displays as its selection(s).
///
/// Probes in order: the control's own value, a single-value display element
/// near it, then selected chips. Custom multi-selects only ever show up in
/// the chip pass.
pub async fn selection_snapshot(
    page: &dyn PagePort,
    node: NodeId,
) -> Result<Vec<String>, PageError> {
    let snap = page.snapshot(node).await?;
    if snap.tag == "select" {
        // A user sees option text, not the value attribute.
        return Ok(page
            .select_options(node)
            .await?
            .into_iter()
            .filter(|o| o.selected && !o.text.trim().is_empty())
            .map(|o| o.text)
            .collect());
    }
    if !snap.value.trim().is_empty() {
        return Ok(vec![snap.value.clone()]);
    }

    let container = display_container(page, node).await?;
    let mut displayed = Vec::new();
    for node in page
        .query(Some(container), "[class*=\"single-value\"]")
        .await?
    {
        let snap = page.snapshot(node).await?;
        let text = snap.text.trim().to_string();
        if is_visible(&snap) && !text.is_empty() {
            displayed.push(text);
        }
    }
    if !displayed.is_empty() {
        return Ok(displayed);
    }
    chip_texts(page, container).await
}

async fn display_container(page: &dyn PagePort, node: NodeId) -> Result<NodeId, PageError> {
    Ok(page
        .closest(
            node,
            "[class*=\"select\"], [class*=\"dropdown\"], [class*=\"question\"], fieldset",
        )
        .await?
        .or(page.parent(node).await?)
        .unwrap_or(node))
}

async fn chip_texts(page: &dyn PagePort, container: NodeId) -> Result<Vec<String>, PageError> {
    let mut displayed = Vec::new();
    for node in page
        .query(
            Some(container),
            "[class*=\"chip\"], [class*=\"tag\"], [class*=\"multi-value\"]",
        )
        .await?
    {
        let snap = page.snapshot(node).await?;
        let text = snap.text.trim().to_string();
        if is_visible(&snap) && !text.is_empty() && !displayed.contains(&text) {
            displayed.push(text);
        }
    }
    Ok(displayed)
}

/// Did a selection land? Every requested value must be matched by something
/// the control now displays.
pub async fn verify_selection(
    page: &dyn PagePort,
    node: NodeId,
    requested: &[String],
) -> Result<bool, PageError> {
    let displayed = selection_snapshot(page, node).await?;
    all_matched(requested, &displayed)
}

/// Multi-value variant: the state lives in the chips (or the selected
/// options of a native multi-select). The backing input of a custom widget
/// is only a filter box, so its leftover text is never read as a selection.
pub async fn verify_multi_selection(
    page: &dyn PagePort,
    node: NodeId,
    requested: &[String],
) -> Result<bool, PageError> {
    let snap = page.snapshot(node).await?;
    let displayed = if snap.tag == "select" {
        page.select_options(node)
            .await?
            .into_iter()
            .filter(|o| o.selected && !o.text.trim().is_empty())
            .map(|o| o.text)
            .collect()
    } else {
        let container = display_container(page, node).await?;
        chip_texts(page, container).await?
    };
    all_matched(requested, &displayed)
}

fn all_matched(requested: &[String], displayed: &[String]) -> Result<bool, PageError> {
    if displayed.is_empty() {
        return Ok(requested.is_empty());
    }
    let ok = requested
        .iter()
        .all(|want| displayed.iter().any(|have| fuzzy_match(want, have).is_some()));
    if !ok {
        debug!(?requested, ?displayed, "selection verification mismatch");
    }
    Ok(ok)
}
