//! Option discovery for menu controls.
//!
//! Native selects enumerate their `<option>` children. Custom widgets are
//! probed passively first; only when nothing is visible does the scanner
//! open the menu, wait a bounded settle interval, read the rendered
//! options, and close the menu again.

use std::time::Duration;

use formpilot_core_types::{normalize_text, normalize_ws, FieldOption};
use formpilot_page_port::{is_visible, DomEvent, NodeId, PageError, PagePort};
use tracing::debug;

use crate::classify::question_container;

const OPTION_SELECTOR: &str =
    "[role=\"option\"], [role=\"menuitem\"], [role=\"menuitemradio\"], li";

pub async fn native_options(
    page: &dyn PagePort,
    node: NodeId,
) -> Result<Vec<FieldOption>, PageError> {
    let mut out = Vec::new();
    for option in page.select_options(node).await? {
        let text = normalize_ws(&option.text);
        if text.is_empty() && option.value.is_empty() {
            continue;
        }
        out.push(FieldOption {
            value: option.value,
            text,
        });
    }
    Ok(out)
}

async fn visible_options(
    page: &dyn PagePort,
    scope: Option<NodeId>,
    max: usize,
) -> Result<Vec<FieldOption>, PageError> {
    let mut out: Vec<FieldOption> = Vec::new();
    let mut seen: Vec<String> = Vec::new();
    for node in page.query(scope, OPTION_SELECTOR).await? {
        let snap = page.snapshot(node).await?;
        if !is_visible(&snap) {
            continue;
        }
        let text = normalize_ws(&snap.text);
        if text.is_empty() {
            continue;
        }
        let key = normalize_text(&text);
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        out.push(FieldOption {
            value: snap.attr("data-value").unwrap_or(&text).to_string(),
            text,
        });
        if out.len() >= max {
            break;
        }
    }
    Ok(out)
}

/// Where an opened custom menu renders its options: the element named by
/// `aria-controls`, else the nearest visible listbox, else the question
/// container, else the whole document.
async fn option_scope(page: &dyn PagePort, control: NodeId) -> Result<Option<NodeId>, PageError> {
    let snap = page.snapshot(control).await?;
    if let Some(controls) = snap.attr("aria-controls") {
        if let Some(target) = page
            .query(None, &format!("[id=\"{controls}\"]"))
            .await?
            .first()
        {
            return Ok(Some(*target));
        }
    }
    for listbox in page.query(None, "[role=\"listbox\"]").await? {
        if is_visible(&page.snapshot(listbox).await?) {
            return Ok(Some(listbox));
        }
    }
    Ok(question_container(page, control).await?)
}

pub async fn custom_options(
    page: &dyn PagePort,
    control: NodeId,
    settle: Duration,
    max: usize,
) -> Result<Vec<FieldOption>, PageError> {
    // Passive pass: some widgets keep their option list mounted.
    let passive_scope = question_container(page, control)
        .await?
        .or(page.parent(control).await?);
    let passive = visible_options(page, passive_scope, max).await?;
    if !passive.is_empty() {
        return Ok(passive);
    }

    // Open, settle, read, close. Closing runs even when nothing rendered.
    page.dispatch(control, DomEvent::Focus).await?;
    page.dispatch(control, DomEvent::MouseDown).await?;
    page.dispatch(control, DomEvent::MouseUp).await?;
    page.dispatch(control, DomEvent::Click).await?;
    page.dispatch(control, DomEvent::key_down("ArrowDown")).await?;
    tokio::time::sleep(settle).await;

    let scope = option_scope(page, control).await?;
    let found = visible_options(page, scope, max).await?;
    debug!(count = found.len(), "custom menu option discovery");

    page.dispatch(control, DomEvent::key_down("Escape")).await?;
    page.dispatch(control, DomEvent::Blur).await?;
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use formpilot_page_port::{MemoryPage, NodeSpec};

    #[tokio::test]
    async fn native_enumeration_normalizes_text() {
        let page = MemoryPage::new("x");
        let select = page.append(None, NodeSpec::new("select"));
        page.append(
            Some(select),
            NodeSpec::new("option").attr("value", "US").text("  United   States "),
        );
        page.append(Some(select), NodeSpec::new("option").attr("value", "CA").text("Canada"));
        let options = native_options(&page, select).await.unwrap();
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].text, "United States");
        assert_eq!(options[0].value, "US");
    }

    #[tokio::test]
    async fn passive_pass_reads_mounted_options_without_clicking() {
        let page = MemoryPage::new("x");
        let q = page.append(None, NodeSpec::new("div").attr("class", "question"));
        let input = page.append(Some(q), NodeSpec::new("input").attr("role", "combobox"));
        let list = page.append(Some(q), NodeSpec::new("ul"));
        page.append(Some(list), NodeSpec::new("li").attr("role", "option").text("Yes"));
        page.append(Some(list), NodeSpec::new("li").attr("role", "option").text("No"));

        let options = custom_options(&page, input, Duration::ZERO, 50).await.unwrap();
        assert_eq!(options.len(), 2);
        assert!(page.events_for(input).is_empty());
    }

    #[tokio::test]
    async fn hidden_menus_are_opened_read_and_closed() {
        let page = MemoryPage::new("x");
        let wrap = page.append(None, NodeSpec::new("div"));
        let input = page.append(
            Some(wrap),
            NodeSpec::new("input").attr("role", "combobox").attr("aria-controls", "menu"),
        );
        let menu = page.append(
            Some(wrap),
            NodeSpec::new("ul").attr("id", "menu").attr("role", "listbox").hidden(),
        );
        page.append(Some(menu), NodeSpec::new("li").attr("role", "option").text("Referral"));
        page.bind_menu(input, menu, Some(input));

        let options = custom_options(&page, input, Duration::ZERO, 50).await.unwrap();
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].text, "Referral");
        // Menu is closed again after discovery.
        let snap = page.snapshot(menu).await.unwrap();
        assert_eq!(snap.style.display, "none");
        let events = page.events_for(input);
        assert!(events.contains(&DomEvent::key_down("Escape")));
        assert!(events.contains(&DomEvent::Blur));
    }

    #[tokio::test]
    async fn duplicate_texts_fold() {
        let page = MemoryPage::new("x");
        let q = page.append(None, NodeSpec::new("div").attr("class", "question"));
        let input = page.append(Some(q), NodeSpec::new("input").attr("role", "combobox"));
        page.append(Some(q), NodeSpec::new("li").attr("role", "option").text("Other"));
        page.append(Some(q), NodeSpec::new("li").attr("role", "option").text(" other "));
        let options = custom_options(&page, input, Duration::ZERO, 50).await.unwrap();
        assert_eq!(options.len(), 1);
    }
}
