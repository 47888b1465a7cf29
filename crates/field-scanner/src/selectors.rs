//! Locator-hint generation.
//!
//! Selectors are hints for re-finding a control after a re-render, not
//! guaranteed-unique keys. A selector that would match half the page (bare
//! `input`, `input[type="text"]`) is flagged generic so the resolver can
//! refuse it for strict actions.

use formpilot_core_types::SelectorHints;
use formpilot_page_port::{ElementSnapshot, PageError, PagePort};

use crate::classify::question_container;

fn css_ident(id: &str) -> bool {
    !id.is_empty()
        && !id.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(true)
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn is_generic(selector: &str) -> bool {
    let base = selector
        .split(":nth-of-type")
        .next()
        .unwrap_or(selector)
        .trim();
    matches!(base, "input" | "textarea" | "select" | "input[type=\"text\"]")
}

/// Best selector for one element: `#id` > `tag[name=...]` > structural.
async fn element_selector(page: &dyn PagePort, snap: &ElementSnapshot) -> Result<String, PageError> {
    if let Some(id) = snap.id() {
        return Ok(if css_ident(id) {
            format!("#{id}")
        } else {
            format!("[id=\"{id}\"]")
        });
    }
    if let Some(name) = snap.name() {
        return Ok(format!("{}[name=\"{name}\"]", snap.tag));
    }

    let mut selector = snap.tag.clone();
    if let Some(input_type) = snap.attr("type") {
        selector.push_str(&format!("[type=\"{}\"]", input_type.to_lowercase()));
    }
    let placeholder = snap.placeholder();
    if !placeholder.is_empty() {
        selector.push_str(&format!("[placeholder=\"{placeholder}\"]"));
    }

    let matches = page.query(None, &selector).await?;
    if matches.len() > 1 {
        if let Some(pos) = matches.iter().position(|n| *n == snap.node) {
            selector.push_str(&format!(":nth-of-type({})", pos + 1));
        }
    }
    Ok(selector)
}

pub async fn build_selectors(
    page: &dyn PagePort,
    snap: &ElementSnapshot,
) -> Result<SelectorHints, PageError> {
    let control = element_selector(page, snap).await?;
    let container = match question_container(page, snap.node).await? {
        Some(node) => {
            let container_snap = page.snapshot(node).await?;
            Some(element_selector(page, &container_snap).await?)
        }
        None => None,
    };
    let generic = is_generic(&control);
    Ok(SelectorHints {
        primary: Some(control.clone()),
        control: Some(control),
        container,
        generic,
    })
}

/// Selector addressing every member of a same-name radio or checkbox group.
pub fn group_selector(input_type: &str, name: &str) -> String {
    format!("input[type=\"{input_type}\"][name=\"{name}\"]")
}
