//! Label resolution ladder.
//!
//! Job boards label controls every way imaginable; the ladder walks the
//! likeliest sources in fidelity order and stops at the first non-empty
//! text.

use formpilot_core_types::normalize_ws;
use formpilot_page_port::{is_visible, ElementSnapshot, NodeId, PageError, PagePort};

use crate::classify::question_container;

async fn text_of(page: &dyn PagePort, node: NodeId) -> Result<String, PageError> {
    Ok(normalize_ws(&page.snapshot(node).await?.text))
}

async fn label_for(page: &dyn PagePort, snap: &ElementSnapshot) -> Result<String, PageError> {
    let Some(id) = snap.id() else {
        return Ok(String::new());
    };
    for node in page.query(None, &format!("label[for=\"{id}\"]")).await? {
        let text = text_of(page, node).await?;
        if !text.is_empty() {
            return Ok(text);
        }
    }
    Ok(String::new())
}

/// An ancestor `<label>` wraps both the caption and the control; the
/// control's own value must not leak into the caption.
async fn ancestor_label(page: &dyn PagePort, snap: &ElementSnapshot) -> Result<String, PageError> {
    let Some(label) = page.closest(snap.node, "label").await? else {
        return Ok(String::new());
    };
    if label == snap.node {
        return Ok(String::new());
    }
    let mut text = text_of(page, label).await?;
    let own = normalize_ws(&snap.value);
    if !own.is_empty() {
        text = text.replace(&own, " ");
    }
    Ok(normalize_ws(&text))
}

async fn labelled_by(page: &dyn PagePort, snap: &ElementSnapshot) -> Result<String, PageError> {
    let Some(ids) = snap.attr("aria-labelledby") else {
        return Ok(String::new());
    };
    let mut parts = Vec::new();
    for id in ids.split_whitespace() {
        for node in page.query(None, &format!("[id=\"{id}\"]")).await? {
            let text = text_of(page, node).await?;
            if !text.is_empty() {
                parts.push(text);
            }
        }
    }
    Ok(parts.join(" "))
}

pub(crate) async fn container_heading(
    page: &dyn PagePort,
    snap: &ElementSnapshot,
) -> Result<String, PageError> {
    let Some(container) = question_container(page, snap.node).await? else {
        return Ok(String::new());
    };
    for node in page
        .query(Some(container), "label, legend, h3, h4, p")
        .await?
    {
        let heading = page.snapshot(node).await?;
        let text = normalize_ws(&heading.text);
        if is_visible(&heading) && !text.is_empty() {
            return Ok(text);
        }
    }
    Ok(String::new())
}

async fn preceding_text(page: &dyn PagePort, snap: &ElementSnapshot) -> Result<String, PageError> {
    for sibling in page.preceding_siblings(snap.node).await? {
        let text = text_of(page, sibling).await?;
        if !text.is_empty() {
            return Ok(text);
        }
    }
    Ok(String::new())
}

pub async fn resolve_label(page: &dyn PagePort, snap: &ElementSnapshot) -> Result<String, PageError> {
    for text in [
        label_for(page, snap).await?,
        ancestor_label(page, snap).await?,
        labelled_by(page, snap).await?,
        snap.attr("aria-label").map(normalize_ws).unwrap_or_default(),
        normalize_ws(snap.placeholder()),
        container_heading(page, snap).await?,
        preceding_text(page, snap).await?,
        snap.name().map(normalize_ws).unwrap_or_default(),
    ] {
        if !text.is_empty() {
            return Ok(text);
        }
    }
    Ok("Unknown field".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use formpilot_page_port::{MemoryPage, NodeSpec};

    async fn label_of(page: &MemoryPage, node: NodeId) -> String {
        let snap = page.snapshot(node).await.unwrap();
        resolve_label(page, &snap).await.unwrap()
    }

    #[tokio::test]
    async fn label_for_wins_over_placeholder() {
        let page = MemoryPage::new("x");
        let _l = page.append(
            None,
            NodeSpec::new("label").attr("for", "email").text("Email address"),
        );
        let input = page.append(
            None,
            NodeSpec::new("input").attr("id", "email").attr("placeholder", "you@example.com"),
        );
        assert_eq!(label_of(&page, input).await, "Email address");
    }

    #[tokio::test]
    async fn wrapping_label_strips_the_control_value() {
        let page = MemoryPage::new("x");
        let label = page.append(None, NodeSpec::new("label").text("Preferred name"));
        let input = page.append(Some(label), NodeSpec::new("input").value("Jane"));
        assert_eq!(label_of(&page, input).await, "Preferred name");
    }

    #[tokio::test]
    async fn aria_labelledby_joins_referenced_text() {
        let page = MemoryPage::new("x");
        let _a = page.append(None, NodeSpec::new("span").attr("id", "q1").text("Work"));
        let _b = page.append(None, NodeSpec::new("span").attr("id", "q2").text("authorization?"));
        let input = page.append(
            None,
            NodeSpec::new("input").attr("aria-labelledby", "q1 q2"),
        );
        assert_eq!(label_of(&page, input).await, "Work authorization?");
    }

    #[tokio::test]
    async fn aria_labelledby_outranks_aria_label() {
        let page = MemoryPage::new("x");
        let _h = page.append(
            None,
            NodeSpec::new("span").attr("id", "q1").text("Desired salary"),
        );
        let input = page.append(
            None,
            NodeSpec::new("input")
                .attr("aria-labelledby", "q1")
                .attr("aria-label", "salary input"),
        );
        assert_eq!(label_of(&page, input).await, "Desired salary");
    }

    #[tokio::test]
    async fn question_container_heading_backstops() {
        let page = MemoryPage::new("x");
        let q = page.append(None, NodeSpec::new("div").attr("class", "application-question"));
        let _h = page.append(Some(q), NodeSpec::new("h3").text("How did you hear about us?"));
        let input = page.append(Some(q), NodeSpec::new("input"));
        assert_eq!(label_of(&page, input).await, "How did you hear about us?");
    }

    #[tokio::test]
    async fn falls_back_to_name_then_unknown() {
        let page = MemoryPage::new("x");
        let named = page.append(None, NodeSpec::new("input").attr("name", "first_name"));
        assert_eq!(label_of(&page, named).await, "first_name");
        let bare = page.append(None, NodeSpec::new("input"));
        assert_eq!(label_of(&page, bare).await, "Unknown field");
    }
}
