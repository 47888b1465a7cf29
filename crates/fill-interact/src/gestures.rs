//! The shared activation gesture. Widgets listen on any of the three mouse
//! events, so a bare `click` is not enough.

use formpilot_page_port::{DomEvent, NodeId, PageError, PagePort};

pub async fn real_click(page: &dyn PagePort, node: NodeId) -> Result<(), PageError> {
    page.dispatch(node, DomEvent::MouseDown).await?;
    page.dispatch(node, DomEvent::MouseUp).await?;
    page.dispatch(node, DomEvent::Click).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use formpilot_page_port::{MemoryPage, NodeSpec};

    #[tokio::test]
    async fn fires_the_activation_triple_in_order() {
        let page = MemoryPage::new("x");
        let node = page.append(None, NodeSpec::new("button"));
        real_click(&page, node).await.unwrap();
        assert_eq!(
            page.events_for(node),
            vec![DomEvent::MouseDown, DomEvent::MouseUp, DomEvent::Click]
        );
    }
}
