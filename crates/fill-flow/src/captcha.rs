//! CAPTCHA presence probe.
//!
//! Looks for the widgets the major providers render. An iframe counts only
//! with a real on-screen footprint; a bare container counts only when it
//! holds actual challenge markup, since some sites ship dormant wrappers.

use formpilot_page_port::{is_visible, PageError, PagePort};
use tracing::debug;

const CAPTCHA_SELECTORS: &[&str] = &[
    "iframe[src*=\"recaptcha\"]",
    "iframe[src*=\"hcaptcha\"]",
    ".g-recaptcha",
    ".h-captcha",
    "#recaptcha",
];

const CHALLENGE_MARKUP: &str =
    "[role=\"presentation\"], [class*=\"recaptcha-checkbox\"], [class*=\"h-captcha-checkbox\"], iframe";

pub async fn captcha_present(page: &dyn PagePort) -> Result<bool, PageError> {
    for selector in CAPTCHA_SELECTORS {
        for node in page.query(None, selector).await? {
            let snap = page.snapshot(node).await?;
            if !is_visible(&snap) {
                continue;
            }
            if snap.tag == "iframe" {
                if snap.rect.width > 100.0 && snap.rect.height > 50.0 {
                    debug!(selector, "captcha iframe visible");
                    return Ok(true);
                }
                continue;
            }
            if !page.query(Some(node), CHALLENGE_MARKUP).await?.is_empty() {
                debug!(selector, "captcha container with challenge markup");
                return Ok(true);
            }
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use formpilot_page_port::{MemoryPage, NodeSpec};

    #[tokio::test]
    async fn sized_recaptcha_iframe_detects() {
        let page = MemoryPage::new("x");
        page.append(
            None,
            NodeSpec::new("iframe")
                .attr("src", "https://www.google.com/recaptcha/api2/anchor")
                .rect(304.0, 78.0),
        );
        assert!(captcha_present(&page).await.unwrap());
    }

    #[tokio::test]
    async fn tiny_or_hidden_iframes_do_not() {
        let page = MemoryPage::new("x");
        page.append(
            None,
            NodeSpec::new("iframe").attr("src", "https://recaptcha.test/").rect(1.0, 1.0),
        );
        page.append(
            None,
            NodeSpec::new("iframe")
                .attr("src", "https://hcaptcha.test/")
                .rect(304.0, 78.0)
                .hidden(),
        );
        assert!(!captcha_present(&page).await.unwrap());
    }

    #[tokio::test]
    async fn dormant_wrapper_needs_challenge_markup() {
        let page = MemoryPage::new("x");
        let wrapper = page.append(None, NodeSpec::new("div").attr("class", "g-recaptcha"));
        assert!(!captcha_present(&page).await.unwrap());
        page.append(
            Some(wrapper),
            NodeSpec::new("span").attr("class", "recaptcha-checkbox"),
        );
        assert!(captcha_present(&page).await.unwrap());
    }
}
