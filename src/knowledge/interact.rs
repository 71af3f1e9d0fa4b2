//! Search form interaction - fills the keyword, submits and waits for results

use std::time::{Duration, Instant};

use chromiumoxide::Page;
use chromiumoxide::element::Element;
use serde_json::json;
use tracing::{debug, info};

use super::types::{
    KEYWORD_INPUT_NAME, RESULTS_CONTAINER_ID, SUBMIT_BUTTON_SELECTOR,
};
use crate::utils::{KnowledgeResult, SearchError, wait_for_visible};

/// Attribute the locate script stamps on elements found by role
const LOCATOR_ATTRIBUTE: &str = "data-kodegen-locator";

/// Locate an element and report whether it is visible
///
/// Takes one descriptor, either `{ "css": selector }` or
/// `{ "role": "textbox", "name": text, "marker": value }`. Role lookups
/// compute the accessible name the way assistive technology does for form
/// fields (`aria-labelledby`, `aria-label`, `<label>`, `title`, `placeholder`)
/// and match it case-insensitively as a substring. The match is stamped with
/// `data-kodegen-locator` so it can be fetched afterwards by CSS.
const LOCATE_VISIBLE_JS: &str = r#"(target) => {
  const visible = (el) => {
    const style = window.getComputedStyle(el);
    if (style.visibility === 'hidden' || style.display === 'none') return false;
    const rect = el.getBoundingClientRect();
    return rect.width > 0 && rect.height > 0;
  };
  if (target.css) {
    const el = document.querySelector(target.css);
    return !!el && visible(el);
  }
  const textOf = (id) => {
    const el = document.getElementById(id);
    return el ? el.textContent : '';
  };
  const accessibleName = (el) => {
    const labelledBy = el.getAttribute('aria-labelledby');
    if (labelledBy) {
      const text = labelledBy.split(/\s+/).map(textOf).join(' ').trim();
      if (text) return text;
    }
    const aria = el.getAttribute('aria-label');
    if (aria && aria.trim()) return aria;
    if (el.labels && el.labels.length) {
      const text = Array.from(el.labels).map((l) => l.textContent).join(' ').trim();
      if (text) return text;
    }
    return el.getAttribute('title') || el.getAttribute('placeholder') || '';
  };
  const textboxes = 'input:not([type]), input[type=text], input[type=search], ' +
    'input[type=email], input[type=tel], input[type=url], textarea, [role=textbox]';
  const wanted = target.name.toLowerCase();
  for (const el of document.querySelectorAll(textboxes)) {
    const name = accessibleName(el).replace(/\s+/g, ' ').trim().toLowerCase();
    if (name.includes(wanted) && visible(el)) {
      el.setAttribute('data-kodegen-locator', target.marker);
      return true;
    }
  }
  return false;
}"#;

/// Something the driver waits for on the page
enum Target<'a> {
    /// Element with role `textbox` and a matching accessible name
    Textbox { name: &'a str },
    /// First element matching a CSS selector
    Css(&'a str),
}

impl Target<'_> {
    fn probe(&self) -> String {
        let descriptor = match self {
            Target::Textbox { name } => json!({ "role": "textbox", "name": name, "marker": name }),
            Target::Css(selector) => json!({ "css": selector }),
        };
        format!("Boolean(({LOCATE_VISIBLE_JS})({descriptor}))")
    }

    fn selector(&self) -> String {
        match self {
            Target::Textbox { name } => format!("[{LOCATOR_ATTRIBUTE}=\"{name}\"]"),
            Target::Css(selector) => (*selector).to_string(),
        }
    }
}

/// Wait for `target` to be visible and return its element handle
async fn locate(
    page: &Page,
    target: Target<'_>,
    element: &'static str,
    timeout: Duration,
) -> KnowledgeResult<Element> {
    if !wait_for_visible(page, &target.probe(), timeout).await {
        return Err(SearchError::ElementNotFound { element, timeout });
    }

    page.find_element(target.selector())
        .await
        .map_err(|e| SearchError::InteractionFailed {
            element,
            reason: e.to_string(),
        })
}

/// Type `keyword` into the search form and submit it
///
/// The keyword textbox and the submit button each get `timeout` to become
/// visible. An empty keyword is submitted as-is.
pub async fn submit_keyword(page: &Page, keyword: &str, timeout: Duration) -> KnowledgeResult<()> {
    const INPUT: &str = "keyword textbox";
    const SUBMIT: &str = "submit button";

    let input = locate(
        page,
        Target::Textbox {
            name: KEYWORD_INPUT_NAME,
        },
        INPUT,
        timeout,
    )
    .await?;

    let interaction_failed = |element: &'static str| {
        move |e: chromiumoxide::error::CdpError| SearchError::InteractionFailed {
            element,
            reason: e.to_string(),
        }
    };

    // Replace whatever the page pre-filled, then type like a user would
    input.focus().await.map_err(interaction_failed(INPUT))?;
    input
        .call_js_fn(
            "function() { this.value = ''; this.dispatchEvent(new Event('input', { bubbles: true })); }",
            false,
        )
        .await
        .map_err(interaction_failed(INPUT))?;
    input
        .type_str(keyword)
        .await
        .map_err(interaction_failed(INPUT))?;
    debug!("Filled keyword textbox ({} chars)", keyword.chars().count());

    let submit = locate(page, Target::Css(SUBMIT_BUTTON_SELECTOR), SUBMIT, timeout).await?;
    submit.click().await.map_err(interaction_failed(SUBMIT))?;
    info!("Submitted knowledge search for {:?}", keyword);

    Ok(())
}

/// Wait for the results container and return its outer HTML
///
/// A form submit reloads the page, so a pending navigation is awaited
/// first; both waits share the `timeout` budget.
pub async fn wait_for_results(page: &Page, timeout: Duration) -> KnowledgeResult<String> {
    let deadline = Instant::now() + timeout;

    match tokio::time::timeout(timeout, page.wait_for_navigation()).await {
        Ok(Ok(_)) => debug!("Post-submit navigation settled"),
        Ok(Err(e)) => debug!("Post-submit navigation wait failed: {}", e),
        Err(_) => return Err(SearchError::ResultsTimeout { timeout }),
    }

    let container = format!("#{RESULTS_CONTAINER_ID}");
    let remaining = deadline.saturating_duration_since(Instant::now());
    if !wait_for_visible(page, &Target::Css(&container).probe(), remaining).await {
        return Err(SearchError::ResultsTimeout { timeout });
    }

    let element = page
        .find_element(container.as_str())
        .await
        .map_err(|e| SearchError::ReadFailed(e.to_string()))?;

    let html = element
        .outer_html()
        .await
        .map_err(|e| SearchError::ReadFailed(e.to_string()))?
        .unwrap_or_default();

    debug!("Read results container ({} bytes)", html.len());
    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn textbox_probe_passes_name_and_marker_as_json() {
        let probe = Target::Textbox { name: "keyword" }.probe();

        assert!(probe.starts_with("Boolean(((target) => {"));
        assert!(probe.contains(r#""role":"textbox""#));
        assert!(probe.contains(r#""name":"keyword""#));
        assert!(probe.contains(r#""marker":"keyword""#));
    }

    #[test]
    fn css_probe_escapes_selector_quotes() {
        let probe = Target::Css(r#"a[title="x"]"#).probe();
        assert!(probe.ends_with(r#"({"css":"a[title=\"x\"]"}))"#));
    }

    #[test]
    fn role_targets_are_fetched_through_the_marker_attribute() {
        assert_eq!(
            Target::Textbox { name: "keyword" }.selector(),
            r#"[data-kodegen-locator="keyword"]"#
        );
        assert_eq!(
            Target::Css(SUBMIT_BUTTON_SELECTOR).selector(),
            "button[type=submit].btn-default"
        );
    }
}
