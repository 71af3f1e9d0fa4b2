//! Knowledge-base search pipeline
//!
//! navigate → interact → extract → release, one browser per search.

mod extract;
mod interact;
mod navigate;
mod types;

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::Page;
use tracing::{info, warn};

use crate::browser::BrowsingSession;
use crate::utils::KnowledgeResult;
use crate::{BrowserConfig, Config, ToolOptions};

pub use extract::{collapse_whitespace, extract_results, parse_created_at};
pub use interact::{submit_keyword, wait_for_results};
pub use navigate::open_search_page;
pub use types::{SEARCH_PATH, SearchResult, SearchResults, search_url};

/// Validated per-step timeouts of one search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTimeouts {
    /// Page load until network idle
    pub navigation: Duration,
    /// Keyword textbox and submit button visibility
    pub input: Duration,
    /// Results container visibility after submit
    pub results: Duration,
}

impl Default for SearchTimeouts {
    fn default() -> Self {
        Self {
            navigation: Duration::from_secs(30),
            input: Duration::from_secs(10),
            results: Duration::from_secs(30),
        }
    }
}

/// Backend that answers a keyword with scraped articles
///
/// Returned URLs are relative, exactly as scraped; the tool adapter makes
/// them absolute.
#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    async fn search(&self, keyword: &str) -> KnowledgeResult<Vec<SearchResult>>;
}

/// [`KnowledgeSource`] that drives a fresh headless Chrome per search
#[derive(Debug, Clone)]
pub struct BrowserKnowledgeSource {
    base_url: String,
    browser: BrowserConfig,
    timeouts: SearchTimeouts,
}

impl BrowserKnowledgeSource {
    /// Build a source from startup options and validated config
    pub fn new(options: &ToolOptions, config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            base_url: options.url().to_string(),
            browser: config.browser.clone(),
            timeouts: config.timeouts.resolve()?,
        })
    }
}

#[async_trait]
impl KnowledgeSource for BrowserKnowledgeSource {
    async fn search(&self, keyword: &str) -> KnowledgeResult<Vec<SearchResult>> {
        search(&self.base_url, keyword, &self.browser, self.timeouts).await
    }
}

/// Run one complete search in its own browsing session
///
/// The session is closed on every path before the outcome is returned.
pub async fn search(
    base_url: &str,
    keyword: &str,
    browser: &BrowserConfig,
    timeouts: SearchTimeouts,
) -> KnowledgeResult<Vec<SearchResult>> {
    let session = BrowsingSession::open(browser).await?;

    let outcome = run_search(session.page(), base_url, keyword, timeouts).await;

    session.close().await;

    match &outcome {
        Ok(results) => info!("Knowledge search returned {} article(s)", results.len()),
        Err(e) => warn!("Knowledge search failed: {}", e),
    }

    outcome
}

async fn run_search(
    page: &Page,
    base_url: &str,
    keyword: &str,
    timeouts: SearchTimeouts,
) -> KnowledgeResult<Vec<SearchResult>> {
    open_search_page(page, base_url, timeouts.navigation).await?;
    submit_keyword(page, keyword, timeouts.input).await?;
    let container = wait_for_results(page, timeouts.results).await?;

    Ok(extract_results(&container))
}
