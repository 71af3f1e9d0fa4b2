//! Data structures and constants for knowledge search

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// =============================================================================
// Constants
// =============================================================================

/// Path of the search page, appended verbatim to the configured base URL
pub const SEARCH_PATH: &str = "/open.knowledge/list";

/// Accessible name of the keyword textbox (case-insensitive substring match)
pub const KEYWORD_INPUT_NAME: &str = "keyword";

/// CSS selector for the search form's submit button
pub const SUBMIT_BUTTON_SELECTOR: &str = "button[type=submit].btn-default";

/// Element id of the results container
pub const RESULTS_CONTAINER_ID: &str = "knowledgeList";

/// CSS selector for one article inside the results container
pub const RESULT_ITEM_SELECTOR: &str = ".knowledge_item";

/// CSS selector for the block holding the numbered link and the author
pub const INSERT_INFO_SELECTOR: &str = ".insert_info";

/// CSS selector for elements exposing the `link` role
pub const LINK_ROLE_SELECTOR: &str = "a[href], [role='link']";

/// CSS selector for the title text inside the numbered link
pub const TITLE_SELECTOR: &str = ".list-title";

/// CSS selector for tag labels
///
/// ```html
/// <div class="item-info"><a href="..."><span class="tag label label-info">rust</span></a></div>
/// ```
pub const TAG_SELECTOR: &str = ".item-info a span.tag.label.label-info";

/// Accessible name of an article link, e.g. `#42 Deploying the wiki`
pub const ARTICLE_LINK_NAME_PATTERN: &str = r"^#[0-9]+ .+$";

/// Text that locates the authorship line of an article
pub const WRITTEN_BY_PATTERN: &str = r"written by .+ at";

/// Capture of the timestamp in the authorship line
///
/// Everything after the last ` at ` up to an optional ` (...)` suffix.
pub const CREATED_AT_PATTERN: &str = r"written by .+ at (.+?)(?:\s*\(|$)";

// =============================================================================
// Data Structures
// =============================================================================

/// One knowledge article scraped from the results page
///
/// Every field is empty when the corresponding node is missing; a record
/// is never rejected for being incomplete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// Article title with whitespace collapsed
    pub title: String,

    /// Article link; relative as scraped, absolute once returned by the tool
    pub url: String,

    /// Author display name, verbatim
    pub author: String,

    /// Creation timestamp as printed on the page
    pub created_at: String,

    /// Tag labels in page order
    pub tags: Vec<String>,
}

/// Structured payload of the `knowledge-search` tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SearchResults {
    /// Articles with absolute URLs, in page order
    pub items: Vec<SearchResult>,

    /// Number of articles in `items`
    pub total: usize,
}

impl SearchResults {
    /// Rewrite every scraped URL against `base_url` and count the items
    ///
    /// The base is prefixed verbatim, without any path normalization, so
    /// `https://example.com` + `/test-article` gives
    /// `https://example.com/test-article`.
    #[must_use]
    pub fn with_base_url(base_url: &str, results: Vec<SearchResult>) -> Self {
        let items: Vec<SearchResult> = results
            .into_iter()
            .map(|result| SearchResult {
                url: format!("{base_url}{}", result.url),
                ..result
            })
            .collect();

        Self {
            total: items.len(),
            items,
        }
    }
}

/// Compute the search page URL for a knowledge site
///
/// # Example
/// ```rust
/// use kodegen_tools_knowledge::search_url;
///
/// assert_eq!(
///     search_url("https://example.com"),
///     "https://example.com/open.knowledge/list"
/// );
/// ```
#[must_use]
pub fn search_url(base_url: &str) -> String {
    format!("{base_url}{SEARCH_PATH}")
}
