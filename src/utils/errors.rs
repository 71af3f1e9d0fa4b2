use std::time::Duration;

use thiserror::Error;

/// Errors that abort a knowledge search
///
/// Every variant is a hard failure: the invocation stops, the browsing
/// session is released and the message reaches the tool caller unchanged.
/// Missing fields inside a result item are never represented here, they
/// degrade to empty values in the extractor instead.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Failed to create page: {0}")]
    PageCreationFailed(String),

    #[error("Navigation timeout after {}ms for URL: {url}", .timeout.as_millis())]
    NavigationTimeout { url: String, timeout: Duration },

    #[error("Navigation failed for URL: {url}. Error: {reason}")]
    NavigationFailed { url: String, reason: String },

    #[error("Element not found (timeout after {}ms): {element}", .timeout.as_millis())]
    ElementNotFound {
        element: &'static str,
        timeout: Duration,
    },

    #[error("Interaction with {element} failed: {reason}")]
    InteractionFailed {
        element: &'static str,
        reason: String,
    },

    #[error("Search results did not become visible within {}ms", .timeout.as_millis())]
    ResultsTimeout { timeout: Duration },

    #[error("Failed to read search results: {0}")]
    ReadFailed(String),
}

pub type KnowledgeResult<T> = Result<T, SearchError>;
