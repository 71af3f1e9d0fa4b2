//! `knowledge-search` MCP tool

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo, Tool},
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::knowledge::{KnowledgeSource, SearchResults};

/// Tool name as registered with MCP clients
pub const TOOL_NAME: &str = "knowledge-search";

/// Arguments of `knowledge-search`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct KnowledgeSearchArgs {
    /// Keyword typed into the site's search box (may be empty)
    pub keyword: String,
}

/// MCP server exposing the knowledge search tool
#[derive(Clone)]
pub struct KnowledgeSearchServer {
    source: Arc<dyn KnowledgeSource>,
    base_url: String,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl KnowledgeSearchServer {
    /// Create a server answering searches from `source`
    ///
    /// Scraped URLs are made absolute by prefixing `base_url` verbatim.
    pub fn new(source: Arc<dyn KnowledgeSource>, base_url: impl Into<String>) -> Self {
        Self {
            source,
            base_url: base_url.into(),
            tool_router: Self::tool_router(),
        }
    }

    /// Definitions of every registered tool
    pub fn tools(&self) -> Vec<Tool> {
        self.tool_router.list_all()
    }

    #[tool(
        name = "knowledge-search",
        description = "Search for knowledge articles",
        annotations(
            title = "Knowledge Search",
            read_only_hint = true,
            open_world_hint = true
        )
    )]
    pub async fn knowledge_search(
        &self,
        Parameters(args): Parameters<KnowledgeSearchArgs>,
    ) -> Result<CallToolResult, McpError> {
        info!("knowledge-search invoked with keyword {:?}", args.keyword);

        let results = match self.source.search(&args.keyword).await {
            Ok(results) => results,
            Err(e) => {
                warn!("knowledge-search failed: {}", e);
                return Ok(CallToolResult::error(vec![Content::text(e.to_string())]));
            }
        };

        let payload = SearchResults::with_base_url(&self.base_url, results);
        tool_result(&payload)
    }
}

/// Structured `{ items, total }` plus a pretty JSON text of the items
fn tool_result(payload: &SearchResults) -> Result<CallToolResult, McpError> {
    let structured = serde_json::to_value(payload)
        .map_err(|e| McpError::internal_error(format!("Failed to serialize results: {e}"), None))?;
    let text = serde_json::to_string_pretty(&payload.items)
        .map_err(|e| McpError::internal_error(format!("Failed to serialize results: {e}"), None))?;

    let mut result = CallToolResult::structured(structured);
    result.content = vec![Content::text(text)];
    Ok(result)
}

#[tool_handler]
impl ServerHandler for KnowledgeSearchServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Knowledge base search. Call knowledge-search with a keyword to get matching \
                 articles (title, url, author, createdAt, tags) from the configured site."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::SearchResult;

    #[test]
    fn text_block_renders_items_only() {
        let payload = SearchResults::with_base_url(
            "https://kb.example.com",
            vec![SearchResult {
                title: "Backup policy".into(),
                url: "/open.knowledge/view/7".into(),
                tags: vec!["ops".into()],
                ..Default::default()
            }],
        );

        let result = tool_result(&payload).unwrap();

        let text = &result.content[0].as_text().unwrap().text;
        let rendered: serde_json::Value = serde_json::from_str(text).unwrap();
        assert!(rendered.is_array());
        assert_eq!(rendered[0]["url"], "https://kb.example.com/open.knowledge/view/7");
        assert!(text.contains('\n'), "text block should be pretty-printed");

        let structured = result.structured_content.unwrap();
        assert_eq!(structured["total"], 1);
        assert_eq!(structured["items"], rendered);
    }
}
