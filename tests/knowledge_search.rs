use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use kodegen_tools_knowledge::{
    KnowledgeResult, KnowledgeSearchArgs, KnowledgeSearchServer, KnowledgeSource, SearchError,
    SearchResult, TOOL_NAME, extract_results,
};
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::CallToolResult;

/// Source replaying a fixed outcome and recording every keyword it saw
struct FakeSource {
    outcome: fn() -> KnowledgeResult<Vec<SearchResult>>,
    keywords: Mutex<Vec<String>>,
}

impl FakeSource {
    fn new(outcome: fn() -> KnowledgeResult<Vec<SearchResult>>) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            keywords: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl KnowledgeSource for FakeSource {
    async fn search(&self, keyword: &str) -> KnowledgeResult<Vec<SearchResult>> {
        self.keywords.lock().unwrap().push(keyword.to_string());
        (self.outcome)()
    }
}

const RESULTS_PAGE: &str = r#"
<div id="knowledgeList">
  <div class="knowledge_item">
    <div class="insert_info">
      <a href="/open.knowledge/view/12">#12 <span class="list-title">Rotating
         TLS   certificates</span></a>
      <div><a href="/open.account/info/ada">Ada Lovelace</a></div>
      <div>written by Ada Lovelace at 2025-01-01 12:00:00 (3 days ago)</div>
    </div>
    <div class="item-info">
      <a href="/open.knowledge/tag/ops"><span class="tag label label-info">ops</span></a>
      <a href="/open.knowledge/tag/tls"><span class="tag label label-info">tls</span></a>
    </div>
  </div>
  <div class="knowledge_item">
    <div class="insert_info">
      <a href="/open.knowledge/view/3">#3 <span class="list-title">Draft</span></a>
    </div>
  </div>
</div>
"#;

fn scraped_page() -> KnowledgeResult<Vec<SearchResult>> {
    Ok(extract_results(RESULTS_PAGE))
}

fn no_results() -> KnowledgeResult<Vec<SearchResult>> {
    Ok(Vec::new())
}

fn results_timeout() -> KnowledgeResult<Vec<SearchResult>> {
    Err(SearchError::ResultsTimeout {
        timeout: Duration::from_secs(30),
    })
}

async fn call(server: &KnowledgeSearchServer, keyword: &str) -> CallToolResult {
    server
        .knowledge_search(Parameters(KnowledgeSearchArgs {
            keyword: keyword.to_string(),
        }))
        .await
        .expect("tool call")
}

fn text_of(result: &CallToolResult) -> String {
    result.content[0]
        .as_text()
        .expect("text content")
        .text
        .clone()
}

#[test]
fn registers_exactly_one_read_only_tool() {
    let server = KnowledgeSearchServer::new(FakeSource::new(no_results), "https://kb.example.com");
    let tools = server.tools();

    assert_eq!(tools.len(), 1);
    let tool = &tools[0];
    assert_eq!(tool.name, TOOL_NAME);
    assert_eq!(tool.name, "knowledge-search");
    assert_eq!(
        tool.description.as_deref(),
        Some("Search for knowledge articles")
    );

    let annotations = tool.annotations.as_ref().expect("annotations");
    assert_eq!(annotations.title.as_deref(), Some("Knowledge Search"));
    assert_eq!(annotations.read_only_hint, Some(true));

    let schema = serde_json::Value::Object((*tool.input_schema).clone());
    assert_eq!(schema["properties"]["keyword"]["type"], "string");
    assert!(
        schema["required"]
            .as_array()
            .expect("required list")
            .contains(&serde_json::json!("keyword"))
    );
}

#[tokio::test]
async fn scraped_results_are_made_absolute_and_rendered_twice() {
    let source = FakeSource::new(scraped_page);
    let server = KnowledgeSearchServer::new(source.clone(), "https://kb.example.com");

    let result = call(&server, "tls").await;

    assert_ne!(result.is_error, Some(true));
    assert_eq!(*source.keywords.lock().unwrap(), vec!["tls".to_string()]);

    let structured = result.structured_content.clone().expect("structured content");
    assert_eq!(structured["total"], 2);

    let first = &structured["items"][0];
    assert_eq!(first["title"], "Rotating TLS certificates");
    assert_eq!(first["url"], "https://kb.example.com/open.knowledge/view/12");
    assert_eq!(first["author"], "Ada Lovelace");
    assert_eq!(first["createdAt"], "2025-01-01 12:00:00");
    assert_eq!(first["tags"], serde_json::json!(["ops", "tls"]));

    let second = &structured["items"][1];
    assert_eq!(second["title"], "Draft");
    assert_eq!(second["url"], "https://kb.example.com/open.knowledge/view/3");
    assert_eq!(second["author"], "");
    assert_eq!(second["createdAt"], "");
    assert_eq!(second["tags"], serde_json::json!([]));

    let text: serde_json::Value = serde_json::from_str(&text_of(&result)).expect("json text");
    assert_eq!(text, structured["items"]);
}

#[tokio::test]
async fn empty_keyword_with_no_results() {
    let source = FakeSource::new(no_results);
    let server = KnowledgeSearchServer::new(source.clone(), "https://kb.example.com");

    let result = call(&server, "").await;

    assert_eq!(*source.keywords.lock().unwrap(), vec![String::new()]);
    let structured = result.structured_content.clone().expect("structured content");
    assert_eq!(structured["total"], 0);
    assert_eq!(structured["items"], serde_json::json!([]));
    assert_eq!(text_of(&result), "[]");
}

#[tokio::test]
async fn base_url_is_prefixed_without_normalization() {
    let server = KnowledgeSearchServer::new(FakeSource::new(scraped_page), "https://kb.example.com/");

    let result = call(&server, "tls").await;

    let structured = result.structured_content.expect("structured content");
    assert_eq!(
        structured["items"][0]["url"],
        "https://kb.example.com//open.knowledge/view/12"
    );
}

#[tokio::test]
async fn search_failures_surface_as_tool_errors() {
    let server = KnowledgeSearchServer::new(FakeSource::new(results_timeout), "https://kb.example.com");

    let result = call(&server, "tls").await;

    assert_eq!(result.is_error, Some(true));
    assert!(result.structured_content.is_none());
    assert_eq!(
        text_of(&result),
        "Search results did not become visible within 30000ms"
    );
}
