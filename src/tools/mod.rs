//! MCP tool implementations

mod knowledge_search;

pub use knowledge_search::{KnowledgeSearchArgs, KnowledgeSearchServer, TOOL_NAME};
