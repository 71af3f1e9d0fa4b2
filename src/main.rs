// Knowledge search MCP server
//
// Serves the `knowledge-search` tool over stdio. stdout carries the MCP
// transport, so all logging goes to stderr.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use kodegen_tools_knowledge::{ToolOptions, load_config, serve_stdio};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "kodegen-knowledge",
    version,
    about = "MCP server searching a knowledge site through headless Chrome"
)]
struct Cli {
    /// Base URL of the knowledge site, e.g. https://kb.example.com
    #[arg(long, env = "KNOWLEDGE_URL")]
    url: String,

    /// YAML config file (defaults to ./config.yaml when present)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let options = ToolOptions::new(cli.url)?;
    let config = load_config(cli.config.as_deref())?;

    serve_stdio(options, config).await
}
