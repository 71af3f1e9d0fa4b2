//! Knowledge-base search tool for AI agents
//!
//! Exposes one MCP tool, `knowledge-search`, that drives a headless Chrome
//! through a knowledge site's search form and scrapes the result list.

mod browser;
pub mod browser_setup;
pub mod knowledge;
mod tools;
mod utils;

use anyhow::{Context, bail};
use rmcp::ServiceExt;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

pub use browser::{BrowsingSession, download_managed_browser, find_browser_executable, launch_args};
pub use knowledge::{
    BrowserKnowledgeSource, KnowledgeSource, SearchResult, SearchResults, SearchTimeouts,
    collapse_whitespace, extract_results, parse_created_at, search, search_url,
};
pub use tools::{KnowledgeSearchArgs, KnowledgeSearchServer, TOOL_NAME};
pub use utils::{
    KnowledgeResult, MAX_INTERACTION_TIMEOUT_MS, MAX_NAVIGATION_TIMEOUT_MS, SearchError,
    validate_interaction_timeout, validate_navigation_timeout,
};

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

/// Browser launch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Chrome executable to use instead of discovering one
    #[serde(default)]
    pub executable: Option<PathBuf>,

    /// Window dimensions
    #[serde(default)]
    pub window: WindowConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_window_width")]
    pub width: u32,

    #[serde(default = "default_window_height")]
    pub height: u32,
}

/// Per-step timeouts in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Page load until network idle
    #[serde(default = "default_navigation_ms")]
    pub navigation_ms: u64,

    /// Keyword textbox and submit button visibility
    #[serde(default = "default_input_ms")]
    pub input_ms: u64,

    /// Results container visibility
    #[serde(default = "default_results_ms")]
    pub results_ms: u64,
}

fn default_headless() -> bool {
    true
}

fn default_window_width() -> u32 {
    1280
}

fn default_window_height() -> u32 {
    720
}

fn default_navigation_ms() -> u64 {
    30_000
}

fn default_input_ms() -> u64 {
    10_000
}

fn default_results_ms() -> u64 {
    30_000
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            executable: None,
            window: WindowConfig::default(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_window_width(),
            height: default_window_height(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            navigation_ms: default_navigation_ms(),
            input_ms: default_input_ms(),
            results_ms: default_results_ms(),
        }
    }
}

impl TimeoutConfig {
    /// Validate every timeout against its cap
    pub fn resolve(&self) -> anyhow::Result<SearchTimeouts> {
        Ok(SearchTimeouts {
            navigation: validate_navigation_timeout(self.navigation_ms)
                .context("invalid timeouts.navigation_ms")?,
            input: validate_interaction_timeout(self.input_ms)
                .context("invalid timeouts.input_ms")?,
            results: validate_navigation_timeout(self.results_ms)
                .context("invalid timeouts.results_ms")?,
        })
    }
}

/// Load config from YAML
///
/// An explicit `path` must exist. Without one, `config.yaml` in the working
/// directory is used if present, otherwise the defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config_path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !fallback.exists() {
                return Ok(Config::default());
            }
            fallback
        }
    };

    let contents = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config {}", config_path.display()))?;
    let config: Config = serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse config {}", config_path.display()))?;

    config.timeouts.resolve()?;
    Ok(config)
}

/// Startup options of the tool, fixed for the process lifetime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOptions {
    url: String,
}

impl ToolOptions {
    /// Accept `url` if it is an absolute http(s) URL
    ///
    /// The string is kept verbatim; scraped paths are appended to it as-is.
    pub fn new(url: impl Into<String>) -> anyhow::Result<Self> {
        let url = url.into();
        let parsed = url::Url::parse(&url).with_context(|| format!("Invalid base URL: {url}"))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            bail!(
                "Base URL must use http or https, got '{}': {url}",
                parsed.scheme()
            );
        }

        Ok(Self { url })
    }

    /// Base URL of the knowledge site
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Serve `knowledge-search` over stdio until the client disconnects
pub async fn serve_stdio(options: ToolOptions, config: Config) -> anyhow::Result<()> {
    let source = BrowserKnowledgeSource::new(&options, &config)?;
    let server = KnowledgeSearchServer::new(Arc::new(source), options.url());

    info!("Serving knowledge-search for {} over stdio", options.url());
    let running = server
        .serve(rmcp::transport::stdio())
        .await
        .context("Failed to start MCP stdio server")?;

    let reason = running.waiting().await.context("MCP server task failed")?;
    info!("MCP client disconnected: {:?}", reason);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn empty_yaml_yields_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();

        assert!(config.browser.headless);
        assert_eq!(config.browser.executable, None);
        assert_eq!(config.browser.window.width, 1280);
        assert_eq!(config.browser.window.height, 720);
        assert_eq!(config.timeouts.navigation_ms, 30_000);
        assert_eq!(config.timeouts.input_ms, 10_000);
        assert_eq!(config.timeouts.results_ms, 30_000);
    }

    #[test]
    fn partial_yaml_keeps_remaining_defaults() {
        let yaml = "browser:\n  headless: false\n  executable: /opt/chrome/chrome\ntimeouts:\n  results_ms: 45000\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert!(!config.browser.headless);
        assert_eq!(
            config.browser.executable,
            Some(PathBuf::from("/opt/chrome/chrome"))
        );
        assert_eq!(config.browser.window.width, 1280);
        assert_eq!(config.timeouts.results_ms, 45_000);
        assert_eq!(config.timeouts.input_ms, 10_000);
    }

    #[test]
    fn default_timeouts_resolve() {
        let timeouts = TimeoutConfig::default().resolve().unwrap();
        assert_eq!(timeouts, SearchTimeouts::default());
    }

    #[test]
    fn input_timeout_is_capped_at_thirty_seconds() {
        let config = TimeoutConfig {
            input_ms: 60_000,
            ..Default::default()
        };
        assert!(config.resolve().is_err());

        let config = TimeoutConfig {
            navigation_ms: 120_000,
            results_ms: 300_000,
            ..Default::default()
        };
        let timeouts = config.resolve().unwrap();
        assert_eq!(timeouts.navigation, Duration::from_secs(120));
        assert_eq!(timeouts.results, Duration::from_secs(300));
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        let config = TimeoutConfig {
            navigation_ms: 0,
            ..Default::default()
        };
        let err = config.resolve().unwrap_err();
        assert!(format!("{err:#}").contains("timeouts.navigation_ms"));
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let missing = std::env::temp_dir().join(format!(
            "kodegen_knowledge_missing_{}.yaml",
            uuid::Uuid::new_v4().simple()
        ));
        assert!(load_config(Some(&missing)).is_err());
    }

    #[test]
    fn config_file_is_loaded_and_validated() {
        let path = std::env::temp_dir().join(format!(
            "kodegen_knowledge_config_{}.yaml",
            uuid::Uuid::new_v4().simple()
        ));

        fs::write(&path, "timeouts:\n  navigation_ms: 60000\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.timeouts.navigation_ms, 60_000);

        fs::write(&path, "timeouts:\n  navigation_ms: 600000\n").unwrap();
        assert!(load_config(Some(&path)).is_err());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn tool_options_keep_url_verbatim() {
        let options = ToolOptions::new("https://kb.example.com/").unwrap();
        assert_eq!(options.url(), "https://kb.example.com/");

        let options = ToolOptions::new("http://localhost:3000").unwrap();
        assert_eq!(options.url(), "http://localhost:3000");
    }

    #[test]
    fn tool_options_reject_non_http_urls() {
        assert!(ToolOptions::new("ftp://kb.example.com").is_err());
        assert!(ToolOptions::new("kb.example.com").is_err());
        assert!(ToolOptions::new("").is_err());
    }
}
