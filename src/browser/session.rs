//! Per-search browsing session
//!
//! One browser process plus one page, owned by exactly one search
//! invocation. Nothing here is shared between concurrent searches.

use chromiumoxide::browser::Browser;
use chromiumoxide::page::Page;
use std::path::{Path, PathBuf};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::BrowserConfig;
use crate::utils::{KnowledgeResult, SearchError};

/// Browser process, its CDP handler task and the single page of one search
///
/// Release with [`BrowsingSession::close`], which consumes the session so the
/// page can never be touched after the browser is gone. If a session is
/// dropped without `close` (panic, cancelled future), `Drop` aborts the
/// handler and `Browser::drop` kills the Chrome process.
pub struct BrowsingSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    user_data_dir: Option<PathBuf>,
}

impl BrowsingSession {
    /// Launch a fresh browser and open one blank page in it
    ///
    /// If the page cannot be created the already-running browser is closed
    /// before the error is returned.
    pub async fn open(config: &BrowserConfig) -> KnowledgeResult<Self> {
        let user_data_dir = std::env::temp_dir().join(format!(
            "kodegen_knowledge_{}_{}",
            std::process::id(),
            uuid::Uuid::new_v4().simple()
        ));

        let (mut browser, handler) =
            crate::browser_setup::launch_browser(config, user_data_dir.clone())
                .await
                .map_err(|e| SearchError::LaunchFailed(format!("{e:#}")))?;

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                warn!("Page creation failed, closing browser: {}", e);
                shutdown_browser(&mut browser).await;
                handler.abort();
                remove_user_data_dir(&user_data_dir);
                return Err(SearchError::PageCreationFailed(e.to_string()));
            }
        };

        info!("Opened browsing session ({})", user_data_dir.display());

        Ok(Self {
            browser,
            page,
            handler,
            user_data_dir: Some(user_data_dir),
        })
    }

    /// Browser process handle
    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// The session's only page
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Close the browser, wait for the process to exit and remove its profile
    ///
    /// Consumes the session; failures are logged, never returned, so release
    /// cannot mask the outcome of the search that used the session.
    pub async fn close(mut self) {
        shutdown_browser(&mut self.browser).await;
        self.handler.abort();

        if let Some(path) = self.user_data_dir.take() {
            remove_user_data_dir(&path);
        }

        info!("Browsing session closed");
    }
}

impl Drop for BrowsingSession {
    fn drop(&mut self) {
        self.handler.abort();

        if let Some(path) = self.user_data_dir.take() {
            warn!(
                "BrowsingSession dropped without close(); Chrome is killed on drop. \
                 Removing profile directory {}",
                path.display()
            );
            remove_user_data_dir(&path);
        }
    }
}

/// Close the browser and wait for the process to exit
///
/// Both steps are needed: `close()` only sends the CDP command, and
/// without `wait()` Chrome lingers as a zombie holding the profile lock.
async fn shutdown_browser(browser: &mut Browser) {
    if let Err(e) = browser.close().await {
        warn!("Failed to close browser cleanly: {}", e);
    }

    if let Err(e) = browser.wait().await {
        warn!("Failed to wait for browser exit: {}", e);
    }
}

fn remove_user_data_dir(path: &Path) {
    match std::fs::remove_dir_all(path) {
        Ok(()) => debug!("Removed browser profile directory {}", path.display()),
        Err(e) => warn!(
            "Failed to clean up temp directory {}: {}. Manual cleanup may be required.",
            path.display(),
            e
        ),
    }
}
