//! Browser infrastructure for launching per-search Chrome instances

mod session;

pub use crate::browser_setup::{download_managed_browser, find_browser_executable, launch_args};
pub use session::BrowsingSession;
