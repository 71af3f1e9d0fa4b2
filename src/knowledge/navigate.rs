//! Page navigation - loads the search page and waits for the network to settle

use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::page::{
    EventLifecycleEvent, FrameId, SetLifecycleEventsEnabledParams,
};
use futures::{Stream, StreamExt};
use tracing::{debug, info};

use super::types::search_url;
use crate::utils::{KnowledgeResult, SearchError};

/// Lifecycle event Chrome emits once a frame has had no network activity for 500ms
const NETWORK_IDLE: &str = "networkIdle";

/// Lifecycle event that opens a new document in a frame
const NAVIGATION_INIT: &str = "init";

/// Navigate `page` to the search page of `base_url`
///
/// Returns once the main frame has loaded and its network went idle. The
/// whole sequence is bounded by `timeout`; running out yields
/// [`SearchError::NavigationTimeout`] and is not retried.
pub async fn open_search_page(
    page: &Page,
    base_url: &str,
    timeout: Duration,
) -> KnowledgeResult<()> {
    let url = search_url(base_url);
    info!("Navigating to knowledge search page: {}", url);

    let navigation_failed = |e: chromiumoxide::error::CdpError| SearchError::NavigationFailed {
        url: url.clone(),
        reason: e.to_string(),
    };

    page.execute(SetLifecycleEventsEnabledParams::new(true))
        .await
        .map_err(navigation_failed)?;

    // Subscribe before navigating so no lifecycle event can be missed
    let mut lifecycle = page
        .event_listener::<EventLifecycleEvent>()
        .await
        .map_err(navigation_failed)?;
    let main_frame = page.mainframe().await.map_err(navigation_failed)?;

    let load = async {
        page.goto(url.as_str()).await.map_err(navigation_failed)?;
        wait_for_network_idle(&mut lifecycle, main_frame.as_ref()).await;
        Ok(())
    };

    match tokio::time::timeout(timeout, load).await {
        Ok(result) => result,
        Err(_) => Err(SearchError::NavigationTimeout { url, timeout }),
    }
}

/// Consume lifecycle events until the main frame's new document is network-idle
///
/// Events of the previous document (`about:blank`) are skipped by waiting for
/// `init` first. If the event stream closes, navigation counts as settled.
async fn wait_for_network_idle<S>(events: &mut S, main_frame: Option<&FrameId>)
where
    S: Stream<Item = Arc<EventLifecycleEvent>> + Unpin,
{
    let mut navigation_started = false;

    while let Some(event) = events.next().await {
        if main_frame.is_some_and(|frame| *frame != event.frame_id) {
            continue;
        }

        match event.name.as_str() {
            NAVIGATION_INIT => navigation_started = true,
            NETWORK_IDLE if navigation_started => {
                debug!("Main frame reached network idle");
                return;
            }
            _ => {}
        }
    }

    debug!("Lifecycle event stream closed before network idle");
}
