//! Visibility polling for server-rendered and scripted pages
//!
//! Provides wait_for_visible() which polls a JavaScript probe with exponential
//! backoff until it reports a visible element. Used for the keyword textbox,
//! the submit button and the results container, all of which may be rendered
//! or replaced after the initial load event fires.

use std::time::{Duration, Instant};

use chromiumoxide::Page;
use tracing::trace;

/// Wait until `probe` evaluates to `true` on the page
///
/// The probe is a JavaScript expression returning a boolean. Evaluation
/// errors count as "not yet": they happen routinely while the page is in
/// the middle of a form-submit navigation.
///
/// # Returns
/// * `true` - The probe reported a visible element before the deadline
/// * `false` - The timeout elapsed
///
/// # Polling Strategy
/// - Starts at 100ms intervals
/// - Doubles each retry (exponential backoff)
/// - Caps at 1 second maximum interval
/// - Total duration limited by timeout parameter
pub async fn wait_for_visible(page: &Page, probe: &str, timeout: Duration) -> bool {
    let start = Instant::now();
    let mut poll_interval = Duration::from_millis(100);
    let max_interval = Duration::from_secs(1);

    loop {
        match page.evaluate(probe).await {
            Ok(result) => {
                if let Ok(true) = result.into_value::<bool>() {
                    return true;
                }
            }
            Err(e) => trace!("Visibility probe failed, retrying: {}", e),
        }

        let elapsed = start.elapsed();
        if elapsed >= timeout {
            return false;
        }

        // Never sleep past the deadline
        tokio::time::sleep(poll_interval.min(timeout - elapsed)).await;

        poll_interval = (poll_interval * 2).min(max_interval);
    }
}
