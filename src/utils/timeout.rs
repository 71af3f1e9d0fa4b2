//! Timeout validation utilities for browser operations

use anyhow::{Result, bail};
use std::time::Duration;

/// Maximum timeout for page loads and result waits (5 minutes)
/// Covers slow intranet servers and heavy result pages
pub const MAX_NAVIGATION_TIMEOUT_MS: u64 = 300_000; // 5 minutes

/// Maximum timeout for element interaction operations (30 seconds)
/// Covers dynamic element loading and animations
pub const MAX_INTERACTION_TIMEOUT_MS: u64 = 30_000; // 30 seconds

/// Validate timeout for navigation-class waits (page load, results container)
///
/// # Returns
/// * `Ok(Duration)` - Validated Duration object
/// * `Err` - If timeout is zero or exceeds MAX_NAVIGATION_TIMEOUT_MS
///
/// # Example
/// ```rust
/// use kodegen_tools_knowledge::validate_navigation_timeout;
///
/// let timeout = validate_navigation_timeout(45_000).unwrap();
/// assert_eq!(timeout.as_secs(), 45);
/// ```
pub fn validate_navigation_timeout(ms: u64) -> Result<Duration> {
    if ms == 0 {
        bail!("Navigation timeout must be greater than 0ms");
    }

    if ms > MAX_NAVIGATION_TIMEOUT_MS {
        bail!(
            "Timeout cannot exceed {}ms ({} minutes). Received: {}ms ({:.1} minutes)",
            MAX_NAVIGATION_TIMEOUT_MS,
            MAX_NAVIGATION_TIMEOUT_MS / 60_000,
            ms,
            ms as f64 / 60_000.0
        );
    }

    Ok(Duration::from_millis(ms))
}

/// Validate timeout for element interaction operations (keyword input, submit button)
///
/// # Returns
/// * `Ok(Duration)` - Validated Duration object
/// * `Err` - If timeout is zero or exceeds MAX_INTERACTION_TIMEOUT_MS
pub fn validate_interaction_timeout(ms: u64) -> Result<Duration> {
    if ms == 0 {
        bail!("Interaction timeout must be greater than 0ms");
    }

    if ms > MAX_INTERACTION_TIMEOUT_MS {
        bail!(
            "Timeout cannot exceed {}ms ({} seconds). Received: {}ms ({} seconds)",
            MAX_INTERACTION_TIMEOUT_MS,
            MAX_INTERACTION_TIMEOUT_MS / 1000,
            ms,
            ms / 1000
        );
    }

    Ok(Duration::from_millis(ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_values_within_bounds() {
        assert_eq!(
            validate_navigation_timeout(30_000).unwrap(),
            Duration::from_secs(30)
        );
        assert_eq!(
            validate_interaction_timeout(10_000).unwrap(),
            Duration::from_secs(10)
        );
        assert_eq!(
            validate_interaction_timeout(MAX_INTERACTION_TIMEOUT_MS).unwrap(),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn rejects_zero_and_oversized_values() {
        assert!(validate_navigation_timeout(0).is_err());
        assert!(validate_navigation_timeout(MAX_NAVIGATION_TIMEOUT_MS + 1).is_err());
        assert!(validate_interaction_timeout(0).is_err());

        let err = validate_interaction_timeout(45_000).unwrap_err();
        assert!(err.to_string().contains("Received: 45000ms"));
    }
}
