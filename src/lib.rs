//! Wallwatch
//!
//! A headless client for HTML status wallboards. It polls a dashboard page,
//! keeps an in-memory rendition of it fresh, sizes the status-box grid to
//! fill a viewport and maintains the stylesheet for it, and mirrors the
//! running-build count into a favicon badge.
//!
//! # Refresh model
//!
//! Every document carries a content-version fingerprint as a `rel`
//! attribute on its `<head>`. A poll that comes back with the same
//! fingerprint patches only the body-derived state; a changed fingerprint
//! adopts the fetched document wholesale (the headless equivalent of a full
//! page reload). A failed poll swaps in an error banner and waits for the
//! next tick.
//!
//! # Example
//!
//! ```no_run
//! use wallwatch::{BoardConfig, Monitor, Viewport};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BoardConfig {
//!     refresh_interval_secs: 30,
//!     viewport: Viewport { width: 1920, height: 1080 },
//!     ..Default::default()
//! };
//!
//! let mut monitor = Monitor::new(config)?;
//! monitor.load("http://wallboard.internal:8080/")?;
//! let outcome = monitor.poll();
//! println!("refresh: {:?}", outcome);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;

pub mod error;
pub use error::{Error, Result};

pub mod badge;
pub mod monitor;
pub mod page;
pub mod rendering;

pub use badge::{Badge, BadgeOptions};
pub use monitor::{Monitor, RefreshOutcome};
pub use page::{Page, Status, StatusBox};

/// Poll cadence used when neither the flag nor the environment names one.
pub const DEFAULT_REFRESH_INTERVAL: u64 = 30;

/// Configuration for the wallboard monitor
///
/// The defaults match what the boards themselves assume: a thirty-second
/// poll cadence and a 1280x720 viewport. The interval is the board's sole
/// behavioral knob; everything else is plumbing for the HTTP client.
///
/// # Examples
///
/// ```
/// let cfg = wallwatch::BoardConfig::default();
/// assert_eq!(cfg.refresh_interval_secs, 30);
/// ```
#[derive(Debug, Clone)]
pub struct BoardConfig {
    /// Seconds between polls
    pub refresh_interval_secs: u64,
    /// Viewport the layout pass sizes the grid against
    pub viewport: Viewport,
    /// User agent string to send with requests
    pub user_agent: String,
    /// Timeout for board fetches in milliseconds
    pub timeout_ms: u64,
    /// Custom HTTP headers
    pub headers: HashMap<String, String>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL,
            viewport: Viewport::default(),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) wallwatch/0.1".to_string(),
            timeout_ms: 30000,
            headers: HashMap::new(),
        }
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BoardConfig::default();
        assert_eq!(config.refresh_interval_secs, 30);
        assert_eq!(config.viewport.width, 1280);
        assert_eq!(config.viewport.height, 720);
        assert!(config.user_agent.contains("wallwatch"));
    }

    #[test]
    fn test_viewport() {
        let viewport = Viewport {
            width: 1920,
            height: 1080,
        };
        assert_eq!(viewport.width, 1920);
        assert_eq!(viewport.height, 1080);
    }
}
