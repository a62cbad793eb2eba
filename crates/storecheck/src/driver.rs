//! StoreDriver - the browser tab seam.
//!
//! Page objects talk to a tab only through this trait. `CdpDriver`
//! implements it over the Chrome DevTools Protocol and [`crate::mock`] over
//! static HTML, so page-object logic is tested without a browser.

use crate::locator::Selector;
use crate::result::{StoreError, StoreResult};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

/// Poll interval for the provided wait methods
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Quiet period without new network activity that counts as idle
pub const NETWORK_IDLE_THRESHOLD_MS: u64 = 500;

/// Page load milestones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    /// The `load` event fired
    Load,
    /// DOM parsed
    DomContentLoaded,
    /// Loaded and no network activity for [`NETWORK_IDLE_THRESHOLD_MS`]
    #[default]
    NetworkIdle,
}

/// Scroll targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollPosition {
    /// Top of the document
    Top,
    /// Bottom of the document
    Bottom,
}

/// A single browser tab
#[async_trait]
pub trait StoreDriver: Send + Sync + std::fmt::Debug {
    /// Navigate to an absolute URL
    async fn goto(&self, url: &str) -> StoreResult<()>;

    /// Wait until the page reaches `state`
    async fn wait_for_load(&self, state: LoadState, timeout: Duration) -> StoreResult<()>;

    /// Reload the current page
    async fn reload(&self) -> StoreResult<()>;

    /// Go back in history
    async fn go_back(&self) -> StoreResult<()>;

    /// Current URL
    async fn current_url(&self) -> StoreResult<String>;

    /// Document title
    async fn title(&self) -> StoreResult<String>;

    /// Number of elements matching `selector`
    async fn count(&self, selector: &Selector) -> StoreResult<usize>;

    /// Text content of every match, untrimmed
    async fn text_contents(&self, selector: &Selector) -> StoreResult<Vec<String>>;

    /// Whether any match is visible
    async fn is_visible(&self, selector: &Selector) -> StoreResult<bool>;

    /// Click the first match
    async fn click(&self, selector: &Selector) -> StoreResult<()>;

    /// Fire the first match's DOM `click()`, bypassing pointer hit-testing.
    /// Used where overlapping menus intercept a real mouse click.
    async fn dom_click(&self, selector: &Selector) -> StoreResult<()>;

    /// Move the pointer over the first match
    async fn hover(&self, selector: &Selector) -> StoreResult<()>;

    /// Select `value` in the first matching `<select>`
    async fn select_option(&self, selector: &Selector, value: &str) -> StoreResult<()>;

    /// Scroll the document
    async fn scroll_to(&self, position: ScrollPosition) -> StoreResult<()>;

    /// Full-page PNG screenshot
    async fn screenshot(&self) -> StoreResult<Vec<u8>>;

    /// Close the tab and its browser
    async fn close(&self) -> StoreResult<()>;

    /// Wait until at least one element matches
    ///
    /// # Errors
    ///
    /// Returns `Timeout` if nothing matched within `timeout`
    async fn wait_for(&self, selector: &Selector, timeout: Duration) -> StoreResult<()> {
        let started = Instant::now();
        loop {
            if self.count(selector).await? > 0 {
                return Ok(());
            }
            if started.elapsed() >= timeout {
                return Err(StoreError::timeout(timeout));
            }
            tokio::time::sleep(WAIT_POLL_INTERVAL.min(timeout)).await;
        }
    }

    /// Wait until no match is visible
    ///
    /// # Errors
    ///
    /// Returns `Timeout` if a match stayed visible for `timeout`
    async fn wait_for_hidden(&self, selector: &Selector, timeout: Duration) -> StoreResult<()> {
        let started = Instant::now();
        loop {
            if !self.is_visible(selector).await? {
                return Ok(());
            }
            if started.elapsed() >= timeout {
                return Err(StoreError::timeout(timeout));
            }
            tokio::time::sleep(WAIT_POLL_INTERVAL.min(timeout)).await;
        }
    }

    /// Wait for the first match and return its trimmed text
    ///
    /// # Errors
    ///
    /// Returns `Timeout` if nothing matched within `timeout`
    async fn text_of(&self, selector: &Selector, timeout: Duration) -> StoreResult<String> {
        self.wait_for(selector, timeout).await?;
        let texts = self.text_contents(selector).await?;
        Ok(texts
            .first()
            .map(|t| t.trim().to_string())
            .unwrap_or_default())
    }
}
