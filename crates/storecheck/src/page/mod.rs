//! Page Object Model for the storefront.
//!
//! Every page object wraps a [`StorePage`]: the shared tab, the base URL and
//! the wait budgets. Page objects are cheap to clone and all clones drive the
//! same tab.

mod category;
mod home;
mod registry;

pub use category::{parse_price_block, CategoryPage, MAX_PAGES};
pub use home::HomePage;
pub use registry::{PageRegistry, PageRegistryBuilder};

use crate::config::Timeouts;
use crate::driver::{LoadState, StoreDriver};
use crate::locator::Selector;
use crate::result::StoreResult;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// A page or component of the storefront
#[async_trait]
pub trait PageObject: Send + Sync {
    /// Name for logging
    fn page_name(&self) -> &str;

    /// Whether the page's identifying element is showing; never errors
    async fn is_displayed(&self) -> bool;
}

/// Navigable base page shared by every page object
#[derive(Debug, Clone)]
pub struct StorePage {
    driver: Arc<dyn StoreDriver>,
    base_url: String,
    timeouts: Timeouts,
}

impl StorePage {
    /// Create a base page over a tab
    #[must_use]
    pub fn new(driver: Arc<dyn StoreDriver>, base_url: impl Into<String>, timeouts: Timeouts) -> Self {
        Self {
            driver,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeouts,
        }
    }

    /// Underlying tab
    #[must_use]
    pub fn driver(&self) -> &dyn StoreDriver {
        self.driver.as_ref()
    }

    /// Shared handle to the tab
    #[must_use]
    pub fn driver_handle(&self) -> Arc<dyn StoreDriver> {
        Arc::clone(&self.driver)
    }

    /// Storefront root, without trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Wait budgets
    #[must_use]
    pub const fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    /// Absolute URL for `path`; absolute inputs pass through
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    /// Navigate to `path` relative to the storefront root
    pub async fn navigate_to(&self, path: &str) -> StoreResult<()> {
        let url = self.url_for(path);
        tracing::debug!(%url, "Navigating");
        self.driver.goto(&url).await
    }

    /// Wait for network idle
    pub async fn wait_for_page_load(&self) -> StoreResult<()> {
        self.driver
            .wait_for_load(LoadState::NetworkIdle, self.timeouts.network_idle)
            .await
    }

    /// Click the first match
    pub async fn click(&self, selector: &Selector) -> StoreResult<()> {
        self.driver.click(selector).await
    }

    /// Fire the first match's DOM click handler
    pub async fn dom_click(&self, selector: &Selector) -> StoreResult<()> {
        self.driver.dom_click(selector).await
    }

    /// Whether `selector` is visible; lookup failures count as not visible
    pub async fn is_visible(&self, selector: &Selector) -> bool {
        match self.driver.is_visible(selector).await {
            Ok(visible) => visible,
            Err(e) => {
                tracing::debug!(%selector, error = %e, "Visibility check failed");
                false
            }
        }
    }

    /// Wait until `selector` matches
    pub async fn wait_for_element(&self, selector: &Selector, timeout: Duration) -> StoreResult<()> {
        self.driver.wait_for(selector, timeout).await
    }

    /// Choose `value` in a `<select>`
    pub async fn select_dropdown(&self, selector: &Selector, value: &str) -> StoreResult<()> {
        self.driver.select_option(selector, value).await
    }

    /// Pause for `delay`; zero returns immediately
    pub async fn settle(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
