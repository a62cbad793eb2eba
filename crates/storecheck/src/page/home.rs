//! Home page: header navigation and the currency picker.

use super::{PageObject, StorePage};
use crate::catalog::Category;
use crate::currency::CurrencyTable;
use crate::driver::ScrollPosition;
use crate::locator::Selector;
use crate::result::{StoreError, StoreResult};
use crate::selectors::{Role, SelectorTable};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Home page and the header shared by every page
#[derive(Debug, Clone)]
pub struct HomePage {
    base: StorePage,
    selectors: Arc<SelectorTable>,
    currencies: Arc<CurrencyTable>,
}

impl HomePage {
    /// Create the home page object
    #[must_use]
    pub fn new(base: StorePage, selectors: Arc<SelectorTable>, currencies: Arc<CurrencyTable>) -> Self {
        Self {
            base,
            selectors,
            currencies,
        }
    }

    /// Base page
    #[must_use]
    pub const fn base(&self) -> &StorePage {
        &self.base
    }

    /// Currency table in use
    #[must_use]
    pub fn currencies(&self) -> &CurrencyTable {
        &self.currencies
    }

    /// Open the storefront root and wait for it to settle
    pub async fn navigate_home(&self) -> StoreResult<()> {
        info!(url = %self.base.base_url(), "Opening home page");
        self.base.navigate_to("/").await?;
        self.base.wait_for_page_load().await
    }

    /// Whether the store logo is visible
    pub async fn is_home_displayed(&self) -> bool {
        self.base.is_visible(&self.selectors.get(Role::Logo)).await
    }

    /// Open the top-menu dropdown for `category`
    pub async fn hover_menu(&self, category: Category) -> StoreResult<()> {
        debug!(%category, "Hovering menu");
        self.base
            .driver()
            .hover(&self.selectors.get(Role::MenuTrigger(category)))
            .await
    }

    /// Follow the "Show All" link of `category`; menus without a dropdown are
    /// clicked directly
    pub async fn click_show_all(&self, category: Category) -> StoreResult<()> {
        if category.show_all_label().is_some() {
            self.hover_menu(category).await?;
            self.base.settle(self.base.timeouts().menu_settle).await;
        }
        info!(%category, "Opening category listing");
        self.base
            .click(&self.selectors.get(Role::ShowAllLink(category)))
            .await?;
        self.base.wait_for_page_load().await
    }

    /// Click the first link or button whose text contains `text`
    pub async fn click_link_text(&self, text: &str) -> StoreResult<()> {
        info!(%text, "Clicking by text");
        self.base
            .click(&Selector::css_with_text("a, button", text).first())
            .await?;
        self.base.wait_for_page_load().await
    }

    async fn available_currencies(&self) -> Vec<String> {
        self.base
            .driver()
            .text_contents(&self.selectors.get(Role::CurrencyOption))
            .await
            .map(|texts| {
                texts
                    .iter()
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Switch the storefront currency to `code`
    ///
    /// # Errors
    ///
    /// Returns `CurrencyNotFound` (listing the offered options) if the picker
    /// has no option for `code`, or the driver error of any step
    pub async fn change_currency(&self, code: &str) -> StoreResult<()> {
        let driver = self.base.driver();
        let timeouts = self.base.timeouts();
        let control = self.selectors.get(Role::CurrencyControl);
        info!(%code, "Changing currency");

        self.base
            .wait_for_element(&control, timeouts.currency_control)
            .await?;
        driver.scroll_to(ScrollPosition::Top).await?;
        self.base.click(&control.first()).await?;

        let option = self.currencies.option_selector(code)?;
        if driver.count(&option).await? == 0 {
            return Err(StoreError::CurrencyNotFound {
                code: code.to_string(),
                available: self.available_currencies().await,
            });
        }

        // Options sit under the open menu bar, so a pointer click can land on it
        let before = driver.current_url().await?;
        self.base.dom_click(&option.first()).await?;
        self.base.wait_for_page_load().await?;
        self.base.settle(timeouts.currency_settle).await;

        let after = driver.current_url().await?;
        if after != before && !after.contains("currency") {
            warn!(%before, %after, "Currency switch navigated away, going back");
            driver.go_back().await?;
            self.base.wait_for_page_load().await?;
        }

        if let Err(e) = driver
            .wait_for_hidden(&self.selectors.get(Role::CurrencyOption), timeouts.currency_close)
            .await
        {
            warn!(error = %e, "Currency options still open");
        }
        self.base.wait_for_page_load().await?;
        info!(%code, "Currency changed");
        Ok(())
    }
}

#[async_trait]
impl PageObject for HomePage {
    fn page_name(&self) -> &str {
        "Home"
    }

    async fn is_displayed(&self) -> bool {
        self.is_home_displayed().await
    }
}
