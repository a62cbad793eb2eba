//! Category listing page: product extraction and pagination.

use super::{PageObject, StorePage};
use crate::catalog::{dedup_names, Category, ListingEntry};
use crate::driver::LoadState;
use crate::locator::Selector;
use crate::result::StoreResult;
use crate::selectors::{Role, SelectorTable};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Pagination ceiling for the all-pages walks
pub const MAX_PAGES: usize = 10;

/// Displayed price of a regular price block.
///
/// The block's text is the price followed by a tax line; the first line of
/// the trimmed text is the price. Returns `None` for an empty block.
#[must_use]
pub fn parse_price_block(raw: &str) -> Option<String> {
    let first = raw.trim().lines().next()?.trim();
    (!first.is_empty()).then(|| first.to_string())
}

/// Listing page for one category
#[derive(Debug, Clone)]
pub struct CategoryPage {
    base: StorePage,
    category: Category,
    selectors: Arc<SelectorTable>,
}

impl CategoryPage {
    /// Create the page object for `category`
    #[must_use]
    pub fn new(base: StorePage, category: Category, selectors: Arc<SelectorTable>) -> Self {
        Self {
            base,
            category,
            selectors,
        }
    }

    /// Category shown by this page
    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }

    /// Base page
    #[must_use]
    pub const fn base(&self) -> &StorePage {
        &self.base
    }

    fn sel(&self, role: Role) -> Selector {
        self.selectors.get(role)
    }

    /// Whether the category heading is visible
    pub async fn is_displayed(&self) -> bool {
        self.base
            .is_visible(&self.sel(Role::CategoryHeading(self.category)))
            .await
    }

    /// Number of product cards once the first has rendered
    ///
    /// # Errors
    ///
    /// Returns `Timeout` if no card renders within the list timeout
    pub async fn product_count(&self) -> StoreResult<usize> {
        let cards = self.sel(Role::ProductCard);
        self.base
            .wait_for_element(&cards.clone().first(), self.base.timeouts().list)
            .await?;
        let count = self.base.driver().count(&cards).await?;
        info!(category = %self.category, count, "Counted products");
        Ok(count)
    }

    async fn wait_for_listing(&self) -> bool {
        let first = self.sel(Role::ProductCard).first();
        match self
            .base
            .wait_for_element(&first, self.base.timeouts().list)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(category = %self.category, error = %e, "No product cards rendered");
                false
            }
        }
    }

    /// Product names on the current page, de-duplicated in first-seen order
    pub async fn product_names(&self) -> Vec<String> {
        info!(category = %self.category, "Extracting product names");
        if !self.wait_for_listing().await {
            return Vec::new();
        }
        let names = self.sel(Role::ProductName);
        let total = match self.base.driver().count(&names).await {
            Ok(total) => total,
            Err(e) => {
                warn!(error = %e, "Could not count product names");
                return Vec::new();
            }
        };
        let mut found = Vec::with_capacity(total);
        for index in 0..total {
            let name = names.clone().nth(index);
            match self
                .base
                .driver()
                .text_of(&name, self.base.timeouts().element)
                .await
            {
                Ok(text) if text.is_empty() => debug!(index, "Skipping empty product name"),
                Ok(text) => {
                    info!(index = index + 1, name = %text, "Found product");
                    found.push(text);
                }
                Err(e) => warn!(index, error = %e, "Could not read product name"),
            }
        }
        dedup_names(found)
    }

    async fn card_entry(&self, index: usize) -> StoreResult<Option<ListingEntry>> {
        let driver = self.base.driver();
        let timeouts = self.base.timeouts();
        let card = self.sel(Role::ProductCard).nth(index);
        driver.wait_for(&card, timeouts.card).await?;

        let name = driver
            .text_of(&card.clone().descendant(self.sel(Role::CardName)), timeouts.card)
            .await?;
        let price_block = card.descendant(self.sel(Role::CardPrice));
        let old = price_block.clone().descendant(self.sel(Role::PriceOld));
        let new = price_block.clone().descendant(self.sel(Role::PriceNew));

        let entry = if driver.count(&old).await? > 0 && driver.count(&new).await? > 0 {
            let original = driver.text_of(&old, timeouts.element).await?;
            let current = driver.text_of(&new, timeouts.element).await?;
            (!current.is_empty()).then(|| ListingEntry::new(&name, current).with_original_price(original))
        } else {
            let raw = driver
                .text_contents(&price_block)
                .await?
                .into_iter()
                .next()
                .unwrap_or_default();
            parse_price_block(&raw).map(|price| ListingEntry::new(&name, price))
        };
        Ok(entry.filter(|e| !e.name.is_empty()))
    }

    /// Name and price of every card on the current page
    pub async fn product_prices(&self) -> Vec<ListingEntry> {
        info!(category = %self.category, "Extracting product prices");
        if !self.wait_for_listing().await {
            return Vec::new();
        }
        let total = match self.base.driver().count(&self.sel(Role::ProductCard)).await {
            Ok(total) => total,
            Err(e) => {
                warn!(error = %e, "Could not count product cards");
                return Vec::new();
            }
        };
        let mut entries = Vec::with_capacity(total);
        for index in 0..total {
            match self.card_entry(index).await {
                Ok(Some(entry)) => {
                    match &entry.original_price {
                        Some(original) => info!(
                            index = index + 1,
                            name = %entry.name,
                            price = %entry.price,
                            original = %original,
                            "Found sale product"
                        ),
                        None => info!(
                            index = index + 1,
                            name = %entry.name,
                            price = %entry.price,
                            "Found product"
                        ),
                    }
                    entries.push(entry);
                }
                Ok(None) => debug!(index, "Skipping card without name or price"),
                Err(e) => warn!(index, error = %e, "Could not read product card"),
            }
        }
        entries
    }

    /// Whether any pagination link exists
    pub async fn has_pagination(&self) -> bool {
        match self
            .base
            .driver()
            .count(&self.sel(Role::PaginationLink))
            .await
        {
            Ok(count) => count > 0,
            Err(e) => {
                warn!(error = %e, "Could not inspect pagination");
                false
            }
        }
    }

    /// Whether a "next" link exists
    pub async fn has_next_page(&self) -> bool {
        self.base
            .driver()
            .count(&self.sel(Role::NextPage))
            .await
            .map(|count| count > 0)
            .unwrap_or(false)
    }

    /// Follow the "next" link; false when there is none or it fails
    pub async fn go_to_next_page(&self) -> bool {
        if !self.has_next_page().await {
            return false;
        }
        let next = self.sel(Role::NextPage).first();
        let advanced = async {
            self.base.click(&next).await?;
            self.base.wait_for_page_load().await
        }
        .await;
        match advanced {
            Ok(()) => {
                self.base.settle(self.base.timeouts().page_settle).await;
                true
            }
            Err(e) => {
                warn!(error = %e, "Could not advance to the next page");
                false
            }
        }
    }

    /// Return to page 1, reloading when no "1" link is present
    pub async fn go_to_first_page(&self) {
        let first = self.sel(Role::FirstPage);
        let outcome = async {
            if self.base.driver().count(&first).await? > 0 {
                info!("Returning to the first page");
                self.base.click(&first.clone().first()).await?;
            } else {
                debug!("No first-page link, reloading");
                self.base.driver().reload().await?;
            }
            self.base.wait_for_page_load().await
        }
        .await;
        if let Err(e) = outcome {
            warn!(error = %e, "Could not return to the first page, reloading");
            if let Err(e) = self.base.driver().reload().await {
                warn!(error = %e, "Reload failed");
            }
            if let Err(e) = self
                .base
                .driver()
                .wait_for_load(LoadState::NetworkIdle, self.base.timeouts().network_idle)
                .await
            {
                debug!(error = %e, "Page did not go idle after reload");
            }
        }
        self.base.settle(self.base.timeouts().page_settle).await;
    }

    /// Extract page after page until no next page or [`MAX_PAGES`]
    async fn walk_pages<T, F, Fut>(&self, mut extract: F) -> Vec<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Vec<T>>,
    {
        let mut accumulated = Vec::new();
        let mut page = 1;
        loop {
            let batch = extract().await;
            info!(category = %self.category, page, found = batch.len(), "Extracted page");
            accumulated.extend(batch);
            if page >= MAX_PAGES {
                info!(limit = MAX_PAGES, "Reached page limit");
                break;
            }
            if !self.go_to_next_page().await {
                debug!(page, "No further pages");
                break;
            }
            page += 1;
        }
        accumulated
    }

    /// Names across all pages, de-duplicated in first-seen order
    pub async fn product_names_from_all_pages(&self) -> Vec<String> {
        let names = self.walk_pages(move || self.product_names()).await;
        let unique = dedup_names(names);
        info!(category = %self.category, total = unique.len(), "Collected unique names");
        unique
    }

    /// Entries across all pages in page order; never de-duplicated
    pub async fn product_prices_from_all_pages(&self) -> Vec<ListingEntry> {
        let entries = self.walk_pages(move || self.product_prices()).await;
        info!(category = %self.category, total = entries.len(), "Collected price entries");
        entries
    }
}

#[async_trait]
impl PageObject for CategoryPage {
    fn page_name(&self) -> &str {
        self.category.heading()
    }

    async fn is_displayed(&self) -> bool {
        CategoryPage::is_displayed(self).await
    }
}
