//! One instance of each page object, bound to a shared tab.

use super::{CategoryPage, HomePage, StorePage};
use crate::catalog::Category;
use crate::config::{Timeouts, DEFAULT_BASE_URL};
use crate::currency::CurrencyTable;
use crate::driver::StoreDriver;
use crate::selectors::SelectorTable;
use std::sync::Arc;

/// Page objects for a session
#[derive(Debug, Clone)]
pub struct PageRegistry {
    home: HomePage,
    desktop: CategoryPage,
    laptop: CategoryPage,
    phone: CategoryPage,
    currencies: Arc<CurrencyTable>,
}

impl PageRegistry {
    /// Start building a registry over `driver`
    #[must_use]
    pub fn builder(driver: Arc<dyn StoreDriver>) -> PageRegistryBuilder {
        PageRegistryBuilder {
            driver,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeouts: Timeouts::default(),
            selectors: SelectorTable::opencart(),
            currencies: CurrencyTable::opencart(),
        }
    }

    /// Home page
    #[must_use]
    pub const fn home(&self) -> &HomePage {
        &self.home
    }

    /// Listing page for `category`
    #[must_use]
    pub const fn category(&self, category: Category) -> &CategoryPage {
        match category {
            Category::Desktop => &self.desktop,
            Category::Laptop => &self.laptop,
            Category::Phone => &self.phone,
        }
    }

    /// Currency table shared by the pages
    #[must_use]
    pub fn currencies(&self) -> &CurrencyTable {
        &self.currencies
    }

    /// The shared tab
    #[must_use]
    pub fn driver(&self) -> &dyn StoreDriver {
        self.home.base().driver()
    }

    /// Base page
    #[must_use]
    pub const fn base(&self) -> &StorePage {
        self.home.base()
    }
}

/// Builder for [`PageRegistry`]
#[derive(Debug)]
pub struct PageRegistryBuilder {
    driver: Arc<dyn StoreDriver>,
    base_url: String,
    timeouts: Timeouts,
    selectors: SelectorTable,
    currencies: CurrencyTable,
}

impl PageRegistryBuilder {
    /// Storefront root
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Wait budgets
    #[must_use]
    pub const fn timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Selector table
    #[must_use]
    pub fn selectors(mut self, selectors: SelectorTable) -> Self {
        self.selectors = selectors;
        self
    }

    /// Currency table
    #[must_use]
    pub fn currencies(mut self, currencies: CurrencyTable) -> Self {
        self.currencies = currencies;
        self
    }

    /// Build the registry
    #[must_use]
    pub fn build(self) -> PageRegistry {
        let base = StorePage::new(self.driver, self.base_url, self.timeouts);
        let selectors = Arc::new(self.selectors);
        let currencies = Arc::new(self.currencies);
        let listing = |category| CategoryPage::new(base.clone(), category, Arc::clone(&selectors));
        PageRegistry {
            desktop: listing(Category::Desktop),
            laptop: listing(Category::Laptop),
            phone: listing(Category::Phone),
            home: HomePage::new(base.clone(), Arc::clone(&selectors), Arc::clone(&currencies)),
            currencies,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::MockDriver;

    #[test]
    fn test_defaults() {
        let registry = PageRegistry::builder(Arc::new(MockDriver::from_html(""))).build();
        assert_eq!(registry.base().base_url(), DEFAULT_BASE_URL);
        assert_eq!(registry.base().timeouts(), &Timeouts::default());
        assert_eq!(registry.currencies().len(), 3);
    }

    #[test]
    fn test_category_lookup() {
        let registry = PageRegistry::builder(Arc::new(MockDriver::from_html("")))
            .base_url("https://shop.test")
            .timeouts(Timeouts::immediate())
            .build();
        for category in Category::ALL {
            assert_eq!(registry.category(category).category(), category);
        }
        assert_eq!(registry.category(Category::Phone).base().base_url(), "https://shop.test");
    }

    #[tokio::test]
    async fn test_pages_share_one_tab() {
        let driver = Arc::new(MockDriver::from_html("<h2>Desktops</h2>"));
        let registry = PageRegistry::builder(driver.clone()).build();
        assert!(registry.category(Category::Desktop).is_displayed().await);
        registry.driver().close().await.unwrap();
        assert!(driver.is_closed());
    }
}
