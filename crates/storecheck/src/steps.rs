//! Scenario step implementations.
//!
//! Each method is one Given/When/Then step of the storefront features. The
//! cucumber glue and the CLI both drive these.

use crate::catalog::{Category, ListingEntry};
use crate::fixture::{FixtureRecord, FixtureRecorder, FixtureStore};
use crate::page::{CategoryPage, PageRegistry};
use crate::reconcile::{ensure_extracted, reconcile_names, reconcile_prices, NameReport, PriceReport};
use crate::result::{StoreError, StoreResult};
use std::path::PathBuf;
use tracing::{info, warn};

/// Result of a price validation step
#[derive(Debug, Clone)]
pub enum PriceOutcome {
    /// Prices were compared with the fixture
    Verified(PriceReport),
    /// No fixture existed, so one was recorded
    Recorded {
        /// Written fixture file
        path: PathBuf,
        /// Recorded products
        records: Vec<FixtureRecord>,
    },
}

/// Category whose "Show All" link carries `label`
#[must_use]
pub fn category_for_label(label: &str) -> Option<Category> {
    let label = label.trim();
    Category::ALL
        .into_iter()
        .find(|c| label == format!("Show All {}", c.heading()))
}

/// Page objects and fixtures for one scenario
#[derive(Debug, Clone)]
pub struct StepContext {
    pages: PageRegistry,
    fixtures: FixtureStore,
}

impl StepContext {
    /// Create a context
    #[must_use]
    pub fn new(pages: PageRegistry, fixtures: FixtureStore) -> Self {
        Self { pages, fixtures }
    }

    /// Page objects
    #[must_use]
    pub const fn pages(&self) -> &PageRegistry {
        &self.pages
    }

    /// Fixture files
    #[must_use]
    pub const fn fixtures(&self) -> &FixtureStore {
        &self.fixtures
    }

    fn listing(&self, category: Category) -> &CategoryPage {
        self.pages.category(category)
    }

    /// Given user is on the OpenCart homepage
    pub async fn open_home(&self) -> StoreResult<()> {
        let home = self.pages.home();
        home.navigate_home().await?;
        if !home.is_home_displayed().await {
            return Err(StoreError::assertion("store logo is not visible on the home page"));
        }
        Ok(())
    }

    /// When user navigates to the `category` section
    pub async fn open_section_menu(&self, category: Category) -> StoreResult<()> {
        self.pages.home().hover_menu(category).await?;
        let base = self.pages.base();
        base.settle(base.timeouts().menu_settle).await;
        Ok(())
    }

    /// When user clicks on `label`
    pub async fn click_labeled(&self, label: &str) -> StoreResult<()> {
        match category_for_label(label) {
            Some(category) => self.pages.home().click_show_all(category).await,
            None => self.pages.home().click_link_text(label).await,
        }
    }

    /// Open the home page and follow the "Show All" link of `category`
    pub async fn open_category(&self, category: Category) -> StoreResult<()> {
        self.open_home().await?;
        self.pages.home().click_show_all(category).await
    }

    /// Then user should see the `category` section details page
    pub async fn verify_category_page(&self, category: Category) -> StoreResult<usize> {
        if !self.listing(category).is_displayed().await {
            return Err(StoreError::assertion(format!(
                "the {} heading is not visible",
                category.heading()
            )));
        }
        self.verify_product_count(category).await
    }

    /// Then verify `category` products count should be greater than 0
    pub async fn verify_product_count(&self, category: Category) -> StoreResult<usize> {
        let count = self.listing(category).product_count().await?;
        if count == 0 {
            return Err(StoreError::assertion(format!("no {category} products listed")));
        }
        info!(%category, count, "Product count check passed");
        Ok(count)
    }

    /// Names on every page when paginated, otherwise the current page
    pub async fn extract_names(&self, category: Category) -> Vec<String> {
        let listing = self.listing(category);
        if listing.has_pagination().await {
            info!(%category, "Extracting names from all pages");
            listing.product_names_from_all_pages().await
        } else {
            info!(%category, "Extracting names from the current page only");
            listing.product_names().await
        }
    }

    /// Prices on every page when paginated, otherwise the current page
    pub async fn extract_prices(&self, category: Category) -> Vec<ListingEntry> {
        let listing = self.listing(category);
        if listing.has_pagination().await {
            info!(%category, "Extracting prices from all pages");
            listing.product_prices_from_all_pages().await
        } else {
            info!(%category, "Extracting prices from the current page only");
            listing.product_prices().await
        }
    }

    /// Then validate `category` names should match test data
    ///
    /// # Errors
    ///
    /// Fails without a fixture, when nothing was extracted, or when no
    /// fixture name was found
    pub async fn validate_names(&self, category: Category) -> StoreResult<NameReport> {
        let expected = self.fixtures.require(category)?;
        let names = self.extract_names(category).await;
        ensure_extracted(category, names.len())?;
        let report = reconcile_names(&names, &expected);
        if !report.missing.is_empty() {
            warn!(%category, missing = ?report.missing, "Some products were not found");
        }
        report.ensure_any_match()?;
        Ok(report)
    }

    /// When user changes currency to `code`
    pub async fn change_currency(&self, code: &str) -> StoreResult<()> {
        self.pages.home().change_currency(code).await
    }

    async fn ensure_on_listing(&self, category: Category) -> StoreResult<()> {
        let title = self.pages.driver().title().await?;
        if !title.to_lowercase().contains(category.slug()) {
            return Err(StoreError::assertion(format!(
                "expected a {category} listing, page title is {title:?}"
            )));
        }
        Ok(())
    }

    /// Then validate `category` prices should match `code` prices from test
    /// data.
    ///
    /// Records the fixture instead when the file is missing or empty, then
    /// switches back to `code`.
    pub async fn validate_prices(&self, category: Category, code: &str) -> StoreResult<PriceOutcome> {
        let field = self.pages.currencies().field_for(code)?;
        self.ensure_on_listing(category).await?;
        let listing = self.listing(category);
        listing.go_to_first_page().await;
        let actual = self.extract_prices(category).await;
        ensure_extracted(category, actual.len())?;

        let expected = match self.fixtures.load(category)? {
            Some(records) if !records.is_empty() => records,
            _ => {
                warn!(%category, path = %self.fixtures.path_for(category).display(), "No fixture, recording one");
                let (path, records) = self.record_prices(category, Some(actual.as_slice())).await?;
                self.change_currency(code).await?;
                listing.go_to_first_page().await;
                return Ok(PriceOutcome::Recorded { path, records });
            }
        };

        let report = reconcile_prices(&actual, &expected, code, field);
        report.ensure_any_match()?;
        if report.is_complete() {
            info!(%category, currency = %code, "Every fixture price matched");
        }
        Ok(PriceOutcome::Verified(report))
    }

    /// Record the fixture of `category` from the listing currently shown,
    /// cycling through every currency
    pub async fn record_fixture(&self, category: Category) -> StoreResult<(PathBuf, Vec<FixtureRecord>)> {
        self.ensure_on_listing(category).await?;
        self.record_prices(category, None).await
    }

    async fn record_prices(
        &self,
        category: Category,
        seed: Option<&[ListingEntry]>,
    ) -> StoreResult<(PathBuf, Vec<FixtureRecord>)> {
        let mut recorder = seed.map(FixtureRecorder::seeded);
        let listing = self.listing(category);
        for row in self.pages.currencies().rows() {
            self.change_currency(&row.code).await?;
            listing.go_to_first_page().await;
            let entries = self.extract_prices(category).await;
            info!(%category, currency = %row.code, found = entries.len(), "Collected prices");
            let recorder = recorder.get_or_insert_with(|| FixtureRecorder::seeded(&entries));
            recorder.record(row.field, &entries);
        }
        let records = recorder.map(FixtureRecorder::finish).unwrap_or_default();
        ensure_extracted(category, records.len())?;
        let path = self.fixtures.save(category, &records)?;
        info!(%category, products = records.len(), path = %path.display(), "Recorded fixture");
        Ok((path, records))
    }
}
