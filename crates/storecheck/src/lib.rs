//! storecheck: end-to-end checks for an OpenCart storefront
//!
//! Drives a browser tab through page objects, extracts product listings
//! across pagination and currencies, and reconciles them with recorded
//! fixtures.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//! │ Feature steps │──►│ Page objects  │──►│ StoreDriver   │
//! │ (StepContext) │   │ Home/Category │   │ CDP or mock   │
//! └───────┬───────┘   └───────────────┘   └───────────────┘
//!         │
//!         ▼
//! ┌───────────────┐   ┌───────────────┐
//! │ Reconcile     │◄──│ Fixtures      │
//! │ names, prices │   │ <slug>List    │
//! └───────────────┘   └───────────────┘
//! ```

#![warn(missing_docs)]

mod catalog;
mod config;
mod currency;
mod driver;
mod fixture;
mod locator;
mod logging;
mod reconcile;
mod report;
mod result;
mod selectors;
mod session;
mod steps;

/// Page Object Model
pub mod page;

/// Offline driver and storefront for tests
pub mod mock;

#[cfg(feature = "browser")]
mod browser;

pub use catalog::{dedup_names, Category, ListingEntry};
pub use config::{
    BrowserEngine, RunConfig, Timeouts, DEFAULT_ARTIFACT_DIR, DEFAULT_BASE_URL, DEFAULT_FIXTURE_DIR,
};
pub use currency::{CurrencyRow, CurrencyTable, PriceField, FALLBACK_OPTION_PATTERN};
pub use driver::{LoadState, ScrollPosition, StoreDriver, NETWORK_IDLE_THRESHOLD_MS};
pub use fixture::{FixturePrices, FixtureRecord, FixtureRecorder, FixtureStore};
pub use locator::Selector;
pub use logging::{filter_for, init_tracing, LogFormat};
pub use page::{CategoryPage, HomePage, PageObject, PageRegistry, StorePage, MAX_PAGES};
pub use reconcile::{
    ensure_extracted, names_match, reconcile_names, reconcile_prices, NameReport, PriceMismatch,
    PriceReport,
};
pub use report::{Attachment, RunReport, ScenarioResult, ScenarioStatus};
pub use result::{StoreError, StoreResult};
pub use selectors::{Role, SelectorTable};
pub use session::{DriverLauncher, FnLauncher, NoBrowser, SessionManager};
pub use steps::{category_for_label, PriceOutcome, StepContext};

#[cfg(feature = "browser")]
pub use browser::{CdpDriver, CdpLauncher, WINDOW_SIZE};

/// Launcher for the compiled-in browser support
#[must_use]
pub fn default_launcher() -> std::sync::Arc<dyn DriverLauncher> {
    #[cfg(feature = "browser")]
    {
        std::sync::Arc::new(CdpLauncher)
    }
    #[cfg(not(feature = "browser"))]
    {
        std::sync::Arc::new(NoBrowser)
    }
}
