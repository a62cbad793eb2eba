//! Command handlers, kept out of main.rs so they run against the mock
//! storefront in tests

pub mod config;
pub mod fixtures;
pub mod record;
pub mod scrape;
pub mod verify;

pub use config::render_config;
pub use fixtures::execute_fixtures;
pub use record::execute_record;
pub use scrape::execute_scrape;
pub use verify::execute_verify;

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;
    use std::sync::Arc;
    use storecheck::mock::{MockDriver, MockProduct, MockStorefront};
    use storecheck::{Category, FnLauncher, RunConfig, SessionManager, StoreDriver, Timeouts};

    pub const BASE: &str = "https://shop.test";

    pub fn product(name: &str, usd: &str, eur: &str, gbp: &str) -> MockProduct {
        MockProduct::new(name)
            .price("USD", usd)
            .price("EUR", eur)
            .price("GBP", gbp)
    }

    pub fn shop() -> MockStorefront {
        MockStorefront::new(BASE).with_listing(
            Category::Laptop,
            vec![
                vec![
                    product("HP LP3065", "$122.00", "95.72€", "£74.73"),
                    product("MacBook", "$602.00", "472.33€", "£368.73"),
                ],
                vec![product("Sony VAIO", "$1,202.00", "943.09€", "£736.23")],
            ],
        )
    }

    pub fn session(shop: MockStorefront, dir: &Path) -> (Arc<MockDriver>, SessionManager) {
        let driver = Arc::new(shop.into_driver());
        let shared = Arc::clone(&driver);
        let launcher = FnLauncher::new(move |_config| {
            let driver: Arc<dyn StoreDriver> = shared.clone();
            async move { Ok(driver) }
        });
        let config = RunConfig::default()
            .with_base_url(BASE)
            .with_fixture_dir(dir.join("test-data"))
            .with_artifact_dir(dir.join("test-results"));
        let session = SessionManager::new(config, Arc::new(launcher)).with_timeouts(Timeouts::immediate());
        (driver, session)
    }
}
