//! Browser session lifecycle.
//!
//! One tab serves the whole run. It is created on the first
//! [`SessionManager::acquire`] and closed once by [`SessionManager::release`].
//! Nothing is reset between scenarios: cookies, the selected currency and the
//! navigation history carry over, so scenario order can matter.

use crate::config::{RunConfig, Timeouts};
use crate::driver::StoreDriver;
use crate::fixture::FixtureStore;
use crate::page::PageRegistry;
use crate::report::Attachment;
use crate::result::{StoreError, StoreResult};
use crate::steps::StepContext;
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Creates the driver for a run
#[async_trait]
pub trait DriverLauncher: Send + Sync + fmt::Debug {
    /// Launch a browser and open a tab
    async fn launch(&self, config: &RunConfig) -> StoreResult<Arc<dyn StoreDriver>>;
}

type LaunchFuture = Pin<Box<dyn Future<Output = StoreResult<Arc<dyn StoreDriver>>> + Send>>;

/// Launcher backed by a closure
pub struct FnLauncher {
    launch: Box<dyn Fn(RunConfig) -> LaunchFuture + Send + Sync>,
}

impl FnLauncher {
    /// Wrap an async closure
    pub fn new<F, Fut>(launch: F) -> Self
    where
        F: Fn(RunConfig) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StoreResult<Arc<dyn StoreDriver>>> + Send + 'static,
    {
        Self {
            launch: Box::new(move |config| Box::pin(launch(config))),
        }
    }
}

impl fmt::Debug for FnLauncher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnLauncher").finish_non_exhaustive()
    }
}

#[async_trait]
impl DriverLauncher for FnLauncher {
    async fn launch(&self, config: &RunConfig) -> StoreResult<Arc<dyn StoreDriver>> {
        (self.launch)(config.clone()).await
    }
}

/// Owns the shared tab for a run
#[derive(Debug)]
pub struct SessionManager {
    config: RunConfig,
    timeouts: Timeouts,
    launcher: Arc<dyn DriverLauncher>,
    driver: Mutex<Option<Arc<dyn StoreDriver>>>,
}

impl SessionManager {
    /// Create a manager; no browser is started yet
    #[must_use]
    pub fn new(config: RunConfig, launcher: Arc<dyn DriverLauncher>) -> Self {
        Self {
            config,
            timeouts: Timeouts::default(),
            launcher,
            driver: Mutex::new(None),
        }
    }

    /// Override the wait budgets handed to page objects
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Run configuration
    #[must_use]
    pub const fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Wait budgets
    #[must_use]
    pub const fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    /// The shared tab, launching the browser on first use
    ///
    /// # Errors
    ///
    /// Returns the launcher's error if the browser cannot start
    pub async fn acquire(&self) -> StoreResult<Arc<dyn StoreDriver>> {
        let mut slot = self.driver.lock().await;
        if let Some(driver) = slot.as_ref() {
            debug!("Reusing browser session");
            return Ok(Arc::clone(driver));
        }
        info!(browser = %self.config.browser, headless = self.config.headless, "Starting browser session");
        let driver = self.launcher.launch(&self.config).await?;
        *slot = Some(Arc::clone(&driver));
        Ok(driver)
    }

    /// Page objects and fixtures bound to the shared tab
    ///
    /// # Errors
    ///
    /// Returns error if the browser cannot start
    pub async fn context(&self) -> StoreResult<StepContext> {
        let driver = self.acquire().await?;
        let pages = PageRegistry::builder(driver)
            .base_url(self.config.base_url.clone())
            .timeouts(self.timeouts)
            .build();
        Ok(StepContext::new(pages, FixtureStore::new(self.config.fixture_dir())))
    }

    /// Whether a tab is open
    pub async fn is_active(&self) -> bool {
        self.driver.lock().await.is_some()
    }

    /// Close the browser; errors are logged, never returned
    pub async fn release(&self) {
        let Some(driver) = self.driver.lock().await.take() else {
            return;
        };
        match tokio::time::timeout(self.timeouts.cleanup, driver.close()).await {
            Ok(Ok(())) => info!("Browser session closed"),
            Ok(Err(e)) => warn!(error = %e, "Failed to close browser"),
            Err(_) => warn!(timeout = ?self.timeouts.cleanup, "Timed out closing browser"),
        }
    }

    /// Per-scenario cleanup: a failure screenshot when enabled.
    ///
    /// Bounded by the cleanup timeout. Errors are logged, never returned, so
    /// cleanup cannot change a scenario's outcome.
    pub async fn finish_scenario(&self, failed: bool) -> Option<Attachment> {
        if !failed || !self.config.screenshot_on_failure {
            return None;
        }
        let driver = self.driver.lock().await.as_ref().map(Arc::clone)?;
        match tokio::time::timeout(self.timeouts.cleanup, self.capture_failure(driver.as_ref())).await {
            Ok(Ok(attachment)) => Some(attachment),
            Ok(Err(e)) => {
                warn!(error = %e, "Failure screenshot not captured");
                None
            }
            Err(_) => {
                warn!(timeout = ?self.timeouts.cleanup, "Failure screenshot timed out");
                None
            }
        }
    }

    async fn capture_failure(&self, driver: &dyn StoreDriver) -> StoreResult<Attachment> {
        let bytes = driver.screenshot().await?;
        let path = self.screenshot_path();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &bytes).await?;
        info!(path = %path.display(), "Saved failure screenshot");
        Ok(Attachment::png(&bytes).with_path(path))
    }

    fn screenshot_path(&self) -> PathBuf {
        let stamp = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%S%.3fZ");
        self.config
            .screenshot_dir()
            .join(format!("screenshot-{stamp}.png"))
    }
}

/// Launcher that always fails; for runs where no browser may be started
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBrowser;

#[async_trait]
impl DriverLauncher for NoBrowser {
    async fn launch(&self, config: &RunConfig) -> StoreResult<Arc<dyn StoreDriver>> {
        Err(StoreError::BrowserLaunchError {
            message: format!("no browser support compiled in for {}", config.browser),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::{MockDriver, MOCK_SCREENSHOT};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn counting_launcher(
        launches: Arc<AtomicUsize>,
        driver: Arc<MockDriver>,
    ) -> Arc<dyn DriverLauncher> {
        Arc::new(FnLauncher::new(move |_config| {
            launches.fetch_add(1, Ordering::SeqCst);
            let driver: Arc<dyn StoreDriver> = driver.clone();
            async move { Ok(driver) }
        }))
    }

    fn manager(config: RunConfig) -> (Arc<AtomicUsize>, Arc<MockDriver>, SessionManager) {
        let launches = Arc::new(AtomicUsize::new(0));
        let driver = Arc::new(MockDriver::from_html("<div id=\"logo\"></div>"));
        let launcher = counting_launcher(Arc::clone(&launches), Arc::clone(&driver));
        let manager = SessionManager::new(config, launcher).with_timeouts(Timeouts::immediate());
        (launches, driver, manager)
    }

    mod lifecycle_tests {
        use super::*;

        #[tokio::test]
        async fn test_lazy_launch_and_reuse() {
            let (launches, _, manager) = manager(RunConfig::default());
            assert!(!manager.is_active().await);
            let first = manager.acquire().await.unwrap();
            let second = manager.acquire().await.unwrap();
            assert!(Arc::ptr_eq(&first, &second));
            assert_eq!(launches.load(Ordering::SeqCst), 1);
            assert!(manager.is_active().await);
        }

        #[tokio::test]
        async fn test_state_carries_over_between_contexts() {
            let (launches, driver, manager) = manager(RunConfig::default());
            let first = manager.context().await.unwrap();
            first.pages().driver().goto("mock://page").await.unwrap();
            let _second = manager.context().await.unwrap();
            assert_eq!(launches.load(Ordering::SeqCst), 1);
            assert_eq!(driver.call_count("goto:"), 1);
        }

        #[tokio::test]
        async fn test_release_closes_once() {
            let (_, driver, manager) = manager(RunConfig::default());
            manager.acquire().await.unwrap();
            manager.release().await;
            manager.release().await;
            assert!(driver.is_closed());
            assert_eq!(driver.call_count("close"), 1);
            assert!(!manager.is_active().await);
        }

        #[tokio::test]
        async fn test_release_without_session() {
            let (_, driver, manager) = manager(RunConfig::default());
            manager.release().await;
            assert!(!driver.is_closed());
        }

        #[tokio::test]
        async fn test_launch_failure_propagates() {
            let manager = SessionManager::new(RunConfig::default(), Arc::new(NoBrowser));
            let err = manager.acquire().await.unwrap_err();
            assert!(matches!(err, StoreError::BrowserLaunchError { .. }));
            assert!(!manager.is_active().await);
        }
    }

    mod screenshot_tests {
        use super::*;

        #[tokio::test]
        async fn test_screenshot_on_failure() {
            let dir = TempDir::new().unwrap();
            let config = RunConfig::default()
                .with_screenshot_on_failure(true)
                .with_artifact_dir(dir.path());
            let (_, _, manager) = manager(config);
            manager.acquire().await.unwrap();
            let attachment = manager.finish_scenario(true).await.unwrap();
            assert_eq!(attachment.mime_type, "image/png");
            assert_eq!(attachment.bytes().unwrap(), MOCK_SCREENSHOT);
            let path = attachment.path.unwrap();
            assert!(path.starts_with(dir.path().join("screenshots")));
            assert!(path
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("screenshot-"));
            assert_eq!(std::fs::read(path).unwrap(), MOCK_SCREENSHOT);
        }

        #[tokio::test]
        async fn test_no_screenshot_when_passed() {
            let dir = TempDir::new().unwrap();
            let (_, driver, manager) = manager(
                RunConfig::default()
                    .with_screenshot_on_failure(true)
                    .with_artifact_dir(dir.path()),
            );
            manager.acquire().await.unwrap();
            assert!(manager.finish_scenario(false).await.is_none());
            assert!(!driver.was_called("screenshot"));
        }

        #[tokio::test]
        async fn test_no_screenshot_when_disabled() {
            let (_, driver, manager) = manager(RunConfig::default());
            manager.acquire().await.unwrap();
            assert!(manager.finish_scenario(true).await.is_none());
            assert!(!driver.was_called("screenshot"));
        }

        #[tokio::test]
        async fn test_screenshot_errors_are_swallowed() {
            let (_, driver, manager) = manager(RunConfig::default().with_screenshot_on_failure(true));
            manager.acquire().await.unwrap();
            driver.close().await.unwrap();
            assert!(manager.finish_scenario(true).await.is_none());
        }

        #[tokio::test]
        async fn test_no_session_no_screenshot() {
            let (_, _, manager) = manager(RunConfig::default().with_screenshot_on_failure(true));
            assert!(manager.finish_scenario(true).await.is_none());
        }
    }
}
