//! Run configuration and timeouts.
//!
//! Every field of [`RunConfig`] can be set from the command line or the
//! environment (`BROWSER`, `HEADLESS`, `BASE_URL`, ...). The library reads the
//! environment alone through [`RunConfig::from_env`].

use crate::result::{StoreError, StoreResult};
use clap::{ArgAction, Args, Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Storefront used when `BASE_URL` is not set
pub const DEFAULT_BASE_URL: &str = "https://demo.opencart.com";

/// Default fixture directory
pub const DEFAULT_FIXTURE_DIR: &str = "test-data";

/// Default artifact directory (screenshots, frames, reports)
pub const DEFAULT_ARTIFACT_DIR: &str = "test-results";

/// Browser engine selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BrowserEngine {
    /// Chromium / Chrome
    #[default]
    Chromium,
    /// Firefox
    Firefox,
    /// WebKit
    Webkit,
}

impl BrowserEngine {
    /// Engine name as accepted by `BROWSER`
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chromium => "chromium",
            Self::Firefox => "firefox",
            Self::Webkit => "webkit",
        }
    }
}

impl fmt::Display for BrowserEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Args)]
pub struct RunConfig {
    /// Browser engine to drive
    #[arg(long, env = "BROWSER", value_enum, default_value_t = BrowserEngine::Chromium)]
    pub browser: BrowserEngine,

    /// Run without a visible window
    #[arg(long, env = "HEADLESS", default_value_t = true, action = ArgAction::Set)]
    pub headless: bool,

    /// Storefront root URL
    #[arg(long, env = "BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Capture a full-page screenshot when a scenario fails
    #[arg(long, env = "SCREENSHOT_ON_FAILURE", default_value_t = false, action = ArgAction::Set)]
    pub screenshot_on_failure: bool,

    /// Save a frame after every navigation-level action
    #[arg(long, env = "RECORD_VIDEO", default_value_t = false, action = ArgAction::Set)]
    pub record_video: bool,

    /// Directory holding `<category>List.json` fixtures
    #[arg(long, env = "FIXTURE_DIR", default_value = DEFAULT_FIXTURE_DIR)]
    pub fixture_dir: PathBuf,

    /// Directory for screenshots, frames and reports
    #[arg(long, env = "ARTIFACT_DIR", default_value = DEFAULT_ARTIFACT_DIR)]
    pub artifact_dir: PathBuf,

    /// Chromium executable override
    #[arg(long, env = "CHROMIUM_PATH")]
    pub chromium_path: Option<String>,
}

#[derive(Debug, Parser)]
#[command(name = "storecheck", no_binary_name = true)]
struct EnvOnly {
    #[command(flatten)]
    config: RunConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            browser: BrowserEngine::Chromium,
            headless: true,
            base_url: DEFAULT_BASE_URL.to_string(),
            screenshot_on_failure: false,
            record_video: false,
            fixture_dir: PathBuf::from(DEFAULT_FIXTURE_DIR),
            artifact_dir: PathBuf::from(DEFAULT_ARTIFACT_DIR),
            chromium_path: None,
        }
    }
}

impl RunConfig {
    /// Create config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the config from environment variables only
    ///
    /// # Errors
    ///
    /// Returns error if a variable holds an unparseable value
    pub fn from_env() -> StoreResult<Self> {
        EnvOnly::try_parse_from(std::iter::empty::<String>())
            .map(|parsed| parsed.config)
            .map_err(|e| StoreError::Config {
                message: e.to_string(),
            })
    }

    /// Set the browser engine
    #[must_use]
    pub const fn with_browser(mut self, browser: BrowserEngine) -> Self {
        self.browser = browser;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set the storefront URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Enable screenshots on failure
    #[must_use]
    pub const fn with_screenshot_on_failure(mut self, enabled: bool) -> Self {
        self.screenshot_on_failure = enabled;
        self
    }

    /// Enable frame recording
    #[must_use]
    pub const fn with_record_video(mut self, enabled: bool) -> Self {
        self.record_video = enabled;
        self
    }

    /// Set the fixture directory
    #[must_use]
    pub fn with_fixture_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fixture_dir = dir.into();
        self
    }

    /// Set the artifact directory
    #[must_use]
    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = dir.into();
        self
    }

    /// Directory for failure screenshots
    #[must_use]
    pub fn screenshot_dir(&self) -> PathBuf {
        self.artifact_dir.join("screenshots")
    }

    /// Directory for recorded frames
    #[must_use]
    pub fn video_dir(&self) -> PathBuf {
        self.artifact_dir.join("video")
    }

    /// Fixture directory
    #[must_use]
    pub fn fixture_dir(&self) -> &Path {
        &self.fixture_dir
    }
}

/// Poll interval for element waits
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Wait budgets used by the page objects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// First product card to render
    pub list: Duration,
    /// A single name link or price text
    pub element: Duration,
    /// A single product card
    pub card: Duration,
    /// Page navigation
    pub navigation: Duration,
    /// Network-idle waits
    pub network_idle: Duration,
    /// Currency control to appear
    pub currency_control: Duration,
    /// Currency options to close
    pub currency_close: Duration,
    /// Pause after pagination clicks
    pub page_settle: Duration,
    /// Pause after opening a menu
    pub menu_settle: Duration,
    /// Pause after switching currency
    pub currency_settle: Duration,
    /// Per-scenario cleanup bound
    pub cleanup: Duration,
    /// Poll interval for waits
    pub poll_interval: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            list: Duration::from_secs(10),
            element: Duration::from_secs(3),
            card: Duration::from_secs(5),
            navigation: Duration::from_secs(30),
            network_idle: Duration::from_secs(10),
            currency_control: Duration::from_secs(10),
            currency_close: Duration::from_secs(5),
            page_settle: Duration::from_secs(2),
            menu_settle: Duration::from_secs(1),
            currency_settle: Duration::from_millis(1500),
            cleanup: Duration::from_secs(10),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl Timeouts {
    /// Zero waits and pauses, for drivers whose DOM never changes on its own
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            list: Duration::ZERO,
            element: Duration::ZERO,
            card: Duration::ZERO,
            navigation: Duration::ZERO,
            network_idle: Duration::ZERO,
            currency_control: Duration::ZERO,
            currency_close: Duration::ZERO,
            page_settle: Duration::ZERO,
            menu_settle: Duration::ZERO,
            currency_settle: Duration::ZERO,
            cleanup: Duration::from_secs(1),
            poll_interval: Duration::from_millis(1),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod run_config_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let config = RunConfig::default();
            assert_eq!(config.browser, BrowserEngine::Chromium);
            assert!(config.headless);
            assert_eq!(config.base_url, DEFAULT_BASE_URL);
            assert!(!config.screenshot_on_failure);
            assert_eq!(config.fixture_dir(), Path::new("test-data"));
        }

        #[test]
        fn test_builder() {
            let config = RunConfig::new()
                .with_browser(BrowserEngine::Firefox)
                .with_headless(false)
                .with_base_url("https://opencart.abstracta.us")
                .with_screenshot_on_failure(true)
                .with_artifact_dir("/tmp/out");
            assert_eq!(config.browser, BrowserEngine::Firefox);
            assert!(!config.headless);
            assert_eq!(config.base_url, "https://opencart.abstracta.us");
            assert_eq!(config.screenshot_dir(), PathBuf::from("/tmp/out/screenshots"));
            assert_eq!(config.video_dir(), PathBuf::from("/tmp/out/video"));
        }

        #[test]
        fn test_args_parse_flags() {
            let parsed = EnvOnly::try_parse_from([
                "--browser",
                "webkit",
                "--headless",
                "false",
                "--base-url",
                "http://localhost:8080",
            ])
            .unwrap();
            assert_eq!(parsed.config.browser, BrowserEngine::Webkit);
            assert!(!parsed.config.headless);
            assert_eq!(parsed.config.base_url, "http://localhost:8080");
        }

        #[test]
        fn test_args_reject_unknown_engine() {
            assert!(EnvOnly::try_parse_from(["--browser", "lynx"]).is_err());
        }

        #[test]
        fn test_engine_display() {
            assert_eq!(BrowserEngine::Webkit.to_string(), "webkit");
        }
    }

    mod timeouts_tests {
        use super::*;

        #[test]
        fn test_default_budgets() {
            let t = Timeouts::default();
            assert_eq!(t.list, Duration::from_secs(10));
            assert_eq!(t.element, Duration::from_secs(3));
            assert_eq!(t.card, Duration::from_secs(5));
            assert_eq!(t.page_settle, Duration::from_secs(2));
            assert_eq!(t.cleanup, Duration::from_secs(10));
        }

        #[test]
        fn test_immediate_has_no_pauses() {
            let t = Timeouts::immediate();
            assert!(t.list.is_zero());
            assert!(t.page_settle.is_zero());
            assert!(!t.cleanup.is_zero());
        }
    }
}
