//! Chrome DevTools Protocol driver.
//!
//! Implements [`StoreDriver`] with chromiumoxide. Element lookups run the
//! JavaScript compiled from a [`Selector`]; clicks and hovers are dispatched as
//! real mouse events at the element's centre. Load waits after a click hold
//! until the clicked document is gone or the click proves non-navigating.

use crate::config::{BrowserEngine, RunConfig};
use crate::driver::{LoadState, ScrollPosition, StoreDriver, NETWORK_IDLE_THRESHOLD_MS};
use crate::locator::Selector;
use crate::result::{StoreError, StoreResult};
use crate::session::DriverLauncher;
use async_trait::async_trait;
use base64::Engine as _;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, CaptureScreenshotParams};
use chromiumoxide::layout::Point;
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Browser window size
pub const WINDOW_SIZE: (u32, u32) = (1920, 1080);

const LOAD_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long a clicked document may linger before the click counts as
/// non-navigating
const NAVIGATION_GRACE: Duration = Duration::from_millis(1000);

const CLICK_MARKER: &str = "(window.__storecheckClick = true, true)";

const LOAD_SNAPSHOT: &str = "({ready: document.readyState, \
     resources: performance.getEntriesByType('resource').length, \
     marked: window.__storecheckClick === true})";

#[derive(Debug, Deserialize)]
struct LoadSnapshot {
    ready: String,
    resources: usize,
    #[serde(default)]
    marked: bool,
}

/// Readiness bookkeeping for one load wait.
///
/// A click marks the document before it is dispatched. While the marked
/// document is still showing within [`NAVIGATION_GRACE`], the navigation has
/// not committed yet and the page is not ready. A failed snapshot means the
/// document is being replaced.
#[derive(Debug)]
struct LoadTracker {
    state: LoadState,
    clicked_at: Option<Instant>,
    last_resources: Option<usize>,
    quiet_since: Instant,
}

impl LoadTracker {
    fn new(state: LoadState, clicked_at: Option<Instant>, now: Instant) -> Self {
        Self {
            state,
            clicked_at,
            last_resources: None,
            quiet_since: now,
        }
    }

    fn observe(&mut self, snapshot: Option<&LoadSnapshot>, now: Instant) -> bool {
        let Some(snapshot) = snapshot else {
            self.last_resources = None;
            self.quiet_since = now;
            return false;
        };
        let awaiting_navigation = snapshot.marked
            && self
                .clicked_at
                .is_some_and(|at| now.saturating_duration_since(at) < NAVIGATION_GRACE);
        if awaiting_navigation {
            self.quiet_since = now;
            return false;
        }
        match self.state {
            LoadState::DomContentLoaded => snapshot.ready != "loading",
            LoadState::Load => snapshot.ready == "complete",
            LoadState::NetworkIdle => {
                if self.last_resources != Some(snapshot.resources) {
                    self.last_resources = Some(snapshot.resources);
                    self.quiet_since = now;
                }
                snapshot.ready == "complete"
                    && now.saturating_duration_since(self.quiet_since)
                        >= Duration::from_millis(NETWORK_IDLE_THRESHOLD_MS)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct Center {
    x: f64,
    y: f64,
}

fn page_error(e: impl std::fmt::Display) -> StoreError {
    StoreError::page(e.to_string())
}

fn script_error(e: impl std::fmt::Display) -> StoreError {
    StoreError::script(e.to_string())
}

/// Numbered PNG frames written after navigation-level actions
#[derive(Debug)]
struct FrameRecorder {
    dir: PathBuf,
    next: AtomicUsize,
}

impl FrameRecorder {
    fn path(&self) -> PathBuf {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        self.dir.join(format!("frame-{n:05}.png"))
    }
}

/// A Chromium tab driven over CDP
#[derive(Debug)]
pub struct CdpDriver {
    browser: Mutex<Option<CdpBrowser>>,
    page: CdpPage,
    handle: tokio::task::JoinHandle<()>,
    frames: Option<FrameRecorder>,
    clicked_at: Mutex<Option<Instant>>,
}

impl CdpDriver {
    /// Launch Chromium and open a blank tab
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedEngine` for engines other than Chromium, or
    /// `BrowserLaunchError` if the browser cannot start
    pub async fn launch(config: &RunConfig) -> StoreResult<Self> {
        if config.browser != BrowserEngine::Chromium {
            return Err(StoreError::UnsupportedEngine {
                engine: config.browser.to_string(),
            });
        }

        let (width, height) = WINDOW_SIZE;
        let mut builder = CdpConfig::builder()
            .window_size(width, height)
            .viewport(None)
            .no_sandbox()
            .arg("--disable-dev-shm-usage");

        if !config.headless {
            builder = builder.with_head();
        }

        if let Some(ref path) = config.chromium_path {
            builder = builder.chrome_executable(path);
        }

        let cdp_config = builder
            .build()
            .map_err(|e| StoreError::BrowserLaunchError { message: e })?;

        let (browser, mut handler) = CdpBrowser::launch(cdp_config).await.map_err(|e| {
            StoreError::BrowserLaunchError {
                message: e.to_string(),
            }
        })?;

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| StoreError::BrowserLaunchError {
                message: e.to_string(),
            })?;

        let frames = config.record_video.then(|| FrameRecorder {
            dir: config.video_dir(),
            next: AtomicUsize::new(0),
        });

        info!(headless = config.headless, "Chromium started");
        Ok(Self {
            browser: Mutex::new(Some(browser)),
            page,
            handle,
            frames,
            clicked_at: Mutex::new(None),
        })
    }

    /// Evaluate `expr` and decode its JSON-serialised value
    async fn eval<T: DeserializeOwned>(&self, expr: &str) -> StoreResult<T> {
        let json: String = self
            .page
            .evaluate(format!("JSON.stringify({expr})"))
            .await
            .map_err(script_error)?
            .into_value()
            .map_err(script_error)?;
        Ok(serde_json::from_str(&json)?)
    }

    async fn center(&self, selector: &Selector) -> StoreResult<Point> {
        let center: Option<Center> = self.eval(&selector.to_center_query()).await?;
        center
            .map(|c| Point::new(c.x, c.y))
            .ok_or_else(|| StoreError::ElementNotFound {
                selector: selector.to_string(),
            })
    }

    async fn capture(&self, full_page: bool) -> StoreResult<Vec<u8>> {
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .capture_beyond_viewport(full_page)
            .build();

        let screenshot = self
            .page
            .execute(params)
            .await
            .map_err(|e| StoreError::ScreenshotError {
                message: e.to_string(),
            })?;

        base64::engine::general_purpose::STANDARD
            .decode(&screenshot.data)
            .map_err(|e| StoreError::ScreenshotError {
                message: e.to_string(),
            })
    }

    /// Save a frame when recording; failures only warn
    async fn record_frame(&self) {
        let Some(frames) = &self.frames else {
            return;
        };
        let saved = async {
            let bytes = self.capture(false).await?;
            tokio::fs::create_dir_all(&frames.dir).await?;
            let path = frames.path();
            tokio::fs::write(&path, bytes).await?;
            Ok::<_, StoreError>(path)
        }
        .await;
        match saved {
            Ok(path) => debug!(path = %path.display(), "Recorded frame"),
            Err(e) => warn!(error = %e, "Could not record frame"),
        }
    }

    async fn wait_until_idle(&self, state: LoadState, timeout: Duration) -> StoreResult<()> {
        let clicked_at = self.clicked_at.lock().await.take();
        let started = Instant::now();
        let mut tracker = LoadTracker::new(state, clicked_at, started);
        loop {
            let snapshot = match self.eval::<LoadSnapshot>(LOAD_SNAPSHOT).await {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    debug!(error = %e, "Load snapshot failed, document is changing");
                    None
                }
            };
            if tracker.observe(snapshot.as_ref(), Instant::now()) {
                return Ok(());
            }
            if started.elapsed() >= timeout {
                return Err(StoreError::timeout(timeout));
            }
            tokio::time::sleep(LOAD_POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl StoreDriver for CdpDriver {
    async fn goto(&self, url: &str) -> StoreResult<()> {
        debug!(%url, "goto");
        self.page
            .goto(url)
            .await
            .map_err(|e| StoreError::NavigationError {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        self.record_frame().await;
        Ok(())
    }

    async fn wait_for_load(&self, state: LoadState, timeout: Duration) -> StoreResult<()> {
        self.wait_until_idle(state, timeout).await
    }

    async fn reload(&self) -> StoreResult<()> {
        self.page.reload().await.map_err(page_error)?;
        self.record_frame().await;
        Ok(())
    }

    async fn go_back(&self) -> StoreResult<()> {
        self.page
            .evaluate("history.back()")
            .await
            .map_err(script_error)?;
        self.page.wait_for_navigation().await.map_err(page_error)?;
        self.record_frame().await;
        Ok(())
    }

    async fn current_url(&self) -> StoreResult<String> {
        Ok(self
            .page
            .url()
            .await
            .map_err(page_error)?
            .unwrap_or_default())
    }

    async fn title(&self) -> StoreResult<String> {
        Ok(self
            .page
            .get_title()
            .await
            .map_err(page_error)?
            .unwrap_or_default())
    }

    async fn count(&self, selector: &Selector) -> StoreResult<usize> {
        self.eval(&selector.to_count_query()).await
    }

    async fn text_contents(&self, selector: &Selector) -> StoreResult<Vec<String>> {
        self.eval(&selector.to_texts_query()).await
    }

    async fn is_visible(&self, selector: &Selector) -> StoreResult<bool> {
        self.eval(&selector.to_visible_query()).await
    }

    async fn click(&self, selector: &Selector) -> StoreResult<()> {
        debug!(%selector, "click");
        let point = self.center(selector).await?;
        let _: bool = self.eval(CLICK_MARKER).await?;
        self.page.click(point).await.map_err(page_error)?;
        *self.clicked_at.lock().await = Some(Instant::now());
        self.record_frame().await;
        Ok(())
    }

    async fn dom_click(&self, selector: &Selector) -> StoreResult<()> {
        debug!(%selector, "dom click");
        let _: bool = self.eval(CLICK_MARKER).await?;
        let clicked: bool = self.eval(&selector.to_dom_click_query()).await?;
        if !clicked {
            return Err(StoreError::ElementNotFound {
                selector: selector.to_string(),
            });
        }
        *self.clicked_at.lock().await = Some(Instant::now());
        self.record_frame().await;
        Ok(())
    }

    async fn hover(&self, selector: &Selector) -> StoreResult<()> {
        debug!(%selector, "hover");
        let point = self.center(selector).await?;
        self.page.move_mouse(point).await.map_err(page_error)?;
        Ok(())
    }

    async fn select_option(&self, selector: &Selector, value: &str) -> StoreResult<()> {
        let selected: bool = self.eval(&selector.to_select_query(value)).await?;
        if !selected {
            return Err(StoreError::ElementNotFound {
                selector: selector.to_string(),
            });
        }
        Ok(())
    }

    async fn scroll_to(&self, position: ScrollPosition) -> StoreResult<()> {
        let script = match position {
            ScrollPosition::Top => "(window.scrollTo(0, 0), true)",
            ScrollPosition::Bottom => "(window.scrollTo(0, document.body.scrollHeight), true)",
        };
        let _: bool = self.eval(script).await?;
        Ok(())
    }

    async fn screenshot(&self) -> StoreResult<Vec<u8>> {
        self.capture(true).await
    }

    async fn close(&self) -> StoreResult<()> {
        let Some(mut browser) = self.browser.lock().await.take() else {
            return Ok(());
        };
        let closed = browser.close().await;
        if let Err(e) = browser.wait().await {
            debug!(error = %e, "Browser process did not exit cleanly");
        }
        self.handle.abort();
        closed.map(|_| ()).map_err(|e| StoreError::BrowserLaunchError {
            message: e.to_string(),
        })
    }
}

/// Launches [`CdpDriver`] tabs
#[derive(Debug, Clone, Copy, Default)]
pub struct CdpLauncher;

#[async_trait]
impl DriverLauncher for CdpLauncher {
    async fn launch(&self, config: &RunConfig) -> StoreResult<Arc<dyn StoreDriver>> {
        Ok(Arc::new(CdpDriver::launch(config).await?))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_only_chromium_launches() {
        for engine in [BrowserEngine::Firefox, BrowserEngine::Webkit] {
            let config = RunConfig::default().with_browser(engine);
            let err = CdpDriver::launch(&config).await.unwrap_err();
            assert!(
                matches!(err, StoreError::UnsupportedEngine { ref engine } if engine != "chromium"),
                "{err}"
            );
        }
    }

    #[test]
    fn test_frame_names() {
        let frames = FrameRecorder {
            dir: PathBuf::from("test-results/video"),
            next: AtomicUsize::new(0),
        };
        assert_eq!(frames.path(), PathBuf::from("test-results/video/frame-00000.png"));
        assert_eq!(frames.path(), PathBuf::from("test-results/video/frame-00001.png"));
    }

    #[test]
    fn test_snapshot_decodes() {
        let snapshot: LoadSnapshot = serde_json::from_str(r#"{"ready":"complete","resources":12}"#).unwrap();
        assert_eq!(snapshot.ready, "complete");
        assert_eq!(snapshot.resources, 12);
        assert!(!snapshot.marked);
        let center: Option<Center> = serde_json::from_str("null").unwrap();
        assert!(center.is_none());
    }

    #[test]
    fn test_snapshot_is_a_plain_expression() {
        assert!(!LOAD_SNAPSHOT.contains("JSON.stringify"));
        assert!(LOAD_SNAPSHOT.contains("__storecheckClick"));
        assert!(CLICK_MARKER.contains("__storecheckClick"));
    }

    mod load_tracker_tests {
        use super::*;

        fn snapshot(ready: &str, resources: usize, marked: bool) -> LoadSnapshot {
            LoadSnapshot {
                ready: ready.to_string(),
                resources,
                marked,
            }
        }

        #[test]
        fn test_failed_snapshot_is_not_ready() {
            let t0 = Instant::now();
            let mut tracker = LoadTracker::new(LoadState::Load, None, t0);
            assert!(!tracker.observe(None, t0));
            assert!(tracker.observe(Some(&snapshot("complete", 3, false)), t0 + Duration::from_millis(100)));
        }

        #[test]
        fn test_marked_document_waits_for_navigation() {
            let t0 = Instant::now();
            let mut tracker = LoadTracker::new(LoadState::Load, Some(t0), t0);
            let old = snapshot("complete", 3, true);
            assert!(!tracker.observe(Some(&old), t0 + Duration::from_millis(200)));
            assert!(!tracker.observe(None, t0 + Duration::from_millis(300)));
            let fresh = snapshot("complete", 5, false);
            assert!(tracker.observe(Some(&fresh), t0 + Duration::from_millis(400)));
        }

        #[test]
        fn test_non_navigating_click_ready_after_grace() {
            let t0 = Instant::now();
            let mut tracker = LoadTracker::new(LoadState::Load, Some(t0), t0);
            let same = snapshot("complete", 3, true);
            assert!(!tracker.observe(Some(&same), t0 + Duration::from_millis(500)));
            assert!(tracker.observe(Some(&same), t0 + NAVIGATION_GRACE));
        }

        #[test]
        fn test_network_idle_quiet_window_restarts_after_navigation() {
            let t0 = Instant::now();
            let quiet = Duration::from_millis(NETWORK_IDLE_THRESHOLD_MS);
            let mut tracker = LoadTracker::new(LoadState::NetworkIdle, Some(t0), t0);
            let old = snapshot("complete", 3, true);
            assert!(!tracker.observe(Some(&old), t0 + quiet));
            let fresh = snapshot("complete", 8, false);
            let t1 = t0 + quiet + Duration::from_millis(100);
            assert!(!tracker.observe(Some(&fresh), t1));
            assert!(!tracker.observe(Some(&fresh), t1 + quiet / 2));
            assert!(tracker.observe(Some(&fresh), t1 + quiet));
        }

        #[test]
        fn test_dom_content_loaded() {
            let t0 = Instant::now();
            let mut tracker = LoadTracker::new(LoadState::DomContentLoaded, None, t0);
            assert!(!tracker.observe(Some(&snapshot("loading", 0, false)), t0));
            assert!(tracker.observe(Some(&snapshot("interactive", 0, false)), t0));
        }
    }
}
