//! Shared headless Chromium driven over the DevTools protocol.

use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::fetch::{
    EnableParams, EventRequestPaused, FailRequestParams, RequestPattern,
};
use chromiumoxide::cdp::browser_protocol::network::{
    ErrorReason, ResourceType, SetUserAgentOverrideParams,
};
use chromiumoxide::{Browser, BrowserConfig as CdpConfig, Page};
use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{BrowserError, LoadedPage, PageSource};
use crate::config::BrowserConfig;

/// Reads the live `currentSrc` of the first video, which the serialized DOM
/// does not carry for MSE/blob players.
const MEDIA_SRC_SCRIPT: &str = r#"
(() => {
    const v = document.querySelector('video');
    if (!v) return null;
    return v.currentSrc || v.src || null;
})()
"#;

struct Running {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl Running {
    /// The handler task ends when the CDP connection drops or Chrome dies.
    fn is_alive(&self) -> bool {
        !self.handler.is_finished()
    }
}

/// Runs a cleanup future exactly once: through [`Cleanup::run`], or on a
/// spawned task if dropped first, as happens when a load is cancelled by a
/// timeout or a disconnected client.
pub(crate) struct Cleanup {
    pending: Option<BoxFuture<'static, ()>>,
}

impl Cleanup {
    pub(crate) fn new<F>(cleanup: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            pending: Some(cleanup.boxed()),
        }
    }

    pub(crate) async fn run(mut self) {
        if let Some(cleanup) = self.pending.as_mut() {
            cleanup.await;
        }
        self.pending = None;
    }
}

impl Drop for Cleanup {
    fn drop(&mut self) {
        let Some(cleanup) = self.pending.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(cleanup);
            }
            Err(_) => warn!("No runtime left to run browser cleanup"),
        }
    }
}

/// Aborts the request-interception task when dropped.
struct Interceptor(JoinHandle<()>);

impl Drop for Interceptor {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Error for a failed CDP call on the shared connection. A dead connection
/// counts as a launch failure so callers retry and the next launch replaces
/// the browser.
fn connection_error(error: impl Display, connection_lost: bool) -> BrowserError {
    if connection_lost {
        BrowserError::Launch(format!("browser connection lost: {}", error))
    } else {
        BrowserError::Protocol(error.to_string())
    }
}

/// One browser process shared by every page load.
///
/// The process is started lazily on first use and lives until
/// [`ChromiumBrowser::shutdown`]. Each [`PageSource::load`] opens its own
/// tab and always closes it before returning.
pub struct ChromiumBrowser {
    config: BrowserConfig,
    inner: RwLock<Option<Running>>,
    closed: AtomicBool,
}

impl ChromiumBrowser {
    pub fn new(config: BrowserConfig) -> Self {
        Self {
            config,
            inner: RwLock::new(None),
            closed: AtomicBool::new(false),
        }
    }

    /// Start (or connect to) the browser if it is not running yet, or
    /// replace it if its connection has died.
    pub async fn launch(&self) -> Result<(), BrowserError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BrowserError::ShutDown);
        }
        if self.inner.read().await.as_ref().is_some_and(Running::is_alive) {
            return Ok(());
        }

        let mut guard = self.inner.write().await;
        // Another task may have won the race while we waited for the lock.
        if guard.as_ref().is_some_and(Running::is_alive) {
            return Ok(());
        }
        if let Some(mut dead) = guard.take() {
            warn!("Browser connection lost, relaunching");
            dead.handler.abort();
            let _ = dead.browser.kill().await;
        }

        let (browser, mut handler) = match &self.config.remote_url {
            Some(remote) => connect_remote(remote).await?,
            None => {
                info!(headless = self.config.headless, "Launching browser");
                Browser::launch(self.cdp_config()?)
                    .await
                    .map_err(|e| BrowserError::Launch(e.to_string()))?
            }
        };

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        *guard = Some(Running { browser, handler });
        Ok(())
    }

    /// Close the browser process. Later loads fail with
    /// [`BrowserError::ShutDown`].
    pub async fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let Some(mut running) = self.inner.write().await.take() else {
            return;
        };
        if let Err(e) = running.browser.close().await {
            warn!(error = %e, "Browser did not close cleanly");
        }
        running.handler.abort();
        info!("Browser shut down");
    }

    fn cdp_config(&self) -> Result<CdpConfig, BrowserError> {
        let mut builder = CdpConfig::builder()
            .window_size(self.config.viewport_width, self.config.viewport_height)
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run");

        if !self.config.headless {
            builder = builder.with_head();
        }
        if let Some(ref path) = self.config.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        for arg in &self.config.chrome_args {
            builder = builder.arg(arg);
        }

        builder.build().map_err(BrowserError::Launch)
    }

    async fn open_page(&self) -> Result<Page, BrowserError> {
        self.launch().await?;
        let guard = self.inner.read().await;
        let running = guard.as_ref().ok_or(BrowserError::ShutDown)?;
        running
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| connection_error(e, !running.is_alive()))
    }

    /// Run `f` against a fresh tab, closing the tab on every exit path,
    /// including cancellation of the returned future.
    pub async fn with_page<T, F, Fut>(&self, f: F) -> Result<T, BrowserError>
    where
        F: FnOnce(Page) -> Fut,
        Fut: Future<Output = Result<T, BrowserError>>,
    {
        let page = self.open_page().await?;
        let tab = page.clone();
        let close = Cleanup::new(async move {
            if let Err(e) = tab.close().await {
                debug!(error = %e, "Failed to close page");
            }
        });
        let result = f(page).await;
        close.run().await;
        result
    }

    /// Bound one browser step by the navigation timeout.
    async fn bounded<T, Fut>(&self, url: &str, step: Fut) -> Result<T, BrowserError>
    where
        Fut: Future<Output = Result<T, BrowserError>>,
    {
        let secs = self.config.navigation_timeout_secs;
        tokio::time::timeout(Duration::from_secs(secs), step)
            .await
            .map_err(|_| BrowserError::Timeout {
                url: url.to_string(),
                secs,
            })?
    }

    /// Apply user agent, viewport and resource blocking to a fresh tab.
    ///
    /// The returned interceptor, if any, must outlive the navigation.
    async fn prepare(&self, page: &Page) -> Result<Option<Interceptor>, BrowserError> {
        page.execute(SetUserAgentOverrideParams::new(
            self.config.user_agent.clone(),
        ))
        .await
        .map_err(|e| BrowserError::Protocol(e.to_string()))?;

        page.execute(SetDeviceMetricsOverrideParams::new(
            i64::from(self.config.viewport_width),
            i64::from(self.config.viewport_height),
            1.0,
            false,
        ))
        .await
        .map_err(|e| BrowserError::Protocol(e.to_string()))?;

        if !self.config.block_resources {
            return Ok(None);
        }
        self.block_images_and_fonts(page).await.map(Some)
    }

    /// Pause image and font requests and fail them. Only those resource
    /// types are intercepted, so every paused request is aborted.
    async fn block_images_and_fonts(&self, page: &Page) -> Result<Interceptor, BrowserError> {
        let mut paused = page
            .event_listener::<EventRequestPaused>()
            .await
            .map_err(|e| BrowserError::Protocol(e.to_string()))?;

        let enable = EnableParams::builder()
            .pattern(RequestPattern::builder().resource_type(ResourceType::Image).build())
            .pattern(RequestPattern::builder().resource_type(ResourceType::Font).build())
            .build();
        page.execute(enable)
            .await
            .map_err(|e| BrowserError::Protocol(e.to_string()))?;

        let tab = page.clone();
        let task = tokio::spawn(async move {
            while let Some(event) = paused.next().await {
                let fail = FailRequestParams::new(
                    event.request_id.clone(),
                    ErrorReason::BlockedByClient,
                );
                if tab.execute(fail).await.is_err() {
                    break;
                }
            }
        });
        Ok(Interceptor(task))
    }

    async fn visit(&self, page: &Page, url: &str) -> Result<LoadedPage, BrowserError> {
        let _interceptor = self.bounded(url, self.prepare(page)).await?;

        debug!(url = url, "Navigating");
        self.bounded(url, async {
            page.goto(url)
                .await
                .map(|_| ())
                .map_err(|e| BrowserError::Navigation(e.to_string()))
        })
        .await?;

        tokio::time::sleep(Duration::from_millis(self.config.settle_delay_ms)).await;

        let (final_url, html) = self
            .bounded(url, async {
                let final_url = page
                    .url()
                    .await
                    .ok()
                    .flatten()
                    .unwrap_or_else(|| url.to_string());
                let html = page
                    .content()
                    .await
                    .map_err(|e| BrowserError::Protocol(e.to_string()))?;
                Ok((final_url, html))
            })
            .await?;

        let probe = self.bounded(url, async {
            page.evaluate(MEDIA_SRC_SCRIPT)
                .await
                .map_err(|e| BrowserError::Protocol(e.to_string()))
        });
        let media_src = match probe.await {
            Ok(result) => result
                .into_value::<Option<String>>()
                .ok()
                .flatten()
                .filter(|s| !s.is_empty()),
            Err(e) => {
                debug!(error = %e, "Media probe script failed");
                None
            }
        };

        Ok(LoadedPage {
            requested_url: url.to_string(),
            final_url,
            html,
            media_src,
        })
    }
}

#[async_trait]
impl PageSource for ChromiumBrowser {
    fn name(&self) -> &str {
        "chromium"
    }

    async fn load(&self, url: &str) -> Result<LoadedPage, BrowserError> {
        self.with_page(|page| async move { self.visit(&page, url).await })
            .await
    }
}

/// Attach to an already running browser through its DevTools endpoint.
async fn connect_remote(
    url: &str,
) -> Result<(Browser, chromiumoxide::Handler), BrowserError> {
    info!(url = url, "Connecting to remote browser");

    let http_url = url
        .replace("ws://", "http://")
        .replace("wss://", "https://");
    let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

    let version: serde_json::Value = reqwest::get(&version_url)
        .await
        .map_err(|e| BrowserError::Launch(format!("remote browser unreachable: {}", e)))?
        .json()
        .await
        .map_err(|e| BrowserError::Launch(format!("invalid version response: {}", e)))?;

    let ws_url = version
        .get("webSocketDebuggerUrl")
        .and_then(|v| v.as_str())
        .ok_or_else(|| BrowserError::Launch("no webSocketDebuggerUrl in response".into()))?;

    Browser::connect(ws_url)
        .await
        .map_err(|e| BrowserError::Launch(e.to_string()))
}
