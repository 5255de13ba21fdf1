//! Chrome-backed renderer
//!
//! `headless_chrome` is synchronous, so each render runs on the blocking pool.
//! The `Browser` value owns the Chrome process and kills it on drop; it is
//! created and dropped inside the blocking closure, so the process is released
//! on every exit path including early returns through `?`.
//!
//! Every blocking step draws its timeout from one render deadline, so the
//! blocking side gives up at about the same moment the async caller stops
//! waiting for it.

use crate::fetch::render::{RenderError, RenderRequest, RenderedPage, Renderer};
use async_trait::async_trait;
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::time::{Duration, Instant};

/// The network counts as idle once no new resource has loaded for this long
const NETWORK_QUIET: Duration = Duration::from_millis(500);

/// Upper bound on waiting for the network to go quiet
const MAX_IDLE_WAIT: Duration = Duration::from_secs(10);

const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Resource count once the document has loaded, -1 while it is still loading
const RESOURCE_COUNT_JS: &str =
    "document.readyState === 'complete' ? performance.getEntriesByType('resource').length : -1";

/// Launches a fresh headless Chrome per render
#[derive(Debug, Clone, Default)]
pub struct ChromeRenderer {
    sandbox: bool,
}

impl ChromeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables the Chrome sandbox (off by default for container use)
    pub fn with_sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }
}

#[async_trait]
impl Renderer for ChromeRenderer {
    async fn render(&self, request: &RenderRequest) -> Result<RenderedPage, RenderError> {
        let request = request.clone();
        let sandbox = self.sandbox;

        tokio::task::spawn_blocking(move || render_blocking(&request, sandbox))
            .await
            .map_err(|e| RenderError::Launch(format!("render task aborted: {}", e)))?
    }
}

fn render_blocking(request: &RenderRequest, sandbox: bool) -> Result<RenderedPage, RenderError> {
    let deadline = Instant::now() + request.timeout;
    let args = vec![
        OsStr::new("--disable-blink-features=AutomationControlled"),
        OsStr::new("--no-first-run"),
        OsStr::new("--no-default-browser-check"),
        OsStr::new("--disable-extensions"),
        OsStr::new("--mute-audio"),
    ];

    let options = LaunchOptions::default_builder()
        .headless(true)
        .sandbox(sandbox)
        .window_size(Some((1920, 1080)))
        .idle_browser_timeout(request.timeout)
        .proxy_server(request.proxy_server.as_deref())
        .args(args)
        .build()
        .map_err(|e| RenderError::Launch(e.to_string()))?;

    let browser = Browser::new(options).map_err(|e| RenderError::Launch(e.to_string()))?;
    let tab = browser
        .new_tab()
        .map_err(|e| RenderError::Launch(e.to_string()))?;

    if let Some(user_agent) = &request.user_agent {
        tab.set_user_agent(user_agent, Some("en-US,en;q=0.9"), None)
            .map_err(|e| RenderError::Launch(e.to_string()))?;
    }

    tab.set_default_timeout(remaining(deadline, request.timeout)?);
    tab.navigate_to(&request.url)
        .and_then(|tab| tab.wait_until_navigated())
        .map_err(|e| RenderError::Navigation(e.to_string()))?;

    wait_for_network_idle(&tab, deadline);

    if let Some(selector) = &request.wait_for {
        let budget = remaining(deadline, request.timeout)?;
        tab.wait_for_element_with_custom_timeout(selector, budget)
            .map_err(|_| RenderError::SelectorTimeout(selector.clone()))?;
    }

    tab.set_default_timeout(remaining(deadline, request.timeout)?);
    let script_result = match &request.script {
        Some(script) => tab
            .evaluate(script, true)
            .map_err(|e| RenderError::Script(e.to_string()))?
            .value,
        None => None,
    };

    let html = tab
        .get_content()
        .map_err(|e| RenderError::Capture(e.to_string()))?;

    let screenshot = if request.screenshot {
        Some(
            tab.capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
                .map_err(|e| RenderError::Capture(e.to_string()))?,
        )
    } else {
        None
    };

    Ok(RenderedPage {
        html,
        script_result,
        screenshot,
    })
}

/// Time left before `deadline`, or a deadline error once it has passed
fn remaining(deadline: Instant, total: Duration) -> Result<Duration, RenderError> {
    deadline
        .checked_duration_since(Instant::now())
        .filter(|left| !left.is_zero())
        .ok_or(RenderError::Deadline(total))
}

/// Polls until the document has loaded and no new resource has appeared for
/// [`NETWORK_QUIET`]
///
/// Gives up quietly at [`MAX_IDLE_WAIT`] or the render deadline, whichever
/// comes first; pages with long-polling never go fully idle.
fn wait_for_network_idle(tab: &Tab, deadline: Instant) {
    let stop = deadline.min(Instant::now() + MAX_IDLE_WAIT);
    let mut tracker = QuietTracker::new(NETWORK_QUIET);

    while Instant::now() < stop {
        let count = tab
            .evaluate(RESOURCE_COUNT_JS, false)
            .ok()
            .and_then(|result| result.value)
            .and_then(|value| value.as_i64());

        if tracker.observe(count, Instant::now()) {
            return;
        }
        std::thread::sleep(IDLE_POLL_INTERVAL);
    }

    tracing::debug!("Network never went idle, capturing anyway");
}

/// Tracks how long a loaded page's resource count has stayed unchanged
#[derive(Debug)]
struct QuietTracker {
    quiet_for: Duration,
    last_count: Option<i64>,
    stable_since: Option<Instant>,
}

impl QuietTracker {
    fn new(quiet_for: Duration) -> Self {
        Self {
            quiet_for,
            last_count: None,
            stable_since: None,
        }
    }

    /// Records one sample and reports whether the page is now idle
    ///
    /// `None` or a negative count means the document is still loading.
    fn observe(&mut self, count: Option<i64>, now: Instant) -> bool {
        let Some(count) = count.filter(|count| *count >= 0) else {
            self.last_count = None;
            self.stable_since = None;
            return false;
        };

        if self.last_count != Some(count) {
            self.last_count = Some(count);
            self.stable_since = Some(now);
            return false;
        }

        self.stable_since
            .is_some_and(|since| now.duration_since(since) >= self.quiet_for)
    }
}
