//! Headless-Chrome session: anti-automation masking, multi-strategy
//! element waiting, and rendered-page capture.

use super::{save_artifact, FetchError, DEFAULT_USER_AGENT};
use headless_chrome::protocol::cdp::Page;
use headless_chrome::{Browser, LaunchOptions, Tab};
use log::{info, warn};
use rand::Rng;
use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Configuration for the browser path.
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// None auto-detects: headless on Linux without a display server.
    pub headless: Option<bool>,
    pub window_size: (u32, u32),
    pub user_agent: String,
    /// Session acquisition attempts, including the first.
    pub acquire_retries: usize,
    /// Fixed backoff between acquisition attempts.
    pub acquire_delay: Duration,
    pub page_load_timeout: Duration,
    pub script_timeout: Duration,
    /// Per-selector budget while waiting for the board to render.
    pub element_wait: Duration,
    /// Fallback settle delay when no wait selector ever appears.
    pub settle_delay: Duration,
    /// Ordered wait targets, most specific first.
    pub wait_selectors: Vec<String>,
    /// Ordered element-extraction selectors; the first that matches at
    /// least one element wins.
    pub element_selectors: Vec<String>,
    /// Popularity-index elements, collected separately from the rows.
    pub index_selector: String,
    /// Where failure-path page sources are saved. Defaults to the working
    /// directory; None is an explicit opt-out.
    pub debug_dir: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: None,
            window_size: (1920, 1080),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            acquire_retries: 3,
            acquire_delay: Duration::from_secs(3),
            page_load_timeout: Duration::from_secs(30),
            script_timeout: Duration::from_secs(15),
            element_wait: Duration::from_secs(5),
            settle_delay: Duration::from_secs(5),
            wait_selectors: vec![
                ".category-wrap_iQLoo tbody".to_string(),
                ".category-wrap_iQLoo".to_string(),
                "tbody".to_string(),
                "[class*=\"hot\"], [class*=\"rank\"]".to_string(),
            ],
            element_selectors: vec![
                ".category-wrap_iQLoo tbody tr".to_string(),
                ".category-wrap_iQLoo".to_string(),
                "[class*=\"hot\"], [class*=\"rank\"]".to_string(),
                ".c-single-text-ellipsis, .title, [class*=\"title\"]".to_string(),
            ],
            index_selector: ".hot-index_1Bl1a, [class*=\"hot-index\"]".to_string(),
            debug_dir: Some(PathBuf::from(".")),
        }
    }
}

/// What one rendered visit yields: the page source plus the raw texts the
/// live element strategies matched.
#[derive(Debug, Clone)]
pub struct RenderedCapture {
    pub html: String,
    /// Inner texts from the winning element-extraction strategy, ≤ 20.
    pub element_texts: Vec<String>,
    /// Popularity-index texts in page order; may diverge in length from
    /// the element list.
    pub index_texts: Vec<String>,
}

/// An acquired browser session. The Chrome process is torn down when this
/// drops, which covers every exit path.
pub struct BrowserFetcher {
    _browser: Browser,
    tab: Arc<Tab>,
    config: BrowserConfig,
}

impl BrowserFetcher {
    /// Try to acquire a masked session. Every failure is classified and
    /// logged with a remediation hint; after the retry budget this returns
    /// None and callers fall back to the HTTP path.
    pub fn acquire(config: &BrowserConfig) -> Option<BrowserFetcher> {
        let attempts = config.acquire_retries.max(1);
        for attempt in 1..=attempts {
            info!("acquiring browser session, attempt {}/{}", attempt, attempts);
            match Self::launch(config) {
                Ok(fetcher) => {
                    info!("browser session ready");
                    return Some(fetcher);
                }
                Err(e) => {
                    classify_launch_failure(&e);
                    warn!("browser acquisition failed ({}/{}): {}", attempt, attempts, e);
                    if attempt < attempts {
                        thread::sleep(config.acquire_delay);
                    }
                }
            }
        }
        warn!("browser path unavailable after {} attempts", attempts);
        None
    }

    fn launch(config: &BrowserConfig) -> Result<BrowserFetcher, FetchError> {
        let headless = config.headless.unwrap_or_else(detect_headless);
        if headless {
            info!("no display server detected, launching headless");
        }
        let window_arg = format!(
            "--window-size={},{}",
            config.window_size.0, config.window_size.1
        );
        let ua_arg = format!("--user-agent={}", config.user_agent);
        let args: Vec<&OsStr> = vec![
            OsStr::new("--disable-blink-features=AutomationControlled"),
            OsStr::new("--disable-gpu"),
            OsStr::new("--disable-extensions"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--no-first-run"),
            OsStr::new("--no-default-browser-check"),
            OsStr::new("--dns-prefetch-disable"),
            OsStr::new("--ignore-certificate-errors"),
            OsStr::new(window_arg.as_str()),
            OsStr::new(ua_arg.as_str()),
        ];

        let options = LaunchOptions::default_builder()
            .headless(headless)
            .sandbox(false)
            .window_size(Some(config.window_size))
            .idle_browser_timeout(config.page_load_timeout + config.script_timeout)
            .args(args)
            .build()
            .map_err(|e| FetchError::Browser(e.to_string()))?;

        let browser = Browser::new(options).map_err(|e| FetchError::Browser(e.to_string()))?;
        let tab = browser
            .new_tab()
            .map_err(|e| FetchError::Browser(e.to_string()))?;

        tab.set_default_timeout(config.script_timeout);
        tab.set_user_agent(&config.user_agent, None, None)
            .map_err(|e| FetchError::Browser(e.to_string()))?;

        // Mask the automation flag before any page script runs.
        let mask = Page::AddScriptToEvaluateOnNewDocument {
            source: "Object.defineProperty(navigator, 'webdriver', {get: () => undefined});"
                .to_string(),
            world_name: None,
            include_command_line_api: None,
            run_immediately: None,
        };
        tab.call_method(mask)
            .map_err(|e| FetchError::Browser(e.to_string()))?;

        Ok(BrowserFetcher {
            _browser: browser,
            tab,
            config: config.clone(),
        })
    }

    /// Navigate and capture the rendered page. On unexpected failure the
    /// page source is saved for postmortem before the error propagates.
    pub fn fetch_rendered(&self, url: &str) -> Result<RenderedCapture, FetchError> {
        match self.fetch_inner(url) {
            Ok(capture) => Ok(capture),
            Err(e) => {
                if let Some(dir) = &self.config.debug_dir {
                    if let Ok(source) = self.tab.get_content() {
                        save_artifact(dir, "browser_error_page.html", &source);
                    }
                }
                Err(e)
            }
        }
    }

    fn fetch_inner(&self, url: &str) -> Result<RenderedCapture, FetchError> {
        self.tab
            .navigate_to(url)
            .map_err(|e| FetchError::Browser(e.to_string()))?;
        if let Err(e) = self.tab.wait_until_navigated() {
            // Eager pages often settle after the navigation deadline.
            warn!("navigation wait ended early: {}", e);
        }

        if !self.wait_for_board() {
            info!("no wait selector matched, settling for {:?}", self.config.settle_delay);
            thread::sleep(self.config.settle_delay);
        }

        self.human_pause();
        self.scroll_a_little();

        let element_texts = self.collect_elements();
        let index_texts = self.collect_texts(&self.config.index_selector);

        let html = self
            .tab
            .get_content()
            .map_err(|e| FetchError::Browser(e.to_string()))?;

        Ok(RenderedCapture {
            html,
            element_texts,
            index_texts,
        })
    }

    /// Try each wait selector with the short per-selector budget; the
    /// first that appears wins.
    fn wait_for_board(&self) -> bool {
        for selector in &self.config.wait_selectors {
            match self
                .tab
                .wait_for_element_with_custom_timeout(selector, self.config.element_wait)
            {
                Ok(_) => {
                    info!("wait selector matched: {}", selector);
                    return true;
                }
                Err(_) => continue,
            }
        }
        false
    }

    fn human_pause(&self) {
        let millis = rand::thread_rng().gen_range(1500..=2500);
        thread::sleep(Duration::from_millis(millis));
    }

    fn scroll_a_little(&self) {
        let script = "window.scrollTo(0, Math.min(500, document.body.scrollHeight));";
        if let Err(e) = self.tab.evaluate(script, false) {
            warn!("scroll script failed: {}", e);
        }
        thread::sleep(Duration::from_secs(1));
    }

    fn collect_elements(&self) -> Vec<String> {
        for selector in &self.config.element_selectors {
            let texts = self.collect_texts(selector);
            if !texts.is_empty() {
                info!("element strategy {:?} matched {} elements", selector, texts.len());
                return texts;
            }
        }
        Vec::new()
    }

    fn collect_texts(&self, selector: &str) -> Vec<String> {
        let elements = match self.tab.find_elements(selector) {
            Ok(elements) => elements,
            Err(_) => return Vec::new(),
        };
        elements
            .iter()
            .take(crate::model::MAX_ITEMS)
            .filter_map(|el| el.get_inner_text().ok())
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// Headless when a Linux host has no display server; other platforms are
/// assumed to have one.
fn detect_headless() -> bool {
    if !cfg!(target_os = "linux") {
        return false;
    }
    std::env::var_os("DISPLAY").is_none() && std::env::var_os("WAYLAND_DISPLAY").is_none()
}

fn classify_launch_failure(err: &FetchError) {
    let msg = err.to_string().to_lowercase();
    if msg.contains("error while loading shared libraries") {
        warn!("missing native dependency; install the browser's shared libraries (e.g. libnss3, libxss1)");
    } else if msg.contains("permission denied") {
        warn!("permission problem launching the browser; check execute bits on the Chrome binary");
    }
}
