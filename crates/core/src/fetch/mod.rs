//! Page fetching: plain HTTP with retry, and the headless-browser session
//! behind the "browser" feature flag.

#[cfg(feature = "browser")]
pub mod browser;

use log::{info, warn};
use reqwest::blocking::Client;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use url::Url;

/// Configuration for the plain-HTTP fallback path.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub user_agent: String,
    pub accept_language: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Attempt count, including the first try.
    pub retry_attempts: usize,
    /// Fixed pause between attempts.
    pub retry_delay: Duration,
    /// Where fetched bodies are dumped for offline analysis. Defaults to
    /// the working directory; None is an explicit opt-out.
    pub debug_dir: Option<PathBuf>,
}

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36";

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: "zh-CN,zh;q=0.8,zh-TW;q=0.7,zh-HK;q=0.5,en-US;q=0.3,en;q=0.2"
                .to_string(),
            timeout_secs: 15,
            retry_attempts: 3,
            retry_delay: Duration::from_secs(2),
            debug_dir: Some(PathBuf::from(".")),
        }
    }
}

/// Fetch raw page markup without a browser. Retries with a fixed pause;
/// a non-2xx status on the final attempt is an error. Any body received is
/// persisted to the debug artifact regardless of outcome.
pub fn fetch_page(url: &str, config: &HttpConfig) -> Result<String, FetchError> {
    let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| FetchError::Network(e.to_string()))?;

    let attempts = config.retry_attempts.max(1);
    let mut last_err = FetchError::Network("no attempt made".to_string());

    for attempt in 1..=attempts {
        match fetch_once(&client, &parsed, config) {
            Ok(body) => {
                info!("http fetch succeeded on attempt {}/{}", attempt, attempts);
                return Ok(body);
            }
            Err(e) => {
                warn!("http fetch attempt {}/{} failed: {}", attempt, attempts, e);
                last_err = e;
                if attempt < attempts {
                    thread::sleep(config.retry_delay);
                }
            }
        }
    }

    Err(last_err)
}

fn fetch_once(client: &Client, url: &Url, config: &HttpConfig) -> Result<String, FetchError> {
    let response = client
        .get(url.as_str())
        .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8")
        .header("Accept-Language", &config.accept_language)
        .header("Connection", "keep-alive")
        .header("Upgrade-Insecure-Requests", "1")
        .send()
        .map_err(|e| FetchError::Network(e.to_string()))?;

    let status = response.status();
    let body = response.text().map_err(|e| FetchError::Network(e.to_string()))?;

    // Dump the body even for error pages; selector drift is debugged from
    // these artifacts.
    if let Some(dir) = &config.debug_dir {
        save_artifact(dir, "backup_page.html", &body);
    }

    if !status.is_success() {
        return Err(FetchError::HttpStatus(status.as_u16()));
    }
    Ok(body)
}

/// Best-effort artifact write; failures are logged, never propagated.
pub fn save_artifact(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Err(e) = std::fs::create_dir_all(dir) {
        warn!("could not create artifact dir {}: {}", dir.display(), e);
        return;
    }
    match std::fs::write(&path, contents) {
        Ok(()) => info!("saved artifact {}", path.display()),
        Err(e) => warn!("could not save artifact {}: {}", path.display(), e),
    }
}

#[derive(Debug)]
pub enum FetchError {
    InvalidUrl(String),
    Network(String),
    HttpStatus(u16),
    Browser(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::InvalidUrl(e) => write!(f, "invalid URL: {}", e),
            FetchError::Network(e) => write!(f, "network error: {}", e),
            FetchError::HttpStatus(code) => write!(f, "HTTP status {}", code),
            FetchError::Browser(e) => write!(f, "browser error: {}", e),
        }
    }
}

impl std::error::Error for FetchError {}
