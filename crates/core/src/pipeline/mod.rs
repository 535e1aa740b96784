//! The capture pipeline: browser path first, HTTP fallback, reconciliation,
//! synthetic last resort. Always produces a snapshot.

use crate::extract::{self, Candidate, ExtractRules, StrategyId};
use crate::fetch::HttpConfig;
use crate::model::Snapshot;
use crate::reconcile;
use log::{info, warn};

#[cfg(feature = "browser")]
use crate::fetch::browser::{BrowserConfig, BrowserFetcher, RenderedCapture};

/// The real-time trending board this collector targets.
pub const DEFAULT_TARGET_URL: &str = "https://top.baidu.com/board?tab=realtime";

/// Everything one capture run needs, passed explicitly so tests never
/// depend on ambient state or timing.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub url: String,
    /// Disable to skip straight to the HTTP path.
    pub use_browser: bool,
    #[cfg(feature = "browser")]
    pub browser: BrowserConfig,
    pub http: HttpConfig,
    pub rules: ExtractRules,
    /// Unique-item threshold below which the HTTP path supplements the
    /// primary result.
    pub min_items: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_TARGET_URL.to_string(),
            use_browser: true,
            #[cfg(feature = "browser")]
            browser: BrowserConfig::default(),
            http: HttpConfig::default(),
            rules: ExtractRules::default(),
            min_items: reconcile::MIN_ITEMS,
        }
    }
}

/// Which fetch path produced the snapshot's items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureSource {
    Browser,
    Http,
    /// Every upstream failed; the items are the synthetic placeholder.
    Synthetic,
}

/// The pipeline's public result. Callers can tell real data from the
/// degraded placeholder without decoding anything.
#[derive(Debug, Clone)]
pub struct CaptureReport {
    pub snapshot: Snapshot,
    pub source: CaptureSource,
    pub strategy: Option<StrategyId>,
}

/// Run one extraction job to completion. Never fails and never returns an
/// empty snapshot: fetch and parse errors are recovered internally, and
/// total upstream failure yields the degraded placeholder.
pub fn capture(config: &CaptureConfig) -> CaptureReport {
    let mut strategy = None;
    let mut source = CaptureSource::Synthetic;
    let mut items = Vec::new();

    if config.use_browser {
        if let Some((candidates, used)) = browser_candidates(config) {
            strategy = Some(used);
            items = reconcile::reconcile(candidates);
            if !items.is_empty() {
                source = CaptureSource::Browser;
            }
        }
    }

    if items.len() < config.min_items {
        info!(
            "{} unique items from primary path, consulting HTTP fallback",
            items.len()
        );
        if let Some((candidates, used)) = http_candidates(config) {
            if items.is_empty() {
                strategy = Some(used);
                items = reconcile::reconcile(candidates);
                if !items.is_empty() {
                    source = CaptureSource::Http;
                }
            } else {
                reconcile::merge_supplement(&mut items, candidates);
            }
        }
    }

    if items.is_empty() {
        warn!("all extraction paths failed, emitting synthetic placeholder");
        return CaptureReport {
            snapshot: Snapshot::new(reconcile::synthetic_items(), true),
            source: CaptureSource::Synthetic,
            strategy: None,
        };
    }

    info!("capture complete: {} items via {:?}", items.len(), source);
    CaptureReport {
        snapshot: Snapshot::new(items, false),
        source,
        strategy,
    }
}

#[cfg(feature = "browser")]
fn browser_candidates(config: &CaptureConfig) -> Option<(Vec<Candidate>, StrategyId)> {
    let fetcher = BrowserFetcher::acquire(&config.browser)?;
    let capture = match fetcher.fetch_rendered(&config.url) {
        Ok(capture) => capture,
        Err(e) => {
            warn!("rendered fetch failed: {}", e);
            return None;
        }
    };

    if let Some(extraction) = extract::extract_from_markup(&capture.html, &config.rules, true) {
        return Some((extraction.candidates, extraction.strategy));
    }

    let live = live_element_candidates(&capture);
    if !live.is_empty() {
        info!("live element pairing yielded {} candidates", live.len());
        return Some((live, StrategyId::IndexedRows));
    }
    None
}

#[cfg(not(feature = "browser"))]
fn browser_candidates(_config: &CaptureConfig) -> Option<(Vec<Candidate>, StrategyId)> {
    None
}

/// Last-ditch browser-path parsing: treat each captured element text as a
/// row and pair it with the separately collected index texts by position.
/// Out-of-range positions degrade to "0".
#[cfg(feature = "browser")]
fn live_element_candidates(capture: &RenderedCapture) -> Vec<Candidate> {
    capture
        .element_texts
        .iter()
        .enumerate()
        .filter_map(|(i, text)| {
            let title = text.lines().next().unwrap_or("").trim();
            if title.is_empty() {
                return None;
            }
            let hot_index = crate::model::largest_number(text)
                .or_else(|| capture.index_texts.get(i).cloned())
                .unwrap_or_else(|| "0".to_string());
            Some(Candidate::new(title, "", &hot_index))
        })
        .collect()
}

fn http_candidates(config: &CaptureConfig) -> Option<(Vec<Candidate>, StrategyId)> {
    let body = match crate::fetch::fetch_page(&config.url, &config.http) {
        Ok(body) => body,
        Err(e) => {
            warn!("http fallback fetch failed: {}", e);
            return None;
        }
    };
    extract::extract_from_markup(&body, &config.rules, false)
        .map(|extraction| (extraction.candidates, extraction.strategy))
}
