//! Canonical value types: one trending entry and one completed capture.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Hard cap on entries per snapshot, mirroring the board's display limit.
pub const MAX_ITEMS: usize = 20;
/// Title length bound, protects downstream storage.
pub const MAX_TITLE_CHARS: usize = 100;
/// Description length bound.
pub const MAX_DESC_CHARS: usize = 200;

/// One trending entry. `rank` is 1-based and assigned by the reconciler,
/// never taken from the source page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotItem {
    pub rank: u32,
    pub title: String,
    pub description: String,
    /// Popularity score carried as text; digits only after normalization,
    /// "0" when the page exposed none.
    pub hot_index: String,
}

impl HotItem {
    /// Build an item with the length bounds applied.
    pub fn new(rank: u32, title: &str, description: &str, hot_index: &str) -> Self {
        Self {
            rank,
            title: truncate_chars(title.trim(), MAX_TITLE_CHARS),
            description: truncate_chars(description.trim(), MAX_DESC_CHARS),
            hot_index: normalize_index(hot_index),
        }
    }
}

/// One completed extraction. Immutable once built; the store only appends.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub captured_at: DateTime<Local>,
    pub items: Vec<HotItem>,
    /// True when the items are the synthetic placeholder rather than
    /// anything extracted from the page.
    pub degraded: bool,
}

impl Snapshot {
    pub fn new(items: Vec<HotItem>, degraded: bool) -> Self {
        let mut items = items;
        items.truncate(MAX_ITEMS);
        Self {
            captured_at: Local::now(),
            items,
            degraded,
        }
    }

    /// Ledger timestamp, second precision.
    pub fn capture_time(&self) -> String {
        self.captured_at.format("%Y-%m-%d %H:%M:%S").to_string()
    }

    /// Encode the items as the UTF-8 JSON array stored in the ledger.
    pub fn payload(&self) -> String {
        // Vec<HotItem> serialization cannot fail.
        serde_json::to_string(&self.items).unwrap_or_else(|_| "[]".to_string())
    }

    /// Decode a ledger payload back into items.
    pub fn items_from_payload(payload: &str) -> Result<Vec<HotItem>, serde_json::Error> {
        serde_json::from_str(payload)
    }
}

/// Truncate on character boundaries, never inside a UTF-8 scalar.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Keep digits only; empty results degrade to "0".
pub fn normalize_index(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        "0".to_string()
    } else {
        digits
    }
}

/// The numerically largest run of digits in a text, used where a
/// popularity score is buried in mixed content. Ties go to the earliest
/// run.
pub fn largest_number(text: &str) -> Option<String> {
    let mut best: Option<String> = None;
    let mut current = String::new();
    for c in text.chars().chain(std::iter::once(' ')) {
        if c.is_ascii_digit() {
            current.push(c);
        } else if !current.is_empty() {
            let larger = best
                .as_ref()
                .map(|b| numerically_larger(&current, b))
                .unwrap_or(true);
            if larger {
                best = Some(current.clone());
            }
            current.clear();
        }
    }
    best
}

/// Digit-run magnitude comparison; leading zeros do not count toward size.
fn numerically_larger(candidate: &str, best: &str) -> bool {
    let c = candidate.trim_start_matches('0');
    let b = best.trim_start_matches('0');
    match c.len().cmp(&b.len()) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => c > b,
    }
}
