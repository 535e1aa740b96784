//! Normalizes raw candidate lists into a valid snapshot: dedup, rank
//! renumbering, supplementation threshold, synthetic fallback.

use crate::extract::Candidate;
use crate::model::{HotItem, MAX_ITEMS};
use chrono::Local;
use rand::Rng;

/// Below this many unique items the pipeline consults the supplementary
/// HTTP path.
pub const MIN_ITEMS: usize = 5;

/// Deduplicate by title (first occurrence wins, encounter order kept),
/// renumber ranks to 1..=N, cap at the display limit.
pub fn reconcile(candidates: Vec<Candidate>) -> Vec<HotItem> {
    let mut items: Vec<HotItem> = Vec::new();
    for candidate in candidates {
        if candidate.title.is_empty() {
            continue;
        }
        if items.iter().any(|item| item.title == candidate.title) {
            continue;
        }
        let rank = items.len() as u32 + 1;
        items.push(HotItem::new(
            rank,
            &candidate.title,
            &candidate.description,
            &candidate.hot_index,
        ));
        if items.len() >= MAX_ITEMS {
            break;
        }
    }
    items
}

/// Append supplementary candidates whose titles are not already present,
/// without re-sorting the existing entries. Ranks stay contiguous.
pub fn merge_supplement(primary: &mut Vec<HotItem>, supplement: Vec<Candidate>) {
    for candidate in supplement {
        if primary.len() >= MAX_ITEMS {
            break;
        }
        if candidate.title.is_empty() {
            continue;
        }
        // Titles are compared post-truncation, same as the dedup pass.
        let item = HotItem::new(
            primary.len() as u32 + 1,
            &candidate.title,
            &candidate.description,
            &candidate.hot_index,
        );
        if primary.iter().any(|existing| existing.title == item.title) {
            continue;
        }
        primary.push(item);
    }
}

const PLACEHOLDER_COUNT: usize = 3;

const PLACEHOLDER_TITLES: &[&str] = &[
    "Placeholder headline: policy briefing of the hour",
    "Placeholder headline: box-office record under review",
    "Placeholder headline: research milestone announced",
];

/// Deterministically templated placeholder entries, emitted only when
/// every upstream source failed. Index values decrease monotonically from
/// one million with a small random perturbation.
pub fn synthetic_items() -> Vec<HotItem> {
    let stamp = Local::now().format("%H:%M").to_string();
    let mut rng = rand::thread_rng();
    let mut items = Vec::with_capacity(PLACEHOLDER_COUNT);
    for (i, base_title) in PLACEHOLDER_TITLES.iter().take(PLACEHOLDER_COUNT).enumerate() {
        let rank = i as u32 + 1;
        let title = format!("{} ({})", base_title, stamp);
        let perturbation: i64 = rng.gen_range(-50_000..=50_000);
        let hot_value = 1_000_000i64 - i as i64 * 100_000 + perturbation;
        let description = format!("Synthetic stand-in generated at {}", stamp);
        items.push(HotItem::new(
            rank,
            &title,
            &description,
            &hot_value.to_string(),
        ));
    }
    items
}
