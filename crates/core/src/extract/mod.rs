//! The strategy cascade: fixed-priority, structurally independent parsing
//! strategies applied to fetched markup until one yields data.

use crate::dom::{self, DomNode};
use crate::model::{self, MAX_ITEMS};
use log::{info, warn};
use serde_json::Value;

/// A raw extracted entry. Ranks from the page are advisory and dropped;
/// the reconciler assigns the real ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub title: String,
    pub description: String,
    pub hot_index: String,
}

impl Candidate {
    pub fn new(title: &str, description: &str, hot_index: &str) -> Self {
        Self {
            title: title.trim().to_string(),
            description: description.trim().to_string(),
            hot_index: model::normalize_index(hot_index),
        }
    }
}

/// Which strategy produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyId {
    EmbeddedJson,
    StructuredDom,
    IndexedRows,
    TextHeuristic,
}

impl std::fmt::Display for StrategyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StrategyId::EmbeddedJson => "embedded-json",
            StrategyId::StructuredDom => "structured-dom",
            StrategyId::IndexedRows => "indexed-rows",
            StrategyId::TextHeuristic => "text-heuristic",
        };
        f.write_str(name)
    }
}

/// One structured-DOM strategy descriptor. The table is ordered and
/// extensible; new selector families are appended via configuration, not
/// code changes.
#[derive(Debug, Clone)]
pub struct SelectorRule {
    pub container: String,
    pub title: String,
    pub description: String,
    pub index: String,
}

impl SelectorRule {
    pub fn new(container: &str, title: &str, description: &str, index: &str) -> Self {
        Self {
            container: container.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            index: index.to_string(),
        }
    }
}

/// Row/index positional-pairing descriptor for rendered captures. Index
/// markup is not guaranteed to live under its row, so the index elements
/// are collected document-wide and paired by position.
#[derive(Debug, Clone)]
pub struct RowPairingRule {
    pub rows: String,
    pub title: String,
    pub description: String,
    pub index: String,
}

/// The full, ordered strategy configuration.
#[derive(Debug, Clone)]
pub struct ExtractRules {
    /// Markup substrings that introduce an embedded JSON assignment.
    pub json_markers: Vec<String>,
    pub selector_rules: Vec<SelectorRule>,
    pub row_pairing: RowPairingRule,
}

impl Default for ExtractRules {
    fn default() -> Self {
        Self {
            json_markers: vec!["window.__INITIAL_STATE__=".to_string()],
            selector_rules: vec![
                SelectorRule::new(
                    ".category-wrap_iQLoo",
                    ".c-single-text-ellipsis",
                    ".hot-desc_1m_jR",
                    ".hot-index_1Bl1a",
                ),
                SelectorRule::new(".hot-list", ".title", ".desc", ".hot"),
                SelectorRule::new(".hot-rank", ".content", ".detail", ".index"),
                SelectorRule::new(
                    "#hot-list",
                    ".hot-item-title",
                    ".hot-item-desc",
                    ".hot-item-index",
                ),
            ],
            row_pairing: RowPairingRule {
                rows: ".category-wrap_iQLoo tbody tr".to_string(),
                title: ".c-single-text-ellipsis".to_string(),
                description: ".hot-desc_1m_jR".to_string(),
                index: ".hot-index_1Bl1a".to_string(),
            },
        }
    }
}

/// A successful extraction: candidates plus the strategy that won.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub candidates: Vec<Candidate>,
    pub strategy: StrategyId,
}

/// Run the cascade over fetched markup. Strategies are tried in fixed
/// priority order; the first non-empty result wins and partial results
/// are never blended. `rendered` enables the row-pairing strategy, which
/// only makes sense on browser output.
pub fn extract_from_markup(html: &str, rules: &ExtractRules, rendered: bool) -> Option<Extraction> {
    let embedded = embedded_json_candidates(html, &rules.json_markers);
    if !embedded.is_empty() {
        info!("embedded-json strategy yielded {} candidates", embedded.len());
        return Some(Extraction {
            candidates: embedded,
            strategy: StrategyId::EmbeddedJson,
        });
    }

    let root = dom::parse_html(html);

    let structured = structured_dom_candidates(&root, &rules.selector_rules);
    if !structured.is_empty() {
        info!("structured-dom strategy yielded {} candidates", structured.len());
        return Some(Extraction {
            candidates: structured,
            strategy: StrategyId::StructuredDom,
        });
    }

    if rendered {
        let paired = indexed_row_candidates(&root, &rules.row_pairing);
        if !paired.is_empty() {
            info!("indexed-rows strategy yielded {} candidates", paired.len());
            return Some(Extraction {
                candidates: paired,
                strategy: StrategyId::IndexedRows,
            });
        }
    }

    let mined = heuristic_candidates(html.lines());
    if !mined.is_empty() {
        info!("text-heuristic strategy yielded {} candidates", mined.len());
        return Some(Extraction {
            candidates: mined,
            strategy: StrategyId::TextHeuristic,
        });
    }

    None
}

// ---- Strategy 1: embedded JSON blob ----

/// Locate a known JSON assignment in the raw markup and mine the decoded
/// structure for the first plausible trending array.
pub fn embedded_json_candidates(html: &str, markers: &[String]) -> Vec<Candidate> {
    for marker in markers {
        let blob = match find_json_blob(html, marker) {
            Some(blob) => blob,
            None => continue,
        };
        let value: Value = match serde_json::from_str(blob) {
            Ok(value) => value,
            Err(e) => {
                warn!("embedded JSON after {:?} did not parse: {}", marker, e);
                continue;
            }
        };
        if let Some(list) = find_hot_array(&value) {
            return map_json_entries(list);
        }
    }
    Vec::new()
}

/// Brace-match the object literal that follows `marker`, honoring strings
/// and escapes. Non-greedy regex on markup is too brittle for this.
fn find_json_blob<'a>(html: &'a str, marker: &str) -> Option<&'a str> {
    let start = html.find(marker)? + marker.len();
    let rest = &html[start..];
    let open = rest.find('{')?;
    let bytes = rest.as_bytes();

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&rest[open..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

const TITLE_KEYS: &[&str] = &["title", "name"];
const INDEX_KEYS: &[&str] = &["hotValue", "hot_index"];
const DESC_KEYS: &[&str] = &["description", "desc"];

/// Depth-first search for the first array whose first element is a mapping
/// carrying a title-like or popularity-like key.
fn find_hot_array(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(list) => {
            if let Some(Value::Object(first)) = list.first() {
                let keyed = TITLE_KEYS
                    .iter()
                    .chain(INDEX_KEYS.iter())
                    .any(|k| first.contains_key(*k));
                if keyed {
                    return Some(list);
                }
            }
            list.iter().find_map(find_hot_array)
        }
        Value::Object(map) => map.values().find_map(find_hot_array),
        _ => None,
    }
}

fn map_json_entries(list: &[Value]) -> Vec<Candidate> {
    let mut out = Vec::new();
    for entry in list.iter().take(MAX_ITEMS) {
        let map = match entry {
            Value::Object(map) => map,
            _ => continue,
        };
        let title = match first_string(map, TITLE_KEYS) {
            Some(title) if !title.trim().is_empty() => title,
            // Untitled entries cannot satisfy the snapshot invariants.
            _ => continue,
        };
        let hot_index = first_string(map, INDEX_KEYS).unwrap_or_else(|| "0".to_string());
        let description = first_string(map, DESC_KEYS).unwrap_or_default();
        out.push(Candidate::new(&title, &description, &hot_index));
    }
    out
}

fn first_string(map: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| map.get(*k)).and_then(|v| match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

// ---- Strategy 2: structured DOM ----

/// Evaluate the ordered selector-rule table; the first rule whose
/// container selector matches at least one element wins.
pub fn structured_dom_candidates(root: &DomNode, rules: &[SelectorRule]) -> Vec<Candidate> {
    for rule in rules {
        let containers = root.select(&rule.container);
        if containers.is_empty() {
            continue;
        }
        info!(
            "selector rule {:?} matched {} containers",
            rule.container,
            containers.len()
        );
        let mut out = Vec::new();
        for container in containers.into_iter().take(MAX_ITEMS) {
            let title = match container.select_first(&rule.title) {
                Some(node) => node.text_content(),
                // Sub-selector miss: fall back to the container's own text.
                None => model::truncate_chars(&container.text_content(), 50),
            };
            if title.trim().is_empty() {
                continue;
            }
            let description = container
                .select_first(&rule.description)
                .map(|n| n.text_content())
                .unwrap_or_default();
            let hot_index = container
                .select_first(&rule.index)
                .map(|n| n.text_content())
                .unwrap_or_else(|| "0".to_string());
            out.push(Candidate::new(&title, &description, &hot_index));
        }
        if !out.is_empty() {
            return out;
        }
    }
    Vec::new()
}

// ---- Strategy 3: row list with positional index pairing ----

/// Pair table rows with the separately collected index elements by
/// position. When the two lists diverge, indices past the shorter list
/// degrade to "0" rather than erroring; this is a known precision loss.
pub fn indexed_row_candidates(root: &DomNode, rule: &RowPairingRule) -> Vec<Candidate> {
    let rows = root.select(&rule.rows);
    if rows.is_empty() {
        return Vec::new();
    }
    let index_texts: Vec<String> = root
        .select(&rule.index)
        .iter()
        .map(|n| n.text_content())
        .collect();
    if rows.len() != index_texts.len() {
        warn!(
            "row/index count diverged: {} rows vs {} indices",
            rows.len(),
            index_texts.len()
        );
    }

    let mut out = Vec::new();
    for (i, row) in rows.into_iter().take(MAX_ITEMS).enumerate() {
        let title = match row.select_first(&rule.title) {
            Some(node) => node.text_content(),
            None => first_line(&row.text_content()),
        };
        if title.trim().is_empty() {
            continue;
        }
        let description = row
            .select_first(&rule.description)
            .map(|n| n.text_content())
            .unwrap_or_default();
        let hot_index = index_texts.get(i).cloned().unwrap_or_else(|| "0".to_string());
        out.push(Candidate::new(&title, &description, &hot_index));
    }
    out
}

fn first_line(text: &str) -> String {
    text.lines().next().unwrap_or("").trim().to_string()
}

// ---- Strategy 4: generic text heuristic ----

/// Mine free text for title-shaped lines: 10 to 100 characters with at
/// least one ideograph. The largest embedded digit run becomes the index.
/// Only consulted when every structured strategy came up empty.
pub fn heuristic_candidates<'a>(lines: impl Iterator<Item = &'a str>) -> Vec<Candidate> {
    let mut seen = Vec::new();
    let mut out = Vec::new();
    for line in lines {
        let line = line.trim();
        let len = line.chars().count();
        if len < 10 || len > 100 || !has_ideograph(line) {
            continue;
        }
        let cleaned = strip_tags(line);
        let cleaned = cleaned.trim();
        if cleaned.is_empty() || seen.iter().any(|s| s == cleaned) {
            continue;
        }
        seen.push(cleaned.to_string());
        let hot_index = model::largest_number(line).unwrap_or_else(|| "0".to_string());
        out.push(Candidate::new(cleaned, "", &hot_index));
        if out.len() >= MAX_ITEMS {
            break;
        }
    }
    out
}

fn has_ideograph(text: &str) -> bool {
    text.chars().any(|c| ('\u{4e00}'..='\u{9fa5}').contains(&c))
}

/// Drop `<...>` spans from a line of markup.
fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}
