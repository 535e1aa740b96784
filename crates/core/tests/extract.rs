//! Strategy cascade behavior: priority order, per-strategy parsing, and
//! the degrade-to-sentinel pairing rule.

use hotboard_core::dom::parse_html;
use hotboard_core::extract::{
    embedded_json_candidates, extract_from_markup, heuristic_candidates, indexed_row_candidates,
    structured_dom_candidates, ExtractRules, StrategyId,
};
use pretty_assertions::assert_eq;

#[test]
fn embedded_json_wins_when_no_selector_matches() {
    let html = r#"<html><head><script>
        window.__INITIAL_STATE__={"curveData":{"cards":[
            {"title":"甲新闻","hotValue":12345,"desc":"内容甲"},
            {"title":"乙新闻","hotValue":"9876"}
        ]},"misc":1};
    </script></head><body><div>nothing structured here</div></body></html>"#;

    let extraction =
        extract_from_markup(html, &ExtractRules::default(), false).expect("should extract");
    assert_eq!(extraction.strategy, StrategyId::EmbeddedJson);
    assert_eq!(extraction.candidates.len(), 2);
    assert_eq!(extraction.candidates[0].title, "甲新闻");
    assert_eq!(extraction.candidates[0].hot_index, "12345");
    assert_eq!(extraction.candidates[0].description, "内容甲");
    // Numeric and string popularity values both normalize.
    assert_eq!(extraction.candidates[1].hot_index, "9876");
    assert_eq!(extraction.candidates[1].description, "");
}

#[test]
fn embedded_json_skips_untitled_entries() {
    let html = r#"<script>window.__INITIAL_STATE__={"list":[
        {"hotValue":1,"desc":"no title here"},
        {"name":"备用标题","hot_index":"777"}
    ]};</script>"#;

    let candidates =
        embedded_json_candidates(html, &["window.__INITIAL_STATE__=".to_string()]);
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].title, "备用标题");
    assert_eq!(candidates[0].hot_index, "777");
}

#[test]
fn structured_dom_extracts_board_rows() {
    let html = r#"<html><body>
      <div class="category-wrap_iQLoo">
        <div class="c-single-text-ellipsis">甲新闻</div>
        <div class="hot-desc_1m_jR">内容甲</div>
        <div class="hot-index_1Bl1a">12345</div>
      </div>
      <div class="category-wrap_iQLoo">
        <div class="c-single-text-ellipsis">乙新闻</div>
        <div class="hot-desc_1m_jR">内容乙</div>
        <div class="hot-index_1Bl1a">9876</div>
      </div>
    </body></html>"#;

    let extraction =
        extract_from_markup(html, &ExtractRules::default(), false).expect("should extract");
    assert_eq!(extraction.strategy, StrategyId::StructuredDom);

    let items = hotboard_core::reconcile::reconcile(extraction.candidates);
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].rank, 1);
    assert_eq!(items[0].title, "甲新闻");
    assert_eq!(items[0].hot_index, "12345");
    assert_eq!(items[1].rank, 2);
    assert_eq!(items[1].title, "乙新闻");
    assert_eq!(items[1].hot_index, "9876");
}

#[test]
fn structured_dom_falls_back_to_container_text() {
    let html = r#"<div class="hot-list">孤零零的一条长标题文本</div>"#;
    let root = parse_html(html);

    let candidates = structured_dom_candidates(&root, &ExtractRules::default().selector_rules);
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].title, "孤零零的一条长标题文本");
    assert_eq!(candidates[0].description, "");
    assert_eq!(candidates[0].hot_index, "0");
}

#[test]
fn structured_dom_normalizes_index_to_digits() {
    let html = r#"<div class="hot-list">
        <span class="title">某个热门话题标题</span>
        <span class="hot">热度: 9,876</span>
    </div>"#;
    let root = parse_html(html);

    let candidates = structured_dom_candidates(&root, &ExtractRules::default().selector_rules);
    assert_eq!(candidates[0].hot_index, "9876");
}

#[test]
fn selector_table_is_ordered_first_match_wins() {
    // Both the second and fourth rule families are present; the second
    // must win because the table is ordered.
    let html = r#"
      <div class="hot-list"><span class="title">榜单甲标题</span></div>
      <div id="hot-list"><span class="hot-item-title">不应选中的标题</span></div>
    "#;
    let root = parse_html(html);

    let candidates = structured_dom_candidates(&root, &ExtractRules::default().selector_rules);
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].title, "榜单甲标题");
}

#[test]
fn indexed_rows_pair_by_position() {
    let html = r#"<table class="category-wrap_iQLoo"><tbody>
        <tr><td class="c-single-text-ellipsis">标题一</td></tr>
        <tr><td class="c-single-text-ellipsis">标题二</td></tr>
      </tbody></table>
      <div class="hot-index_1Bl1a">100</div>
      <div class="hot-index_1Bl1a">90</div>"#;
    let root = parse_html(html);

    let candidates = indexed_row_candidates(&root, &ExtractRules::default().row_pairing);
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].hot_index, "100");
    assert_eq!(candidates[1].hot_index, "90");
}

#[test]
fn indexed_rows_degrade_to_sentinel_on_divergence() {
    // Three rows, two index elements: positional pairing is a known
    // precision loss, the tail degrades instead of erroring.
    let html = r#"<table class="category-wrap_iQLoo"><tbody>
        <tr><td class="c-single-text-ellipsis">标题一</td></tr>
        <tr><td class="c-single-text-ellipsis">标题二</td></tr>
        <tr><td class="c-single-text-ellipsis">标题三</td></tr>
      </tbody></table>
      <div class="hot-index_1Bl1a">100</div>
      <div class="hot-index_1Bl1a">90</div>"#;
    let root = parse_html(html);

    let candidates = indexed_row_candidates(&root, &ExtractRules::default().row_pairing);
    assert_eq!(candidates.len(), 3);
    assert_eq!(candidates[2].title, "标题三");
    assert_eq!(candidates[2].hot_index, "0");
}

#[test]
fn heuristic_mines_ideographic_lines() {
    let lines = [
        "short",
        "这是一条足够长的候选标题行 12345",
        "<li>嵌着标签的另一条候选标题</li>",
        "no ideographs in this line at all, so skipped",
        "这是一条足够长的候选标题行 12345",
    ];

    let candidates = heuristic_candidates(lines.iter().copied());
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].title, "这是一条足够长的候选标题行 12345");
    assert_eq!(candidates[0].hot_index, "12345");
    assert_eq!(candidates[1].title, "嵌着标签的另一条候选标题");
    assert_eq!(candidates[1].hot_index, "0");
}

#[test]
fn heuristic_only_runs_when_structured_strategies_miss() {
    let html = r#"<div class="hot-list"><span class="title">结构化提取的标题</span></div>
        <p>这一行本来也会被启发式策略选中的</p>"#;

    let extraction =
        extract_from_markup(html, &ExtractRules::default(), false).expect("should extract");
    assert_eq!(extraction.strategy, StrategyId::StructuredDom);

    let bare = "<p>这一行本来也会被启发式策略选中的</p>";
    let extraction = extract_from_markup(bare, &ExtractRules::default(), false)
        .expect("heuristic should fire");
    assert_eq!(extraction.strategy, StrategyId::TextHeuristic);
}

#[test]
fn hopeless_markup_yields_nothing() {
    assert!(extract_from_markup("<html><body></body></html>", &ExtractRules::default(), true)
        .is_none());
}
