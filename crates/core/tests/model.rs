//! Value-type helpers: digit-run mining and index normalization.

use hotboard_core::model::{largest_number, normalize_index};
use pretty_assertions::assert_eq;

#[test]
fn largest_number_compares_magnitude_not_run_length() {
    // A zero-padded run must not beat a numerically larger one.
    assert_eq!(largest_number("a 0999 b 1000"), Some("1000".to_string()));
    assert_eq!(largest_number("1000 then 0999"), Some("1000".to_string()));
    // Leading zeros alone do not add magnitude.
    assert_eq!(largest_number("007 vs 99"), Some("99".to_string()));
}

#[test]
fn largest_number_prefers_longer_runs() {
    assert_eq!(largest_number("热度 12345 排名 42"), Some("12345".to_string()));
    assert_eq!(largest_number("no digits here"), None);
}

#[test]
fn largest_number_ties_go_to_the_earliest_run() {
    assert_eq!(largest_number("123 then 123"), Some("123".to_string()));
    // Equal length, different value: the larger wins regardless of order.
    assert_eq!(largest_number("123 then 321"), Some("321".to_string()));
}

#[test]
fn normalize_index_keeps_digits_only() {
    assert_eq!(normalize_index("热度: 9,876"), "9876");
    assert_eq!(normalize_index("no digits"), "0");
    assert_eq!(normalize_index(""), "0");
}
