//! Containment behaviour over realistic API payloads.

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use structassert_core::{
    contains_array, contains_array_with, ArrayContainsComparator, MatchOptions, SequenceStrategy,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../tests/fixtures");

fn load_fixture(name: &str) -> Value {
    let path = Path::new(FIXTURES_DIR).join(name);
    let content = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {name}: {e}"));
    serde_json::from_str(&content).unwrap_or_else(|e| panic!("Failed to parse fixture {name}: {e}"))
}

fn exhaustive() -> MatchOptions {
    MatchOptions {
        sequence_strategy: SequenceStrategy::Exhaustive,
        ..MatchOptions::default()
    }
}

// ---------------------------------------------------------------------------
// Fixture payloads
// ---------------------------------------------------------------------------

#[test]
fn test_partial_order_is_found() {
    let orders = load_fixture("orders.json");
    let needle = json!({
        "orders": [
            {"customer": {"name": "Grace Hopper"}, "items": [{"sku": "C-3"}]}
        ]
    });
    assert!(contains_array(&needle, &orders));
}

#[test]
fn test_orders_out_of_order_are_found() {
    let orders = load_fixture("orders.json");
    let needle = json!({"orders": [{"id": 1003}, {"id": 1001}]});
    assert!(contains_array(&needle, &orders));
}

#[test]
fn test_wrong_nested_value_is_rejected() {
    let orders = load_fixture("orders.json");
    let needle = json!({"orders": [{"customer": {"name": "Grace Hopper", "email": "ada@example.com"}}]});
    assert!(!contains_array(&needle, &orders));
}

#[test]
fn test_numbers_match_numeric_strings() {
    let orders = load_fixture("orders.json");
    assert!(contains_array(&json!({"count": "3"}), &orders));
    assert!(contains_array(&json!({"orders": [{"id": "1002"}]}), &orders));
    assert!(!contains_array(&json!({"count": "3.0"}), &orders));
}

#[test]
fn test_null_only_matches_null() {
    let orders = load_fixture("orders.json");
    assert!(contains_array(&json!({"links": {"next": null}}), &orders));
    assert!(!contains_array(&json!({"links": {"next": ""}}), &orders));
}

// ---------------------------------------------------------------------------
// Matched subset
// ---------------------------------------------------------------------------

#[test]
fn test_matched_subset_reports_what_was_found() {
    let haystack = json!({"tags": ["a", "b"], "id": 1});
    let comparator = ArrayContainsComparator::new(&haystack);

    let needle = json!({"tags": ["b", "z"], "id": 1});
    assert!(!comparator.contains_array(&needle));
    assert_eq!(
        comparator.matched_subset(&needle),
        Some(json!({"tags": ["b"], "id": 1}))
    );
}

#[test]
fn test_matched_subset_of_incompatible_shapes_is_none() {
    let haystack = json!([1, 2]);
    let comparator = ArrayContainsComparator::new(&haystack);
    assert_eq!(comparator.matched_subset(&json!({"a": 1})), None);
}

// ---------------------------------------------------------------------------
// Sequence strategy
// ---------------------------------------------------------------------------

#[test]
fn test_exhaustive_recovers_assignment_greedy_misses() {
    let haystack = json!({"rows": [{"k": 1, "v": "x"}, {"k": 1}]});
    let needle = json!({"rows": [{"k": 1}, {"k": 1, "v": "x"}]});

    assert!(!contains_array(&needle, &haystack));
    assert!(contains_array_with(&needle, &haystack, &exhaustive()));
}

#[test]
fn test_strategies_agree_on_simple_inputs() {
    let cases = [
        (json!([1, 2]), json!([2, 3, 1])),
        (json!(["x", "x"]), json!(["x"])),
        (json!({"a": [1]}), json!({"a": [0, 1]})),
    ];
    for (needle, haystack) in cases {
        assert_eq!(
            contains_array(&needle, &haystack),
            contains_array_with(&needle, &haystack, &exhaustive()),
            "strategies disagree for {needle} in {haystack}"
        );
    }
}
