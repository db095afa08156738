//! Array containment: decides whether a needle container is reproduced
//! inside a haystack container.
//!
//! The matcher builds the *matched subset* of the needle: every needle entry
//! that found a counterpart in the haystack. The needle is contained iff that
//! subset deep-equals the needle, so nothing was silently dropped.
//!
//! | Needle      | Haystack    | Algorithm                                         |
//! |-------------|-------------|---------------------------------------------------|
//! | sequential  | sequential  | positional scan, each haystack element used once  |
//! | associative | associative | common keys, or descend one level if none shared  |
//! | empty       | container   | always matches                                    |
//! | mismatched  |             | no match                                          |

use serde_json::{Map, Value};

use crate::config::{MatchOptions, SequenceStrategy};
use crate::node::{is_equal_value, Shape};

/// Check whether `needle` is contained in `haystack` with default options.
///
/// # Example
/// ```
/// use serde_json::json;
/// use structassert_core::contains_array;
///
/// let haystack = json!({"user": {"id": 1, "tags": ["a", "b"]}, "ok": true});
/// assert!(contains_array(&json!({"user": {"tags": ["b"]}}), &haystack));
/// assert!(!contains_array(&json!({"user": {"tags": ["c"]}}), &haystack));
/// ```
pub fn contains_array(needle: &Value, haystack: &Value) -> bool {
    contains_array_with(needle, haystack, &MatchOptions::default())
}

/// Check whether `needle` is contained in `haystack`.
pub fn contains_array_with(needle: &Value, haystack: &Value, options: &MatchOptions) -> bool {
    ArrayContainsComparator::new(haystack)
        .with_options(options)
        .contains_array(needle)
}

/// Containment matcher bound to a haystack.
#[derive(Debug, Clone)]
pub struct ArrayContainsComparator<'h> {
    haystack: &'h Value,
    strategy: SequenceStrategy,
}

impl<'h> ArrayContainsComparator<'h> {
    pub fn new(haystack: &'h Value) -> Self {
        Self {
            haystack,
            strategy: SequenceStrategy::default(),
        }
    }

    pub fn with_options(mut self, options: &MatchOptions) -> Self {
        self.strategy = options.sequence_strategy;
        self
    }

    pub fn contains_array(&self, needle: &Value) -> bool {
        let contained = self.matched_subset(needle).as_ref() == Some(needle);
        tracing::debug!(contained, strategy = ?self.strategy, "containment check");
        contained
    }

    /// The part of `needle` that could be matched, or `None` when the
    /// top-level shapes are incompatible.
    pub fn matched_subset(&self, needle: &Value) -> Option<Value> {
        self.match_subset(needle, self.haystack)
    }

    fn match_subset(&self, needle: &Value, haystack: &Value) -> Option<Value> {
        match (Shape::of(needle), Shape::of(haystack)) {
            (Shape::Scalar, _) | (_, Shape::Scalar) => None,
            (Shape::Empty, _) => Some(needle.clone()),
            (Shape::Sequential, Shape::Sequential) => Some(self.sequential_subset(needle, haystack)),
            (Shape::Sequential, Shape::Empty) => Some(empty_like(needle)),
            (Shape::Associative, Shape::Associative) => match (needle, haystack) {
                (Value::Object(n), Value::Object(h)) => self.associative_subset(n, h),
                _ => None,
            },
            (Shape::Associative, Shape::Empty) => Some(Value::Object(Map::new())),
            (Shape::Sequential, Shape::Associative) | (Shape::Associative, Shape::Sequential) => {
                None
            }
        }
    }

    /// A needle element matches a haystack element when the recursive match
    /// reproduces it entirely, or when both are equal scalars.
    fn element_match(&self, needle: &Value, haystack: &Value) -> Option<Value> {
        if let Some(matched) = self.match_subset(needle, haystack) {
            if matched == *needle {
                return Some(matched);
            }
        }
        is_equal_value(needle, haystack).then(|| needle.clone())
    }

    fn sequential_subset(&self, needle: &Value, haystack: &Value) -> Value {
        let needle_items = values(needle);
        let haystack_items = values(haystack);

        let matched = match self.strategy {
            SequenceStrategy::Greedy => self.greedy_assignment(&needle_items, &haystack_items),
            SequenceStrategy::Exhaustive => self
                .complete_assignment(&needle_items, &haystack_items)
                .unwrap_or_else(|| self.greedy_assignment(&needle_items, &haystack_items)),
        };

        rebuild_like(needle, matched)
    }

    /// First unconsumed haystack element wins; unmatched needle elements are
    /// dropped.
    fn greedy_assignment(&self, needle: &[&Value], haystack: &[&Value]) -> Vec<(usize, Value)> {
        let mut consumed = vec![false; haystack.len()];
        let mut matched = Vec::new();

        for (ni, n) in needle.iter().enumerate() {
            for (hi, h) in haystack.iter().enumerate() {
                if consumed[hi] {
                    continue;
                }
                if let Some(value) = self.element_match(n, h) {
                    consumed[hi] = true;
                    matched.push((ni, value));
                    break;
                }
            }
        }

        matched
    }

    /// Backtracking search over all candidate pairs. `None` when no
    /// assignment covers every needle element.
    fn complete_assignment(
        &self,
        needle: &[&Value],
        haystack: &[&Value],
    ) -> Option<Vec<(usize, Value)>> {
        let candidates: Vec<Vec<(usize, Value)>> = needle
            .iter()
            .map(|n| {
                haystack
                    .iter()
                    .enumerate()
                    .filter_map(|(hi, h)| self.element_match(n, h).map(|v| (hi, v)))
                    .collect()
            })
            .collect();

        if candidates.iter().any(Vec::is_empty) {
            return None;
        }

        let mut used = vec![false; haystack.len()];
        let mut chosen = Vec::with_capacity(needle.len());
        if !assign(&candidates, 0, &mut used, &mut chosen) {
            tracing::debug!("no complete sequential assignment, falling back to greedy");
            return None;
        }

        Some(
            candidates
                .into_iter()
                .zip(chosen)
                .enumerate()
                .map(|(ni, (mut options, slot))| (ni, options.swap_remove(slot).1))
                .collect(),
        )
    }

    fn associative_subset(
        &self,
        needle: &Map<String, Value>,
        haystack: &Map<String, Value>,
    ) -> Option<Value> {
        let mut result = Map::new();
        let mut common_keys = 0usize;

        for (key, n) in needle {
            let Some(h) = haystack.get(key) else {
                continue;
            };
            common_keys += 1;

            if let Some(matched) = self.match_subset(n, h) {
                if matched == *n || !is_empty_container(&matched) {
                    result.insert(key.clone(), matched);
                    continue;
                }
            }
            if is_equal_value(n, h) {
                result.insert(key.clone(), n.clone());
            }
        }

        // Needle may sit one level deeper than the haystack it was given,
        // e.g. a keyed relation wrapping the expected object.
        if common_keys == 0 {
            let whole = Value::Object(needle.clone());
            for h in haystack.values() {
                if let Some(matched) = self.match_subset(&whole, h) {
                    if matched == whole {
                        return Some(matched);
                    }
                }
            }
        }

        if result.len() < needle.len().min(haystack.len()) {
            tracing::debug!(
                matched = result.len(),
                needle = needle.len(),
                haystack = haystack.len(),
                "rejecting partial associative match"
            );
            return None;
        }

        Some(Value::Object(result))
    }
}

fn assign(
    candidates: &[Vec<(usize, Value)>],
    index: usize,
    used: &mut [bool],
    chosen: &mut Vec<usize>,
) -> bool {
    let Some(options) = candidates.get(index) else {
        return true;
    };

    for (slot, (hi, _)) in options.iter().enumerate() {
        if used[*hi] {
            continue;
        }
        used[*hi] = true;
        chosen.push(slot);
        if assign(candidates, index + 1, used, chosen) {
            return true;
        }
        used[*hi] = false;
        chosen.pop();
    }

    false
}

fn values(container: &Value) -> Vec<&Value> {
    match container {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => map.values().collect(),
        _ => Vec::new(),
    }
}

fn empty_like(container: &Value) -> Value {
    match container {
        Value::Object(_) => Value::Object(Map::new()),
        _ => Value::Array(Vec::new()),
    }
}

/// Rebuild matched entries in the needle's own container kind, keeping the
/// needle's keys for positional objects.
fn rebuild_like(needle: &Value, matched: Vec<(usize, Value)>) -> Value {
    match needle {
        Value::Object(map) => {
            let keys: Vec<&String> = map.keys().collect();
            Value::Object(
                matched
                    .into_iter()
                    .map(|(i, value)| (keys[i].clone(), value))
                    .collect(),
            )
        }
        _ => Value::Array(matched.into_iter().map(|(_, value)| value).collect()),
    }
}

fn is_empty_container(value: &Value) -> bool {
    matches!(Shape::of(value), Shape::Empty)
}
