//! Filter evaluation for type rules: custom filter registry and builtins.
//!
//! Evaluation order for a single filter:
//!
//! 1. `!expr` negates the evaluation of `expr`.
//! 2. Custom filters, in registration order. A filter registered under a
//!    delimited pattern (`/len\((\d+)\)/`) applies when the pattern matches
//!    the filter text and receives the capture groups; any other name applies
//!    on exact equality.
//! 3. Builtins: `=value` (loose equality), `url`, `date`, `empty`,
//!    `regex(pattern)`, `>N`, `<N`.
//!
//! A filter nobody recognises evaluates to `false`. It is not an error.

use std::fmt;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde_json::Value;
use url::Url;

use crate::error::MatchError;
use crate::node::{is_empty_value, loose_equals, value_as_f64, value_text};
use crate::pattern;

/// Predicate signature for custom filters: the value under test and the
/// capture groups of a pattern-named filter (empty for exact names).
pub type FilterFn = dyn Fn(&Value, &[&str]) -> bool + Send + Sync;

const DATE_PATTERN: &str =
    r"^(\d\d\d\d)-(\d\d)-(\d\d)T(\d\d):(\d\d):(\d\d)(\.\d+)?(([+-]\d\d:\d\d)|Z)?$";

fn date_regex() -> &'static Regex {
    static DATE: OnceLock<Regex> = OnceLock::new();
    DATE.get_or_init(|| Regex::new(DATE_PATTERN).expect("date pattern is valid"))
}

fn comparison_regex() -> &'static Regex {
    static COMPARISON: OnceLock<Regex> = OnceLock::new();
    COMPARISON.get_or_init(|| Regex::new(r"^([<>])([\d.]+)$").expect("comparison pattern is valid"))
}

#[derive(Clone)]
enum FilterKey {
    Exact,
    Pattern(Regex),
}

#[derive(Clone)]
struct CustomFilter {
    name: String,
    key: FilterKey,
    predicate: Arc<FilterFn>,
}

/// User-defined filters available to type rules.
///
/// Registration takes `&mut self` and evaluation `&self`; wrap the registry
/// in a `RwLock` to share it between threads that register concurrently.
#[derive(Clone, Default)]
pub struct FilterRegistry {
    filters: Vec<CustomFilter>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a filter under an exact name or a delimited pattern
    /// (names starting with `/`).
    ///
    /// Registering an existing name replaces its predicate in place, keeping
    /// its position in the evaluation order.
    ///
    /// # Example
    /// ```
    /// use serde_json::json;
    /// use structassert_core::{FilterRegistry, JsonType};
    ///
    /// let mut filters = FilterRegistry::new();
    /// filters
    ///     .register(r"/len\((\d+)\)/", |value, args| {
    ///         let expected: usize = args[0].parse().unwrap_or(0);
    ///         value.as_str().map(|s| s.chars().count() == expected).unwrap_or(false)
    ///     })
    ///     .unwrap();
    ///
    /// let data = json!({"code": "ABC"});
    /// let checker = JsonType::new(&data);
    /// assert!(checker.matches_with(&json!({"code": "string:len(3)"}), &filters).is_ok());
    /// ```
    pub fn register<F>(&mut self, name: impl Into<String>, predicate: F) -> Result<(), MatchError>
    where
        F: Fn(&Value, &[&str]) -> bool + Send + Sync + 'static,
    {
        let name = name.into();
        let key = if name.starts_with('/') {
            FilterKey::Pattern(pattern::compile(&name)?)
        } else {
            FilterKey::Exact
        };
        let filter = CustomFilter {
            name,
            key,
            predicate: Arc::new(predicate),
        };

        match self.filters.iter_mut().find(|f| f.name == filter.name) {
            Some(existing) => *existing = filter,
            None => self.filters.push(filter),
        }
        Ok(())
    }

    /// Remove every custom filter.
    pub fn clear(&mut self) {
        self.filters.clear();
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.filters.iter().map(|f| f.name.as_str())
    }

    /// Apply the first custom filter that recognises `filter`.
    fn apply(&self, filter: &str, value: &Value) -> Option<bool> {
        for custom in &self.filters {
            match &custom.key {
                FilterKey::Pattern(re) => {
                    if let Some(caps) = re.captures(filter) {
                        let args: Vec<&str> = caps
                            .iter()
                            .skip(1)
                            .map(|m| m.map_or("", |m| m.as_str()))
                            .collect();
                        return Some((custom.predicate)(value, &args));
                    }
                }
                FilterKey::Exact => {
                    if custom.name == filter {
                        return Some((custom.predicate)(value, &[]));
                    }
                }
            }
        }
        None
    }
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterRegistry")
            .field("filters", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

/// Evaluate one filter against a value.
pub(crate) fn matches_filter(filter: &str, value: &Value, registry: &FilterRegistry) -> bool {
    let filter = filter.trim();
    if let Some(inner) = filter.strip_prefix('!') {
        return !matches_filter(inner, value, registry);
    }

    if let Some(result) = registry.apply(filter, value) {
        tracing::trace!(filter, result, "custom filter");
        return result;
    }

    let result = builtin(filter, value);
    if result.is_none() {
        tracing::trace!(filter, "unknown filter, treated as non-matching");
    }
    result.unwrap_or(false)
}

fn builtin(filter: &str, value: &Value) -> Option<bool> {
    if let Some(expected) = filter.strip_prefix('=') {
        return Some(loose_equals(value, expected));
    }

    match filter {
        "url" => return Some(Url::parse(&value_text(value)).is_ok()),
        "date" => return Some(date_regex().is_match(&value_text(value))),
        "empty" => return Some(is_empty_value(value)),
        _ => {}
    }

    if let Some(source) = filter
        .strip_prefix("regex(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        return Some(match pattern::compile(source) {
            Ok(re) => re.is_match(&value_text(value)),
            Err(err) => {
                tracing::warn!(filter, error = %err, "regex filter cannot be compiled");
                false
            }
        });
    }

    let caps = comparison_regex().captures(filter)?;
    let bound: f64 = caps[2].parse().ok()?;
    let actual = value_as_f64(value);
    Some(match &caps[1] {
        ">" => actual > bound,
        _ => actual < bound,
    })
}
