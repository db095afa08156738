//! JSON type matching: checks data against a tree of type rules.
//!
//! A rule tree mirrors the expected data: nested mappings descend into the
//! data, string leaves are [`TypeRule`]s. Every key named by the rule tree
//! must exist in the data.
//!
//! ```
//! use serde_json::json;
//! use structassert_core::JsonType;
//!
//! let data = json!({"id": 5, "name": "ada", "tags": [], "owner": {"url": "https://a.b"}});
//! let rules = json!({
//!     "id": "integer:>0",
//!     "name": "string:!empty",
//!     "tags": "array",
//!     "owner": {"url": "string:url|null"},
//! });
//! assert!(JsonType::new(&data).matches(&rules).is_ok());
//! ```

mod filters;
mod rule;

pub use filters::{FilterFn, FilterRegistry};
pub use rule::{Alternative, TypeRule};

use serde_json::Value;

use crate::config::{ListMode, MatchOptions};
use crate::error::TypeMismatch;
use crate::node::{child, repr, ValueType};

/// Type-rule matcher bound to the data under test.
#[derive(Debug, Clone)]
pub struct JsonType<'d> {
    data: &'d Value,
    list_mode: ListMode,
}

impl<'d> JsonType<'d> {
    pub fn new(data: &'d Value) -> Self {
        Self {
            data,
            list_mode: ListMode::default(),
        }
    }

    pub fn with_options(mut self, options: &MatchOptions) -> Self {
        self.list_mode = options.list_mode;
        self
    }

    /// Match against `rules` with no custom filters.
    pub fn matches(&self, rules: &Value) -> Result<(), TypeMismatch> {
        self.matches_with(rules, &FilterRegistry::default())
    }

    /// Match against `rules`, resolving custom filters through `filters`.
    ///
    /// When the data is a list whose first element is a container, the list
    /// elements are checked instead of the list itself (see [`ListMode`]).
    pub fn matches_with(&self, rules: &Value, filters: &FilterRegistry) -> Result<(), TypeMismatch> {
        let Some(items) = self.list_of_records() else {
            return compare(self.data, rules, filters);
        };

        match self.list_mode {
            ListMode::FirstElement => compare(&items[0], rules, filters),
            ListMode::EachElement => {
                let failures: Vec<String> = items
                    .iter()
                    .filter_map(|item| compare(item, rules, filters).err())
                    .map(|mismatch| mismatch.message)
                    .collect();
                if failures.is_empty() {
                    Ok(())
                } else {
                    Err(TypeMismatch::new(failures.join("\n")))
                }
            }
        }
    }

    fn list_of_records(&self) -> Option<&'d [Value]> {
        match self.data {
            Value::Array(items)
                if matches!(items.first(), Some(Value::Array(_) | Value::Object(_))) =>
            {
                Some(items.as_slice())
            }
            _ => None,
        }
    }
}

fn compare(data: &Value, rules: &Value, registry: &FilterRegistry) -> Result<(), TypeMismatch> {
    let entries: Vec<(String, &Value)> = match rules {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        other => {
            return Err(TypeMismatch::new(format!(
                "Type rules must be a mapping, got {}",
                repr(other)
            )))
        }
    };

    for (key, rule) in entries {
        let Some(value) = child(data, &key) else {
            return Err(TypeMismatch::new(format!(
                "Key '{}' doesn't exist in {}",
                key,
                repr(data)
            )));
        };

        if rule.is_object() || rule.is_array() {
            compare(value, rule, registry)?;
            continue;
        }

        let type_rule = TypeRule::from_leaf(rule);
        if !leaf_matches(&type_rule, value, registry) {
            tracing::debug!(key = %key, rule = %type_rule, "type rule mismatch");
            return Err(TypeMismatch::new(format!(
                "`{}: {}` is not of type `{}`",
                key,
                repr(value),
                type_rule
            )));
        }
    }

    Ok(())
}

fn leaf_matches(rule: &TypeRule, value: &Value, registry: &FilterRegistry) -> bool {
    let current = ValueType::of(value);
    rule.alternatives()
        .iter()
        .filter(|alternative| alternative.accepts(current))
        .any(|alternative| {
            alternative
                .filters
                .iter()
                .all(|filter| filters::matches_filter(filter, value, registry))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_alternation() {
        let data = json!({"id": 5});
        let checker = JsonType::new(&data);
        assert!(checker.matches(&json!({"id": "integer:>0|string:>0"})).is_ok());

        let err = checker.matches(&json!({"id": "string"})).unwrap_err();
        assert_eq!(err.message, "`id: 5` is not of type `string`");
    }

    #[test]
    fn test_type_name_is_case_insensitive() {
        let data = json!({"price": 1.5});
        assert!(JsonType::new(&data).matches(&json!({"price": "Double"})).is_ok());
        assert!(JsonType::new(&data).matches(&json!({"price": "FLOAT:<2"})).is_ok());
    }

    #[test]
    fn test_missing_key_diagnostic() {
        let data = json!({"a": 1});
        let err = JsonType::new(&data).matches(&json!({"b": "integer"})).unwrap_err();
        assert_eq!(err.message, "Key 'b' doesn't exist in {\"a\":1}");
    }

    #[test]
    fn test_nested_diagnostic_is_propagated() {
        let data = json!({"user": {"name": 3}});
        let err = JsonType::new(&data)
            .matches(&json!({"user": {"name": "string"}}))
            .unwrap_err();
        assert_eq!(err.message, "`name: 3` is not of type `string`");
    }

    #[test]
    fn test_type_mismatch_skips_filters() {
        let mut filters = FilterRegistry::new();
        filters
            .register("boom", |_, _| panic!("filter must not run for other types"))
            .unwrap();
        let data = json!({"a": 1});
        assert!(JsonType::new(&data)
            .matches_with(&json!({"a": "string:boom|integer"}), &filters)
            .is_ok());
    }

    #[test]
    fn test_every_filter_must_pass() {
        let data = json!({"n": 5});
        assert!(JsonType::new(&data).matches(&json!({"n": "integer:>1:<10"})).is_ok());
        assert!(JsonType::new(&data).matches(&json!({"n": "integer:>1:<3"})).is_err());
    }

    #[test]
    fn test_list_uses_first_element_by_default() {
        let data = json!([{"id": 1}, {"id": "two"}]);
        let rules = json!({"id": "integer"});
        assert!(JsonType::new(&data).matches(&rules).is_ok());

        let options = MatchOptions {
            list_mode: ListMode::EachElement,
            ..MatchOptions::default()
        };
        let err = JsonType::new(&data)
            .with_options(&options)
            .matches(&rules)
            .unwrap_err();
        assert_eq!(err.message, "`id: \"two\"` is not of type `integer`");
    }

    #[test]
    fn test_list_of_scalars_is_indexed() {
        let data = json!(["a", 2]);
        assert!(JsonType::new(&data)
            .matches(&json!({"0": "string", "1": "integer"}))
            .is_ok());
    }

    #[test]
    fn test_scalar_rule_tree_is_rejected() {
        let data = json!({"a": 1});
        let err = JsonType::new(&data).matches(&json!("integer")).unwrap_err();
        assert!(err.message.contains("must be a mapping"));
    }
}
