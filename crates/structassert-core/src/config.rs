//! Configuration for structural matching.

use serde::{Deserialize, Serialize};

/// How sequential containers are matched against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SequenceStrategy {
    /// Each needle element takes the first unconsumed haystack element that
    /// matches it. No backtracking: a valid assignment that needs a later
    /// haystack element for an earlier needle element can be missed.
    #[default]
    Greedy,
    /// Backtracking search for a complete needle → haystack assignment.
    /// Finds one whenever it exists, at exponential worst-case cost.
    Exhaustive,
}

/// How a top-level list of objects is checked against a type-rule tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListMode {
    /// Only the first element is checked.
    #[default]
    FirstElement,
    /// Every element is checked; diagnostics are joined with newlines.
    EachElement,
}

/// Options for structural matching.
///
/// ## Serialization Format
///
/// Fields are serialized in `kebab-case` (e.g., `sequence-strategy`,
/// `list-mode`). Missing fields take their defaults, which reproduce the
/// legacy matching semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct MatchOptions {
    /// Strategy for sequential containment. Default: greedy.
    pub sequence_strategy: SequenceStrategy,
    /// Strategy for list-of-objects type checking. Default: first element.
    pub list_mode: ListMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_options_serde_round_trip() {
        let opts = MatchOptions {
            sequence_strategy: SequenceStrategy::Exhaustive,
            list_mode: ListMode::EachElement,
        };

        let json = serde_json::to_string(&opts).unwrap();

        assert!(json.contains("\"sequence-strategy\""));
        assert!(json.contains("\"list-mode\""));
        assert!(json.contains("\"exhaustive\""));
        assert!(json.contains("\"each-element\""));

        let deserialized: MatchOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, opts);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let opts: MatchOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts.sequence_strategy, SequenceStrategy::Greedy);
        assert_eq!(opts.list_mode, ListMode::FirstElement);
    }
}
