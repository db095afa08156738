//! Type-rule expressions: `type:filter:filter|type:filter`.
//!
//! `|` separates alternatives and `:` separates a type name from its
//! filters. Neither splits inside parentheses, nor inside the delimited
//! pattern of a `regex(...)` filter, so `string:regex(~^a|b:c$~)` is a single
//! alternative with a single filter.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::node::ValueType;

/// One `type:filter:filter` alternative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alternative {
    /// Type name as written, trimmed and lowercased.
    pub type_name: String,
    /// Filters in evaluation order, trimmed.
    pub filters: Vec<String>,
}

impl Alternative {
    /// Whether this alternative applies to values of `value_type`.
    pub fn accepts(&self, value_type: ValueType) -> bool {
        ValueType::from_name(&self.type_name) == Some(value_type)
    }
}

/// A parsed type rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRule {
    source: String,
    alternatives: Vec<Alternative>,
}

impl TypeRule {
    /// Parse a rule. Parsing never fails: unknown type names simply never
    /// match and unknown filters evaluate to false.
    pub fn parse(source: &str) -> TypeRule {
        let alternatives = split_rule(source)
            .into_iter()
            .map(|segments| {
                let mut segments = segments.into_iter();
                let type_name = segments
                    .next()
                    .map(|t| t.trim().to_ascii_lowercase())
                    .unwrap_or_default();
                let filters = segments
                    .map(|f| f.trim().to_string())
                    .filter(|f| !f.is_empty())
                    .collect();
                Alternative { type_name, filters }
            })
            .collect();

        TypeRule {
            source: source.to_string(),
            alternatives,
        }
    }

    /// Rule leaves are strings; any other scalar is read through its JSON text.
    pub fn from_leaf(leaf: &Value) -> TypeRule {
        match leaf {
            Value::String(s) => TypeRule::parse(s),
            other => TypeRule::parse(&other.to_string()),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn alternatives(&self) -> &[Alternative] {
        &self.alternatives
    }
}

impl FromStr for TypeRule {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(TypeRule::parse(s))
    }
}

impl fmt::Display for TypeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Split a rule into alternatives, each a list of `:`-separated segments.
fn split_rule(source: &str) -> Vec<Vec<String>> {
    let chars: Vec<char> = source.chars().collect();
    let mut alternatives = Vec::new();
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '(' => {
                depth += 1;
                current.push(c);
                i += 1;
                if current.trim_start().trim_start_matches('!').trim_start() == "regex(" {
                    i = copy_delimited(&chars, i, &mut current);
                }
                continue;
            }
            ')' => depth = depth.saturating_sub(1),
            '|' if depth == 0 => {
                segments.push(std::mem::take(&mut current));
                alternatives.push(std::mem::take(&mut segments));
                i += 1;
                continue;
            }
            ':' if depth == 0 => {
                segments.push(std::mem::take(&mut current));
                i += 1;
                continue;
            }
            _ => {}
        }
        current.push(c);
        i += 1;
    }

    segments.push(current);
    alternatives.push(segments);
    alternatives
}

/// Copy a delimited pattern starting at `start` (delimiter, body, closing
/// delimiter, flags) into `out`, returning the index after it. Bare patterns
/// are left to the normal scanner.
fn copy_delimited(chars: &[char], start: usize, out: &mut String) -> usize {
    let Some(&open) = chars.get(start) else {
        return start;
    };
    if open.is_alphanumeric() || open.is_whitespace() || open == ')' || open == '\\' {
        return start;
    }
    let close = match open {
        '(' => ')',
        '{' => '}',
        '[' => ']',
        '<' => '>',
        other => other,
    };

    out.push(open);
    let mut nesting = 0usize;
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i];
        out.push(c);
        i += 1;
        if c == '\\' {
            if let Some(&escaped) = chars.get(i) {
                out.push(escaped);
                i += 1;
            }
            continue;
        }
        if c == close {
            if nesting == 0 {
                break;
            }
            nesting -= 1;
        } else if c == open {
            nesting += 1;
        }
    }

    while let Some(&flag) = chars.get(i) {
        if !flag.is_ascii_alphabetic() {
            break;
        }
        out.push(flag);
        i += 1;
    }
    i
}
