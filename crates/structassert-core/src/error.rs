//! Error types for structural matching.
//!
//! Ordinary mismatches are never errors: boolean entry points return `false`
//! and type-rule matching returns a [`TypeMismatch`] diagnostic. `MatchError`
//! is reserved for inputs that cannot be interpreted at all (malformed JSON,
//! XML, XPath, CSS selectors or filter patterns).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable, machine-readable error codes.
///
/// Variant names and their serialized `snake_case` strings are part of the
/// public contract and must not change across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ErrorCode {
    /// Malformed JSON document.
    JsonDecodeError,
    /// Malformed XML document or template.
    XmlParseError,
    /// XML could not be serialized.
    XmlWriteError,
    /// XPath expression could not be parsed or evaluated.
    XpathError,
    /// CSS selector outside the supported subset.
    InvalidSelector,
    /// Delimited regular expression could not be compiled.
    InvalidPattern,
    /// Locator matched no element.
    ElementNotFound,
}

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("JSON decode error at line {line}, column {column}: {message}")]
    JsonDecode {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("XML parse error: {message}")]
    XmlParse { message: String },

    #[error("XML write error: {0}")]
    XmlWrite(#[from] std::io::Error),

    #[error("Malformed XPath '{expression}': {message}")]
    XPath { expression: String, message: String },

    #[error("Invalid CSS selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Element not found: {locator}")]
    ElementNotFound { locator: String },
}

impl From<serde_json::Error> for MatchError {
    fn from(err: serde_json::Error) -> Self {
        MatchError::JsonDecode {
            message: err.to_string(),
            line: err.line(),
            column: err.column(),
        }
    }
}

impl MatchError {
    /// Returns the stable error code for this error variant.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            MatchError::JsonDecode { .. } => ErrorCode::JsonDecodeError,
            MatchError::XmlParse { .. } => ErrorCode::XmlParseError,
            MatchError::XmlWrite(_) => ErrorCode::XmlWriteError,
            MatchError::XPath { .. } => ErrorCode::XpathError,
            MatchError::InvalidSelector { .. } => ErrorCode::InvalidSelector,
            MatchError::InvalidPattern { .. } => ErrorCode::InvalidPattern,
            MatchError::ElementNotFound { .. } => ErrorCode::ElementNotFound,
        }
    }

    /// Returns the offending expression, pattern or locator, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            MatchError::JsonDecode { .. } => None,
            MatchError::XmlParse { .. } => None,
            MatchError::XmlWrite(_) => None,
            MatchError::XPath { expression, .. } => Some(expression),
            MatchError::InvalidSelector { selector, .. } => Some(selector),
            MatchError::InvalidPattern { pattern, .. } => Some(pattern),
            MatchError::ElementNotFound { locator } => Some(locator),
        }
    }

    /// Produces a structured JSON error.
    ///
    /// Format: `{"code": "...", "message": "...", "path": "..." | null}`
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "code": self.error_code(),
            "message": self.to_string(),
            "path": self.path(),
        })
    }
}

/// Diagnostic produced when data does not conform to a type-rule tree.
///
/// The message is the user-facing assertion failure text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TypeMismatch {
    pub message: String,
}

impl TypeMismatch {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
