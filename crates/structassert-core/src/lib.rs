//! Structural assertions for test suites.
//!
//! Matchers that decide whether actual data "contains" or "conforms to" an
//! expected partial template:
//!
//! - [`contains_array`]: recursive needle-in-haystack containment;
//! - [`JsonType`]: type-rule trees such as `{"id": "integer:>0"}`;
//! - [`XmlStructure`]: XPath queries and tag-shape templates over XML;
//! - [`JsonDocument`]: JSON parsing with an XML view for XPath filtering.

pub mod config;
pub mod contains;
pub mod css;
pub mod element;
pub mod error;
pub mod json_document;
pub mod json_type;
pub mod node;
pub mod pattern;
pub mod xml_structure;
mod xpath;

pub use config::{ListMode, MatchOptions, SequenceStrategy};
pub use contains::{contains_array, contains_array_with, ArrayContainsComparator};
pub use element::{Content, Element, Origin, TagNaming};
pub use error::{ErrorCode, MatchError, TypeMismatch};
pub use json_document::{ElementTree, JsonDocument};
pub use json_type::{FilterRegistry, JsonType, TypeRule};
pub use node::{Node, Shape, ValueType};
pub use xml_structure::{MatchedElement, XmlInput, XmlStructure};
