//! JSON documents: parsing and the XML view used for XPath queries.

use std::str::FromStr;

use serde_json::Value;
use sxd_document::dom::ChildOfRoot;
use sxd_document::parser;
use sxd_xpath::Value as XPathValue;

use crate::element::{Element, TagNaming};
use crate::error::MatchError;
use crate::xpath;

/// Name of the document element in the XML view.
pub const ROOT_TAG: &str = "root";

/// A parsed JSON document.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonDocument {
    root: Value,
}

impl JsonDocument {
    /// Parse a JSON string. Malformed input is a [`MatchError::JsonDecode`]
    /// carrying the parser's message and position.
    pub fn parse(json: &str) -> Result<Self, MatchError> {
        let root = serde_json::from_str(json).map_err(|err| {
            tracing::debug!(error = %err, "rejecting malformed JSON document");
            MatchError::from(err)
        })?;
        Ok(Self { root })
    }

    pub fn from_node(root: Value) -> Self {
        Self { root }
    }

    pub fn as_node(&self) -> &Value {
        &self.root
    }

    pub fn into_node(self) -> Value {
        self.root
    }

    /// Element tree with document element `root`.
    ///
    /// # Example
    /// ```
    /// use structassert_core::JsonDocument;
    ///
    /// let doc = JsonDocument::parse(r#"{"user": {"tags": ["a", "b"]}}"#).unwrap();
    /// let tree = doc.to_tree();
    /// assert_eq!(tree.to_node(), *doc.as_node());
    /// ```
    pub fn to_tree(&self) -> ElementTree {
        ElementTree {
            root: Element::from_node(ROOT_TAG, &self.root),
        }
    }

    /// Canonical XML rendering of [`JsonDocument::to_tree`].
    pub fn to_xml_string(&self) -> Result<String, MatchError> {
        self.to_tree().to_xml_string()
    }

    /// Nodes selected by an XPath expression over the XML view.
    ///
    /// Selected elements convert back to the node they hold; scalar XPath
    /// results are returned as a single node.
    pub fn filter_by_xpath(&self, expression: &str) -> Result<Vec<Value>, MatchError> {
        let package = self.to_tree().root.to_package();
        let document = package.as_document();
        let result = xpath::evaluate(&document, expression)?;
        let nodes = match result {
            XPathValue::Nodeset(nodes) => nodes
                .document_order()
                .into_iter()
                .map(|node| xpath::node_value(node, TagNaming::Placeholders))
                .collect(),
            scalar => vec![xpath::to_node(scalar, TagNaming::Placeholders)],
        };
        Ok(nodes)
    }

    /// Raw XPath result over the XML view: node sets become sequences,
    /// booleans, numbers and strings stay scalars.
    pub fn evaluate_xpath(&self, expression: &str) -> Result<Value, MatchError> {
        let package = self.to_tree().root.to_package();
        let document = package.as_document();
        let result = xpath::evaluate(&document, expression)?;
        let node = xpath::to_node(result, TagNaming::Placeholders);
        Ok(node)
    }
}

impl FromStr for JsonDocument {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JsonDocument::parse(s)
    }
}

/// The XML view of a document: an ordered element tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementTree {
    root: Element,
}

impl ElementTree {
    /// Read an XML string. Leaves hold their text as strings and element
    /// names are taken as written.
    pub fn from_xml(markup: &str) -> Result<Self, MatchError> {
        let package = parser::parse(markup).map_err(|err| MatchError::XmlParse {
            message: format!("{err:?}"),
        })?;
        let document = package.as_document();
        let root = document
            .root()
            .children()
            .into_iter()
            .find_map(|child| match child {
                ChildOfRoot::Element(element) => Some(Element::from_sxd(element)),
                _ => None,
            })
            .ok_or_else(|| MatchError::XmlParse {
                message: "document has no root element".to_string(),
            })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Convert back to a node.
    pub fn to_node(&self) -> Value {
        self.root.to_node()
    }

    pub fn to_xml_string(&self) -> Result<String, MatchError> {
        self.root.to_xml_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_parse_rejects_malformed_json() {
        let err = JsonDocument::parse("{\"a\": [1, }").unwrap_err();
        match err {
            MatchError::JsonDecode { line, .. } => assert_eq!(line, 1),
            other => panic!("Wrong variant: {:?}", other),
        }
    }

    #[test]
    fn test_from_str() {
        let doc: JsonDocument = "[1, 2]".parse().unwrap();
        assert_eq!(doc.into_node(), json!([1, 2]));
    }

    #[test]
    fn test_tree_round_trip_with_invalid_keys() {
        let doc = JsonDocument::parse(r#"{"ok": 1, "not ok": {"0": "zero"}, "list": [{"a": true}]}"#)
            .unwrap();
        let tree = doc.to_tree();
        assert_eq!(tree.root().name, "root");
        assert!(tree
            .root()
            .children()
            .iter()
            .any(|c| c.name.starts_with("invalidTag")));
        assert_eq!(tree.to_node(), *doc.as_node());
    }

    #[test]
    fn test_top_level_sequence_uses_item_elements() {
        let doc = JsonDocument::parse(r#"[{"id": 1}, {"id": 2}]"#).unwrap();
        let tree = doc.to_tree();
        let names: Vec<&str> = tree.root().children().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["item", "item"]);
        assert_eq!(tree.to_node(), *doc.as_node());
    }

    #[test]
    fn test_xml_string() {
        let doc = JsonDocument::parse(r#"{"user": {"name": "ada", "tags": ["x", "y"]}}"#).unwrap();
        let xml = doc.to_xml_string().unwrap();
        assert!(
            xml.contains("<root><user><name>ada</name><tags>x</tags><tags>y</tags></user></root>"),
            "{xml}"
        );
    }

    #[test]
    fn test_filter_by_xpath() {
        let doc = JsonDocument::parse(
            r#"{"users": [{"name": "ada", "role": "admin"}, {"name": "bob", "role": "user"}]}"#,
        )
        .unwrap();
        let admins = doc.filter_by_xpath("//users[role='admin']").unwrap();
        assert_eq!(admins, vec![json!({"name": "ada", "role": "admin"})]);

        let names = doc.filter_by_xpath("//users/name").unwrap();
        assert_eq!(names, vec![json!("ada"), json!("bob")]);
    }

    #[test]
    fn test_positional_mapping_is_queried_as_siblings() {
        let doc = JsonDocument::parse(r#"{"list": {"0": "a", "1": "b"}}"#).unwrap();
        let xml = doc.to_xml_string().unwrap();
        assert!(xml.contains("<root><list>a</list><list>b</list></root>"), "{xml}");
        assert_eq!(doc.filter_by_xpath("//list").unwrap(), vec![json!("a"), json!("b")]);
        assert_eq!(doc.to_tree().to_node(), *doc.as_node());
    }

    #[test]
    fn test_xpath_results_resolve_placeholder_names() {
        let doc = JsonDocument::parse(r#"{"item list": {"first name": "ada"}}"#).unwrap();
        let found = doc.filter_by_xpath("/root/*").unwrap();
        assert_eq!(found, vec![json!({"first name": "ada"})]);
    }

    #[test]
    fn test_evaluate_xpath_scalar() {
        let doc = JsonDocument::parse(r#"{"users": [{"id": 1}, {"id": 2}, {"id": 3}]}"#).unwrap();
        assert_eq!(doc.evaluate_xpath("count(//users)").unwrap(), json!(3.0));
    }

    #[test]
    fn test_malformed_xpath_is_error() {
        let doc = JsonDocument::parse(r#"{"a": 1}"#).unwrap();
        let err = doc.filter_by_xpath("//a[").unwrap_err();
        assert!(matches!(err, MatchError::XPath { .. }));
    }

    #[test]
    fn test_element_tree_from_xml() {
        let tree = ElementTree::from_xml("<doc><a>1</a><a>2</a><b/></doc>").unwrap();
        assert_eq!(tree.to_node(), json!({"a": ["1", "2"], "b": ""}));
        assert!(ElementTree::from_xml("<doc>").is_err());
    }

    #[test]
    fn test_element_tree_from_xml_keeps_placeholder_lookalikes() {
        let allocated = crate::element::tag_name_for("some key?");
        let markup = format!("<doc><{allocated}>x</{allocated}></doc>");
        let tree = ElementTree::from_xml(&markup).unwrap();
        assert_eq!(tree.to_node(), json!({ allocated.clone(): "x" }));
    }
}
