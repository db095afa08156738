//! XPath evaluation over `sxd-document` trees.

use serde_json::Value;
use sxd_document::dom::{ChildOfRoot, Document};
use sxd_xpath::nodeset::Node;
use sxd_xpath::{evaluate_xpath, Value as XPathValue};

use crate::element::{Element, TagNaming};
use crate::error::MatchError;

/// Evaluate `expression` against the document root.
pub(crate) fn evaluate<'d>(
    document: &'d Document<'d>,
    expression: &str,
) -> Result<XPathValue<'d>, MatchError> {
    evaluate_xpath(document, expression).map_err(|err| MatchError::XPath {
        expression: expression.to_string(),
        message: err.to_string(),
    })
}

/// Node form of an XPath result. Node sets become sequences.
pub(crate) fn to_node(value: XPathValue<'_>, naming: TagNaming) -> Value {
    match value {
        XPathValue::Boolean(b) => Value::Bool(b),
        XPathValue::Number(n) => serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        XPathValue::String(s) => Value::String(s),
        XPathValue::Nodeset(nodes) => Value::Array(
            nodes
                .document_order()
                .into_iter()
                .map(|node| node_value(node, naming))
                .collect(),
        ),
    }
}

/// Elements convert to the node they hold; other nodes to their string value.
pub(crate) fn node_value(node: Node<'_>, naming: TagNaming) -> Value {
    match node {
        Node::Element(element) => Element::from_sxd_with(element, naming).to_node(),
        Node::Root(root) => root
            .children()
            .into_iter()
            .find_map(|child| match child {
                ChildOfRoot::Element(element) => {
                    Some(Element::from_sxd_with(element, naming).to_node())
                }
                _ => None,
            })
            .unwrap_or(Value::Null),
        other => Value::String(other.string_value()),
    }
}
