//! XML structure matching: XPath point queries, element lookup and
//! tag-shape templates.

use serde_json::Value;
use sxd_document::dom::{self, ChildOfElement, ChildOfRoot, Document};
use sxd_document::{parser, Package, QName};
use sxd_xpath::nodeset::Node;
use sxd_xpath::Value as XPathValue;

use crate::css;
use crate::element::{Element, TagNaming};
use crate::error::MatchError;
use crate::json_document::ROOT_TAG;
use crate::node::Shape;
use crate::xpath;

/// Input accepted by [`XmlStructure::new`] and
/// [`XmlStructure::match_xml_structure`].
#[derive(Debug, Clone, Copy)]
pub enum XmlInput<'a> {
    /// XML markup.
    Markup(&'a str),
    /// A node converted to XML. A mapping with a single non-sequence entry
    /// becomes that element; anything else is wrapped in `root`.
    Node(&'a Value),
}

impl<'a> From<&'a str> for XmlInput<'a> {
    fn from(markup: &'a str) -> Self {
        XmlInput::Markup(markup)
    }
}

impl<'a> From<&'a String> for XmlInput<'a> {
    fn from(markup: &'a String) -> Self {
        XmlInput::Markup(markup.as_str())
    }
}

impl<'a> From<&'a Value> for XmlInput<'a> {
    fn from(node: &'a Value) -> Self {
        XmlInput::Node(node)
    }
}

/// Element returned by [`XmlStructure::match_element`].
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedElement {
    pub name: String,
    /// XPath string value: all descendant text, concatenated.
    pub text: String,
    /// Attributes sorted by name.
    pub attributes: Vec<(String, String)>,
    /// Node form of the element's content.
    pub value: Value,
}

/// An XML document under test.
///
/// # Example
/// ```
/// use structassert_core::XmlStructure;
///
/// let xml = XmlStructure::new("<user><name>ada</name><email>a@b.c</email></user>").unwrap();
/// assert!(xml.matches_xpath("//user/name").unwrap());
/// assert!(xml.match_xml_structure("<user><email/></user>").unwrap());
/// assert!(!xml.match_xml_structure("<user><phone/></user>").unwrap());
/// ```
pub struct XmlStructure {
    package: Package,
    naming: TagNaming,
}

impl XmlStructure {
    pub fn new<'a>(input: impl Into<XmlInput<'a>>) -> Result<Self, MatchError> {
        let input = input.into();
        let naming = match input {
            XmlInput::Markup(_) => TagNaming::Literal,
            XmlInput::Node(_) => TagNaming::Placeholders,
        };
        Ok(Self {
            package: load(input)?,
            naming,
        })
    }

    /// Whether `expression` selects anything.
    ///
    /// Node sets match when non-empty; other results use XPath `boolean()`
    /// conversion.
    pub fn matches_xpath(&self, expression: &str) -> Result<bool, MatchError> {
        let document = self.package.as_document();
        let result = xpath::evaluate(&document, expression)?;
        let matched = match result {
            XPathValue::Nodeset(nodes) => nodes.size() > 0,
            XPathValue::Boolean(b) => b,
            XPathValue::Number(n) => n != 0.0 && !n.is_nan(),
            XPathValue::String(s) => !s.is_empty(),
        };
        tracing::debug!(expression, matched, "xpath match");
        Ok(matched)
    }

    /// First element located by a CSS selector or, failing that, by an XPath
    /// expression.
    pub fn match_element(&self, locator: &str) -> Result<MatchedElement, MatchError> {
        let document = self.package.as_document();

        let css_error = match css::to_xpath(locator) {
            Ok(expression) => {
                if let Some(found) = first_element(&document, &expression, self.naming)? {
                    return Ok(found);
                }
                None
            }
            Err(err) => {
                tracing::debug!(locator, error = %err, "not a CSS selector, trying XPath");
                Some(err)
            }
        };

        match first_element(&document, locator, self.naming) {
            Ok(Some(found)) => Ok(found),
            // Valid CSS is not always valid XPath; only report the XPath
            // error when the locator was not CSS either.
            Err(err) if css_error.is_some() => Err(err),
            _ => Err(MatchError::ElementNotFound {
                locator: locator.to_string(),
            }),
        }
    }

    /// Whether some element shaped like `template` exists.
    ///
    /// Candidates are the elements named like the template's document
    /// element. A candidate matches when every child tag of the template is
    /// found among the candidate's same-named children, recursively. Text and
    /// attributes are ignored.
    pub fn match_xml_structure<'a>(
        &self,
        template: impl Into<XmlInput<'a>>,
    ) -> Result<bool, MatchError> {
        let template = load(template.into())?;
        let template_doc = template.as_document();
        let Some(template_root) = document_element(&template_doc) else {
            return Ok(false);
        };

        let document = self.package.as_document();
        let mut candidates = Vec::new();
        if let Some(root) = document_element(&document) {
            collect_named(root, template_root.name(), &mut candidates);
        }

        let matched = candidates
            .iter()
            .any(|candidate| shape_matches(template_root, *candidate));
        tracing::debug!(
            tag = template_root.name().local_part(),
            candidates = candidates.len(),
            matched,
            "xml structure match"
        );
        Ok(matched)
    }
}

impl std::fmt::Debug for XmlStructure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let document = self.package.as_document();
        let root = document_element(&document).map(|e| e.name().local_part().to_string());
        f.debug_struct("XmlStructure").field("root", &root).finish()
    }
}

fn load(input: XmlInput<'_>) -> Result<Package, MatchError> {
    match input {
        XmlInput::Markup(markup) => parser::parse(markup).map_err(|err| MatchError::XmlParse {
            message: format!("{err:?}"),
        }),
        XmlInput::Node(node) => Ok(element_for_node(node).to_package()),
    }
}

fn element_for_node(node: &Value) -> Element {
    match node {
        Value::Object(map) if map.len() == 1 => match map.iter().next() {
            Some((key, value)) if !value.is_array() && Shape::of(value) != Shape::Sequential => {
                Element::from_node(key, value)
            }
            _ => Element::from_node(ROOT_TAG, node),
        },
        _ => Element::from_node(ROOT_TAG, node),
    }
}

fn document_element<'d>(document: &Document<'d>) -> Option<dom::Element<'d>> {
    document.root().children().into_iter().find_map(|child| match child {
        ChildOfRoot::Element(element) => Some(element),
        _ => None,
    })
}

fn child_elements(element: dom::Element<'_>) -> impl Iterator<Item = dom::Element<'_>> {
    element.children().into_iter().filter_map(|child| match child {
        ChildOfElement::Element(e) => Some(e),
        _ => None,
    })
}

/// Elements named `name` at or below `element`, in document order.
fn collect_named<'d>(
    element: dom::Element<'d>,
    name: QName<'_>,
    out: &mut Vec<dom::Element<'d>>,
) {
    if element.name() == name {
        out.push(element);
    }
    for child in child_elements(element) {
        collect_named(child, name, out);
    }
}

fn shape_matches(template: dom::Element<'_>, candidate: dom::Element<'_>) -> bool {
    child_elements(template).all(|expected| {
        child_elements(candidate)
            .filter(|actual| actual.name() == expected.name())
            .any(|actual| shape_matches(expected, actual))
    })
}

fn first_element<'d>(
    document: &'d Document<'d>,
    expression: &str,
    naming: TagNaming,
) -> Result<Option<MatchedElement>, MatchError> {
    let result = xpath::evaluate(document, expression)?;
    let found = match result {
        XPathValue::Nodeset(nodes) => nodes
            .document_order()
            .into_iter()
            .find_map(|node| match node {
                Node::Element(element) => Some(matched_element(element, naming)),
                _ => None,
            }),
        _ => None,
    };
    Ok(found)
}

fn matched_element(element: dom::Element<'_>, naming: TagNaming) -> MatchedElement {
    let mut attributes: Vec<(String, String)> = element
        .attributes()
        .into_iter()
        .map(|attr| (attr.name().local_part().to_string(), attr.value().to_string()))
        .collect();
    attributes.sort();

    MatchedElement {
        name: element.name().local_part().to_string(),
        text: Node::Element(element).string_value(),
        attributes,
        value: Element::from_sxd_with(element, naming).to_node(),
    }
}
