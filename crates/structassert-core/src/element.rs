//! Ordered element trees, the XML view of a node.
//!
//! Conversion rules from a node:
//!
//! - a mapping key becomes a child element of that name;
//! - a sequence under key `k` becomes repeated sibling `k` elements, and so
//!   does a mapping keyed `"0".."n-1"` (numeric keys never become tags);
//! - a sequence that is not under a key (the document itself, or a sequence
//!   inside a sequence) becomes `item` children;
//! - keys that are not valid XML names are replaced by `invalidTagN`
//!   placeholders, allocated once per process so the same key always gets
//!   the same placeholder.
//!
//! Elements remember which siblings came from a sequence or a positional
//! mapping, so [`Element::to_node`] restores the original node exactly.
//! Placeholder names are only resolved for elements of a rendered tree;
//! markup read with [`TagNaming::Literal`] keeps every name as written.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, OnceLock, PoisonError};

use serde_json::{Map, Value};
use sxd_document::dom::{self, ChildOfElement, Document};
use sxd_document::{writer, Package};

use crate::error::MatchError;
use crate::node::{value_text, Shape};

const SEQUENCE_ITEM: &str = "item";
const PLACEHOLDER_PREFIX: &str = "invalidTag";

/// Content of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// Scalar leaf. Elements read from XML carry their text as a string.
    Text(Value),
    /// Keyed children; repeated names fold into a sequence.
    Mapping(Vec<Element>),
    /// Positional children.
    Sequence(Vec<Element>),
}

/// Where an element came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The value under a mapping key.
    Entry,
    /// One position of a sequence.
    ListItem,
    /// One position of a mapping keyed `"0".."n-1"`.
    PositionalItem,
    /// Read from XML markup; the name is a key as written.
    Markup,
}

/// How element names of a parsed document map back to keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagNaming {
    /// Names are keys as written.
    Literal,
    /// The document was rendered from a node: `invalidTagN` names resolve to
    /// the keys they were allocated for.
    Placeholders,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub content: Content,
    pub origin: Origin,
}

impl Element {
    /// Build the element named `key` holding `node`.
    pub fn from_node(key: &str, node: &Value) -> Element {
        Element {
            name: tag_name_for(key),
            content: content_for(node),
            origin: Origin::Entry,
        }
    }

    /// Convert an element parsed from an XML document, keeping names as
    /// written.
    ///
    /// Attributes, comments and processing instructions are dropped; text is
    /// kept only for elements without element children.
    pub fn from_sxd(element: dom::Element<'_>) -> Element {
        Element::from_sxd_with(element, TagNaming::Literal)
    }

    pub fn from_sxd_with(element: dom::Element<'_>, naming: TagNaming) -> Element {
        let mut children = Vec::new();
        let mut text = String::new();
        for child in element.children() {
            match child {
                ChildOfElement::Element(e) => children.push(Element::from_sxd_with(e, naming)),
                ChildOfElement::Text(t) => text.push_str(t.text()),
                _ => {}
            }
        }

        let content = if children.is_empty() {
            Content::Text(Value::String(text))
        } else {
            Content::Mapping(children)
        };

        Element {
            name: element.name().local_part().to_string(),
            content,
            origin: match naming {
                TagNaming::Literal => Origin::Markup,
                TagNaming::Placeholders => Origin::Entry,
            },
        }
    }

    pub fn children(&self) -> &[Element] {
        match &self.content {
            Content::Mapping(children) | Content::Sequence(children) => children,
            Content::Text(_) => &[],
        }
    }

    /// The node this element holds, with placeholder names resolved back to
    /// their original keys.
    pub fn to_node(&self) -> Value {
        match &self.content {
            Content::Text(value) => value.clone(),
            Content::Sequence(items) if is_positional(items) => Value::Object(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| (i.to_string(), item.to_node()))
                    .collect(),
            ),
            Content::Sequence(items) => Value::Array(items.iter().map(Element::to_node).collect()),
            Content::Mapping(children) => group_children(children),
        }
    }

    pub(crate) fn to_sxd<'d>(&self, document: &Document<'d>) -> dom::Element<'d> {
        let element = document.create_element(self.name.as_str());
        match &self.content {
            Content::Text(Value::Null) => {}
            Content::Text(value) => {
                element.set_text(&value_text(value));
            }
            Content::Mapping(children) | Content::Sequence(children) => {
                for child in children {
                    element.append_child(child.to_sxd(document));
                }
            }
        }
        element
    }

    /// A standalone XML document whose document element is `self`.
    pub fn to_package(&self) -> Package {
        let package = Package::new();
        {
            let document = package.as_document();
            let element = self.to_sxd(&document);
            document.root().append_child(element);
        }
        package
    }

    pub fn to_xml_string(&self) -> Result<String, MatchError> {
        let package = self.to_package();
        let document = package.as_document();
        let mut out = Vec::new();
        writer::format_document(&document, &mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}

fn content_for(node: &Value) -> Content {
    match node {
        Value::Object(map) if Shape::of(node) == Shape::Sequential => Content::Sequence(
            map.values()
                .map(|item| sequence_item(SEQUENCE_ITEM.to_string(), item, Origin::PositionalItem))
                .collect(),
        ),
        Value::Object(map) => {
            let mut children = Vec::with_capacity(map.len());
            for (key, value) in map {
                push_entry(key, value, &mut children);
            }
            Content::Mapping(children)
        }
        Value::Array(items) => Content::Sequence(
            items
                .iter()
                .map(|item| sequence_item(SEQUENCE_ITEM.to_string(), item, Origin::ListItem))
                .collect(),
        ),
        scalar => Content::Text(scalar.clone()),
    }
}

fn sequence_item(name: String, node: &Value, origin: Origin) -> Element {
    Element {
        name,
        content: content_for(node),
        origin,
    }
}

fn is_positional(items: &[Element]) -> bool {
    !items.is_empty() && items.iter().all(|item| item.origin == Origin::PositionalItem)
}

fn push_entry(key: &str, value: &Value, out: &mut Vec<Element>) {
    match value {
        Value::Array(items) if !items.is_empty() => {
            let name = tag_name_for(key);
            out.extend(
                items
                    .iter()
                    .map(|item| sequence_item(name.clone(), item, Origin::ListItem)),
            );
        }
        Value::Object(map) if Shape::of(value) == Shape::Sequential => {
            let name = tag_name_for(key);
            out.extend(
                map.values()
                    .map(|item| sequence_item(name.clone(), item, Origin::PositionalItem)),
            );
        }
        // An empty sequence stays a single element so the key survives.
        _ => out.push(Element::from_node(key, value)),
    }
}

fn group_children(children: &[Element]) -> Value {
    let mut map = Map::new();
    let mut repeated: HashSet<String> = HashSet::new();

    for child in children {
        let key = match child.origin {
            Origin::Markup => child.name.clone(),
            _ => key_for_tag(&child.name),
        };
        let value = child.to_node();

        match map.get_mut(&key) {
            None if child.origin == Origin::ListItem => {
                repeated.insert(key.clone());
                map.insert(key, Value::Array(vec![value]));
            }
            None if child.origin == Origin::PositionalItem => {
                repeated.insert(key.clone());
                let mut positions = Map::new();
                positions.insert("0".to_string(), value);
                map.insert(key, Value::Object(positions));
            }
            None => {
                map.insert(key, value);
            }
            Some(Value::Array(items)) if repeated.contains(&key) => items.push(value),
            Some(Value::Object(positions)) if repeated.contains(&key) => {
                positions.insert(positions.len().to_string(), value);
            }
            Some(existing) => {
                let previous = existing.take();
                *existing = Value::Array(vec![previous, value]);
                repeated.insert(key);
            }
        }
    }

    Value::Object(map)
}

// ---------------------------------------------------------------------------
// Tag names
// ---------------------------------------------------------------------------

#[derive(Default)]
struct TagNames {
    by_key: HashMap<String, String>,
    by_tag: HashMap<String, String>,
}

fn tag_names() -> &'static Mutex<TagNames> {
    static TAG_NAMES: OnceLock<Mutex<TagNames>> = OnceLock::new();
    TAG_NAMES.get_or_init(Mutex::default)
}

/// Whether `name` can be used as an element name as-is.
pub fn is_valid_tag_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Element name for a key: the key itself when valid, otherwise its
/// process-wide `invalidTagN` placeholder. Keys that already look like a
/// placeholder get one too, so they cannot collide with an allocated name.
pub fn tag_name_for(key: &str) -> String {
    if is_valid_tag_name(key) && !key.starts_with(PLACEHOLDER_PREFIX) {
        return key.to_string();
    }

    let mut names = tag_names().lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(tag) = names.by_key.get(key) {
        return tag.clone();
    }

    let tag = format!("{PLACEHOLDER_PREFIX}{}", names.by_key.len() + 1);
    tracing::debug!(tag = %tag, key, "placeholder element name for invalid key");
    names.by_key.insert(key.to_string(), tag.clone());
    names.by_tag.insert(tag.clone(), key.to_string());
    tag
}

/// Original key for an element name, resolving placeholders.
pub fn key_for_tag(tag: &str) -> String {
    if !tag.starts_with(PLACEHOLDER_PREFIX) {
        return tag.to_string();
    }
    let names = tag_names().lock().unwrap_or_else(PoisonError::into_inner);
    names
        .by_tag
        .get(tag)
        .cloned()
        .unwrap_or_else(|| tag.to_string())
}
