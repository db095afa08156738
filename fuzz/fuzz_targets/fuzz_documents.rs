#![no_main]

use libfuzzer_sys::fuzz_target;
use structassert_core::{contains_array, ElementTree, JsonDocument, XmlStructure};

// Arbitrary bytes as JSON and XML. Parsed JSON must contain itself and
// survive the element tree round trip.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(doc) = JsonDocument::parse(text) {
        let node = doc.as_node();
        if node.is_array() || node.is_object() {
            assert!(contains_array(node, node));
        }
        assert_eq!(doc.to_tree().to_node(), *node);
        let _ = doc.to_xml_string();
    }

    if let Ok(xml) = XmlStructure::new(text) {
        let _ = xml.matches_xpath("//*");
        let _ = xml.match_xml_structure(text);
    }
    let _ = ElementTree::from_xml(text);
});
