#![forbid(unsafe_code)]

//! Element lookup by expanded name.

use crate::document::{Document, NodeId};
use samlsig_core::ns::{self, node};

/// First element below (or at) `start`, in document order, with this local
/// name and namespace.
pub fn find_element(doc: &Document, start: NodeId, namespace: &str, local_name: &str) -> Option<NodeId> {
    doc.descendants(start).find(|&id| {
        doc.element(id)
            .is_some_and(|elem| elem.name.is(namespace, local_name))
    })
}

/// All matching elements below (or at) `start`, in document order.
pub fn find_elements<'a>(
    doc: &'a Document,
    start: NodeId,
    namespace: &'a str,
    local_name: &'a str,
) -> impl Iterator<Item = NodeId> + 'a {
    doc.descendants(start).filter(move |&id| {
        doc.element(id)
            .is_some_and(|elem| elem.name.is(namespace, local_name))
    })
}

/// First child element of `parent` with this local name and namespace.
pub fn find_child_element(
    doc: &Document,
    parent: NodeId,
    namespace: &str,
    local_name: &str,
) -> Option<NodeId> {
    doc.child_elements(parent, namespace, local_name).next()
}

pub fn find_child_elements(
    doc: &Document,
    parent: NodeId,
    namespace: &str,
    local_name: &str,
) -> Vec<NodeId> {
    doc.child_elements(parent, namespace, local_name).collect()
}

/// First `Signature` element in the XML-DSig namespace at or below `root`,
/// in pre-order. A `Signature` in any other namespace is not a match.
pub fn find_signature_node(doc: &Document, root: NodeId) -> Option<NodeId> {
    find_element(doc, root, ns::DSIG, node::SIGNATURE)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DS: &str = "http://www.w3.org/2000/09/xmldsig#";

    #[test]
    fn test_finds_first_signature_in_document_order() {
        let xml = format!(
            r#"<r><a><ds:Signature xmlns:ds="{DS}" Id="first"/></a><ds:Signature xmlns:ds="{DS}" Id="second"/></r>"#
        );
        let doc = Document::parse(&xml).unwrap();
        let sig = find_signature_node(&doc, doc.root()).unwrap();
        assert_eq!(doc.attribute_value(sig, "Id"), Some("first"));
    }

    #[test]
    fn test_wrong_namespace_is_not_a_signature() {
        let doc = Document::parse(r#"<r><Signature/><x:Signature xmlns:x="urn:x"/></r>"#).unwrap();
        assert_eq!(find_signature_node(&doc, doc.root()), None);
    }

    #[test]
    fn test_default_namespace_signature_matches() {
        let xml = format!(r#"<r><Signature xmlns="{DS}"/></r>"#);
        let doc = Document::parse(&xml).unwrap();
        assert!(find_signature_node(&doc, doc.root()).is_some());
    }

    #[test]
    fn test_search_starts_at_root_argument() {
        let xml = format!(
            r#"<r><ds:Signature xmlns:ds="{DS}" Id="outside"/><a><ds:Signature xmlns:ds="{DS}" Id="inside"/></a></r>"#
        );
        let doc = Document::parse(&xml).unwrap();
        let r = doc.root_element().unwrap();
        let a = doc.children(r)[1];
        let sig = find_signature_node(&doc, a).unwrap();
        assert_eq!(doc.attribute_value(sig, "Id"), Some("inside"));
    }

    #[test]
    fn test_child_lookup_is_one_level() {
        let doc = Document::parse("<a><b n='1'/><c><b n='2'/></c><b n='3'/></a>").unwrap();
        let a = doc.root_element().unwrap();
        let first = find_child_element(&doc, a, "", "b").unwrap();
        assert_eq!(doc.attribute_value(first, "n"), Some("1"));
        assert_eq!(find_child_elements(&doc, a, "", "b").len(), 2);
        assert_eq!(find_child_element(&doc, a, "", "d"), None);
    }

    #[test]
    fn test_find_elements_in_order() {
        let doc = Document::parse("<a><b n='1'/><c><b n='2'/></c></a>").unwrap();
        let found: Vec<_> = find_elements(&doc, doc.root(), "", "b")
            .filter_map(|id| doc.attribute_value(id, "n"))
            .collect();
        assert_eq!(found, ["1", "2"]);
    }
}
