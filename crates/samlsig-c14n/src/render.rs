#![forbid(unsafe_code)]

//! Output pieces shared by both canonicalization algorithms.

use crate::escape;
use samlsig_core::ns;
use samlsig_xml::{Document, NodeId, NodeKind};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A namespace declaration on an output start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NsDecl {
    /// `""` for the default namespace.
    pub prefix: String,
    pub uri: String,
}

impl NsDecl {
    pub fn new(prefix: &str, uri: &str) -> Self {
        Self {
            prefix: prefix.to_owned(),
            uri: uri.to_owned(),
        }
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        if self.prefix.is_empty() {
            out.extend_from_slice(b" xmlns=\"");
        } else {
            out.extend_from_slice(b" xmlns:");
            out.extend_from_slice(self.prefix.as_bytes());
            out.extend_from_slice(b"=\"");
        }
        escape::write_attr(out, &self.uri);
        out.push(b'"');
    }
}

/// Default namespace first, then by prefix.
impl Ord for NsDecl {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.prefix.is_empty(), other.prefix.is_empty()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => self.prefix.cmp(&other.prefix),
        }
    }
}

impl PartialOrd for NsDecl {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// An attribute on an output start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    /// `""` when the attribute has no namespace.
    pub ns_uri: String,
    pub local_name: String,
    pub qualified_name: String,
    pub value: String,
}

impl Attr {
    pub fn write(&self, out: &mut Vec<u8>) {
        out.push(b' ');
        out.extend_from_slice(self.qualified_name.as_bytes());
        out.extend_from_slice(b"=\"");
        escape::write_attr(out, &self.value);
        out.push(b'"');
    }
}

/// Un-namespaced attributes first (by local name), then by
/// `(namespace URI, local name)`.
impl Ord for Attr {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.ns_uri.is_empty(), other.ns_uri.is_empty()) {
            (true, true) => self.local_name.cmp(&other.local_name),
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self
                .ns_uri
                .cmp(&other.ns_uri)
                .then_with(|| self.local_name.cmp(&other.local_name)),
        }
    }
}

impl PartialOrd for Attr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The element's own attributes, sorted into canonical order.
pub fn element_attrs(doc: &Document, id: NodeId) -> Vec<Attr> {
    let mut attrs: Vec<Attr> = doc
        .attributes(id)
        .map(|(_, attr)| Attr {
            ns_uri: attr.name.namespace_uri.clone().unwrap_or_default(),
            local_name: attr.name.local_name.clone(),
            qualified_name: attr.name.qualified(),
            value: attr.value.clone(),
        })
        .collect();
    attrs.sort();
    attrs
}

/// Every namespace binding in scope at `id`, prefix `""` for the default.
/// Undeclared defaults (`xmlns=""`) are absent.
pub fn inscope_namespaces(doc: &Document, id: NodeId) -> BTreeMap<String, String> {
    let mut chain = Vec::new();
    let mut current = Some(id);
    while let Some(n) = current {
        if let Some(elem) = doc.element(n) {
            chain.push(&elem.namespace_declarations);
        }
        current = doc.parent(n);
    }

    let mut scope = BTreeMap::new();
    for decls in chain.into_iter().rev() {
        for (prefix, uri) in decls {
            if uri.is_empty() {
                scope.remove(prefix);
            } else {
                scope.insert(prefix.clone(), uri.clone());
            }
        }
    }
    scope.remove("xml");
    scope
}

pub fn write_start_tag(out: &mut Vec<u8>, name: &str, ns_decls: &[NsDecl], attrs: &[Attr]) {
    out.push(b'<');
    out.extend_from_slice(name.as_bytes());
    for decl in ns_decls {
        decl.write(out);
    }
    for attr in attrs {
        attr.write(out);
    }
    out.push(b'>');
}

pub fn write_end_tag(out: &mut Vec<u8>, name: &str) {
    out.extend_from_slice(b"</");
    out.extend_from_slice(name.as_bytes());
    out.push(b'>');
}

/// Write a comment or processing instruction. Outside the document element
/// these are separated from it by a line feed.
pub fn write_misc(out: &mut Vec<u8>, doc: &Document, id: NodeId) {
    let top_level = doc
        .parent(id)
        .is_some_and(|p| matches!(doc.node_kind(p), Some(NodeKind::Document)));
    let after_root = top_level && doc.preceding_siblings(id).iter().any(|&s| doc.is_element(s));
    let before_root = top_level && doc.following_siblings(id).iter().any(|&s| doc.is_element(s));

    if after_root {
        out.push(b'\n');
    }
    match doc.node_kind(id) {
        Some(NodeKind::Comment(text)) => {
            out.extend_from_slice(b"<!--");
            out.extend_from_slice(text.as_bytes());
            out.extend_from_slice(b"-->");
        }
        Some(NodeKind::ProcessingInstruction { target, data }) => {
            out.extend_from_slice(b"<?");
            out.extend_from_slice(target.as_bytes());
            if let Some(data) = data.as_deref().filter(|d| !d.is_empty()) {
                out.push(b' ');
                escape::write_pi(out, data);
            }
            out.extend_from_slice(b"?>");
        }
        _ => {}
    }
    if before_root {
        out.push(b'\n');
    }
}

/// Whether `uri` is the reserved `xml` namespace.
pub(crate) fn is_xml_namespace(uri: &str) -> bool {
    uri == ns::XML
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ns_decl_order_puts_default_first() {
        let mut decls = vec![
            NsDecl::new("b", "urn:b"),
            NsDecl::new("", "urn:d"),
            NsDecl::new("a", "urn:a"),
        ];
        decls.sort();
        let prefixes: Vec<_> = decls.iter().map(|d| d.prefix.as_str()).collect();
        assert_eq!(prefixes, ["", "a", "b"]);
    }

    #[test]
    fn test_attr_order() {
        let doc = Document::parse(r#"<e xmlns:z="urn:a" xmlns:y="urn:b" z:k="1" y:k="2" b="3" a="4"/>"#)
            .unwrap();
        let e = doc.root_element().unwrap();
        let names: Vec<_> = element_attrs(&doc, e)
            .into_iter()
            .map(|a| a.qualified_name)
            .collect();
        assert_eq!(names, ["a", "b", "z:k", "y:k"]);
    }

    #[test]
    fn test_inscope_namespaces_honours_undeclaration() {
        let doc = Document::parse(r#"<a xmlns="urn:d" xmlns:p="urn:p"><b xmlns=""/></a>"#).unwrap();
        let a = doc.root_element().unwrap();
        let b = doc.children(a)[0];
        let scope = inscope_namespaces(&doc, b);
        assert_eq!(scope.get("p").map(String::as_str), Some("urn:p"));
        assert!(!scope.contains_key(""));
        assert_eq!(inscope_namespaces(&doc, a).len(), 2);
    }
}
