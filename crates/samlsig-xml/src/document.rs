#![forbid(unsafe_code)]

//! Arena-backed XML document.
//!
//! The tree is parsed with `roxmltree` and copied into an owned arena so the
//! document can carry mutable per-document state (the ID registry) and be
//! moved between threads. Nodes and attributes refer to each other through
//! [`NodeId`] / [`AttrId`] indices only; the [`Document`] owns everything.

use crate::ids::IdRegistry;
use samlsig_core::{ns, Error};

/// Index of a node inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Index of an attribute inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttrId(usize);

impl AttrId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A namespace-qualified name as it appeared in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QName {
    pub prefix: Option<String>,
    pub local_name: String,
    pub namespace_uri: Option<String>,
}

impl QName {
    /// `prefix:local` or just `local`.
    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(prefix) if !prefix.is_empty() => format!("{prefix}:{}", self.local_name),
            _ => self.local_name.clone(),
        }
    }

    pub fn is(&self, namespace: &str, local_name: &str) -> bool {
        self.local_name == local_name && self.namespace_uri.as_deref().unwrap_or("") == namespace
    }
}

#[derive(Debug, Clone)]
pub struct Element {
    pub name: QName,
    /// Declarations made on this element: `(prefix, uri)`, prefix `""` for
    /// the default namespace, uri `""` for `xmlns=""`.
    pub namespace_declarations: Vec<(String, String)>,
    pub attributes: Vec<AttrId>,
}

#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
    /// The element carrying this attribute.
    pub owner: NodeId,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Document,
    Element(Element),
    Text(String),
    Comment(String),
    ProcessingInstruction { target: String, data: Option<String> },
}

#[derive(Debug)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An owned, parsed XML document plus its ID registry.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<NodeData>,
    attrs: Vec<Attribute>,
    ids: IdRegistry,
}

impl Document {
    /// Parse XML text into a document. DTDs are rejected.
    ///
    /// Fails with [`Error::XmlParse`] on malformed input, which includes the
    /// empty string (no root element).
    pub fn parse(text: &str) -> Result<Self, Error> {
        let parsed =
            roxmltree::Document::parse(text).map_err(|e| Error::XmlParse(e.to_string()))?;

        let mut doc = Document {
            nodes: vec![NodeData {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
            attrs: Vec::new(),
            ids: IdRegistry::new(),
        };

        // Children are pushed in reverse so they are popped, and therefore
        // numbered and attached, in document order.
        let mut stack: Vec<(roxmltree::Node<'_, '_>, NodeId)> = parsed
            .root()
            .children()
            .rev()
            .map(|child| (child, doc.root()))
            .collect();

        while let Some((node, parent)) = stack.pop() {
            let Some(kind) = doc.convert(text, node) else {
                continue;
            };
            let id = doc.push_node(kind, parent);
            if node.is_element() {
                stack.extend(node.children().rev().map(|child| (child, id)));
            }
        }

        if doc.root_element().is_none() {
            return Err(Error::XmlParse("document has no root element".into()));
        }
        Ok(doc)
    }

    fn convert(&mut self, text: &str, node: roxmltree::Node<'_, '_>) -> Option<NodeKind> {
        match node.node_type() {
            roxmltree::NodeType::Root => None,
            roxmltree::NodeType::Element => Some(NodeKind::Element(self.convert_element(text, node))),
            roxmltree::NodeType::Text => Some(NodeKind::Text(node.text().unwrap_or("").to_owned())),
            roxmltree::NodeType::Comment => {
                Some(NodeKind::Comment(node.text().unwrap_or("").to_owned()))
            }
            roxmltree::NodeType::PI => node.pi().map(|pi| NodeKind::ProcessingInstruction {
                target: pi.target.to_owned(),
                data: pi.value.map(str::to_owned),
            }),
        }
    }

    fn convert_element(&mut self, text: &str, node: roxmltree::Node<'_, '_>) -> Element {
        let owner = NodeId(self.nodes.len());
        let tag = node.tag_name();

        let mut attributes = Vec::new();
        for attr in node.attributes() {
            let prefix = match attr.namespace() {
                Some(ns::XML) => Some("xml".to_owned()),
                Some(_) => attribute_source_prefix(text, &attr),
                None => None,
            };
            let id = AttrId(self.attrs.len());
            self.attrs.push(Attribute {
                name: QName {
                    prefix,
                    local_name: attr.name().to_owned(),
                    namespace_uri: non_empty(attr.namespace()),
                },
                value: attr.value().to_owned(),
                owner,
            });
            attributes.push(id);
        }

        Element {
            name: QName {
                prefix: source_prefix(text, node),
                local_name: tag.name().to_owned(),
                namespace_uri: non_empty(tag.namespace()),
            },
            namespace_declarations: declared_namespaces(node),
            attributes,
        }
    }

    fn push_node(&mut self, kind: NodeKind, parent: NodeId) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    // ── Tree access ──────────────────────────────────────────────────

    /// The document node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The single top-level element.
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(self.root())
            .iter()
            .copied()
            .find(|&id| self.is_element(id))
    }

    /// Number of nodes, the document node included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn node_kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.0).map(|n| &n.kind)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.node_kind(id) {
            Some(NodeKind::Element(elem)) => Some(elem),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id.0).map_or(&[][..], |n| n.children.as_slice())
    }

    /// Siblings that come before `id`, nearest last.
    pub fn preceding_siblings(&self, id: NodeId) -> &[NodeId] {
        let siblings = self.parent(id).map_or(&[][..], |p| self.children(p));
        match siblings.iter().position(|&s| s == id) {
            Some(pos) => &siblings[..pos],
            None => &[],
        }
    }

    /// Siblings that come after `id`, nearest first.
    pub fn following_siblings(&self, id: NodeId) -> &[NodeId] {
        let siblings = self.parent(id).map_or(&[][..], |p| self.children(p));
        match siblings.iter().position(|&s| s == id) {
            Some(pos) => &siblings[pos + 1..],
            None => &[],
        }
    }

    /// Pre-order traversal of `id` and everything below it.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            stack: vec![id],
        }
    }

    /// Child elements of `id` with the given namespace and local name.
    pub fn child_elements<'a>(
        &'a self,
        id: NodeId,
        namespace: &'a str,
        local_name: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.children(id).iter().copied().filter(move |&child| {
            self.element(child)
                .is_some_and(|elem| elem.name.is(namespace, local_name))
        })
    }

    /// Concatenated text of all text nodes below `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.descendants(id) {
            if let Some(NodeKind::Text(text)) = self.node_kind(node) {
                out.push_str(text);
            }
        }
        out
    }

    // ── Attributes ───────────────────────────────────────────────────

    pub fn attribute(&self, id: AttrId) -> &Attribute {
        &self.attrs[id.0]
    }

    /// Attributes of an element, in source order.
    pub fn attributes(&self, id: NodeId) -> impl Iterator<Item = (AttrId, &Attribute)> + '_ {
        self.element(id)
            .map_or(&[][..], |elem| elem.attributes.as_slice())
            .iter()
            .map(move |&aid| (aid, &self.attrs[aid.0]))
    }

    /// Value of the un-namespaced attribute `local_name`.
    pub fn attribute_value(&self, id: NodeId, local_name: &str) -> Option<&str> {
        self.attributes(id)
            .find(|(_, attr)| attr.name.namespace_uri.is_none() && attr.name.local_name == local_name)
            .map(|(_, attr)| attr.value.as_str())
    }

    // ── ID registry ──────────────────────────────────────────────────

    pub fn ids(&self) -> &IdRegistry {
        &self.ids
    }

    pub fn ids_mut(&mut self) -> &mut IdRegistry {
        &mut self.ids
    }

    /// The element whose registered ID attribute has this value.
    pub fn element_by_id(&self, value: &str) -> Option<NodeId> {
        self.ids.lookup(value).map(|aid| self.attribute(aid).owner)
    }
}

/// Iterator returned by [`Document::descendants`].
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack.extend(self.doc.children(id).iter().rev().copied());
        Some(id)
    }
}

/// Read the element prefix from the start tag in the source text;
/// roxmltree only exposes the expanded name.
fn source_prefix(text: &str, node: roxmltree::Node<'_, '_>) -> Option<String> {
    let tag = text.get(node.range().start + 1..)?;
    let end = tag
        .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
        .unwrap_or(tag.len());
    tag[..end].split_once(':').map(|(prefix, _)| prefix.to_owned())
}

/// The prefix an attribute was written with. Several prefixes may be bound
/// to the same URI, so it cannot be recovered from the namespace alone.
fn attribute_source_prefix(text: &str, attr: &roxmltree::Attribute<'_, '_>) -> Option<String> {
    text.get(attr.range_qname())?
        .split_once(':')
        .map(|(prefix, _)| prefix.to_owned())
}

/// `xmlns=""` puts an element in no namespace.
fn non_empty(uri: Option<&str>) -> Option<String> {
    uri.filter(|u| !u.is_empty()).map(str::to_owned)
}

/// Namespace bindings introduced (or undeclared) on this element relative
/// to its parent.
fn declared_namespaces(node: roxmltree::Node<'_, '_>) -> Vec<(String, String)> {
    let inherited: Vec<(Option<&str>, &str)> = match node.parent_element() {
        Some(parent) => parent.namespaces().map(|n| (n.name(), n.uri())).collect(),
        None => Vec::new(),
    };

    let mut decls: Vec<(String, String)> = node
        .namespaces()
        .filter(|n| n.name() != Some("xml"))
        .filter(|n| !inherited.contains(&(n.name(), n.uri())))
        .map(|n| (n.name().unwrap_or("").to_owned(), n.uri().to_owned()))
        .collect();

    let had_default = inherited.iter().any(|(prefix, _)| prefix.is_none());
    let has_default = node.namespaces().any(|n| n.name().is_none());
    if had_default && !has_default {
        decls.push((String::new(), String::new()));
    }
    decls
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_builds_tree_in_document_order() {
        let doc = Document::parse("<a><b/>text<c><d/></c></a>").unwrap();
        let root = doc.root_element().unwrap();
        assert_eq!(doc.element(root).unwrap().name.local_name, "a");

        let names: Vec<String> = doc
            .descendants(root)
            .filter_map(|id| doc.element(id).map(|e| e.name.local_name.clone()))
            .collect();
        assert_eq!(names, ["a", "b", "c", "d"]);

        let kids = doc.children(root);
        assert_eq!(kids.len(), 3);
        assert!(matches!(doc.node_kind(kids[1]), Some(NodeKind::Text(t)) if t == "text"));
        assert_eq!(doc.parent(kids[2]), Some(root));
    }

    #[test]
    fn test_prefixes_and_namespaces() {
        let xml = r#"<p:a xmlns:p="urn:p" xmlns="urn:d"><b xmlns=""/><p:c p:x="1" y="2"/></p:a>"#;
        let doc = Document::parse(xml).unwrap();
        let a = doc.root_element().unwrap();
        let elem = doc.element(a).unwrap();
        assert_eq!(elem.name.prefix.as_deref(), Some("p"));
        assert_eq!(elem.name.namespace_uri.as_deref(), Some("urn:p"));
        assert!(elem
            .namespace_declarations
            .contains(&("p".to_owned(), "urn:p".to_owned())));
        assert!(elem
            .namespace_declarations
            .contains(&(String::new(), "urn:d".to_owned())));

        let b = doc.children(a)[0];
        let b_elem = doc.element(b).unwrap();
        assert_eq!(b_elem.name.prefix, None);
        assert_eq!(b_elem.name.namespace_uri, None);
        assert_eq!(b_elem.namespace_declarations, vec![(String::new(), String::new())]);

        let c = doc.children(a)[1];
        let attrs: Vec<&Attribute> = doc.attributes(c).map(|(_, a)| a).collect();
        assert_eq!(attrs[0].name.prefix.as_deref(), Some("p"));
        assert_eq!(attrs[0].owner, c);
        assert_eq!(doc.attribute_value(c, "y"), Some("2"));
        assert_eq!(doc.attribute_value(c, "x"), None);
    }

    #[test]
    fn test_attribute_prefix_is_the_one_written() {
        let xml = r#"<r xmlns:a="urn:u" xmlns:b="urn:u"><e b:x="1" a:y="2"/></r>"#;
        let doc = Document::parse(xml).unwrap();
        let r = doc.root_element().unwrap();
        let e = doc.children(r)[0];
        let prefixes: Vec<Option<&str>> = doc
            .attributes(e)
            .map(|(_, attr)| attr.name.prefix.as_deref())
            .collect();
        assert_eq!(prefixes, [Some("b"), Some("a")]);
        assert_eq!(doc.element(r).unwrap().name.namespace_uri, None);
    }

    #[test]
    fn test_empty_and_malformed_input() {
        assert!(matches!(Document::parse(""), Err(Error::XmlParse(_))));
        assert!(matches!(Document::parse("<a><b></a>"), Err(Error::XmlParse(_))));
        assert!(matches!(Document::parse("not xml"), Err(Error::XmlParse(_))));
    }

    #[test]
    fn test_text_content_and_siblings() {
        let doc = Document::parse("<a>x<b>y</b>z</a>").unwrap();
        let a = doc.root_element().unwrap();
        assert_eq!(doc.text_content(a), "xyz");
        let b = doc.children(a)[1];
        assert_eq!(doc.preceding_siblings(b).len(), 1);
        assert_eq!(doc.following_siblings(b).len(), 1);
    }
}
