#![forbid(unsafe_code)]

//! Canonical XML 1.0.
//!
//! Algorithm URI: `http://www.w3.org/TR/2001/REC-xml-c14n-20010315`
//! With comments: `http://www.w3.org/TR/2001/REC-xml-c14n-20010315#WithComments`
//!
//! Every in-scope namespace is rendered on the first output element that
//! sees it. For a document subset, the `xml:*` attributes of omitted
//! ancestors are pushed down onto the first output element below them.

use crate::escape;
use crate::render::{self, Attr, NsDecl};
use crate::MAX_DEPTH;
use samlsig_core::{Deadline, Error};
use samlsig_xml::{Document, NodeId, NodeKind, NodeSet};
use std::collections::BTreeMap;

pub fn canonicalize(
    doc: &Document,
    with_comments: bool,
    node_set: Option<&NodeSet>,
    deadline: &Deadline,
) -> Result<Vec<u8>, Error> {
    let ctx = Inclusive {
        doc,
        with_comments,
        node_set,
        deadline,
    };
    let mut out = Vec::new();
    ctx.process_node(doc.root(), &mut out, &BTreeMap::new(), 0)?;
    Ok(out)
}

struct Inclusive<'a> {
    doc: &'a Document,
    with_comments: bool,
    node_set: Option<&'a NodeSet>,
    deadline: &'a Deadline,
}

impl Inclusive<'_> {
    fn is_visible(&self, id: NodeId) -> bool {
        self.node_set.map_or(true, |set| set.contains(id))
    }

    fn process_node(
        &self,
        id: NodeId,
        out: &mut Vec<u8>,
        rendered: &BTreeMap<String, String>,
        depth: usize,
    ) -> Result<(), Error> {
        if depth > MAX_DEPTH {
            return Err(Error::Canonicalization("element nesting too deep".into()));
        }
        let doc = self.doc;
        match doc.node_kind(id) {
            Some(NodeKind::Document) => {
                for &child in doc.children(id) {
                    self.process_node(child, out, rendered, depth + 1)?;
                }
            }
            Some(NodeKind::Element(_)) => self.process_element(id, out, rendered, depth)?,
            Some(NodeKind::Text(text)) => {
                if self.is_visible(id) {
                    escape::write_text(out, text);
                }
            }
            Some(NodeKind::Comment(_)) => {
                if self.with_comments && self.is_visible(id) {
                    render::write_misc(out, doc, id);
                }
            }
            Some(NodeKind::ProcessingInstruction { .. }) => {
                if self.is_visible(id) {
                    render::write_misc(out, doc, id);
                }
            }
            None => {}
        }
        Ok(())
    }

    fn process_element(
        &self,
        id: NodeId,
        out: &mut Vec<u8>,
        rendered: &BTreeMap<String, String>,
        depth: usize,
    ) -> Result<(), Error> {
        self.deadline.check()?;
        let doc = self.doc;

        if !self.is_visible(id) {
            // Output descendants still compare against the nearest output
            // ancestor, so the namespace context passes through unchanged.
            for &child in doc.children(id) {
                self.process_node(child, out, rendered, depth + 1)?;
            }
            return Ok(());
        }

        let Some(elem) = doc.element(id) else {
            return Ok(());
        };
        let scope = render::inscope_namespaces(doc, id);

        let mut ns_decls: Vec<NsDecl> = scope
            .iter()
            .filter(|(prefix, uri)| rendered.get(*prefix) != Some(*uri))
            .map(|(prefix, uri)| NsDecl::new(prefix, uri))
            .collect();

        let mut child_rendered = rendered.clone();
        child_rendered.extend(scope.iter().map(|(p, u)| (p.clone(), u.clone())));

        // An inherited non-empty default that is no longer in scope.
        if !scope.contains_key("") && rendered.get("").is_some_and(|d| !d.is_empty()) {
            ns_decls.push(NsDecl::new("", ""));
            child_rendered.insert(String::new(), String::new());
        }
        ns_decls.sort();

        let mut attrs = render::element_attrs(doc, id);
        if self.node_set.is_some() && !self.parent_is_visible(id) {
            let inherited = self.inherited_xml_attrs(id, &attrs);
            if !inherited.is_empty() {
                attrs.extend(inherited);
                attrs.sort();
            }
        }

        let name = elem.name.qualified();
        render::write_start_tag(out, &name, &ns_decls, &attrs);
        for &child in doc.children(id) {
            self.process_node(child, out, &child_rendered, depth + 1)?;
        }
        render::write_end_tag(out, &name);
        Ok(())
    }

    fn parent_is_visible(&self, id: NodeId) -> bool {
        self.doc
            .parent(id)
            .is_some_and(|p| self.doc.is_element(p) && self.is_visible(p))
    }

    /// `xml:*` attributes of all ancestors, nearest first, that this
    /// element does not carry itself.
    fn inherited_xml_attrs(&self, id: NodeId, own: &[Attr]) -> Vec<Attr> {
        let doc = self.doc;
        let mut found: BTreeMap<String, String> = BTreeMap::new();

        let mut current = doc.parent(id);
        while let Some(ancestor) = current {
            for (_, attr) in doc.attributes(ancestor) {
                let is_xml = attr
                    .name
                    .namespace_uri
                    .as_deref()
                    .is_some_and(render::is_xml_namespace);
                if is_xml {
                    found
                        .entry(attr.name.local_name.clone())
                        .or_insert_with(|| attr.value.clone());
                }
            }
            current = doc.parent(ancestor);
        }

        found
            .into_iter()
            .filter(|(name, _)| {
                !own.iter()
                    .any(|a| render::is_xml_namespace(&a.ns_uri) && &a.local_name == name)
            })
            .map(|(name, value)| Attr {
                ns_uri: samlsig_core::ns::XML.to_owned(),
                qualified_name: format!("xml:{name}"),
                local_name: name,
                value,
            })
            .collect()
    }
}
