#![forbid(unsafe_code)]

//! Exclusive Canonical XML 1.0.
//!
//! Algorithm URI: `http://www.w3.org/2001/10/xml-exc-c14n#`
//! With comments: `http://www.w3.org/2001/10/xml-exc-c14n#WithComments`
//!
//! Only visibly utilized namespaces are rendered: the element's own prefix,
//! the prefixes of its attributes, and anything named in the
//! InclusiveNamespaces PrefixList (`#default` for the default namespace).
//! A declaration is emitted when the nearest output ancestor did not already
//! render the same binding.

use crate::escape;
use crate::render::{self, NsDecl};
use crate::MAX_DEPTH;
use samlsig_core::{Deadline, Error};
use samlsig_xml::{Document, NodeId, NodeKind, NodeSet};
use std::collections::{BTreeMap, BTreeSet};

pub fn canonicalize(
    doc: &Document,
    with_comments: bool,
    node_set: Option<&NodeSet>,
    inclusive_prefixes: &[String],
    deadline: &Deadline,
) -> Result<Vec<u8>, Error> {
    let ctx = Exclusive {
        doc,
        with_comments,
        node_set,
        deadline,
        inclusive_prefixes: inclusive_prefixes
            .iter()
            .map(|p| if p == "#default" { String::new() } else { p.clone() })
            .collect(),
    };
    let mut out = Vec::new();
    ctx.process_node(doc.root(), &mut out, &BTreeMap::new(), 0)?;
    Ok(out)
}

struct Exclusive<'a> {
    doc: &'a Document,
    with_comments: bool,
    node_set: Option<&'a NodeSet>,
    deadline: &'a Deadline,
    /// PrefixList entries, `#default` already mapped to `""`.
    inclusive_prefixes: BTreeSet<String>,
}

impl Exclusive<'_> {
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
            for &child in doc.children(id) {
                self.process_node(child, out, rendered, depth + 1)?;
            }
            return Ok(());
        }

        let Some(elem) = doc.element(id) else {
            return Ok(());
        };

        let mut utilized: BTreeSet<String> = self.inclusive_prefixes.clone();
        utilized.insert(elem.name.prefix.clone().unwrap_or_default());
        for (_, attr) in doc.attributes(id) {
            if attr.name.namespace_uri.is_some() {
                if let Some(prefix) = attr.name.prefix.as_deref().filter(|p| !p.is_empty()) {
                    utilized.insert(prefix.to_owned());
                }
            }
        }
        utilized.remove("xml");

        let scope = render::inscope_namespaces(doc, id);
        let mut ns_decls = Vec::new();
        for prefix in &utilized {
            match scope.get(prefix) {
                Some(uri) if rendered.get(prefix) != Some(uri) => {
                    ns_decls.push(NsDecl::new(prefix, uri));
                }
                Some(_) => {}
                None if prefix.is_empty() => {
                    // Default namespace not in scope here but rendered
                    // non-empty above.
                    if rendered.get("").is_some_and(|d| !d.is_empty()) {
                        ns_decls.push(NsDecl::new("", ""));
                    }
                }
                None => {}
            }
        }
        ns_decls.sort();

        let attrs = render::element_attrs(doc, id);
        let name = elem.name.qualified();
        render::write_start_tag(out, &name, &ns_decls, &attrs);

        let child_rendered = if ns_decls.is_empty() {
            None
        } else {
            let mut next = rendered.clone();
            for decl in &ns_decls {
                next.insert(decl.prefix.clone(), decl.uri.clone());
            }
            Some(next)
        };
        let child_rendered = child_rendered.as_ref().unwrap_or(rendered);

        for &child in doc.children(id) {
            self.process_node(child, out, child_rendered, depth + 1)?;
        }
        render::write_end_tag(out, &name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exc(xml: &str, prefixes: &[&str]) -> String {
        let doc = Document::parse(xml).unwrap();
        let prefixes: Vec<String> = prefixes.iter().map(|p| p.to_string()).collect();
        let out = canonicalize(&doc, false, None, &prefixes, &Deadline::none()).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_unused_namespaces_dropped() {
        assert_eq!(
            exc(r#"<a:r xmlns:a="urn:a" xmlns:b="urn:b"><c/></a:r>"#, &[]),
            r#"<a:r xmlns:a="urn:a"><c></c></a:r>"#
        );
    }

    #[test]
    fn test_attribute_prefix_is_utilized() {
        assert_eq!(
            exc(r#"<r xmlns:b="urn:b"><c b:x="1"/></r>"#, &[]),
            r#"<r><c xmlns:b="urn:b" b:x="1"></c></r>"#
        );
    }

    #[test]
    fn test_shared_uri_declares_the_prefix_in_use() {
        assert_eq!(
            exc(r#"<r xmlns:a="urn:u" xmlns:b="urn:u"><e b:x="1"/></r>"#, &[]),
            r#"<r><e xmlns:b="urn:u" b:x="1"></e></r>"#
        );
    }

    #[test]
    fn test_prefix_list_forces_declaration() {
        assert_eq!(
            exc(r#"<r xmlns:b="urn:b" xmlns="urn:d"><c/></r>"#, &["b", "#default"]),
            r#"<r xmlns="urn:d" xmlns:b="urn:b"><c></c></r>"#
        );
    }

    #[test]
    fn test_subset_redeclares_ancestor_binding() {
        let xml = r#"<p:r xmlns:p="urn:p" xmlns:q="urn:q"><p:s><q:t/></p:s></p:r>"#;
        let doc = Document::parse(xml).unwrap();
        let r = doc.root_element().unwrap();
        let s = doc.children(r)[0];
        let set = NodeSet::tree_without_comments(s, &doc);
        let out = canonicalize(&doc, false, Some(&set), &[], &Deadline::none()).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#"<p:s xmlns:p="urn:p"><q:t xmlns:q="urn:q"></q:t></p:s>"#
        );
    }

    #[test]
    fn test_default_namespace_reset() {
        assert_eq!(
            exc(r#"<r xmlns="urn:d"><c xmlns=""/></r>"#, &[]),
            r#"<r xmlns="urn:d"><c xmlns=""></c></r>"#
        );
    }
}
