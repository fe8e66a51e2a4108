#![forbid(unsafe_code)]

//! ID attribute registration.
//!
//! XML-DSig resolves `URI="#value"` against the attributes a document has
//! declared as IDs, not against any attribute that happens to be called
//! `ID`. Without a DTD or schema nothing is an ID, so the caller names the
//! `(attribute, element, namespace)` triples that are, and [`register_ids`]
//! walks the tree recording them.

use crate::document::{AttrId, Document, NodeId};
use samlsig_core::ns::{self, attr, node};
use samlsig_core::Error;
use std::collections::HashMap;

/// Maps an ID value to the attribute that claimed it.
#[derive(Debug, Default)]
pub struct IdRegistry {
    entries: HashMap<String, AttrId>,
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `value` for `attr`.
    ///
    /// Claiming a value twice for the same attribute is a no-op; a second,
    /// different attribute with the same value is [`Error::DuplicateId`].
    pub fn register(&mut self, value: &str, attr: AttrId) -> Result<(), Error> {
        match self.entries.get(value) {
            None => {
                self.entries.insert(value.to_owned(), attr);
                Ok(())
            }
            Some(&existing) if existing == attr => Ok(()),
            Some(_) => Err(Error::DuplicateId(value.to_owned())),
        }
    }

    pub fn lookup(&self, value: &str) -> Option<AttrId> {
        self.entries.get(value).copied()
    }

    pub fn contains(&self, value: &str) -> bool {
        self.entries.contains_key(value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Which attribute on which element is an ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdTarget {
    /// Attribute local name, matched regardless of its namespace.
    pub attr_name: String,
    /// Element local name.
    pub element_name: String,
    /// When set, the element must be in this namespace.
    pub namespace: Option<String>,
}

impl IdTarget {
    pub fn new(
        attr_name: impl Into<String>,
        element_name: impl Into<String>,
        namespace: Option<&str>,
    ) -> Self {
        Self {
            attr_name: attr_name.into(),
            element_name: element_name.into(),
            namespace: namespace.map(str::to_owned),
        }
    }

    /// `ID` on `samlp:Response`.
    pub fn saml_response() -> Self {
        Self::new(attr::SAML_ID, node::RESPONSE, Some(ns::SAML_PROTOCOL))
    }

    /// `ID` on `saml:Assertion`.
    pub fn saml_assertion() -> Self {
        Self::new(attr::SAML_ID, node::ASSERTION, Some(ns::SAML_ASSERTION))
    }

    /// Parse `ATTR:ELEMENT` or `ATTR:ELEMENT:NAMESPACE`. The namespace may
    /// itself contain colons.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let mut parts = text.splitn(3, ':');
        let attr_name = parts.next().unwrap_or("");
        let element_name = parts.next().unwrap_or("");
        if attr_name.is_empty() || element_name.is_empty() {
            return Err(Error::Config(format!(
                "invalid ID target \"{text}\", expected ATTR:ELEMENT[:NAMESPACE]"
            )));
        }
        let namespace = parts.next().filter(|n| !n.is_empty());
        Ok(Self::new(attr_name, element_name, namespace))
    }

    fn matches(&self, doc: &Document, id: NodeId) -> bool {
        let Some(elem) = doc.element(id) else {
            return false;
        };
        if elem.name.local_name != self.element_name {
            return false;
        }
        match &self.namespace {
            Some(ns) => elem.name.namespace_uri.as_deref() == Some(ns.as_str()),
            None => true,
        }
    }
}

impl Default for IdTarget {
    fn default() -> Self {
        Self::saml_response()
    }
}

/// Register every `target` ID found in the subtree at `root`.
///
/// The walk is post-order: all children of a node (in document order) are
/// handled before the node itself. The first duplicate aborts the walk and
/// is returned; nodes not yet visited are left untouched. An explicit stack
/// is used so deeply nested input cannot exhaust the call stack.
pub fn register_ids(doc: &mut Document, root: NodeId, target: &IdTarget) -> Result<(), Error> {
    // (node, children already pushed)
    let mut stack: Vec<(NodeId, bool)> = vec![(root, false)];

    while let Some((id, expanded)) = stack.pop() {
        if expanded {
            register_node(doc, id, target)?;
            continue;
        }
        stack.push((id, true));
        for &child in doc.children(id).iter().rev() {
            if doc.is_element(child) {
                stack.push((child, false));
            }
        }
    }
    Ok(())
}

fn register_node(doc: &mut Document, id: NodeId, target: &IdTarget) -> Result<(), Error> {
    if !target.matches(doc, id) {
        return Ok(());
    }

    let found = doc
        .attributes(id)
        .find(|(_, a)| a.name.local_name == target.attr_name)
        .map(|(aid, a)| (aid, a.value.clone()));

    let Some((aid, value)) = found else {
        return Ok(());
    };
    if value.is_empty() {
        return Ok(());
    }

    let result = doc.ids_mut().register(&value, aid);
    if result.is_err() {
        tracing::warn!(id = %value, element = %target.element_name, "duplicate ID attribute");
    }
    result
}
