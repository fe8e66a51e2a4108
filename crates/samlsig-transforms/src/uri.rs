#![forbid(unsafe_code)]

//! Reference URI resolution.
//!
//! Only same-document references are dereferenced:
//! - `""`: the whole document, comments removed;
//! - `#xpointer(/)`: the whole document, comments kept;
//! - `#id` and `#xpointer(id('id'))`: the subtree of the element whose
//!   registered ID is `id`, comments removed.

use samlsig_core::Error;
use samlsig_xml::{Document, NodeSet};

/// What a reference URI points at, before it is looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UriTarget<'a> {
    WholeDocument,
    WholeDocumentWithComments,
    Id(&'a str),
}

pub fn parse_uri(uri: &str) -> Result<UriTarget<'_>, Error> {
    if uri.is_empty() {
        return Ok(UriTarget::WholeDocument);
    }
    let Some(fragment) = uri.strip_prefix('#') else {
        return Err(Error::InvalidUri(format!("external URI not supported: {uri}")));
    };
    if fragment == "xpointer(/)" {
        return Ok(UriTarget::WholeDocumentWithComments);
    }
    let id = parse_xpointer_id(fragment).unwrap_or(fragment);
    if id.is_empty() || (fragment.starts_with("xpointer(") && id == fragment) {
        return Err(Error::InvalidUri(format!("unsupported fragment: {uri}")));
    }
    Ok(UriTarget::Id(id))
}

/// `xpointer(id('value'))` (single or double quotes) → `value`.
fn parse_xpointer_id(fragment: &str) -> Option<&str> {
    let inner = fragment.strip_prefix("xpointer(id(")?.strip_suffix("))")?;
    inner
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| inner.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
}

/// Resolve `uri` against `doc` and its ID registry.
pub fn resolve_uri(uri: &str, doc: &Document) -> Result<NodeSet, Error> {
    match parse_uri(uri)? {
        UriTarget::WholeDocument => Ok(NodeSet::all_without_comments(doc)),
        UriTarget::WholeDocumentWithComments => Ok(NodeSet::all(doc)),
        UriTarget::Id(id) => {
            let element = doc
                .element_by_id(id)
                .ok_or_else(|| Error::InvalidUri(format!("ID not found: {id}")))?;
            Ok(NodeSet::tree_without_comments(element, doc))
        }
    }
}
