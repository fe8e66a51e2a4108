#![forbid(unsafe_code)]

//! XML document layer for samlsig.
//!
//! An owned arena over a `roxmltree` parse, the per-document ID registry,
//! element lookup, and the `NodeSet` used by canonicalization and
//! transforms.

pub mod document;
pub mod ids;
pub mod locate;
pub mod nodeset;

pub use document::{AttrId, Attribute, Document, Element, NodeId, NodeKind, QName};
pub use ids::{register_ids, IdRegistry, IdTarget};
pub use locate::{
    find_child_element, find_child_elements, find_element, find_elements, find_signature_node,
};
pub use nodeset::NodeSet;
