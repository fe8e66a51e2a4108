#![forbid(unsafe_code)]

//! XML canonicalization for samlsig.
//!
//! Canonical XML 1.0 and Exclusive Canonical XML 1.0, each with and without
//! comments, over a whole [`Document`] or a [`NodeSet`] subset of it.

pub mod escape;
pub mod exclusive;
pub mod inclusive;
pub mod render;

use samlsig_core::{algorithm, Deadline, Error};
use samlsig_xml::{Document, NodeSet};

/// Deepest element nesting the canonicalizers will follow.
pub const MAX_DEPTH: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum C14nMode {
    /// Canonical XML 1.0
    Inclusive,
    /// Canonical XML 1.0 with comments
    InclusiveWithComments,
    /// Exclusive Canonical XML 1.0
    Exclusive,
    /// Exclusive Canonical XML 1.0 with comments
    ExclusiveWithComments,
}

impl C14nMode {
    pub const ALL: [C14nMode; 4] = [
        Self::Inclusive,
        Self::InclusiveWithComments,
        Self::Exclusive,
        Self::ExclusiveWithComments,
    ];

    pub fn uri(&self) -> &'static str {
        match self {
            Self::Inclusive => algorithm::C14N,
            Self::InclusiveWithComments => algorithm::C14N_WITH_COMMENTS,
            Self::Exclusive => algorithm::EXC_C14N,
            Self::ExclusiveWithComments => algorithm::EXC_C14N_WITH_COMMENTS,
        }
    }

    pub fn from_uri(uri: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.uri() == uri)
    }

    pub fn with_comments(&self) -> bool {
        matches!(self, Self::InclusiveWithComments | Self::ExclusiveWithComments)
    }

    pub fn is_exclusive(&self) -> bool {
        matches!(self, Self::Exclusive | Self::ExclusiveWithComments)
    }
}

/// Canonicalize `doc`, or only the nodes in `node_set` when one is given.
///
/// `inclusive_prefixes` is the InclusiveNamespaces PrefixList and is ignored
/// by the inclusive modes.
pub fn canonicalize(
    doc: &Document,
    mode: C14nMode,
    node_set: Option<&NodeSet>,
    inclusive_prefixes: &[String],
) -> Result<Vec<u8>, Error> {
    canonicalize_until(doc, mode, node_set, inclusive_prefixes, &Deadline::none())
}

/// Like [`canonicalize`], but stops with [`Error::Timeout`] once `deadline`
/// passes. The deadline is checked at every element.
pub fn canonicalize_until(
    doc: &Document,
    mode: C14nMode,
    node_set: Option<&NodeSet>,
    inclusive_prefixes: &[String],
    deadline: &Deadline,
) -> Result<Vec<u8>, Error> {
    if mode.is_exclusive() {
        exclusive::canonicalize(doc, mode.with_comments(), node_set, inclusive_prefixes, deadline)
    } else {
        inclusive::canonicalize(doc, mode.with_comments(), node_set, deadline)
    }
}
