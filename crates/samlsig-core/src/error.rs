#![forbid(unsafe_code)]

use std::time::Duration;

/// Errors produced while verifying a signed SAML document.
///
/// The first group is what the verification orchestrator hands back to
/// callers. The second group is raised inside the provider
/// crates and folded into `VerificationProcess` (or `KeyLoad`) by the
/// orchestrator, keeping the original message.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("duplicate ID attribute \"{0}\"")]
    DuplicateId(String),

    #[error("failed to load key: {0}")]
    KeyLoad(String),

    #[error("signature verification could not be performed: {0}")]
    VerificationProcess(String),

    #[error("verification did not finish within {0:?}")]
    Timeout(Duration),

    // ── provider-internal ────────────────────────────────────────────
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("cryptographic error: {0}")]
    Crypto(String),

    #[error("key error: {0}")]
    Key(String),

    #[error("certificate error: {0}")]
    Certificate(String),

    #[error("canonicalization error: {0}")]
    Canonicalization(String),

    #[error("transform error: {0}")]
    Transform(String),

    #[error("base64 decode error: {0}")]
    Base64(String),

    #[error("missing required element: {0}")]
    MissingElement(String),

    #[error("missing required attribute: {0}")]
    MissingAttribute(String),

    #[error("invalid URI reference: {0}")]
    InvalidUri(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Fold any error raised while loading key material into `KeyLoad`.
    pub fn into_key_load(self) -> Self {
        match self {
            Error::KeyLoad(_) => self,
            other => Error::KeyLoad(other.to_string()),
        }
    }

    /// Fold any error raised while parsing into `XmlParse`.
    pub fn into_xml_parse(self) -> Self {
        match self {
            Error::XmlParse(_) => self,
            other => Error::XmlParse(other.to_string()),
        }
    }

    /// Fold any error raised by the provider's signature check into
    /// `VerificationProcess`.
    pub fn into_verification_process(self) -> Self {
        match self {
            Error::VerificationProcess(_) | Error::Timeout(_) => self,
            other => Error::VerificationProcess(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
