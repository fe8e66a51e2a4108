#![forbid(unsafe_code)]

//! Enveloped XML-DSig verification for SAML documents.
//!
//! [`Verifier`] drives a [`Provider`] through parsing, ID registration,
//! signature lookup, key loading and core validation. [`XmlDsigProvider`]
//! is the built-in provider.

pub mod config;
pub mod context;
pub mod provider;
pub mod runtime;
pub mod verify;
pub mod xmldsig;

pub use config::VerifyConfig;
pub use context::{Status, VerificationContext};
pub use provider::Provider;
pub use runtime::{ensure_ready, verify, Runtime};
pub use verify::Verifier;
pub use xmldsig::XmlDsigProvider;
