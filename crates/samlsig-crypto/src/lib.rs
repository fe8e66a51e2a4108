#![forbid(unsafe_code)]

//! Digest and signature-verification algorithms for samlsig, looked up by
//! their XML-DSig algorithm URIs.

pub mod digest;
pub mod sign;

pub use digest::DigestAlgorithm;
pub use sign::{SignatureAlgorithm, VerifyingKey};
