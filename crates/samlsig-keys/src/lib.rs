#![forbid(unsafe_code)]

//! Verification keys for samlsig: the `Key` type and loaders for X.509
//! certificates (PEM or DER) and PEM public keys.

pub mod key;
pub mod loader;

pub use key::{Key, KeyData, KeyFormat};
pub use loader::load_key;
