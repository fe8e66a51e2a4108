#![forbid(unsafe_code)]

//! Shared types for the samlsig workspace: the error enum, the [`Deadline`]
//! used to bound verification work, and the namespace, element, attribute
//! and algorithm constants used by every other crate.

pub mod algorithm;
pub mod deadline;
pub mod error;
pub mod ns;

pub use deadline::Deadline;
pub use error::{Error, Result};
