#![forbid(unsafe_code)]

//! Reference processing for samlsig: URI dereferencing and the transform
//! chain (enveloped-signature and canonicalization).

pub mod enveloped;
pub mod pipeline;
pub mod uri;

pub use pipeline::{transform_from_uri, Transform, TransformData, TransformPipeline};
pub use uri::resolve_uri;
