#![forbid(unsafe_code)]

//! Transform pipeline and trait definitions.

use samlsig_c14n::C14nMode;
use samlsig_core::{algorithm, Deadline, Error};
use samlsig_xml::{Document, NodeId, NodeSet};

use crate::enveloped::EnvelopedSignatureTransform;

/// Data flowing through a reference's transform chain.
#[derive(Debug, Clone)]
pub enum TransformData {
    /// A selection of the document being verified; `None` is the whole
    /// document.
    Xml(Option<NodeSet>),
    /// Octets.
    Binary(Vec<u8>),
}

impl TransformData {
    /// The octet form: node sets are converted with inclusive C14N, without
    /// comments.
    pub fn into_binary(self, doc: &Document, deadline: &Deadline) -> Result<Vec<u8>, Error> {
        match self {
            TransformData::Binary(data) => Ok(data),
            TransformData::Xml(node_set) => samlsig_c14n::canonicalize_until(
                doc,
                C14nMode::Inclusive,
                node_set.as_ref(),
                &[],
                deadline,
            ),
        }
    }
}

pub trait Transform: Send {
    fn uri(&self) -> &str;

    /// Long-running transforms return [`Error::Timeout`] once `deadline`
    /// passes.
    fn execute(
        &self,
        doc: &Document,
        input: TransformData,
        deadline: &Deadline,
    ) -> Result<TransformData, Error>;
}

/// Transforms run in order.
#[derive(Default)]
pub struct TransformPipeline {
    transforms: Vec<Box<dyn Transform>>,
}

impl TransformPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, transform: Box<dyn Transform>) {
        self.transforms.push(transform);
    }

    pub fn execute(
        &self,
        doc: &Document,
        input: TransformData,
        deadline: &Deadline,
    ) -> Result<TransformData, Error> {
        let mut data = input;
        for transform in &self.transforms {
            deadline.check()?;
            tracing::trace!(transform = transform.uri(), "applying transform");
            data = transform.execute(doc, data, deadline)?;
        }
        Ok(data)
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

/// Build the transform named by `uri`.
///
/// `signature` is the enclosing `Signature` element, used by the
/// enveloped-signature transform. `inclusive_prefixes` is the exclusive
/// C14N PrefixList.
pub fn transform_from_uri(
    uri: &str,
    signature: NodeId,
    inclusive_prefixes: Vec<String>,
) -> Result<Box<dyn Transform>, Error> {
    if uri == algorithm::ENVELOPED_SIGNATURE {
        return Ok(Box::new(EnvelopedSignatureTransform::new(signature)));
    }
    match C14nMode::from_uri(uri) {
        Some(mode) => Ok(Box::new(C14nTransform::new(mode, inclusive_prefixes))),
        None => Err(Error::UnsupportedAlgorithm(format!("transform: {uri}"))),
    }
}

/// A canonicalization transform.
pub struct C14nTransform {
    mode: C14nMode,
    inclusive_prefixes: Vec<String>,
}

impl C14nTransform {
    pub fn new(mode: C14nMode, inclusive_prefixes: Vec<String>) -> Self {
        Self {
            mode,
            inclusive_prefixes,
        }
    }
}

impl Transform for C14nTransform {
    fn uri(&self) -> &str {
        self.mode.uri()
    }

    fn execute(
        &self,
        doc: &Document,
        input: TransformData,
        deadline: &Deadline,
    ) -> Result<TransformData, Error> {
        let prefixes = &self.inclusive_prefixes;
        let bytes = match input {
            TransformData::Xml(node_set) => samlsig_c14n::canonicalize_until(
                doc,
                self.mode,
                node_set.as_ref(),
                prefixes,
                deadline,
            )?,
            TransformData::Binary(data) => {
                let text = std::str::from_utf8(&data)
                    .map_err(|e| Error::Transform(format!("invalid UTF-8: {e}")))?;
                let reparsed = Document::parse(text)?;
                samlsig_c14n::canonicalize_until(&reparsed, self.mode, None, prefixes, deadline)?
            }
        };
        Ok(TransformData::Binary(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DS: &str = "http://www.w3.org/2000/09/xmldsig#";

    fn signed() -> Document {
        Document::parse(&format!(
            r#"<r xmlns:u="urn:u"><a>1</a><ds:Signature xmlns:ds="{DS}"><ds:X/></ds:Signature></r>"#
        ))
        .unwrap()
    }

    #[test]
    fn test_enveloped_then_exclusive() {
        let doc = signed();
        let r = doc.root_element().unwrap();
        let sig = doc.children(r)[1];

        let mut pipeline = TransformPipeline::new();
        pipeline.push(transform_from_uri(algorithm::ENVELOPED_SIGNATURE, sig, vec![]).unwrap());
        pipeline.push(transform_from_uri(algorithm::EXC_C14N, sig, vec![]).unwrap());
        assert_eq!(pipeline.len(), 2);

        let none = Deadline::none();
        let out = pipeline.execute(&doc, TransformData::Xml(None), &none).unwrap();
        let bytes = out.into_binary(&doc, &none).unwrap();
        assert_eq!(bytes, b"<r><a>1</a></r>");
    }

    #[test]
    fn test_default_conversion_is_inclusive() {
        let doc = signed();
        let r = doc.root_element().unwrap();
        let sig = doc.children(r)[1];

        let mut pipeline = TransformPipeline::new();
        pipeline.push(transform_from_uri(algorithm::ENVELOPED_SIGNATURE, sig, vec![]).unwrap());
        let none = Deadline::none();
        let out = pipeline.execute(&doc, TransformData::Xml(None), &none).unwrap();
        assert_eq!(
            out.into_binary(&doc, &none).unwrap(),
            br#"<r xmlns:u="urn:u"><a>1</a></r>"#
        );
    }

    #[test]
    fn test_c14n_of_octets_reparses() {
        let doc = signed();
        let t = C14nTransform::new(C14nMode::Exclusive, vec![]);
        let none = Deadline::none();
        let out = t
            .execute(&doc, TransformData::Binary(b"<x b='2' a='1'/>".to_vec()), &none)
            .unwrap();
        assert_eq!(out.into_binary(&doc, &none).unwrap(), br#"<x a="1" b="2"></x>"#);
    }

    #[test]
    fn test_expired_deadline_stops_pipeline() {
        let doc = signed();
        let r = doc.root_element().unwrap();
        let sig = doc.children(r)[1];

        let mut pipeline = TransformPipeline::new();
        pipeline.push(transform_from_uri(algorithm::ENVELOPED_SIGNATURE, sig, vec![]).unwrap());
        let expired = Deadline::after(std::time::Duration::ZERO);
        let err = pipeline
            .execute(&doc, TransformData::Xml(None), &expired)
            .unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));

        let err = TransformData::Xml(None).into_binary(&doc, &expired).unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
    }

    #[test]
    fn test_unknown_transform() {
        let doc = signed();
        let xslt = "http://www.w3.org/TR/1999/REC-xslt-19991116";
        let err = transform_from_uri(xslt, doc.root(), vec![]).err().unwrap();
        assert!(matches!(err, Error::UnsupportedAlgorithm(_)));
    }
}
