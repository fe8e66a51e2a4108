#![forbid(unsafe_code)]

//! Enveloped-signature transform: drops the `Signature` element and
//! everything below it from the node set.

use crate::pipeline::{Transform, TransformData};
use samlsig_core::{algorithm, Deadline, Error};
use samlsig_xml::{Document, NodeId, NodeSet};

pub struct EnvelopedSignatureTransform {
    signature: NodeId,
}

impl EnvelopedSignatureTransform {
    pub fn new(signature: NodeId) -> Self {
        Self { signature }
    }
}

impl Transform for EnvelopedSignatureTransform {
    fn uri(&self) -> &str {
        algorithm::ENVELOPED_SIGNATURE
    }

    fn execute(
        &self,
        doc: &Document,
        input: TransformData,
        _deadline: &Deadline,
    ) -> Result<TransformData, Error> {
        match input {
            TransformData::Xml(node_set) => {
                let mut set = node_set.unwrap_or_else(|| NodeSet::all(doc));
                set.remove_subtree(self.signature, doc);
                Ok(TransformData::Xml(Some(set)))
            }
            TransformData::Binary(_) => Err(Error::Transform(
                "enveloped-signature transform requires XML input".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_signature_subtree_only() {
        let doc = Document::parse("<r><a/><s><k/></s><b/></r>").unwrap();
        let r = doc.root_element().unwrap();
        let [a, s, b] = doc.children(r) else {
            panic!("unexpected shape");
        };
        let k = doc.children(*s)[0];

        let out = EnvelopedSignatureTransform::new(*s)
            .execute(&doc, TransformData::Xml(None), &Deadline::none())
            .unwrap();
        let TransformData::Xml(Some(set)) = out else {
            panic!("expected a node set");
        };
        assert!(set.contains(*a) && set.contains(*b) && set.contains(r));
        assert!(!set.contains(*s) && !set.contains(k));
    }

    #[test]
    fn test_rejects_octets() {
        let doc = Document::parse("<r/>").unwrap();
        let t = EnvelopedSignatureTransform::new(doc.root());
        let out = t.execute(&doc, TransformData::Binary(vec![1]), &Deadline::none());
        assert!(out.is_err());
    }
}
