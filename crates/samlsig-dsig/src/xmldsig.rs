#![forbid(unsafe_code)]

//! The built-in provider: W3C XML-DSig core validation over the arena
//! document.
//!
//! Processing order:
//! 1. Read `<SignedInfo>`: CanonicalizationMethod, SignatureMethod
//! 2. For each `<Reference>`: resolve URI, run transforms, digest, compare
//! 3. Canonicalize `<SignedInfo>`
//! 4. Check `<SignatureValue>` against the supplied key
//!
//! `<KeyInfo>` is not consulted; the key always comes from the caller.

use crate::context::Status;
use crate::provider::Provider;
use base64::Engine;
use samlsig_c14n::C14nMode;
use samlsig_core::ns::{self, attr, node};
use samlsig_core::{Deadline, Error};
use samlsig_keys::{Key, KeyFormat};
use samlsig_transforms::{transform_from_uri, TransformData, TransformPipeline};
use samlsig_xml::{find_child_element, find_child_elements, Document, NodeId, NodeSet};

#[derive(Debug, Default, Clone, Copy)]
pub struct XmlDsigProvider;

impl XmlDsigProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Provider for XmlDsigProvider {
    fn name(&self) -> &str {
        "xmldsig"
    }

    fn parse_xml(&self, text: &str) -> Result<Document, Error> {
        Document::parse(text)
    }

    fn load_certificate_key(&self, data: &[u8], format: KeyFormat) -> Result<Key, Error> {
        samlsig_keys::load_key(data, format)
    }

    fn verify_signature(
        &self,
        doc: &Document,
        signature: NodeId,
        key: &Key,
        deadline: &Deadline,
    ) -> Result<Status, Error> {
        let signed_info = required_child(doc, signature, node::SIGNED_INFO)?;

        let c14n_method = required_child(doc, signed_info, node::CANONICALIZATION_METHOD)?;
        let c14n_uri = algorithm_of(doc, c14n_method, node::CANONICALIZATION_METHOD)?;
        let c14n_mode = C14nMode::from_uri(c14n_uri)
            .ok_or_else(|| Error::UnsupportedAlgorithm(format!("C14N: {c14n_uri}")))?;
        let inclusive_prefixes = read_inclusive_prefixes(doc, c14n_method);

        let sig_method = required_child(doc, signed_info, node::SIGNATURE_METHOD)?;
        let sig_method_uri = algorithm_of(doc, sig_method, node::SIGNATURE_METHOD)?;
        let sig_alg = samlsig_crypto::sign::from_uri(sig_method_uri)?;

        let references = find_child_elements(doc, signed_info, ns::DSIG, node::REFERENCE);
        if references.is_empty() {
            return Err(Error::MissingElement("Reference".into()));
        }
        for reference in references {
            deadline.check()?;
            if !verify_reference(doc, reference, signature, deadline)? {
                return Ok(Status::Failed);
            }
        }

        let signed_info_set = if c14n_mode.with_comments() {
            NodeSet::tree_with_comments(signed_info, doc)
        } else {
            NodeSet::tree_without_comments(signed_info, doc)
        };
        let c14n_signed_info = samlsig_c14n::canonicalize_until(
            doc,
            c14n_mode,
            Some(&signed_info_set),
            &inclusive_prefixes,
            deadline,
        )?;

        let sig_value_node = required_child(doc, signature, node::SIGNATURE_VALUE)?;
        let sig_value = decode_base64(doc, sig_value_node, node::SIGNATURE_VALUE)?;

        let valid = sig_alg.verify(&key.to_verifying_key(), &c14n_signed_info, &sig_value)?;
        if valid {
            Ok(Status::Succeeded)
        } else {
            tracing::debug!(algorithm = sig_method_uri, "signature value does not match");
            Ok(Status::Failed)
        }
    }
}

/// Check one `<Reference>`. `Ok(false)` is a digest mismatch.
fn verify_reference(
    doc: &Document,
    reference: NodeId,
    signature: NodeId,
    deadline: &Deadline,
) -> Result<bool, Error> {
    let uri = doc.attribute_value(reference, attr::URI).unwrap_or("");

    let digest_method = required_child(doc, reference, node::DIGEST_METHOD)?;
    let digest_uri = algorithm_of(doc, digest_method, node::DIGEST_METHOD)?;

    let digest_value = required_child(doc, reference, node::DIGEST_VALUE)?;
    let expected = decode_base64(doc, digest_value, node::DIGEST_VALUE)?;

    let mut pipeline = TransformPipeline::new();
    if let Some(transforms) = find_child_element(doc, reference, ns::DSIG, node::TRANSFORMS) {
        for transform in find_child_elements(doc, transforms, ns::DSIG, node::TRANSFORM) {
            let transform_uri = algorithm_of(doc, transform, node::TRANSFORM)?;
            let prefixes = read_inclusive_prefixes(doc, transform);
            pipeline.push(transform_from_uri(transform_uri, signature, prefixes)?);
        }
    }

    let node_set = samlsig_transforms::resolve_uri(uri, doc)?;
    let output = pipeline
        .execute(doc, TransformData::Xml(Some(node_set)), deadline)?
        .into_binary(doc, deadline)?;

    let computed = samlsig_crypto::digest::digest(digest_uri, &output)?;
    if computed == expected {
        tracing::trace!(uri, "reference digest matches");
        Ok(true)
    } else {
        tracing::debug!(uri, digest = digest_uri, "reference digest mismatch");
        Ok(false)
    }
}

fn required_child(doc: &Document, parent: NodeId, local_name: &str) -> Result<NodeId, Error> {
    find_child_element(doc, parent, ns::DSIG, local_name)
        .ok_or_else(|| Error::MissingElement(local_name.into()))
}

fn algorithm_of<'a>(doc: &'a Document, id: NodeId, element: &str) -> Result<&'a str, Error> {
    doc.attribute_value(id, attr::ALGORITHM)
        .ok_or_else(|| Error::MissingAttribute(format!("Algorithm on {element}")))
}

/// The exc-c14n `PrefixList` below a CanonicalizationMethod or Transform.
fn read_inclusive_prefixes(doc: &Document, method: NodeId) -> Vec<String> {
    find_child_element(doc, method, ns::EXC_C14N, node::INCLUSIVE_NAMESPACES)
        .and_then(|inc| doc.attribute_value(inc, attr::PREFIX_LIST))
        .map(|list| list.split_whitespace().map(str::to_owned).collect())
        .unwrap_or_default()
}

fn decode_base64(doc: &Document, id: NodeId, element: &str) -> Result<Vec<u8>, Error> {
    let text: String = doc
        .text_content(id)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if text.is_empty() {
        return Err(Error::Base64(format!("{element} is empty")));
    }
    base64::engine::general_purpose::STANDARD
        .decode(&text)
        .map_err(|e| Error::Base64(format!("{element}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use samlsig_xml::{find_signature_node, register_ids, IdTarget};

    const RSA_RESPONSE: &str = include_str!("../../../test-data/saml/response-rsa-sha256.xml");
    const EC_RESPONSE: &str = include_str!("../../../test-data/saml/response-ecdsa-sha256.xml");
    const RSA_CERT: &str = include_str!("../../../test-data/keys/idp-rsa-cert.pem");
    const EC_CERT: &str = include_str!("../../../test-data/keys/idp-ec-p256-cert.pem");
    const INDENTED_RESPONSE: &str =
        include_str!("../../../test-data/saml/response-rsa-indented.xml");
    const INDENTED_CERT: &str = include_str!("../../../test-data/keys/idp-rsa2-cert.pem");

    fn check(xml: &str, cert: &str) -> Result<Status, Error> {
        check_with(xml, cert, &[IdTarget::saml_response()])
    }

    fn check_with(xml: &str, cert: &str, targets: &[IdTarget]) -> Result<Status, Error> {
        let provider = XmlDsigProvider::new();
        let mut doc = provider.parse_xml(xml)?;
        let root = doc.root();
        for target in targets {
            register_ids(&mut doc, root, target)?;
        }
        let sig = find_signature_node(&doc, root).expect("signature");
        let key = provider.load_certificate_key(cert.as_bytes(), KeyFormat::CertPem)?;
        provider.verify_signature(&doc, sig, &key, &Deadline::none())
    }

    #[test]
    fn test_rsa_exclusive() {
        assert_eq!(check(RSA_RESPONSE, RSA_CERT).unwrap(), Status::Succeeded);
    }

    #[test]
    fn test_ecdsa_inclusive() {
        assert_eq!(check(EC_RESPONSE, EC_CERT).unwrap(), Status::Succeeded);
    }

    #[test]
    fn test_indented_assertion_with_prefix_list() {
        let targets = [IdTarget::saml_response(), IdTarget::saml_assertion()];
        let status = |xml: &str| check_with(xml, INDENTED_CERT, &targets).unwrap();
        assert_eq!(status(INDENTED_RESPONSE), Status::Succeeded);

        // Inside an xsi:type'd value.
        let edited = INDENTED_RESPONSE.replace(">admin<", ">admiN<");
        assert_eq!(status(&edited), Status::Failed);

        // Indentation inside the assertion is signed content.
        let edited = INDENTED_RESPONSE.replacen("    <saml:Subject>", "     <saml:Subject>", 1);
        assert_eq!(status(&edited), Status::Failed);

        // xs is declared on the Response and only reaches the signed output
        // through the PrefixList.
        let edited = INDENTED_RESPONSE.replace(
            r#"xmlns:xs="http://www.w3.org/2001/XMLSchema""#,
            r#"xmlns:xs="http://www.w3.org/2001/XMLSchemb""#,
        );
        assert_eq!(status(&edited), Status::Failed);

        // The Response envelope is outside the reference.
        let edited = INDENTED_RESPONSE.replace("sp.example.com/acs", "sp.example.com/acz");
        assert_eq!(status(&edited), Status::Succeeded);
    }

    #[test]
    fn test_digest_mismatch_fails() {
        let tampered = RSA_RESPONSE.replace("alice@example.com", "mallory@example.com");
        assert_eq!(check(&tampered, RSA_CERT).unwrap(), Status::Failed);
    }

    #[test]
    fn test_signed_info_is_canonicalized_before_checking() {
        // Comments vanish under exc-c14n, whitespace does not.
        let tampered = RSA_RESPONSE.replace("<ds:SignedInfo>", "<ds:SignedInfo><!---->");
        assert_eq!(check(&tampered, RSA_CERT).unwrap(), Status::Succeeded);

        let tampered = RSA_RESPONSE.replace("<ds:SignedInfo>", "<ds:SignedInfo> ");
        assert_eq!(check(&tampered, RSA_CERT).unwrap(), Status::Failed);
    }

    #[test]
    fn test_wrong_key_type_is_error() {
        assert!(matches!(check(RSA_RESPONSE, EC_CERT), Err(Error::Key(_))));
    }

    #[test]
    fn test_unknown_reference_is_error() {
        let dangling = RSA_RESPONSE.replace("URI=\"#_resp-7f3a\"", "URI=\"#_nowhere\"");
        assert!(matches!(check(&dangling, RSA_CERT), Err(Error::InvalidUri(_))));
    }

    #[test]
    fn test_unsupported_signature_method_is_error() {
        let xml = RSA_RESPONSE.replace(
            "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256",
            "http://www.w3.org/2000/09/xmldsig#dsa-sha1",
        );
        assert!(matches!(check(&xml, RSA_CERT), Err(Error::UnsupportedAlgorithm(_))));
    }

    #[test]
    fn test_missing_parts_are_errors() {
        let no_refs = {
            let start = RSA_RESPONSE.find("<ds:Reference").unwrap();
            let end = RSA_RESPONSE.find("</ds:Reference>").unwrap() + "</ds:Reference>".len();
            format!("{}{}", &RSA_RESPONSE[..start], &RSA_RESPONSE[end..])
        };
        assert!(matches!(check(&no_refs, RSA_CERT), Err(Error::MissingElement(_))));

        let bad_b64 = {
            let start = RSA_RESPONSE.find("<ds:SignatureValue>").unwrap() + "<ds:SignatureValue>".len();
            format!("{}!!{}", &RSA_RESPONSE[..start], &RSA_RESPONSE[start..])
        };
        assert!(matches!(check(&bad_b64, RSA_CERT), Err(Error::Base64(_))));
    }

    #[test]
    fn test_expired_deadline_is_timeout() {
        let provider = XmlDsigProvider::new();
        let mut doc = provider.parse_xml(RSA_RESPONSE).unwrap();
        let root = doc.root();
        register_ids(&mut doc, root, &IdTarget::saml_response()).unwrap();
        let sig = find_signature_node(&doc, root).unwrap();
        let key = provider
            .load_certificate_key(RSA_CERT.as_bytes(), KeyFormat::CertPem)
            .unwrap();
        let expired = Deadline::after(std::time::Duration::ZERO);
        let result = provider.verify_signature(&doc, sig, &key, &expired);
        assert!(matches!(result, Err(Error::Timeout(_))));
    }

    #[test]
    fn test_prefix_list_read() {
        let xml = format!(
            r#"<m xmlns:ec="{}"><ec:InclusiveNamespaces PrefixList="saml  #default xs"/></m>"#,
            ns::EXC_C14N
        );
        let doc = Document::parse(&xml).unwrap();
        let m = doc.root_element().unwrap();
        assert_eq!(read_inclusive_prefixes(&doc, m), ["saml", "#default", "xs"]);
    }
}
