#![forbid(unsafe_code)]

//! Verify the enveloped XML-DSig signature on a SAML document against a
//! PEM certificate.
//!
//! ```no_run
//! let xml = std::fs::read_to_string("response.xml").unwrap();
//! let pem = std::fs::read_to_string("idp.pem").unwrap();
//! let valid = samlsig::verify(&xml, &pem).unwrap();
//! ```

pub use samlsig_c14n as c14n;
pub use samlsig_core as core;
pub use samlsig_crypto as crypto;
pub use samlsig_dsig as dsig;
pub use samlsig_keys as keys;
pub use samlsig_transforms as transforms;
pub use samlsig_xml as xml;

pub use samlsig_core::{Deadline, Error};
pub use samlsig_dsig::{Provider, Status, Verifier, VerifyConfig, XmlDsigProvider};
pub use samlsig_xml::IdTarget;

/// Verify `xml` against the public key in `certificate_pem`, using the
/// process-wide provider and the default configuration.
///
/// `Ok(false)` means the signature was checked and does not validate.
pub fn verify(xml: &str, certificate_pem: &str) -> Result<bool, Error> {
    samlsig_dsig::verify(xml, certificate_pem)
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_verify_fixture() {
        let xml = include_str!("../../../test-data/saml/response-ecdsa-sha256.xml");
        let pem = include_str!("../../../test-data/keys/idp-ec-p256-cert.pem");
        assert!(super::verify(xml, pem).unwrap());

        let other = include_str!("../../../test-data/keys/other-rsa-cert.pem");
        assert!(matches!(super::verify(xml, other), Err(super::Error::VerificationProcess(_))));
    }
}
