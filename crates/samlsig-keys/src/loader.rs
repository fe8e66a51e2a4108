#![forbid(unsafe_code)]

//! Loading verification keys from certificates and public keys.

use crate::key::{Key, KeyData, KeyFormat};
use samlsig_core::Error;

/// Load a key from `data` in the given format.
pub fn load_key(data: &[u8], format: KeyFormat) -> Result<Key, Error> {
    match format {
        KeyFormat::CertPem => load_x509_cert_pem(data),
        KeyFormat::CertDer => load_x509_cert_der(data),
        KeyFormat::PublicKeyPem => load_spki_pem(data),
    }
}

/// Load the public key from a PEM-encoded X.509 certificate.
pub fn load_x509_cert_pem(pem_data: &[u8]) -> Result<Key, Error> {
    let der = decode_pem(pem_data, "CERTIFICATE")?;
    let mut key = load_x509_cert_der(&der)?;
    key.format = KeyFormat::CertPem;
    Ok(key)
}

/// Load the public key from a DER-encoded X.509 certificate.
pub fn load_x509_cert_der(data: &[u8]) -> Result<Key, Error> {
    use der::{Decode, Encode};
    use x509_cert::Certificate;

    if data.is_empty() {
        return Err(Error::Certificate("empty certificate".into()));
    }
    let cert = Certificate::from_der(data)
        .map_err(|e| Error::Certificate(format!("failed to parse X.509 certificate: {e}")))?;

    let spki_der = cert
        .tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(|e| Error::Certificate(format!("failed to encode SubjectPublicKeyInfo: {e}")))?;

    let key_data = decode_spki(&spki_der)?;
    let subject = cert.tbs_certificate.subject.to_string();
    tracing::debug!(subject = %subject, key = ?key_data, "loaded certificate key");

    Ok(Key::new(key_data, KeyFormat::CertDer, data.to_vec()).with_name(subject))
}

/// Load a public key from a PEM `PUBLIC KEY` block.
pub fn load_spki_pem(pem_data: &[u8]) -> Result<Key, Error> {
    let der = decode_pem(pem_data, "PUBLIC KEY")?;
    let key_data = decode_spki(&der)?;
    Ok(Key::new(key_data, KeyFormat::PublicKeyPem, der))
}

/// Decode SubjectPublicKeyInfo DER into one of the supported key types.
pub fn decode_spki(spki_der: &[u8]) -> Result<KeyData, Error> {
    use der::Decode;
    use spki::DecodePublicKey;

    if let Ok(pk) = rsa::RsaPublicKey::from_public_key_der(spki_der) {
        return Ok(KeyData::Rsa(pk));
    }
    if let Ok(vk) = p256::ecdsa::VerifyingKey::from_public_key_der(spki_der) {
        return Ok(KeyData::EcP256(vk));
    }
    if let Ok(vk) = p384::ecdsa::VerifyingKey::from_public_key_der(spki_der) {
        return Ok(KeyData::EcP384(vk));
    }

    let algorithm = spki::SubjectPublicKeyInfoRef::from_der(spki_der)
        .map(|info| info.algorithm.oid.to_string())
        .unwrap_or_else(|_| "unknown".into());
    Err(Error::Key(format!("unsupported public key algorithm: {algorithm}")))
}

fn decode_pem(pem_data: &[u8], expected_label: &str) -> Result<Vec<u8>, Error> {
    let text = std::str::from_utf8(pem_data)
        .map_err(|e| Error::Key(format!("invalid PEM encoding: {e}")))?
        .trim();
    if text.is_empty() {
        return Err(Error::Key("empty PEM input".into()));
    }

    let (label, der) = pem_rfc7468::decode_vec(text.as_bytes())
        .map_err(|e| Error::Key(format!("failed to decode PEM: {e}")))?;
    if label != expected_label {
        return Err(Error::Key(format!(
            "expected {expected_label} PEM label, got: {label}"
        )));
    }
    Ok(der)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSA_CERT: &str = include_str!("../../../test-data/keys/idp-rsa-cert.pem");
    const EC_CERT: &str = include_str!("../../../test-data/keys/idp-ec-p256-cert.pem");
    const RSA_PUBKEY: &str = include_str!("../../../test-data/keys/idp-rsa-pubkey.pem");

    #[test]
    fn test_rsa_certificate() {
        let key = load_key(RSA_CERT.as_bytes(), KeyFormat::CertPem).unwrap();
        assert!(matches!(key.data, KeyData::Rsa(_)));
        assert_eq!(key.format, KeyFormat::CertPem);
        assert_eq!(key.name.as_deref(), Some("CN=idp.example.com"));
    }

    #[test]
    fn test_ec_certificate() {
        let key = load_x509_cert_pem(EC_CERT.as_bytes()).unwrap();
        assert!(matches!(key.data, KeyData::EcP256(_)));
        assert_eq!(key.name.as_deref(), Some("CN=idp-ec.example.com"));
    }

    #[test]
    fn test_der_certificate_matches_pem() {
        let (_, der) = pem_rfc7468::decode_vec(RSA_CERT.trim().as_bytes()).unwrap();
        let from_der = load_key(&der, KeyFormat::CertDer).unwrap();
        let from_pem = load_key(RSA_CERT.as_bytes(), KeyFormat::CertPem).unwrap();
        assert_eq!(from_der.der, from_pem.der);
        assert_eq!(from_der.rsa_public_key(), from_pem.rsa_public_key());
    }

    #[test]
    fn test_public_key_pem_matches_certificate() {
        let spki = load_key(RSA_PUBKEY.as_bytes(), KeyFormat::PublicKeyPem).unwrap();
        let cert = load_key(RSA_CERT.as_bytes(), KeyFormat::CertPem).unwrap();
        assert_eq!(spki.name, None);
        assert_eq!(spki.rsa_public_key(), cert.rsa_public_key());
    }

    #[test]
    fn test_wrong_label_rejected() {
        let err = load_key(RSA_PUBKEY.as_bytes(), KeyFormat::CertPem).unwrap_err();
        assert!(err.to_string().contains("CERTIFICATE"));
    }

    #[test]
    fn test_empty_and_garbage_rejected() {
        assert!(load_key(b"", KeyFormat::CertPem).is_err());
        assert!(load_key(b"   \n", KeyFormat::CertPem).is_err());
        assert!(load_key(b"not a certificate", KeyFormat::CertPem).is_err());
        assert!(load_key(b"", KeyFormat::CertDer).is_err());
        assert!(load_key(&[0x30, 0x03, 0x02, 0x01, 0x00], KeyFormat::CertDer).is_err());

        let truncated = RSA_CERT.replace("MIIC", "MIIX");
        assert!(load_key(truncated.as_bytes(), KeyFormat::CertPem).is_err());
    }
}
