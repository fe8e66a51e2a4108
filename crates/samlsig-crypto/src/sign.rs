#![forbid(unsafe_code)]

//! Signature verification (RSA PKCS#1 v1.5 and ECDSA).

use samlsig_core::{algorithm, Error};

/// Public key material a signature can be checked against.
#[derive(Debug, Clone)]
pub enum VerifyingKey {
    Rsa(rsa::RsaPublicKey),
    EcP256(p256::ecdsa::VerifyingKey),
    EcP384(p384::ecdsa::VerifyingKey),
}

impl VerifyingKey {
    pub fn algorithm_name(&self) -> &'static str {
        match self {
            Self::Rsa(_) => "RSA",
            Self::EcP256(_) => "EC P-256",
            Self::EcP384(_) => "EC P-384",
        }
    }
}

pub trait SignatureAlgorithm: Send + Sync {
    fn uri(&self) -> &'static str;

    /// `Ok(false)` means the signature does not match. `Err` means the
    /// check could not be carried out: wrong key type or a malformed
    /// signature value.
    fn verify(&self, key: &VerifyingKey, data: &[u8], signature: &[u8]) -> Result<bool, Error>;
}

const ALGORITHMS: &[(&str, Family, HashType)] = &[
    (algorithm::RSA_SHA1, Family::Rsa, HashType::Sha1),
    (algorithm::RSA_SHA224, Family::Rsa, HashType::Sha224),
    (algorithm::RSA_SHA256, Family::Rsa, HashType::Sha256),
    (algorithm::RSA_SHA384, Family::Rsa, HashType::Sha384),
    (algorithm::RSA_SHA512, Family::Rsa, HashType::Sha512),
    (algorithm::ECDSA_SHA1, Family::Ecdsa, HashType::Sha1),
    (algorithm::ECDSA_SHA224, Family::Ecdsa, HashType::Sha224),
    (algorithm::ECDSA_SHA256, Family::Ecdsa, HashType::Sha256),
    (algorithm::ECDSA_SHA384, Family::Ecdsa, HashType::Sha384),
    (algorithm::ECDSA_SHA512, Family::Ecdsa, HashType::Sha512),
];

/// Every signature URI [`from_uri`] accepts.
pub fn supported() -> impl Iterator<Item = &'static str> {
    ALGORITHMS.iter().map(|(uri, _, _)| *uri)
}

pub fn from_uri(uri: &str) -> Result<Box<dyn SignatureAlgorithm>, Error> {
    let Some(&(uri, family, hash)) = ALGORITHMS.iter().find(|(known, _, _)| *known == uri) else {
        return Err(Error::UnsupportedAlgorithm(format!("signature algorithm: {uri}")));
    };
    Ok(match family {
        Family::Rsa => Box::new(RsaPkcs1v15 { uri, hash }),
        Family::Ecdsa => Box::new(Ecdsa { uri, hash }),
    })
}

#[derive(Debug, Clone, Copy)]
enum Family {
    Rsa,
    Ecdsa,
}

#[derive(Debug, Clone, Copy)]
enum HashType {
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl HashType {
    fn digest_uri(self) -> &'static str {
        match self {
            Self::Sha1 => algorithm::SHA1,
            Self::Sha224 => algorithm::SHA224,
            Self::Sha256 => algorithm::SHA256,
            Self::Sha384 => algorithm::SHA384,
            Self::Sha512 => algorithm::SHA512,
        }
    }
}

// ── RSA PKCS#1 v1.5 ─────────────────────────────────────────────────

struct RsaPkcs1v15 {
    uri: &'static str,
    hash: HashType,
}

impl SignatureAlgorithm for RsaPkcs1v15 {
    fn uri(&self) -> &'static str {
        self.uri
    }

    fn verify(&self, key: &VerifyingKey, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        use signature::Verifier;

        let VerifyingKey::Rsa(public_key) = key else {
            return Err(Error::Key(format!(
                "RSA key required, got {}",
                key.algorithm_name()
            )));
        };
        let sig = rsa::pkcs1v15::Signature::try_from(sig_bytes)
            .map_err(|e| Error::Crypto(format!("invalid RSA signature: {e}")))?;

        macro_rules! do_verify {
            ($hasher:ty) => {{
                let vk = rsa::pkcs1v15::VerifyingKey::<$hasher>::new(public_key.clone());
                vk.verify(data, &sig).is_ok()
            }};
        }
        Ok(match self.hash {
            HashType::Sha1 => do_verify!(sha1::Sha1),
            HashType::Sha224 => do_verify!(sha2::Sha224),
            HashType::Sha256 => do_verify!(sha2::Sha256),
            HashType::Sha384 => do_verify!(sha2::Sha384),
            HashType::Sha512 => do_verify!(sha2::Sha512),
        })
    }
}

// ── ECDSA ────────────────────────────────────────────────────────────

/// ECDSA over whichever curve the key is on. The message is hashed with the
/// algorithm named by the URI and checked as a prehash, so `ecdsa-sha1` on
/// P-256 really uses SHA-1.
struct Ecdsa {
    uri: &'static str,
    hash: HashType,
}

impl SignatureAlgorithm for Ecdsa {
    fn uri(&self) -> &'static str {
        self.uri
    }

    fn verify(&self, key: &VerifyingKey, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        use signature::hazmat::PrehashVerifier;

        let prehash = crate::digest::digest(self.hash.digest_uri(), data)?;
        match key {
            VerifyingKey::EcP256(vk) => {
                let sig = xmldsig_to_p256(sig_bytes)?;
                Ok(vk.verify_prehash(&prehash, &sig).is_ok())
            }
            VerifyingKey::EcP384(vk) => {
                let sig = xmldsig_to_p384(sig_bytes)?;
                Ok(vk.verify_prehash(&prehash, &sig).is_ok())
            }
            VerifyingKey::Rsa(_) => Err(Error::Key("EC key required, got RSA".into())),
        }
    }
}

/// XML-DSig carries ECDSA signatures as raw `r || s`.
pub fn xmldsig_to_p256(rs: &[u8]) -> Result<p256::ecdsa::Signature, Error> {
    if rs.len() != 64 {
        return Err(Error::Crypto(format!(
            "P-256 signature must be 64 bytes, got {}",
            rs.len()
        )));
    }
    p256::ecdsa::Signature::from_slice(rs)
        .map_err(|e| Error::Crypto(format!("invalid P-256 signature: {e}")))
}

pub fn xmldsig_to_p384(rs: &[u8]) -> Result<p384::ecdsa::Signature, Error> {
    if rs.len() != 96 {
        return Err(Error::Crypto(format!(
            "P-384 signature must be 96 bytes, got {}",
            rs.len()
        )));
    }
    p384::ecdsa::Signature::from_slice(rs)
        .map_err(|e| Error::Crypto(format!("invalid P-384 signature: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::ecdsa::signature::hazmat::PrehashSigner;

    fn p256_pair() -> (p256::ecdsa::SigningKey, VerifyingKey) {
        let sk = p256::ecdsa::SigningKey::from_slice(&[7u8; 32]).unwrap();
        let vk = VerifyingKey::EcP256(*sk.verifying_key());
        (sk, vk)
    }

    fn raw(sig: &p256::ecdsa::Signature) -> Vec<u8> {
        sig.to_bytes().to_vec()
    }

    #[test]
    fn test_ecdsa_uses_uri_hash() {
        let (sk, vk) = p256_pair();
        let data = b"<ds:SignedInfo></ds:SignedInfo>";
        let prehash = crate::digest::digest(algorithm::SHA1, data).unwrap();
        let sig: p256::ecdsa::Signature = sk.sign_prehash(&prehash).unwrap();

        let sha1 = from_uri(algorithm::ECDSA_SHA1).unwrap();
        assert!(sha1.verify(&vk, data, &raw(&sig)).unwrap());

        let sha256 = from_uri(algorithm::ECDSA_SHA256).unwrap();
        assert!(!sha256.verify(&vk, data, &raw(&sig)).unwrap());
    }

    #[test]
    fn test_ecdsa_tampered_data_is_false() {
        let (sk, vk) = p256_pair();
        let prehash = crate::digest::digest(algorithm::SHA256, b"payload").unwrap();
        let sig: p256::ecdsa::Signature = sk.sign_prehash(&prehash).unwrap();
        let alg = from_uri(algorithm::ECDSA_SHA256).unwrap();
        assert!(alg.verify(&vk, b"payload", &raw(&sig)).unwrap());
        assert!(!alg.verify(&vk, b"pay1oad", &raw(&sig)).unwrap());
    }

    #[test]
    fn test_malformed_signature_is_error() {
        let (_, vk) = p256_pair();
        let alg = from_uri(algorithm::ECDSA_SHA256).unwrap();
        assert!(matches!(alg.verify(&vk, b"x", &[0u8; 10]), Err(Error::Crypto(_))));
    }

    #[test]
    fn test_key_type_mismatch_is_error() {
        let (_, vk) = p256_pair();
        let alg = from_uri(algorithm::RSA_SHA256).unwrap();
        assert!(matches!(alg.verify(&vk, b"x", &[0u8; 256]), Err(Error::Key(_))));
    }

    #[test]
    fn test_lookup() {
        assert_eq!(supported().count(), 10);
        for uri in supported() {
            assert_eq!(from_uri(uri).unwrap().uri(), uri);
        }
        assert!(from_uri("http://www.w3.org/2000/09/xmldsig#dsa-sha1").is_err());
    }
}
