#![forbid(unsafe_code)]

//! Key types.

use samlsig_crypto::VerifyingKey;

/// Encoding of the key material handed to the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFormat {
    /// PEM `CERTIFICATE`.
    CertPem,
    /// DER X.509 certificate.
    CertDer,
    /// PEM `PUBLIC KEY` (SubjectPublicKeyInfo).
    PublicKeyPem,
}

/// Decoded public key.
#[derive(Clone)]
pub enum KeyData {
    Rsa(rsa::RsaPublicKey),
    EcP256(p256::ecdsa::VerifyingKey),
    EcP384(p384::ecdsa::VerifyingKey),
}

impl std::fmt::Debug for KeyData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rsa(pk) => {
                use rsa::traits::PublicKeyParts;
                write!(f, "RSA public key ({} bits)", pk.n().bits())
            }
            Self::EcP256(_) => write!(f, "EC P-256 public key"),
            Self::EcP384(_) => write!(f, "EC P-384 public key"),
        }
    }
}

/// A loaded verification key.
#[derive(Debug, Clone)]
pub struct Key {
    /// Certificate subject, when the key came from a certificate.
    pub name: Option<String>,
    pub format: KeyFormat,
    /// The DER bytes the key was decoded from: the certificate for the
    /// certificate formats, the SubjectPublicKeyInfo otherwise.
    pub der: Vec<u8>,
    pub data: KeyData,
}

impl Key {
    pub fn new(data: KeyData, format: KeyFormat, der: Vec<u8>) -> Self {
        Self {
            name: None,
            format,
            der,
            data,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn to_verifying_key(&self) -> VerifyingKey {
        match &self.data {
            KeyData::Rsa(pk) => VerifyingKey::Rsa(pk.clone()),
            KeyData::EcP256(vk) => VerifyingKey::EcP256(*vk),
            KeyData::EcP384(vk) => VerifyingKey::EcP384(*vk),
        }
    }

    pub fn rsa_public_key(&self) -> Option<&rsa::RsaPublicKey> {
        match &self.data {
            KeyData::Rsa(pk) => Some(pk),
            _ => None,
        }
    }
}
