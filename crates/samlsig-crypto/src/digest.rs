#![forbid(unsafe_code)]

//! Digest algorithms, looked up by their XML-DSig URI.

use digest::Digest;
use samlsig_core::{algorithm, Error};

/// Incremental hash.
pub trait DigestAlgorithm: Send {
    fn update(&mut self, data: &[u8]);
    fn finalize(self: Box<Self>) -> Vec<u8>;
    fn uri(&self) -> &'static str;
}

/// Every digest URI [`from_uri`] accepts.
pub const SUPPORTED: &[&str] = &[
    algorithm::SHA1,
    algorithm::SHA224,
    algorithm::SHA256,
    algorithm::SHA384,
    algorithm::SHA512,
    algorithm::SHA3_224,
    algorithm::SHA3_256,
    algorithm::SHA3_384,
    algorithm::SHA3_512,
];

pub fn from_uri(uri: &str) -> Result<Box<dyn DigestAlgorithm>, Error> {
    let hasher: Box<dyn DigestAlgorithm> = match uri {
        algorithm::SHA1 => Box::new(Sha1Digest::new()),
        algorithm::SHA224 => Box::new(Sha224Digest::new()),
        algorithm::SHA256 => Box::new(Sha256Digest::new()),
        algorithm::SHA384 => Box::new(Sha384Digest::new()),
        algorithm::SHA512 => Box::new(Sha512Digest::new()),
        algorithm::SHA3_224 => Box::new(Sha3_224Digest::new()),
        algorithm::SHA3_256 => Box::new(Sha3_256Digest::new()),
        algorithm::SHA3_384 => Box::new(Sha3_384Digest::new()),
        algorithm::SHA3_512 => Box::new(Sha3_512Digest::new()),
        _ => return Err(Error::UnsupportedAlgorithm(format!("digest algorithm: {uri}"))),
    };
    Ok(hasher)
}

/// Hash `data` in one shot.
pub fn digest(uri: &str, data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut hasher = from_uri(uri)?;
    hasher.update(data);
    Ok(hasher.finalize())
}

macro_rules! impl_digest {
    ($name:ident, $hasher:ty, $uri:expr) => {
        struct $name {
            inner: $hasher,
        }

        impl $name {
            fn new() -> Self {
                Self {
                    inner: <$hasher>::new(),
                }
            }
        }

        impl DigestAlgorithm for $name {
            fn update(&mut self, data: &[u8]) {
                Digest::update(&mut self.inner, data);
            }

            fn finalize(self: Box<Self>) -> Vec<u8> {
                Digest::finalize(self.inner).to_vec()
            }

            fn uri(&self) -> &'static str {
                $uri
            }
        }
    };
}

impl_digest!(Sha1Digest, sha1::Sha1, algorithm::SHA1);
impl_digest!(Sha224Digest, sha2::Sha224, algorithm::SHA224);
impl_digest!(Sha256Digest, sha2::Sha256, algorithm::SHA256);
impl_digest!(Sha384Digest, sha2::Sha384, algorithm::SHA384);
impl_digest!(Sha512Digest, sha2::Sha512, algorithm::SHA512);
impl_digest!(Sha3_224Digest, sha3::Sha3_224, algorithm::SHA3_224);
impl_digest!(Sha3_256Digest, sha3::Sha3_256, algorithm::SHA3_256);
impl_digest!(Sha3_384Digest, sha3::Sha3_384, algorithm::SHA3_384);
impl_digest!(Sha3_512Digest, sha3::Sha3_512, algorithm::SHA3_512);
