#![forbid(unsafe_code)]

//! Process-wide setup, done once on first use.

use crate::provider::Provider;
use crate::verify::Verifier;
use crate::xmldsig::XmlDsigProvider;
use samlsig_core::Error;
use std::sync::{Arc, OnceLock};

static RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// The shared provider and a verifier with the default configuration.
#[derive(Debug)]
pub struct Runtime {
    verifier: Verifier,
}

impl Runtime {
    pub fn provider(&self) -> &Arc<dyn Provider> {
        self.verifier.provider()
    }

    pub fn verifier(&self) -> &Verifier {
        &self.verifier
    }
}

/// Initialize the runtime if needed. Safe to call from any thread, any
/// number of times.
pub fn ensure_ready() -> &'static Runtime {
    RUNTIME.get_or_init(|| {
        let provider: Arc<dyn Provider> = Arc::new(XmlDsigProvider::new());
        tracing::debug!(provider = provider.name(), "runtime initialized");
        Runtime {
            verifier: Verifier::new(provider),
        }
    })
}

/// Verify `xml` against `certificate_pem` with the shared runtime.
pub fn verify(xml: &str, certificate_pem: &str) -> Result<bool, Error> {
    ensure_ready().verifier().verify(xml, certificate_pem)
}
