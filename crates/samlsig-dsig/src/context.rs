#![forbid(unsafe_code)]

//! Per-call verification state.

use crate::provider::Provider;
use samlsig_keys::Key;
use std::sync::Arc;

/// Outcome recorded by the provider's signature check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    /// The check has not run yet.
    #[default]
    NotRun,
    Succeeded,
    Failed,
}

/// Holds the loaded key and the verification status for one call.
///
/// Dropping the context hands it back to the provider through
/// [`Provider::release`], on every exit path including unwinding.
pub struct VerificationContext {
    provider: Arc<dyn Provider>,
    key: Option<Key>,
    status: Status,
}

impl VerificationContext {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            key: None,
            status: Status::NotRun,
        }
    }

    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    /// Store the signing key, replacing any earlier one.
    pub fn install_key(&mut self, key: Key) -> &Key {
        self.key.insert(key)
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = status;
    }
}

impl std::fmt::Debug for VerificationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationContext")
            .field("provider", &self.provider.name())
            .field("key", &self.key)
            .field("status", &self.status)
            .finish()
    }
}

impl Drop for VerificationContext {
    fn drop(&mut self) {
        self.provider.release(self);
    }
}
