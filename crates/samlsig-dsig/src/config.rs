#![forbid(unsafe_code)]

//! Verification configuration.

use samlsig_xml::IdTarget;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for a [`Verifier`](crate::Verifier).
#[derive(Debug, Clone)]
pub struct VerifyConfig {
    /// Attributes registered as IDs before references are resolved, in order.
    pub id_targets: Vec<IdTarget>,
    /// Upper bound on a single verification. `None` runs on the calling
    /// thread with no limit.
    pub timeout: Option<Duration>,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            id_targets: vec![IdTarget::saml_response()],
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

impl VerifyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_id_target(mut self, target: IdTarget) -> Self {
        self.id_targets.push(target);
        self
    }

    /// Drop every configured ID target, including the default one.
    pub fn without_default_ids(mut self) -> Self {
        self.id_targets.clear();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}
