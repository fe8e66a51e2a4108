#![forbid(unsafe_code)]

//! The seam between the verification state machine and whatever does the
//! XML and cryptographic work.

use crate::context::{Status, VerificationContext};
use samlsig_core::{Deadline, Error};
use samlsig_keys::{Key, KeyFormat};
use samlsig_xml::{Document, NodeId};

pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    /// Whether two verifications may run through this provider at the same
    /// time. When `false` the [`Verifier`](crate::Verifier) serializes calls.
    fn is_reentrant(&self) -> bool {
        true
    }

    fn parse_xml(&self, text: &str) -> Result<Document, Error>;

    fn load_certificate_key(&self, data: &[u8], format: KeyFormat) -> Result<Key, Error>;

    /// Core validation of the `Signature` element at `signature`.
    ///
    /// `Status::Failed` is a signature that was checked and did not match.
    /// `Err` means the check could not be carried out. Work still running
    /// once `deadline` has passed should stop with [`Error::Timeout`]; the
    /// caller has already given up on it.
    fn verify_signature(
        &self,
        doc: &Document,
        signature: NodeId,
        key: &Key,
        deadline: &Deadline,
    ) -> Result<Status, Error>;

    /// Called once when a verification context is dropped.
    fn release(&self, _ctx: &VerificationContext) {}
}
