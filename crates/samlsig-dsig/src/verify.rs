#![forbid(unsafe_code)]

//! The verification state machine.
//!
//! Stages, each failing with its own error kind:
//! 1. Init: create the verification context
//! 2. Parsed: parse the XML (`XmlParse`)
//! 3. IdsRegistered: register every configured ID target (`DuplicateId`)
//! 4. SignatureLocated: find the first XML-DSig `Signature` (`NodeNotFound`)
//! 5. KeyLoaded: load the certificate key into the context (`KeyLoad`)
//! 6. Verified: run the provider's core validation (`VerificationProcess`)
//! 7. Done: map the recorded status to `true` / `false`
//!
//! With a timeout configured, every call runs under one [`Deadline`]: waiting
//! for a non-reentrant provider, the stages themselves, and the provider's
//! own work all stop with `Timeout` once it passes.

use crate::config::VerifyConfig;
use crate::context::{Status, VerificationContext};
use crate::provider::Provider;
use samlsig_core::ns::{self, node};
use samlsig_core::{Deadline, Error};
use samlsig_keys::KeyFormat;
use samlsig_xml::{find_signature_node, register_ids};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

/// Verifies enveloped signatures through a [`Provider`].
///
/// Cloning is cheap and clones share the provider and its gate.
#[derive(Clone)]
pub struct Verifier {
    provider: Arc<dyn Provider>,
    gate: Arc<Gate>,
    config: VerifyConfig,
}

impl std::fmt::Debug for Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Verifier")
            .field("provider", &self.provider.name())
            .field("config", &self.config)
            .finish()
    }
}

impl Verifier {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self::with_config(provider, VerifyConfig::default())
    }

    pub fn with_config(provider: Arc<dyn Provider>, config: VerifyConfig) -> Self {
        Self {
            provider,
            gate: Arc::new(Gate::default()),
            config,
        }
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    pub fn config(&self) -> &VerifyConfig {
        &self.config
    }

    /// Verify the enveloped signature in `xml` against the public key of
    /// the PEM certificate `certificate_pem`.
    ///
    /// `Ok(false)` means verification ran and the signature did not
    /// validate. Every other failure is an `Err`.
    pub fn verify(&self, xml: &str, certificate_pem: &str) -> Result<bool, Error> {
        let deadline = self.config.timeout.map_or_else(Deadline::none, Deadline::after);
        let result = self.admit(&deadline).and_then(|permit| match self.config.timeout {
            Some(limit) => self.run_with_timeout(xml, certificate_pem, limit, deadline, permit),
            None => self.run(xml, certificate_pem, &deadline, permit),
        });
        if let Err(e) = &result {
            tracing::warn!(error = %e, "verification aborted");
        }
        result
    }

    /// Wait for a non-reentrant provider to be free, no longer than
    /// `deadline`.
    fn admit(&self, deadline: &Deadline) -> Result<Option<Permit>, Error> {
        if self.provider.is_reentrant() {
            return Ok(None);
        }
        let permit = self.gate.acquire(deadline)?;
        tracing::trace!(provider = self.provider.name(), "provider gate acquired");
        Ok(Some(permit))
    }

    /// Run on a worker thread and give up once `deadline` passes. The
    /// worker sees the same deadline, stops at its next check, and releases
    /// its context and permit.
    fn run_with_timeout(
        &self,
        xml: &str,
        certificate_pem: &str,
        limit: Duration,
        deadline: Deadline,
        permit: Option<Permit>,
    ) -> Result<bool, Error> {
        let (tx, rx) = mpsc::channel();
        let worker = self.clone();
        let xml = xml.to_owned();
        let pem = certificate_pem.to_owned();

        let handle = thread::Builder::new()
            .name("samlsig-verify".into())
            .spawn(move || {
                // The receiver is gone once the caller timed out.
                let _ = tx.send(worker.run(&xml, &pem, &deadline, permit));
            })
            .map_err(|e| {
                Error::VerificationProcess(format!("failed to spawn verification thread: {e}"))
            })?;

        match rx.recv_timeout(deadline.remaining().unwrap_or(limit)) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(deadline.timeout_error()),
            Err(RecvTimeoutError::Disconnected) => match handle.join() {
                Err(panic) => std::panic::resume_unwind(panic),
                Ok(()) => Err(Error::VerificationProcess(
                    "verification thread exited without a result".into(),
                )),
            },
        }
    }

    /// `_permit` is dropped after the context, so a non-reentrant provider
    /// also sees `release` under the gate.
    fn run(
        &self,
        xml: &str,
        certificate_pem: &str,
        deadline: &Deadline,
        _permit: Option<Permit>,
    ) -> Result<bool, Error> {
        let provider = self.provider.as_ref();

        let mut ctx = VerificationContext::new(Arc::clone(&self.provider));
        tracing::debug!(provider = provider.name(), "verification context created");

        let mut doc = provider.parse_xml(xml).map_err(Error::into_xml_parse)?;
        let root = doc
            .root_element()
            .ok_or_else(|| Error::XmlParse("document has no root element".into()))?;
        tracing::debug!(nodes = doc.len(), "document parsed");
        deadline.check()?;

        for target in &self.config.id_targets {
            register_ids(&mut doc, root, target)?;
        }
        tracing::debug!(ids = doc.ids().len(), "ID attributes registered");

        let signature = find_signature_node(&doc, root)
            .ok_or_else(|| Error::NodeNotFound(format!("{{{}}}{}", ns::DSIG, node::SIGNATURE)))?;
        tracing::debug!(node = signature.index(), "signature located");
        deadline.check()?;

        let key = provider
            .load_certificate_key(certificate_pem.as_bytes(), KeyFormat::CertPem)
            .map_err(Error::into_key_load)?;
        let key = ctx.install_key(key);
        tracing::debug!(subject = ?key.name, key = ?key.data, "certificate key loaded");
        deadline.check()?;

        let status = provider
            .verify_signature(&doc, signature, key, deadline)
            .map_err(Error::into_verification_process)?;
        ctx.set_status(status);
        tracing::debug!(status = ?status, "signature checked");

        match ctx.status() {
            Status::Succeeded => {
                tracing::info!("signature is valid");
                Ok(true)
            }
            Status::Failed => {
                tracing::warn!("signature is invalid");
                Ok(false)
            }
            Status::NotRun => Err(Error::VerificationProcess(
                "provider did not record a verification status".into(),
            )),
        }
    }
}

/// Admits one verification at a time into a non-reentrant provider.
#[derive(Debug, Default)]
struct Gate {
    busy: Mutex<bool>,
    freed: Condvar,
}

impl Gate {
    fn acquire(self: &Arc<Self>, deadline: &Deadline) -> Result<Permit, Error> {
        let busy = self.busy.lock().unwrap_or_else(PoisonError::into_inner);
        let mut busy = match deadline.remaining() {
            None => self
                .freed
                .wait_while(busy, |busy| *busy)
                .unwrap_or_else(PoisonError::into_inner),
            Some(left) => {
                self.freed
                    .wait_timeout_while(busy, left, |busy| *busy)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0
            }
        };
        if *busy {
            return Err(deadline.timeout_error());
        }
        *busy = true;
        Ok(Permit(Arc::clone(self)))
    }
}

/// Held for the whole of one verification; frees the gate on drop.
#[derive(Debug)]
struct Permit(Arc<Gate>);

impl Drop for Permit {
    fn drop(&mut self) {
        *self.0.busy.lock().unwrap_or_else(PoisonError::into_inner) = false;
        self.0.freed.notify_one();
    }
}
