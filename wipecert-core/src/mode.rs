//! Execution-mode consistency enforcement.
//!
//! The execution mode, the `did_execute` record, and the evidence
//! authenticity class are set independently, and a certificate is only
//! coherent when they agree. The guard runs twice per certificate lifetime:
//! at build, where a violation aborts the run before signing, and at
//! verification, where it is re-checked even under a valid signature (a
//! signature proves authorship, not internal consistency of the claim).

use thiserror::Error;

use crate::evidence::EVIDENCE_SENTINEL;
use crate::types::{EvidenceAuthenticity, ExecutionMode};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModeViolation {
    #[error("mode 'live' declared but no destructive operation ran")]
    LiveWithoutExecution,

    #[error("mode '{0}' declared but a destructive operation ran")]
    UndeclaredExecution(ExecutionMode),

    #[error("mode '{0}' requires a real evidence digest, found the sentinel")]
    SentinelEvidenceInAuthenticMode(ExecutionMode),

    #[error("mode 'dry' requires the evidence sentinel, found a real digest")]
    RealEvidenceInDryRun,

    #[error("mode 'dry' performs no reads, but a pre-wipe digest is present")]
    PreWipeSampleInDryRun,

    #[error("evidence hash and authenticity marker disagree")]
    AuthenticityMarkerMismatch,
}

/// Cross-checks the mode-related fields of a certificate.
pub struct ModeGuard;

impl ModeGuard {
    pub fn check(
        mode: ExecutionMode,
        did_execute: bool,
        authenticity: EvidenceAuthenticity,
        evidence_hash: &str,
        pre_hash: Option<&str>,
    ) -> Result<(), ModeViolation> {
        let hash_is_sentinel = evidence_hash == EVIDENCE_SENTINEL;
        if hash_is_sentinel != (authenticity == EvidenceAuthenticity::Sentinel) {
            return Err(ModeViolation::AuthenticityMarkerMismatch);
        }

        match mode {
            ExecutionMode::Live => {
                if !did_execute {
                    return Err(ModeViolation::LiveWithoutExecution);
                }
                if hash_is_sentinel {
                    return Err(ModeViolation::SentinelEvidenceInAuthenticMode(mode));
                }
            }
            ExecutionMode::Simulate => {
                if did_execute {
                    return Err(ModeViolation::UndeclaredExecution(mode));
                }
                if hash_is_sentinel {
                    return Err(ModeViolation::SentinelEvidenceInAuthenticMode(mode));
                }
            }
            ExecutionMode::Dry => {
                if did_execute {
                    return Err(ModeViolation::UndeclaredExecution(mode));
                }
                if !hash_is_sentinel {
                    return Err(ModeViolation::RealEvidenceInDryRun);
                }
                if pre_hash.is_some() {
                    return Err(ModeViolation::PreWipeSampleInDryRun);
                }
            }
        }
        Ok(())
    }
}
