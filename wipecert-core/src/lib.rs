//! # Wipecert Core
//!
//! Signed attestation that a storage device underwent a specific
//! data-sanitization procedure. The certificate can be mechanically
//! verified by a third party who does not trust the machine that produced
//! it, and distinguishes real runs from simulated and dry ones.
//!
//! ## Key Features
//! - **Canonical CBOR signing bytes**: identical field values, identical
//!   bytes, so signatures are reproducible and mechanically checkable
//! - **Hash-then-sign Ed25519**: detached signature with key/algorithm
//!   identifiers, verified by re-deriving the canonical encoding
//! - **Mode guard**: `live`/`simulate`/`dry` claims cross-checked against
//!   `did_execute` and evidence authenticity, at build and again at verify
//! - **Pluggable wipe backends**: per-device-class executor interface;
//!   the core only consumes outcomes
//!
//! ## Flow
//! EvidenceCollector → CertificateBuilder → Signer →
//! (certificate + detached signature) → Verifier.

pub mod certificate;
pub mod crypto;
pub mod evidence;
pub mod executor;
pub mod mode;
pub mod serialization;
pub mod types;
pub mod verify;

pub use certificate::{
    BuildError, Certificate, CertificateBuilder, DetachedSignature, SignedCertificate,
    CERTIFICATE_VERSION,
};
pub use crypto::{KeyError, SignError, Signer, SigningKeyHandle, SIGNATURE_ALGORITHM};
pub use evidence::{
    EvidenceCollector, EvidenceDigest, EvidenceError, SamplePolicy, EVIDENCE_SENTINEL,
};
pub use executor::{DeviceClass, ExecutorRegistry, WipeError, WipeExecutor, WipeOutcome};
pub use mode::{ModeGuard, ModeViolation};
pub use types::*;
pub use verify::{Verifier, VerifyOutcome};

/// Re-export for convenience
pub use ed25519_dalek::{SigningKey, VerifyingKey};
