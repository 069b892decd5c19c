//! Wipe certificate data model and builder.
//!
//! A [`Certificate`] is the unsigned record of one sanitization run. It is
//! assembled by [`CertificateBuilder`] from already-decided facts (this
//! module never touches a device), signed once, and persisted as a
//! [`SignedCertificate`] container. Corrections are a new certificate with
//! a new id and timestamp, never a patch to an old one.
//!
//! ## Canonical encoding
//! The signature covers the canonical CBOR bytes of the certificate, so
//! the struct itself is the schema: field values in, deterministic bytes
//! out, independent of the order builder setters were called in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::evidence::{is_real_digest, EvidenceDigest};
use crate::mode::{ModeGuard, ModeViolation};
use crate::serialization::{decode_canonical, encode_canonical, SerializationError};
use crate::types::{DeviceDetails, EvidenceAuthenticity, ExecutionMode, SignatureBytes};

/// Certificate schema version (for document evolution).
pub const CERTIFICATE_VERSION: u8 = 1;

/// An unsigned wipe certificate.
///
/// `signature` is deliberately not a field: signing produces a separate
/// [`SignedCertificate`], so an unsigned value can never pose as signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    /// Schema version.
    pub version: u8,

    /// Public verification reference (UUID v4), minted at build time.
    pub certificate_id: String,

    /// Device path, serial, or model+serial composite. Never empty.
    pub device_id: String,

    /// Enumeration details, when the caller has them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceDetails>,

    /// Sanitization technique actually selected ("ATA Secure Erase",
    /// "overwrite-3-pass", ...). Chosen by the caller per device class;
    /// not validated against device capability here.
    pub wipe_method: String,

    /// Declared class of the run.
    pub execution_mode: ExecutionMode,

    /// Whether a destructive operation actually ran. Explicit and signed,
    /// so a simulated certificate is machine-detectable.
    pub did_execute: bool,

    /// Authenticity class of `evidence_hash`.
    pub evidence_authenticity: EvidenceAuthenticity,

    /// Pre-wipe sample digest, when one was captured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_hash: Option<String>,

    /// Post-operation sample digest, or the dry-run sentinel.
    pub evidence_hash: String,

    /// Host that ran the certification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    /// Operator account that ran the certification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,

    /// Creation time, UTC.
    pub timestamp: DateTime<Utc>,

    /// Version of the generating software.
    pub tool_version: String,
}

impl Certificate {
    /// Canonical CBOR bytes, exactly what the signature covers.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, SerializationError> {
        encode_canonical(self)
    }

    /// SHA-256 of the canonical bytes; the Ed25519 message (hash-then-sign).
    pub fn signing_digest(&self) -> Result<[u8; 32], SerializationError> {
        Ok(crate::crypto::sha256(&self.canonical_bytes()?))
    }

    /// Blake3 fingerprint of the canonical bytes, hex encoded. This is the
    /// short reference handed to rendering collaborators (QR payloads,
    /// audit indexes); it is not part of the signed content.
    pub fn fingerprint(&self) -> Result<String, SerializationError> {
        Ok(hex::encode(crate::crypto::blake3(&self.canonical_bytes()?)))
    }

    /// Deserialize from canonical CBOR bytes.
    pub fn from_canonical_bytes(bytes: &[u8]) -> Result<Self, SerializationError> {
        decode_canonical(bytes)
    }

    /// Field-level and mode-consistency validation. The builder runs this
    /// before returning; callers signing a document they did not build
    /// (e.g. the CLI) run it again to fail fast.
    pub fn validate(&self) -> Result<(), BuildError> {
        if self.version != CERTIFICATE_VERSION {
            return Err(BuildError::InvalidField(
                "version",
                "unsupported schema version",
            ));
        }
        if self.certificate_id.is_empty() {
            return Err(BuildError::InvalidField("certificate_id", "empty"));
        }
        if self.device_id.is_empty() {
            return Err(BuildError::InvalidField("device_id", "empty"));
        }
        if self.wipe_method.is_empty() {
            return Err(BuildError::InvalidField("wipe_method", "empty"));
        }
        if self.tool_version.is_empty() {
            return Err(BuildError::InvalidField("tool_version", "empty"));
        }
        if self.evidence_authenticity == EvidenceAuthenticity::Real
            && !is_real_digest(&self.evidence_hash)
        {
            return Err(BuildError::InvalidField(
                "evidence_hash",
                "not a hex SHA-256 digest",
            ));
        }
        if let Some(pre) = &self.pre_hash {
            if !is_real_digest(pre) {
                return Err(BuildError::InvalidField(
                    "pre_hash",
                    "not a hex SHA-256 digest",
                ));
            }
        }
        ModeGuard::check(
            self.execution_mode,
            self.did_execute,
            self.evidence_authenticity,
            &self.evidence_hash,
            self.pre_hash.as_deref(),
        )?;
        Ok(())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

/// Detached signature over a certificate's canonical bytes, together with
/// the identifiers a verifier needs to pick the right key and algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetachedSignature {
    /// Signing scheme identifier (see [`crate::crypto::SIGNATURE_ALGORITHM`]).
    pub algorithm: String,
    /// Identifier of the signing key.
    pub key_id: String,
    /// Signature bytes, hex in document form.
    pub signature: SignatureBytes,
}

/// The persisted artifact: certificate plus detached signature in one
/// container. The signature covers only the certificate's canonical bytes,
/// so the two halves can also be stored separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedCertificate {
    pub certificate: Certificate,
    pub signature: DetachedSignature,
}

impl SignedCertificate {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    pub fn save(&self, path: &std::path::Path) -> std::io::Result<()> {
        let json = self
            .to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }

    pub fn load(path: &std::path::Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_json(&bytes)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid field '{0}': {1}")]
    InvalidField(&'static str, &'static str),

    #[error("inconsistent evidence: {0}")]
    InconsistentEvidence(#[from] ModeViolation),

    #[error("canonical encoding failed: {0}")]
    Serialization(#[from] SerializationError),
}

/// Builder for unsigned certificates. Pure data assembly: no device or
/// network access, so builds are deterministic given the same inputs
/// (supply `certificate_id` and `timestamp` explicitly for byte-identical
/// output across builders).
#[derive(Debug, Default)]
pub struct CertificateBuilder {
    certificate_id: Option<String>,
    device_id: Option<String>,
    device: Option<DeviceDetails>,
    wipe_method: Option<String>,
    execution_mode: Option<ExecutionMode>,
    did_execute: Option<bool>,
    evidence: Option<EvidenceDigest>,
    pre_hash: Option<String>,
    hostname: Option<String>,
    operator: Option<String>,
    timestamp: Option<DateTime<Utc>>,
    tool_version: Option<String>,
}

impl CertificateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the minted certificate id (re-issue tooling, tests).
    pub fn certificate_id(mut self, id: impl Into<String>) -> Self {
        self.certificate_id = Some(id.into());
        self
    }

    pub fn device_id(mut self, id: impl Into<String>) -> Self {
        self.device_id = Some(id.into());
        self
    }

    pub fn device(mut self, details: DeviceDetails) -> Self {
        self.device = Some(details);
        self
    }

    pub fn wipe_method(mut self, method: impl Into<String>) -> Self {
        self.wipe_method = Some(method.into());
        self
    }

    pub fn execution_mode(mut self, mode: ExecutionMode) -> Self {
        self.execution_mode = Some(mode);
        self
    }

    /// Record whether a destructive operation actually ran, independent of
    /// the declared mode. Taken from the wipe executor's outcome.
    pub fn did_execute(mut self, did_execute: bool) -> Self {
        self.did_execute = Some(did_execute);
        self
    }

    /// Post-operation evidence: a real digest or the dry-run sentinel. The
    /// authenticity marker in the certificate is derived from this value.
    pub fn evidence(mut self, evidence: EvidenceDigest) -> Self {
        self.evidence = Some(evidence);
        self
    }

    pub fn pre_hash(mut self, digest: impl Into<String>) -> Self {
        self.pre_hash = Some(digest.into());
        self
    }

    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    pub fn operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }

    pub fn timestamp(mut self, ts: DateTime<Utc>) -> Self {
        self.timestamp = Some(ts);
        self
    }

    pub fn tool_version(mut self, version: impl Into<String>) -> Self {
        self.tool_version = Some(version.into());
        self
    }

    /// Assemble and validate the certificate. Fails fast: on any error no
    /// partial certificate escapes.
    pub fn build(self) -> Result<Certificate, BuildError> {
        let evidence = self.evidence.ok_or(BuildError::MissingField("evidence"))?;
        let certificate = Certificate {
            version: CERTIFICATE_VERSION,
            certificate_id: self
                .certificate_id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            device_id: self.device_id.ok_or(BuildError::MissingField("device_id"))?,
            device: self.device,
            wipe_method: self
                .wipe_method
                .ok_or(BuildError::MissingField("wipe_method"))?,
            execution_mode: self
                .execution_mode
                .ok_or(BuildError::MissingField("execution_mode"))?,
            did_execute: self
                .did_execute
                .ok_or(BuildError::MissingField("did_execute"))?,
            evidence_authenticity: evidence.authenticity(),
            pre_hash: self.pre_hash,
            evidence_hash: evidence.as_str().to_string(),
            hostname: self.hostname,
            operator: self.operator,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            tool_version: self
                .tool_version
                .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
        };
        certificate.validate()?;
        debug!(
            certificate_id = %certificate.certificate_id,
            device_id = %certificate.device_id,
            mode = %certificate.execution_mode,
            "built certificate"
        );
        Ok(certificate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::EVIDENCE_SENTINEL;

    fn live_builder() -> CertificateBuilder {
        CertificateBuilder::new()
            .device_id("/dev/sdb")
            .wipe_method("ATA Secure Erase")
            .execution_mode(ExecutionMode::Live)
            .did_execute(true)
            .evidence(EvidenceDigest::Real("bb".repeat(32)))
            .pre_hash("aa".repeat(32))
    }

    #[test]
    fn test_build_fills_defaults() {
        let cert = live_builder().build().unwrap();
        assert_eq!(cert.version, CERTIFICATE_VERSION);
        assert_eq!(cert.tool_version, env!("CARGO_PKG_VERSION"));
        assert_eq!(cert.evidence_authenticity, EvidenceAuthenticity::Real);
        assert!(!cert.certificate_id.is_empty());
    }

    #[test]
    fn test_missing_required_fields() {
        let err = CertificateBuilder::new().build().unwrap_err();
        assert!(matches!(err, BuildError::MissingField("evidence")));

        let err = CertificateBuilder::new()
            .evidence(EvidenceDigest::Sentinel)
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::MissingField("device_id")));
    }

    #[test]
    fn test_empty_device_id_rejected() {
        let err = live_builder().device_id("").build().unwrap_err();
        assert!(matches!(err, BuildError::InvalidField("device_id", _)));
    }

    #[test]
    fn test_malformed_evidence_digest_rejected() {
        let err = live_builder()
            .evidence(EvidenceDigest::Real("not-a-digest".into()))
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::InvalidField("evidence_hash", _)));
    }

    #[test]
    fn test_dry_with_real_digest_is_inconsistent_evidence() {
        let err = CertificateBuilder::new()
            .device_id("/dev/sdb")
            .wipe_method("ATA Secure Erase")
            .execution_mode(ExecutionMode::Dry)
            .did_execute(false)
            .evidence(EvidenceDigest::Real("bb".repeat(32)))
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::InconsistentEvidence(_)));
    }

    #[test]
    fn test_dry_with_sentinel_builds() {
        let cert = CertificateBuilder::new()
            .device_id("/dev/sdb")
            .wipe_method("ATA Secure Erase")
            .execution_mode(ExecutionMode::Dry)
            .did_execute(false)
            .evidence(EvidenceDigest::Sentinel)
            .build()
            .unwrap();
        assert_eq!(cert.evidence_hash, EVIDENCE_SENTINEL);
        assert_eq!(cert.evidence_authenticity, EvidenceAuthenticity::Sentinel);
    }

    #[test]
    fn test_canonical_bytes_ignore_setter_order() {
        let ts = "2024-01-01T00:00:00Z".parse().unwrap();
        let a = CertificateBuilder::new()
            .certificate_id("cert-1")
            .device_id("/dev/sdb")
            .wipe_method("ATA Secure Erase")
            .execution_mode(ExecutionMode::Live)
            .did_execute(true)
            .pre_hash("aa".repeat(32))
            .evidence(EvidenceDigest::Real("bb".repeat(32)))
            .timestamp(ts)
            .build()
            .unwrap();
        let b = CertificateBuilder::new()
            .timestamp(ts)
            .evidence(EvidenceDigest::Real("bb".repeat(32)))
            .pre_hash("aa".repeat(32))
            .did_execute(true)
            .execution_mode(ExecutionMode::Live)
            .wipe_method("ATA Secure Erase")
            .device_id("/dev/sdb")
            .certificate_id("cert-1")
            .build()
            .unwrap();
        assert_eq!(a.canonical_bytes().unwrap(), b.canonical_bytes().unwrap());
    }

    #[test]
    fn test_canonical_roundtrip() {
        let cert = live_builder().build().unwrap();
        let bytes = cert.canonical_bytes().unwrap();
        let decoded = Certificate::from_canonical_bytes(&bytes).unwrap();
        assert_eq!(cert, decoded);
    }

    #[test]
    fn test_json_roundtrip() {
        let cert = live_builder()
            .device(DeviceDetails {
                model: Some("WDC WD40EZRZ".into()),
                serial: Some("WD-WCC7K1234567".into()),
                size_bytes: Some(4_000_787_030_016),
            })
            .hostname("wipe-station-03")
            .operator("jdoe")
            .build()
            .unwrap();
        let json = cert.to_json().unwrap();
        let decoded = Certificate::from_json(json.as_bytes()).unwrap();
        assert_eq!(cert, decoded);
    }

    #[test]
    fn test_fingerprint_is_stable_and_not_the_signing_digest() {
        let cert = live_builder().build().unwrap();
        assert_eq!(cert.fingerprint().unwrap(), cert.fingerprint().unwrap());
        assert_ne!(
            cert.fingerprint().unwrap(),
            hex::encode(cert.signing_digest().unwrap())
        );
    }
}
