//! Shared vocabulary types for wipe certification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared authenticity/destructiveness class of a certification run.
///
/// The mode is a *claim* about the run. Whether a destructive operation
/// actually happened is recorded separately in the certificate's
/// `did_execute` field, and the two are cross-checked by the mode guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Destructive operation executed; evidence reflects real post-wipe state.
    Live,
    /// No destructive operation, but evidence was read from the (unmodified)
    /// device. Not visually distinguishable from `Live`; detectable only
    /// through the `did_execute` field.
    Simulate,
    /// No destructive operation and no device read; evidence is a sentinel.
    Dry,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Live => write!(f, "live"),
            ExecutionMode::Simulate => write!(f, "simulate"),
            ExecutionMode::Dry => write!(f, "dry"),
        }
    }
}

/// Authenticity class of the evidence hash carried by a certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceAuthenticity {
    /// Digest of bytes actually read from the device.
    Real,
    /// Reserved marker; no device read backs this certificate.
    Sentinel,
}

impl fmt::Display for EvidenceAuthenticity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvidenceAuthenticity::Real => write!(f, "real"),
            EvidenceAuthenticity::Sentinel => write!(f, "sentinel"),
        }
    }
}

/// Ed25519 signature (64 bytes). Hex-encoded in document form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureBytes(#[serde(with = "hex::serde")] pub [u8; 64]);

impl From<[u8; 64]> for SignatureBytes {
    fn from(bytes: [u8; 64]) -> Self {
        SignatureBytes(bytes)
    }
}

impl AsRef<[u8; 64]> for SignatureBytes {
    fn as_ref(&self) -> &[u8; 64] {
        &self.0
    }
}

/// Identifying details of the wiped device, as reported by the enumeration
/// collaborator. All fields optional: not every transport exposes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_mode_display() {
        assert_eq!(ExecutionMode::Live.to_string(), "live");
        assert_eq!(ExecutionMode::Simulate.to_string(), "simulate");
        assert_eq!(ExecutionMode::Dry.to_string(), "dry");
    }

    #[test]
    fn test_execution_mode_serde_tokens() {
        let json = serde_json::to_string(&ExecutionMode::Dry).unwrap();
        assert_eq!(json, "\"dry\"");
        let mode: ExecutionMode = serde_json::from_str("\"simulate\"").unwrap();
        assert_eq!(mode, ExecutionMode::Simulate);
    }

    #[test]
    fn test_signature_bytes_hex_roundtrip() {
        let sig = SignatureBytes([0xab; 64]);
        let json = serde_json::to_string(&sig).unwrap();
        assert_eq!(json.len(), 130); // 128 hex chars + quotes
        let decoded: SignatureBytes = serde_json::from_str(&json).unwrap();
        assert_eq!(sig, decoded);
    }

    #[test]
    fn test_signature_bytes_rejects_short_hex() {
        let err = serde_json::from_str::<SignatureBytes>("\"abcd\"");
        assert!(err.is_err());
    }
}
