//! Certificate verification.
//!
//! Verification is stateless and total: malformed input is classified, not
//! thrown. The canonical bytes are always re-derived from the structured
//! field values; an attacker-supplied pre-serialized blob is never trusted.

use ed25519_dalek::VerifyingKey;
use std::fmt;
use tracing::debug;

use crate::certificate::{SignedCertificate, CERTIFICATE_VERSION};
use crate::crypto::{Signer, SIGNATURE_ALGORITHM};
use crate::evidence::{is_real_digest, EVIDENCE_SENTINEL};
use crate::mode::ModeGuard;

/// Outcome of verifying one certificate artifact.
///
/// There is no "verified with warnings": anything but [`Valid`] is a hard
/// rejection, and the reason is carried for audit, not for negotiation.
///
/// [`Valid`]: VerifyOutcome::Valid
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Signature verifies and the claim is internally consistent.
    Valid,
    /// Signature does not cover these field values (tamper or wrong key).
    SignatureMismatch,
    /// The artifact violates the schema before crypto is even consulted.
    MalformedCertificate(String),
    /// Authorship is proven but the signed claim contradicts itself.
    InconsistentClaim(String),
}

impl VerifyOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerifyOutcome::Valid)
    }
}

impl fmt::Display for VerifyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerifyOutcome::Valid => write!(f, "valid"),
            VerifyOutcome::SignatureMismatch => write!(f, "signature-mismatch"),
            VerifyOutcome::MalformedCertificate(reason) => {
                write!(f, "malformed-certificate: {reason}")
            }
            VerifyOutcome::InconsistentClaim(reason) => {
                write!(f, "inconsistent-claim: {reason}")
            }
        }
    }
}

/// Verifies signed certificates against a public key.
pub struct Verifier;

impl Verifier {
    /// Verify a parsed artifact.
    pub fn verify(signed: &SignedCertificate, public_key: &VerifyingKey) -> VerifyOutcome {
        if let Err(reason) = Self::check_schema(signed) {
            return VerifyOutcome::MalformedCertificate(reason);
        }

        if !Signer::signature_matches(
            &signed.certificate,
            &signed.signature.signature,
            public_key,
        ) {
            return VerifyOutcome::SignatureMismatch;
        }

        // The signature covers these fields, but proves authorship only;
        // the mode/evidence invariant is re-checked on our own authority.
        let cert = &signed.certificate;
        if let Err(violation) = ModeGuard::check(
            cert.execution_mode,
            cert.did_execute,
            cert.evidence_authenticity,
            &cert.evidence_hash,
            cert.pre_hash.as_deref(),
        ) {
            return VerifyOutcome::InconsistentClaim(violation.to_string());
        }

        debug!(certificate_id = %cert.certificate_id, "certificate verified");
        VerifyOutcome::Valid
    }

    /// Parse a raw JSON artifact and verify it. Parse failures are a
    /// rejection classification, never a panic or error.
    pub fn verify_artifact(artifact: &[u8], public_key: &VerifyingKey) -> VerifyOutcome {
        match SignedCertificate::from_json(artifact) {
            Ok(signed) => Self::verify(&signed, public_key),
            Err(e) => VerifyOutcome::MalformedCertificate(format!("artifact parse: {e}")),
        }
    }

    fn check_schema(signed: &SignedCertificate) -> Result<(), String> {
        let cert = &signed.certificate;
        if cert.version != CERTIFICATE_VERSION {
            return Err(format!("unsupported schema version {}", cert.version));
        }
        if cert.certificate_id.is_empty() {
            return Err("empty certificate_id".into());
        }
        if cert.device_id.is_empty() {
            return Err("empty device_id".into());
        }
        if cert.wipe_method.is_empty() {
            return Err("empty wipe_method".into());
        }
        if cert.tool_version.is_empty() {
            return Err("empty tool_version".into());
        }
        if cert.evidence_hash != EVIDENCE_SENTINEL && !is_real_digest(&cert.evidence_hash) {
            return Err("evidence_hash is neither a digest nor the sentinel".into());
        }
        if let Some(pre) = &cert.pre_hash {
            if !is_real_digest(pre) {
                return Err("pre_hash is not a hex SHA-256 digest".into());
            }
        }
        if signed.signature.algorithm != SIGNATURE_ALGORITHM {
            return Err(format!(
                "unknown signature algorithm '{}'",
                signed.signature.algorithm
            ));
        }
        if signed.signature.key_id.is_empty() {
            return Err("empty signature key_id".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificate::CertificateBuilder;
    use crate::crypto::SigningKeyHandle;
    use crate::evidence::EvidenceDigest;
    use crate::types::ExecutionMode;

    fn signed_fixture() -> (SignedCertificate, SigningKeyHandle) {
        let key = SigningKeyHandle::from_seed(&[0x42; 32], "unit-key");
        let cert = CertificateBuilder::new()
            .device_id("/dev/sdb")
            .wipe_method("ATA Secure Erase")
            .execution_mode(ExecutionMode::Live)
            .did_execute(true)
            .evidence(EvidenceDigest::Real("bb".repeat(32)))
            .build()
            .unwrap();
        let signed = Signer::sign(cert, &key).unwrap();
        (signed, key)
    }

    #[test]
    fn test_valid_artifact() {
        let (signed, key) = signed_fixture();
        let outcome = Verifier::verify(&signed, &key.verifying_key());
        assert!(outcome.is_valid());
    }

    #[test]
    fn test_garbage_artifact_is_malformed() {
        let (_, key) = signed_fixture();
        let outcome = Verifier::verify_artifact(b"not json at all", &key.verifying_key());
        assert!(matches!(outcome, VerifyOutcome::MalformedCertificate(_)));
    }

    #[test]
    fn test_unknown_algorithm_is_malformed() {
        let (mut signed, key) = signed_fixture();
        signed.signature.algorithm = "rsa-pkcs1".into();
        let outcome = Verifier::verify(&signed, &key.verifying_key());
        assert!(matches!(outcome, VerifyOutcome::MalformedCertificate(_)));
    }

    #[test]
    fn test_unsupported_version_is_malformed() {
        let (mut signed, key) = signed_fixture();
        signed.certificate.version = 99;
        let outcome = Verifier::verify(&signed, &key.verifying_key());
        assert!(matches!(outcome, VerifyOutcome::MalformedCertificate(_)));
    }

    #[test]
    fn test_bad_evidence_hash_is_malformed_before_crypto() {
        let (mut signed, key) = signed_fixture();
        signed.certificate.evidence_hash = "0xZZ".into();
        let outcome = Verifier::verify(&signed, &key.verifying_key());
        assert!(matches!(outcome, VerifyOutcome::MalformedCertificate(_)));
    }

    #[test]
    fn test_display_labels_are_stable() {
        assert_eq!(VerifyOutcome::Valid.to_string(), "valid");
        assert_eq!(
            VerifyOutcome::SignatureMismatch.to_string(),
            "signature-mismatch"
        );
        assert!(VerifyOutcome::MalformedCertificate("x".into())
            .to_string()
            .starts_with("malformed-certificate"));
        assert!(VerifyOutcome::InconsistentClaim("x".into())
            .to_string()
            .starts_with("inconsistent-claim"));
    }
}
