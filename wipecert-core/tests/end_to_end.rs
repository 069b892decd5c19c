//! Full-lifecycle scenarios: build → sign → verify, tampering, key
//! confusion, and forged-claim rejection.

use chrono::{DateTime, Utc};
use proptest::prelude::*;
use wipecert_core::{
    BuildError, Certificate, CertificateBuilder, EvidenceDigest, ExecutionMode, Signer,
    SignedCertificate, SigningKeyHandle, Verifier, VerifyOutcome, EVIDENCE_SENTINEL,
};

fn ts() -> DateTime<Utc> {
    "2024-01-01T00:00:00Z".parse().unwrap()
}

fn live_certificate() -> Certificate {
    CertificateBuilder::new()
        .device_id("/dev/sdb")
        .wipe_method("ATA Secure Erase")
        .execution_mode(ExecutionMode::Live)
        .did_execute(true)
        .pre_hash("aa".repeat(32))
        .evidence(EvidenceDigest::Real("bb".repeat(32)))
        .timestamp(ts())
        .build()
        .unwrap()
}

fn keypair() -> SigningKeyHandle {
    SigningKeyHandle::from_seed(&[0x42; 32], "station-key-01")
}

#[test]
fn live_certificate_roundtrips_to_valid() {
    let key = keypair();
    let signed = Signer::sign(live_certificate(), &key).unwrap();
    assert!(Verifier::verify(&signed, &key.verifying_key()).is_valid());
}

#[test]
fn dry_run_with_real_digest_never_reaches_signing() {
    let err = CertificateBuilder::new()
        .device_id("/dev/sdb")
        .wipe_method("ATA Secure Erase")
        .execution_mode(ExecutionMode::Dry)
        .did_execute(false)
        .evidence(EvidenceDigest::Real("bb".repeat(32)))
        .timestamp(ts())
        .build()
        .unwrap_err();
    assert!(matches!(err, BuildError::InconsistentEvidence(_)));
}

#[test]
fn dry_run_certificate_carries_sentinel_and_verifies() {
    let key = keypair();
    let cert = CertificateBuilder::new()
        .device_id("/dev/sdb")
        .wipe_method("ATA Secure Erase")
        .execution_mode(ExecutionMode::Dry)
        .did_execute(false)
        .evidence(EvidenceDigest::Sentinel)
        .timestamp(ts())
        .build()
        .unwrap();
    assert_eq!(cert.evidence_hash, EVIDENCE_SENTINEL);

    let signed = Signer::sign(cert, &key).unwrap();
    assert!(Verifier::verify(&signed, &key.verifying_key()).is_valid());
}

#[test]
fn tampered_wipe_method_is_a_signature_mismatch() {
    let key = keypair();
    let mut signed = Signer::sign(live_certificate(), &key).unwrap();
    signed.certificate.wipe_method = "shred (1 pass)".into();
    assert_eq!(
        Verifier::verify(&signed, &key.verifying_key()),
        VerifyOutcome::SignatureMismatch
    );
}

#[test]
fn every_single_field_mutation_breaks_the_signature() {
    let key = keypair();
    let signed = Signer::sign(live_certificate(), &key).unwrap();

    let mutations: Vec<(&str, Box<dyn Fn(&mut Certificate)>)> = vec![
        ("device_id", Box::new(|c| c.device_id = "/dev/sdc".into())),
        (
            "wipe_method",
            Box::new(|c| c.wipe_method = "overwrite-3-pass".into()),
        ),
        (
            "evidence_hash",
            Box::new(|c| c.evidence_hash = "cc".repeat(32)),
        ),
        (
            "pre_hash",
            Box::new(|c| c.pre_hash = Some("dd".repeat(32))),
        ),
        (
            "timestamp",
            Box::new(|c| c.timestamp = "2024-01-01T00:00:01Z".parse().unwrap()),
        ),
        (
            "execution_mode",
            Box::new(|c| c.execution_mode = ExecutionMode::Simulate),
        ),
        ("did_execute", Box::new(|c| c.did_execute = false)),
        (
            "certificate_id",
            Box::new(|c| c.certificate_id = "f00dfeed-0000-4000-8000-000000000000".into()),
        ),
        (
            "tool_version",
            Box::new(|c| c.tool_version = "99.0.0".into()),
        ),
    ];

    for (field, mutate) in mutations {
        let mut tampered = signed.clone();
        mutate(&mut tampered.certificate);
        assert_eq!(
            Verifier::verify(&tampered, &key.verifying_key()),
            VerifyOutcome::SignatureMismatch,
            "mutation of {field} must break the signature"
        );
    }
}

#[test]
fn wrong_public_key_never_validates() {
    let key = keypair();
    let signed = Signer::sign(live_certificate(), &key).unwrap();

    for trial in 0u8..8 {
        let other = SigningKeyHandle::from_seed(&[trial + 1; 32], "other-key");
        assert_eq!(
            Verifier::verify(&signed, &other.verifying_key()),
            VerifyOutcome::SignatureMismatch,
            "trial {trial}"
        );
    }
}

#[test]
fn forged_consistent_looking_claim_is_rejected_despite_valid_signature() {
    // Bypass the builder: a dishonest producer signs a dry run dressed up
    // with a real digest. The signature is genuine; the claim is not.
    let key = keypair();
    let mut cert = live_certificate();
    cert.execution_mode = ExecutionMode::Dry;
    cert.did_execute = false;
    cert.pre_hash = None;

    let signed = Signer::sign(cert, &key).unwrap();
    assert!(matches!(
        Verifier::verify(&signed, &key.verifying_key()),
        VerifyOutcome::InconsistentClaim(_)
    ));
}

#[test]
fn json_artifact_roundtrips_without_loss() {
    let key = keypair();
    let signed = Signer::sign(live_certificate(), &key).unwrap();

    let json = signed.to_json().unwrap();
    let reloaded = SignedCertificate::from_json(json.as_bytes()).unwrap();
    assert_eq!(signed, reloaded);
    assert!(Verifier::verify_artifact(json.as_bytes(), &key.verifying_key()).is_valid());
}

#[test]
fn identical_logical_fields_yield_identical_canonical_bytes() {
    let build = || {
        CertificateBuilder::new()
            .certificate_id("11111111-2222-4333-8444-555555555555")
            .timestamp(ts())
            .device_id("/dev/sdb")
            .wipe_method("ATA Secure Erase")
            .execution_mode(ExecutionMode::Live)
            .did_execute(true)
            .evidence(EvidenceDigest::Real("bb".repeat(32)))
            .build()
            .unwrap()
    };
    assert_eq!(
        build().canonical_bytes().unwrap(),
        build().canonical_bytes().unwrap()
    );
}

#[test]
fn simulate_run_verifies_but_records_no_execution() {
    let key = keypair();
    let cert = CertificateBuilder::new()
        .device_id("/dev/sdb")
        .wipe_method("NVMe Cryptographic Erase")
        .execution_mode(ExecutionMode::Simulate)
        .did_execute(false)
        .evidence(EvidenceDigest::Real("bb".repeat(32)))
        .timestamp(ts())
        .build()
        .unwrap();

    let signed = Signer::sign(cert, &key).unwrap();
    assert!(Verifier::verify(&signed, &key.verifying_key()).is_valid());
    // The spoofing tension is deliberate: a simulate certificate is only
    // distinguishable from live through this signed field.
    assert!(!signed.certificate.did_execute);
}

proptest! {
    #[test]
    fn prop_sign_then_verify_is_valid(
        device_id in "[a-zA-Z0-9/_.:-]{1,40}",
        wipe_method in "[a-zA-Z0-9 ()-]{1,40}",
        live in any::<bool>(),
        evidence in prop::collection::vec(any::<u8>(), 32),
        pre in prop::option::of(prop::collection::vec(any::<u8>(), 32)),
    ) {
        let mode = if live { ExecutionMode::Live } else { ExecutionMode::Simulate };
        let mut builder = CertificateBuilder::new()
            .device_id(device_id)
            .wipe_method(wipe_method)
            .execution_mode(mode)
            .did_execute(live)
            .evidence(EvidenceDigest::Real(hex::encode(&evidence)))
            .timestamp(ts());
        if let Some(pre) = pre {
            builder = builder.pre_hash(hex::encode(&pre));
        }
        let cert = builder.build().unwrap();

        let key = keypair();
        let signed = Signer::sign(cert, &key).unwrap();
        prop_assert!(Verifier::verify(&signed, &key.verifying_key()).is_valid());
    }

    #[test]
    fn prop_canonical_encoding_is_deterministic(
        device_id in "[a-zA-Z0-9/_.:-]{1,40}",
        evidence in prop::collection::vec(any::<u8>(), 32),
    ) {
        let build = || CertificateBuilder::new()
            .certificate_id("11111111-2222-4333-8444-555555555555")
            .device_id(device_id.clone())
            .wipe_method("overwrite-3-pass")
            .execution_mode(ExecutionMode::Live)
            .did_execute(true)
            .evidence(EvidenceDigest::Real(hex::encode(&evidence)))
            .timestamp(ts())
            .build()
            .unwrap();
        prop_assert_eq!(
            build().canonical_bytes().unwrap(),
            build().canonical_bytes().unwrap()
        );
    }
}
