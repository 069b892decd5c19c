//! Example: Certifying a (simulated) device wipe end to end
//!
//! Run with: cargo run --example certify_wipe

use async_trait::async_trait;
use wipecert_core::{
    CertificateBuilder, DeviceClass, DeviceDetails, EvidenceCollector, ExecutionMode,
    ExecutorRegistry, Signer, SigningKeyHandle, Verifier, WipeError, WipeExecutor, WipeOutcome,
};

/// Demo backend: reports the method it would use, touches nothing.
struct DemoAtaExecutor;

#[async_trait]
impl WipeExecutor for DemoAtaExecutor {
    fn method_name(&self) -> &str {
        "ATA Secure Erase"
    }

    fn device_class(&self) -> DeviceClass {
        DeviceClass::Ata
    }

    async fn execute(&self, _device: &str, mode: ExecutionMode) -> Result<WipeOutcome, WipeError> {
        Ok(WipeOutcome {
            method: self.method_name().to_string(),
            did_execute: mode == ExecutionMode::Live,
        })
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    println!("💽 Wipe Certification - Example Usage\n");
    println!("==============================================\n");

    // A scratch file stands in for the block device.
    let device = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(device.path(), vec![0u8; 8192]).unwrap();
    let device_path = device.path().to_string_lossy().to_string();

    // Step 1: Signing key (in production, loaded from a provisioned seed file)
    println!("1️⃣  Acquiring signing key...");
    let key = SigningKeyHandle::generate("demo-station-key");
    println!("   ✓ Public key: {}...\n", &key.public_key_hex()[..16]);

    // Step 2: Pre-wipe evidence sample
    println!("2️⃣  Capturing pre-wipe evidence sample...");
    let collector = EvidenceCollector::default();
    let pre = collector.collect(device.path()).unwrap();
    println!("   ✓ Pre-wipe digest: {}...\n", &pre.as_str()[..16]);

    // Step 3: Dispatch the wipe (simulate mode - nothing is destroyed)
    println!("3️⃣  Dispatching wipe to the ATA backend (simulate)...");
    let mut registry = ExecutorRegistry::new();
    registry.register(Box::new(DemoAtaExecutor));
    let outcome = registry
        .execute(DeviceClass::Ata, &device_path, ExecutionMode::Simulate)
        .await
        .unwrap();
    println!(
        "   ✓ Outcome: method={}, did_execute={}\n",
        outcome.method, outcome.did_execute
    );

    // Step 4: Post-operation evidence sample
    println!("4️⃣  Capturing post-operation evidence sample...");
    let post = collector.collect(device.path()).unwrap();
    println!("   ✓ Evidence digest: {}...\n", &post.as_str()[..16]);

    // Step 5: Build the certificate
    println!("5️⃣  Building certificate...");
    let certificate = CertificateBuilder::new()
        .device_id(device_path.clone())
        .device(DeviceDetails {
            model: Some("DEMO SSD 870".to_string()),
            serial: Some("S5Y1NG0demo".to_string()),
            size_bytes: Some(8192),
        })
        .wipe_method(outcome.method)
        .execution_mode(ExecutionMode::Simulate)
        .did_execute(outcome.did_execute)
        .pre_hash(pre.as_str())
        .evidence(post)
        .hostname("wipe-station-demo")
        .operator("demo")
        .build()
        .unwrap();
    println!("   ✓ Certificate ID: {}", certificate.certificate_id);
    println!("   ✓ Fingerprint: {}...\n", &certificate.fingerprint().unwrap()[..16]);

    // Step 6: Sign
    println!("6️⃣  Signing...");
    let verifying_key = key.verifying_key();
    let signed = Signer::sign(certificate, &key).unwrap();
    drop(key); // scoped key: zeroized here
    println!("   ✓ Signed by key '{}'\n", signed.signature.key_id);

    // Step 7: Persist and re-verify as a third party would
    println!("7️⃣  Verifying the JSON artifact...");
    let artifact = signed.to_json().unwrap();
    let outcome = Verifier::verify_artifact(artifact.as_bytes(), &verifying_key);
    println!("   Verification outcome: {outcome}\n");

    // Step 8: Tamper and watch it fail
    println!("8️⃣  Tampering with the wipe method...");
    let mut tampered = signed.clone();
    tampered.certificate.wipe_method = "shred (1 pass)".to_string();
    let outcome = Verifier::verify(&tampered, &verifying_key);
    println!("   Verification outcome: {outcome}\n");

    println!("==============================================");
    println!("✅ Certification workflow complete!");
    println!("\nNote: this was a simulate run - the artifact records");
    println!("did_execute=false, and any consumer can reject it.");
}
