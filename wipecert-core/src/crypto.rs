//! Cryptographic primitives: digests, scoped signing keys, and the
//! hash-then-sign certificate signer.

use std::fmt;
use std::path::Path;

use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier as _, VerifyingKey};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;
use zeroize::Zeroizing;

use crate::certificate::{Certificate, DetachedSignature, SignedCertificate};
use crate::serialization::SerializationError;
use crate::types::SignatureBytes;

/// Identifier of the signing scheme: Ed25519 over the SHA-256 digest of the
/// canonical certificate bytes. Carried in the detached signature so a
/// verifier can select the matching key and algorithm.
pub const SIGNATURE_ALGORITHM: &str = "ed25519-sha256";

/// Compute SHA-256 of `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Compute Blake3 of `data` (faster; for non-consensus references such as
/// the rendering fingerprint, never for signed content).
pub fn blake3(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("signing key unavailable: {0}")]
    Unavailable(#[from] std::io::Error),

    #[error("signing key unavailable: seed file is not valid hex")]
    MalformedSeed(#[from] hex::FromHexError),

    #[error("signing key unavailable: expected a 32-byte seed, got {0} bytes")]
    WrongSeedLength(usize),
}

#[derive(Debug, Error)]
pub enum SignError {
    #[error(transparent)]
    KeyUnavailable(#[from] KeyError),

    #[error("signing failed: {0}")]
    SigningFailure(#[from] SerializationError),
}

/// A scoped Ed25519 signing key.
///
/// Acquire, sign, drop: the seed passes through zeroizing buffers on load
/// and the key material itself is wiped when the handle goes out of scope.
/// The handle never writes key material anywhere.
pub struct SigningKeyHandle {
    signing_key: SigningKey,
    key_id: String,
}

impl SigningKeyHandle {
    /// Generate a fresh random key.
    pub fn generate(key_id: impl Into<String>) -> Self {
        let mut csprng = rand::rngs::OsRng;
        Self {
            signing_key: SigningKey::generate(&mut csprng),
            key_id: key_id.into(),
        }
    }

    /// Build a handle from a raw 32-byte seed.
    pub fn from_seed(seed: &[u8; 32], key_id: impl Into<String>) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
            key_id: key_id.into(),
        }
    }

    /// Load a hex-encoded seed from a file.
    pub fn load(path: &Path, key_id: impl Into<String>) -> Result<Self, KeyError> {
        let text = Zeroizing::new(std::fs::read_to_string(path)?);
        let seed = Zeroizing::new(hex::decode(text.trim())?);
        if seed.len() != 32 {
            return Err(KeyError::WrongSeedLength(seed.len()));
        }
        let mut bytes = Zeroizing::new([0u8; 32]);
        bytes.copy_from_slice(&seed);
        Ok(Self::from_seed(&bytes, key_id))
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Hex form of the public key, as written to `.pub` files.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.signing_key.verifying_key().to_bytes())
    }

    /// The raw seed, in zeroizing memory. Only key-export paths (e.g.
    /// `keygen`) should touch this.
    pub fn seed_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.signing_key.to_bytes())
    }

    fn sign_digest(&self, digest: &[u8; 32]) -> Signature {
        self.signing_key.sign(digest)
    }
}

impl fmt::Debug for SigningKeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKeyHandle")
            .field("key_id", &self.key_id)
            .field("verifying_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

/// Signs certificates. Stateless; the key arrives per call.
pub struct Signer;

impl Signer {
    /// Sign `certificate` with `key`, returning the signed container.
    ///
    /// The certificate is consumed: after signing there is no unsigned
    /// object left around to be mistaken for a signed one. Hash-then-sign:
    /// the Ed25519 message is the SHA-256 digest of the canonical bytes.
    pub fn sign(
        certificate: Certificate,
        key: &SigningKeyHandle,
    ) -> Result<SignedCertificate, SignError> {
        let digest = certificate.signing_digest()?;
        let signature = key.sign_digest(&digest);
        debug!(
            certificate_id = %certificate.certificate_id,
            key_id = %key.key_id,
            "signed certificate"
        );
        Ok(SignedCertificate {
            certificate,
            signature: DetachedSignature {
                algorithm: SIGNATURE_ALGORITHM.to_string(),
                key_id: key.key_id.clone(),
                signature: SignatureBytes::from(signature.to_bytes()),
            },
        })
    }

    /// Check a detached signature against a certificate's canonical bytes.
    /// Low-level helper for the verifier; returns false on any mismatch.
    pub(crate) fn signature_matches(
        certificate: &Certificate,
        signature: &SignatureBytes,
        public_key: &VerifyingKey,
    ) -> bool {
        let Ok(digest) = certificate.signing_digest() else {
            return false;
        };
        let signature = Signature::from_bytes(signature.as_ref());
        public_key.verify(&digest, &signature).is_ok()
    }
}
