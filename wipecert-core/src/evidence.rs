//! Evidentiary hash capture.
//!
//! A certificate carries a digest of one deterministic sample window of the
//! device, taken before and/or after the wipe. The sample read is read-only
//! and safe on in-use devices; it is circumstantial proof of device state,
//! not a full-surface verification.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::types::EvidenceAuthenticity;

/// Reserved evidence value for dry runs. Contains a colon, so it can never
/// collide with (or be mistaken for) a hex digest.
pub const EVIDENCE_SENTINEL: &str = "dry-run:no-evidence";

/// Default sample window: the first 4096 bytes of the device.
pub const DEFAULT_SAMPLE_LEN: usize = 4096;

/// Default bound on a single sample read.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum EvidenceError {
    #[error("evidence unavailable: {0}")]
    Unavailable(#[from] std::io::Error),

    #[error("evidence unavailable: sample read timed out after {0:?}")]
    Timeout(Duration),
}

/// Where and how much to sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplePolicy {
    /// Byte offset of the window start.
    pub offset: u64,
    /// Window length in bytes. A device shorter than `offset + len` yields
    /// a digest over the bytes that exist; an empty window is an error.
    pub len: usize,
}

impl Default for SamplePolicy {
    fn default() -> Self {
        Self {
            offset: 0,
            len: DEFAULT_SAMPLE_LEN,
        }
    }
}

/// An evidentiary digest, or the marker standing in for one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvidenceDigest {
    /// Hex-encoded SHA-256 of the sample window.
    Real(String),
    /// No read occurred; the certificate carries [`EVIDENCE_SENTINEL`].
    Sentinel,
}

impl EvidenceDigest {
    pub fn authenticity(&self) -> EvidenceAuthenticity {
        match self {
            EvidenceDigest::Real(_) => EvidenceAuthenticity::Real,
            EvidenceDigest::Sentinel => EvidenceAuthenticity::Sentinel,
        }
    }

    /// The string form carried in the certificate's `evidence_hash` field.
    pub fn as_str(&self) -> &str {
        match self {
            EvidenceDigest::Real(hex) => hex,
            EvidenceDigest::Sentinel => EVIDENCE_SENTINEL,
        }
    }
}

/// True for a well-formed lowercase hex SHA-256 digest.
pub fn is_real_digest(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Reads one sample window per call and digests it.
///
/// The read runs on a helper thread so a hung device cannot block the
/// certification session past the timeout; the thread is detached and its
/// eventual result discarded. A failed or timed-out read is always
/// surfaced, never downgraded to a sentinel.
#[derive(Debug, Clone)]
pub struct EvidenceCollector {
    policy: SamplePolicy,
    timeout: Duration,
}

impl Default for EvidenceCollector {
    fn default() -> Self {
        Self::new(SamplePolicy::default(), DEFAULT_READ_TIMEOUT)
    }
}

impl EvidenceCollector {
    pub fn new(policy: SamplePolicy, timeout: Duration) -> Self {
        Self { policy, timeout }
    }

    /// The sentinel stand-in for dry runs. No device access happens here;
    /// the caller supplies it in place of a capture.
    pub fn sentinel() -> EvidenceDigest {
        EvidenceDigest::Sentinel
    }

    /// Capture the sample window of `device` and return its digest.
    pub fn collect(&self, device: &Path) -> Result<EvidenceDigest, EvidenceError> {
        let policy = self.policy;
        let path: PathBuf = device.to_path_buf();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let _ = tx.send(read_sample(&path, policy));
        });

        let sample = match rx.recv_timeout(self.timeout) {
            Ok(result) => result?,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                return Err(EvidenceError::Timeout(self.timeout));
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                return Err(EvidenceError::Unavailable(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "sample reader thread exited without a result",
                )));
            }
        };

        let digest = hex::encode(crate::crypto::sha256(&sample));
        debug!(
            device = %device.display(),
            offset = policy.offset,
            sampled = sample.len(),
            "captured evidence sample"
        );
        Ok(EvidenceDigest::Real(digest))
    }
}

fn read_sample(path: &Path, policy: SamplePolicy) -> Result<Vec<u8>, EvidenceError> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(policy.offset))?;

    let mut window = vec![0u8; policy.len];
    let mut filled = 0;
    while filled < window.len() {
        match file.read(&mut window[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    window.truncate(filled);

    if window.is_empty() {
        return Err(EvidenceError::Unavailable(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "sample window is empty",
        )));
    }
    Ok(window)
}
