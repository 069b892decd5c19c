//! Wipe-executor collaborator interface.
//!
//! The certificate subsystem never invokes or understands device-specific
//! wipe commands. Backends (vendor secure-erase drivers, NVMe format,
//! overwrite utilities) implement [`WipeExecutor`] elsewhere; this core
//! consumes only the resulting [`WipeOutcome`] when building certificates.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::types::ExecutionMode;

/// Device class a backend knows how to sanitize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    Ata,
    Nvme,
    /// Fallback multi-pass overwrite for anything block-addressable.
    Overwrite,
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceClass::Ata => write!(f, "ata"),
            DeviceClass::Nvme => write!(f, "nvme"),
            DeviceClass::Overwrite => write!(f, "overwrite"),
        }
    }
}

/// What the certificate core consumes from a wipe run: the method that was
/// actually applied and whether anything destructive happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WipeOutcome {
    pub method: String,
    pub did_execute: bool,
}

#[derive(Debug, Error)]
pub enum WipeError {
    #[error("no executor registered for device class '{0}'")]
    UnsupportedClass(DeviceClass),

    #[error("wipe execution failed: {0}")]
    ExecutionFailed(String),
}

/// One wipe backend.
///
/// Implementations must honor the mode: only `live` may reach a
/// destructive path, and `did_execute` in the outcome must reflect what
/// actually happened, not what was requested.
#[async_trait]
pub trait WipeExecutor: Send + Sync {
    /// Human-readable method description recorded in certificates
    /// (e.g. "ATA Secure Erase").
    fn method_name(&self) -> &str;

    /// Device class this backend handles.
    fn device_class(&self) -> DeviceClass;

    /// Run (or skip, per `mode`) the sanitization of `device`.
    async fn execute(&self, device: &str, mode: ExecutionMode)
        -> Result<WipeOutcome, WipeError>;
}

/// Registry of wipe backends, keyed by device class.
pub struct ExecutorRegistry {
    executors: HashMap<DeviceClass, Box<dyn WipeExecutor>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self {
            executors: HashMap::new(),
        }
    }

    pub fn register(&mut self, executor: Box<dyn WipeExecutor>) {
        self.executors.insert(executor.device_class(), executor);
    }

    pub fn get(&self, class: DeviceClass) -> Option<&dyn WipeExecutor> {
        self.executors.get(&class).map(|b| b.as_ref())
    }

    pub fn classes(&self) -> Vec<DeviceClass> {
        self.executors.keys().copied().collect()
    }

    /// Dispatch a wipe to the backend for `class`.
    pub async fn execute(
        &self,
        class: DeviceClass,
        device: &str,
        mode: ExecutionMode,
    ) -> Result<WipeOutcome, WipeError> {
        let executor = self
            .get(class)
            .ok_or(WipeError::UnsupportedClass(class))?;
        executor.execute(device, mode).await
    }
}

impl Default for ExecutorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutorRegistry")
            .field("classes", &self.classes())
            .finish()
    }
}
