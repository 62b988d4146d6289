//! Error types for batch verification and the relay hook

use thiserror::Error;

/// A failure of the whole batch
///
/// Per-signature failures are never reported here; they are `0` entries in
/// the verdict array. When a `BatchError` is returned no verdicts exist.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Buffer lengths do not match the declared request count
    #[error("batch input shape mismatch: {0}")]
    InputShape(String),

    /// A working buffer could not be allocated
    ///
    /// `bytes` is the size that was requested, which may exceed the
    /// address space for absurd record counts.
    #[error("failed to allocate {what} ({bytes} bytes)")]
    Allocation { what: &'static str, bytes: u128 },

    /// The parallel lanes could not be started or did not complete
    #[error("failed to launch verification lanes: {0}")]
    Launch(String),
}

impl BatchError {
    /// Stable integer status of the failure (0 is reserved for success)
    ///
    /// Logged by the relay hook and the CLI alongside the message.
    pub fn code(&self) -> i32 {
        match self {
            BatchError::Allocation { .. } => -1,
            BatchError::Launch(_) => -2,
            BatchError::InputShape(_) => -3,
        }
    }
}

/// Rejection of a single event by the relay's validation hook
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid: Bad signature")]
    BadSignature,

    #[error("invalid: Signature validation error - {0}")]
    Malformed(String),
}
