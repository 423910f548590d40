//! Error types for hostkv
//!
//! Two layers live here:
//! - [`HostKvError`]: the rich error type returned by crate operations
//! - [`ResultCode`]: the flat result taxonomy surfaced to the database engine
//!
//! Every `HostKvError` projects onto exactly one `ResultCode` via
//! [`HostKvError::code`].

use std::fmt;

use thiserror::Error;

use crate::host::HostError;

/// Result type alias using HostKvError
pub type Result<T> = std::result::Result<T, HostKvError>;

/// Result codes handed back to the database engine.
///
/// Numeric values follow the engine's own primary result codes so they can be
/// passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ResultCode {
    Success = 0,
    /// Allocation or scratch exhaustion. Retryable once pressure is relieved.
    OutOfMemory = 7,
    /// Host storage operation failed. Retryability depends on the host.
    IoError = 10,
    /// Feature absent from this build. Never retryable.
    NotSupported = 12,
    /// Bad arguments or missing driver. Never retryable.
    Misuse = 21,
}

impl ResultCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == ResultCode::Success
    }

    /// Collapse an operation result onto its code
    pub fn of<T>(result: &Result<T>) -> Self {
        match result {
            Ok(_) => ResultCode::Success,
            Err(e) => e.code(),
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResultCode::Success => "success",
            ResultCode::OutOfMemory => "out of memory",
            ResultCode::IoError => "I/O error",
            ResultCode::NotSupported => "not supported",
            ResultCode::Misuse => "misuse",
        };
        write!(f, "{} ({})", name, self.as_i32())
    }
}

/// Unified error type for hostkv operations
#[derive(Debug, Error)]
pub enum HostKvError {
    // -------------------------------------------------------------------------
    // Caller Errors
    // -------------------------------------------------------------------------
    #[error("Misuse: {0}")]
    Misuse(String),

    #[error("Not supported: {0}")]
    NotSupported(&'static str),

    // -------------------------------------------------------------------------
    // Resource Errors
    // -------------------------------------------------------------------------
    #[error("Out of memory: {0}")]
    OutOfMemory(String),

    // -------------------------------------------------------------------------
    // Host Errors
    // -------------------------------------------------------------------------
    #[error("Host {op} failed: {source}")]
    Host {
        op: &'static str,
        #[source]
        source: HostError,
    },

    #[error("Mounting {path} failed: {source}")]
    Mount {
        path: String,
        #[source]
        source: HostError,
    },

    // -------------------------------------------------------------------------
    // Local I/O and Format Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corruption detected: {0}")]
    Corruption(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl HostKvError {
    pub fn host(op: &'static str, source: HostError) -> Self {
        HostKvError::Host { op, source }
    }

    /// Map onto the engine-facing taxonomy
    pub fn code(&self) -> ResultCode {
        match self {
            HostKvError::Misuse(_) | HostKvError::Config(_) => ResultCode::Misuse,
            HostKvError::NotSupported(_) => ResultCode::NotSupported,
            HostKvError::OutOfMemory(_) => ResultCode::OutOfMemory,
            HostKvError::Host { source, .. } => source.kind().result_code(),
            // Directory creation failures are one class, whatever the host said.
            HostKvError::Mount { .. } => ResultCode::IoError,
            HostKvError::Io(_) | HostKvError::Corruption(_) | HostKvError::Serialization(_) => {
                ResultCode::IoError
            }
        }
    }
}

impl From<HostKvError> for ResultCode {
    fn from(err: HostKvError) -> Self {
        err.code()
    }
}
