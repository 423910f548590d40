//! Host Primitives Module
//!
//! The storage facilities the embedding host provides, and the boundary
//! every call into them passes through.
//!
//! ## Responsibilities
//! - Flat string-keyed maps ([`HostStorage`]), shaped like the Web Storage API
//! - A hierarchical tree that backends are mounted into ([`HostFileSystem`])
//! - Converting host failures, panics included, into [`HostError`]
//! - One fixed table from [`HostErrorKind`] to [`ResultCode`]
//!
//! ## Implementations
//! - [`MemoryStorage`]: process-lifetime map, used for the session scope
//! - [`FileStorage`]: snapshot-backed map, used for the persistent scope
//! - [`DirFileSystem`]: virtual tree rooted in a real directory

mod dir;
mod file;
mod memory;

use std::any::Any;
use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;

use crate::error::ResultCode;

pub use dir::DirFileSystem;
pub use file::FileStorage;
pub use memory::MemoryStorage;

// =============================================================================
// Host Errors
// =============================================================================

/// Category of a host-side failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostErrorKind {
    /// The write would exceed the host's storage quota
    QuotaExceeded,
    /// The storage API is missing or access was refused
    Unavailable,
    NotFound,
    AlreadyExists,
    OutOfMemory,
    /// Stored data failed validation
    Corrupted,
    /// The host call unwound instead of returning
    Panicked,
    /// Any other I/O failure
    Io,
}

impl HostErrorKind {
    /// Fixed mapping from host failure category to engine result code
    pub fn result_code(self) -> ResultCode {
        match self {
            HostErrorKind::OutOfMemory => ResultCode::OutOfMemory,
            HostErrorKind::QuotaExceeded
            | HostErrorKind::Unavailable
            | HostErrorKind::NotFound
            | HostErrorKind::AlreadyExists
            | HostErrorKind::Corrupted
            | HostErrorKind::Panicked
            | HostErrorKind::Io => ResultCode::IoError,
        }
    }
}

impl fmt::Display for HostErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HostErrorKind::QuotaExceeded => "quota exceeded",
            HostErrorKind::Unavailable => "storage unavailable",
            HostErrorKind::NotFound => "not found",
            HostErrorKind::AlreadyExists => "already exists",
            HostErrorKind::OutOfMemory => "out of memory",
            HostErrorKind::Corrupted => "corrupted",
            HostErrorKind::Panicked => "panicked",
            HostErrorKind::Io => "i/o failure",
        };
        f.write_str(name)
    }
}

/// A failure reported by (or raised inside) a host primitive
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct HostError {
    kind: HostErrorKind,
    message: String,
}

impl HostError {
    pub fn new(kind: HostErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn quota_exceeded(message: impl Into<String>) -> Self {
        Self::new(HostErrorKind::QuotaExceeded, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(HostErrorKind::Unavailable, message)
    }

    pub fn kind(&self) -> HostErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    fn panicked(op: &str, payload: Box<dyn Any + Send>) -> Self {
        let detail = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        Self::new(HostErrorKind::Panicked, format!("{} panicked: {}", op, detail))
    }
}

impl From<io::Error> for HostError {
    fn from(err: io::Error) -> Self {
        let kind = match err.kind() {
            io::ErrorKind::NotFound => HostErrorKind::NotFound,
            io::ErrorKind::AlreadyExists => HostErrorKind::AlreadyExists,
            io::ErrorKind::PermissionDenied => HostErrorKind::Unavailable,
            io::ErrorKind::OutOfMemory => HostErrorKind::OutOfMemory,
            _ => HostErrorKind::Io,
        };
        Self::new(kind, err.to_string())
    }
}

/// Run one host call, catching an unwind as a [`HostErrorKind::Panicked`]
/// error so nothing escapes the operation boundary.
pub fn guard<T>(
    op: &'static str,
    call: impl FnOnce() -> Result<T, HostError>,
) -> Result<T, HostError> {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(result) => result,
        Err(payload) => Err(HostError::panicked(op, payload)),
    }
}

// =============================================================================
// Host Interfaces
// =============================================================================

/// A flat string-keyed map provided by the host.
///
/// Values are text; callers storing bytes are expected to keep them to one
/// byte per character.
pub trait HostStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, HostError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), HostError>;

    /// Removing an absent key is not an error
    fn remove_item(&self, key: &str) -> Result<(), HostError>;

    fn len(&self) -> Result<usize, HostError>;

    /// Key at position `index` in the map's iteration order
    fn key_at(&self, index: usize) -> Result<Option<String>, HostError>;

    fn clear(&self) -> Result<(), HostError>;

    fn is_empty(&self) -> Result<bool, HostError> {
        Ok(self.len()? == 0)
    }
}

/// Opaque handle to a backend instance created by a [`HostFileSystem`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BackendHandle(u64);

impl BackendHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// A hierarchical tree that storage backends can be attached to
pub trait HostFileSystem: Send + Sync {
    /// Instantiate a new storage backend
    fn create_backend(&self) -> Result<BackendHandle, HostError>;

    /// Whether `path` exists in the virtual tree
    fn exists(&self, path: &str) -> Result<bool, HostError>;

    /// Create directory `path`, attaching it to `backend`
    fn create_directory(
        &self,
        path: &str,
        mode: u32,
        backend: &BackendHandle,
    ) -> Result<(), HostError>;
}
