//! Hierarchical Backend Lifecycle
//!
//! Lazily creates a storage backend in the host tree and mounts it at a
//! single-component path. Only creating and mounting the backend lives
//! here; file I/O against the mounted tree belongs to the drivers.
//!
//! ## State Machine
//! ```text
//!                  CAS                    backend + mkdir ok
//!  Uninitialized ───────► Initializing ─────────────────────► Mounted
//!        ▲                 │       │                        (terminal)
//!        │ backend failed  │       │ mkdir failed
//!        └─────────────────┘       ▼
//!                                Failed ──► (init again: mkdir only)
//! ```
//!
//! Entry into `Initializing` is a compare-and-set, so exactly one caller
//! constructs. A caller on another thread that finds `Initializing` backs off
//! until the owner finishes, then looks at the state again. A reentrant call
//! made from the owner's own thread while it is still constructing gets
//! Misuse. It never sees a half-built backend.

#![cfg_attr(not(feature = "opfs"), allow(unused_imports, dead_code))]

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use crossbeam::utils::Backoff;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::{HostKvError, Result};
use crate::host::{self, BackendHandle, HostFileSystem};

/// Mount point used when `init` is given an empty path
pub const DEFAULT_MOUNT_POINT: &str = "/persistent";

/// Permission bits for the mount directory
pub const MOUNT_MODE: u32 = 0o777;

/// Observable lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MountState {
    Uninitialized = 0,
    Initializing = 1,
    /// Backend exists but the mount directory could not be created
    Failed = 2,
    Mounted = 3,
}

impl MountState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => MountState::Initializing,
            2 => MountState::Failed,
            3 => MountState::Mounted,
            _ => MountState::Uninitialized,
        }
    }
}

/// Check that `path` is absolute with exactly one component.
///
/// "/foo" is accepted; "", "/", "foo", "/foo/" and "/foo/bar" are not.
pub fn validate_mount_point(path: &str) -> Result<()> {
    let name = path
        .strip_prefix('/')
        .ok_or_else(|| HostKvError::Misuse(format!("mount point {:?} is not absolute", path)))?;

    if name.is_empty() || name.contains('/') || name == "." || name == ".." {
        return Err(HostKvError::Misuse(format!(
            "mount point {:?} must be exactly one path component",
            path
        )));
    }
    Ok(())
}

/// Owns the hierarchical backend and its mount
pub struct OpfsBackend {
    fs: Arc<dyn HostFileSystem>,
    default_mount: String,
    state: AtomicU8,
    /// Written only by the thread holding `Initializing`
    backend: Mutex<Option<BackendHandle>>,
    mounted_at: Mutex<Option<String>>,
    owner: Mutex<Option<ThreadId>>,
}

impl OpfsBackend {
    pub fn new(fs: Arc<dyn HostFileSystem>, default_mount: impl Into<String>) -> Self {
        Self {
            fs,
            default_mount: default_mount.into(),
            state: AtomicU8::new(MountState::Uninitialized as u8),
            backend: Mutex::new(None),
            mounted_at: Mutex::new(None),
            owner: Mutex::new(None),
        }
    }

    pub fn state(&self) -> MountState {
        MountState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Where the backend ended up mounted, once mounted
    pub fn mount_point(&self) -> Option<String> {
        self.mounted_at.lock().clone()
    }

    pub fn backend(&self) -> Option<BackendHandle> {
        *self.backend.lock()
    }

    /// Create the backend if needed and mount it at `mount_point`.
    ///
    /// An empty `mount_point` means the configured default. Once a call has
    /// succeeded, every later call is a no-op success.
    #[cfg(feature = "opfs")]
    pub fn init(&self, mount_point: &str) -> Result<()> {
        let mount = if mount_point.is_empty() {
            self.default_mount.as_str()
        } else {
            mount_point
        };

        if !self.acquire()? {
            if let Some(current) = self.mounted_at.lock().as_deref() {
                if current != mount {
                    debug!(requested = mount, current, "already mounted; ignoring new mount point");
                }
            }
            return Ok(());
        }

        let mut initializing = Initializing::enter(self);
        let outcome = validate_mount_point(mount).and_then(|()| self.construct(mount));
        initializing.mounted = outcome.is_ok();
        drop(initializing);
        outcome
    }

    /// Without the hierarchical backend compiled in there is nothing to mount
    #[cfg(not(feature = "opfs"))]
    pub fn init(&self, _mount_point: &str) -> Result<()> {
        Err(HostKvError::NotSupported("hierarchical storage backend"))
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Take the `Initializing` state. Ok(false) means already mounted.
    #[cfg(feature = "opfs")]
    fn acquire(&self) -> Result<bool> {
        let backoff = Backoff::new();
        loop {
            let current = self.state.load(Ordering::Acquire);
            match MountState::from_u8(current) {
                MountState::Mounted => return Ok(false),
                MountState::Initializing => {
                    if *self.owner.lock() == Some(thread::current().id()) {
                        return Err(HostKvError::Misuse(
                            "init re-entered while the backend is being constructed".to_string(),
                        ));
                    }
                    backoff.snooze();
                }
                MountState::Uninitialized | MountState::Failed => {
                    if self
                        .state
                        .compare_exchange(
                            current,
                            MountState::Initializing as u8,
                            Ordering::AcqRel,
                            Ordering::Acquire,
                        )
                        .is_ok()
                    {
                        return Ok(true);
                    }
                }
            }
        }
    }

    /// Runs with `Initializing` held
    #[cfg(feature = "opfs")]
    fn construct(&self, mount: &str) -> Result<()> {
        let existing = *self.backend.lock();
        let backend = match existing {
            Some(backend) => backend,
            None => {
                let created = host::guard("create_backend", || self.fs.create_backend())
                    .map_err(|e| {
                        warn!(error = %e, "creating hierarchical backend failed");
                        HostKvError::OutOfMemory(format!("hierarchical backend: {}", e))
                    })?;
                info!(backend = created.id(), "created hierarchical storage backend");
                *self.backend.lock() = Some(created);
                created
            }
        };

        let exists = host::guard("exists", || self.fs.exists(mount)).map_err(|e| {
            HostKvError::Mount {
                path: mount.to_string(),
                source: e,
            }
        })?;

        if !exists {
            let result = host::guard("create_directory", || {
                self.fs.create_directory(mount, MOUNT_MODE, &backend)
            });
            info!(path = mount, ok = result.is_ok(), "mkdir for mount point");
            result.map_err(|e| HostKvError::Mount {
                path: mount.to_string(),
                source: e,
            })?;
        } else {
            debug!(path = mount, "mount point already present");
        }

        *self.mounted_at.lock() = Some(mount.to_string());
        Ok(())
    }
}

/// Held while the `Initializing` state is owned. Dropping it, on return or
/// on unwind, moves the state on so waiting threads are released.
#[cfg(feature = "opfs")]
struct Initializing<'a> {
    opfs: &'a OpfsBackend,
    mounted: bool,
}

#[cfg(feature = "opfs")]
impl<'a> Initializing<'a> {
    fn enter(opfs: &'a OpfsBackend) -> Self {
        *opfs.owner.lock() = Some(thread::current().id());
        Self {
            opfs,
            mounted: false,
        }
    }
}

#[cfg(feature = "opfs")]
impl Drop for Initializing<'_> {
    fn drop(&mut self) {
        *self.opfs.owner.lock() = None;

        let next = if self.mounted {
            MountState::Mounted
        } else if self.opfs.backend.lock().is_some() {
            MountState::Failed
        } else {
            MountState::Uninitialized
        };
        self.opfs.state.store(next as u8, Ordering::Release);
    }
}
