//! Directory-rooted virtual tree
//!
//! Maps the host's virtual paths (`/persistent/db.sqlite3`) onto a real
//! directory. Creating a backend makes sure the root exists; attaching a
//! directory to a backend creates it below the root.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use super::{BackendHandle, HostError, HostErrorKind, HostFileSystem};

/// Virtual tree rooted in a real directory
#[derive(Debug)]
pub struct DirFileSystem {
    root: PathBuf,
    next_backend_id: AtomicU64,
}

impl DirFileSystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            next_backend_id: AtomicU64::new(1),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Translate a virtual path into a path below the root.
    ///
    /// "/persistent/db" → "{root}/persistent/db". Paths that are relative or
    /// climb out with `..` resolve to None.
    pub fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = path.strip_prefix('/')?;
        let mut resolved = self.root.clone();
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(resolved)
    }

    fn resolve_or_err(&self, path: &str) -> Result<PathBuf, HostError> {
        self.resolve(path).ok_or_else(|| {
            HostError::new(HostErrorKind::Io, format!("path {:?} is outside the tree", path))
        })
    }
}

impl HostFileSystem for DirFileSystem {
    fn create_backend(&self) -> Result<BackendHandle, HostError> {
        fs::create_dir_all(&self.root)?;
        let id = self.next_backend_id.fetch_add(1, Ordering::SeqCst);
        debug!(root = %self.root.display(), id, "backend ready");
        Ok(BackendHandle::new(id))
    }

    fn exists(&self, path: &str) -> Result<bool, HostError> {
        let resolved = self.resolve_or_err(path)?;
        Ok(resolved.exists())
    }

    fn create_directory(
        &self,
        path: &str,
        mode: u32,
        backend: &BackendHandle,
    ) -> Result<(), HostError> {
        if backend.id() == 0 || backend.id() >= self.next_backend_id.load(Ordering::SeqCst) {
            return Err(HostError::new(
                HostErrorKind::NotFound,
                format!("unknown backend {}", backend.id()),
            ));
        }

        let resolved = self.resolve_or_err(path)?;
        let mut builder = fs::DirBuilder::new();
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(mode);
        }
        #[cfg(not(unix))]
        let _ = mode;

        builder.create(&resolved)?;
        Ok(())
    }
}
