//! Directory-tree driver
//!
//! Database files kept below the hierarchical backend's tree.

use std::fs;
#[cfg(unix)]
use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::ResultCode;
use crate::host::DirFileSystem;

use super::{Delete, DeleteOptions, StorageDriver};

/// Driver over a [`DirFileSystem`]
pub struct DirDriver {
    fs: Arc<DirFileSystem>,
}

impl DirDriver {
    pub const NAME: &'static str = "opfs";

    pub fn new(fs: Arc<DirFileSystem>) -> Self {
        Self { fs }
    }
}

impl StorageDriver for DirDriver {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn deleter(&self) -> Option<&dyn Delete> {
        Some(self)
    }
}

impl Delete for DirDriver {
    fn delete(&self, path: &str, options: DeleteOptions) -> ResultCode {
        let Some(target) = self.fs.resolve(path) else {
            return ResultCode::Misuse;
        };

        match fs::remove_file(&target) {
            Ok(()) => debug!(path, "deleted"),
            Err(e) if e.kind() == io::ErrorKind::NotFound && options.missing_ok => {
                return ResultCode::Success;
            }
            Err(e) => {
                warn!(path, error = %e, "delete failed");
                return ResultCode::IoError;
            }
        }

        if options.sync_dir {
            if let Err(e) = sync_parent(&target) {
                warn!(path, error = %e, "directory sync after delete failed");
                return ResultCode::IoError;
            }
        }

        ResultCode::Success
    }
}

/// Make a removal durable in its directory. Only unix lets a directory be
/// opened for syncing.
#[cfg(unix)]
fn sync_parent(target: &Path) -> io::Result<()> {
    match target.parent() {
        Some(parent) => File::open(parent)?.sync_all(),
        None => Ok(()),
    }
}

#[cfg(not(unix))]
fn sync_parent(_target: &Path) -> io::Result<()> {
    Ok(())
}
