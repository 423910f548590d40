//! Key/value driver
//!
//! Database files kept in the key/value backend. A file name selects the
//! class: `session` (and `session-journal`) live in the session map, any
//! other name in the persistent map under class `local`. Only the rollback
//! journal is ever deleted; the database itself is kept page by page and
//! outlives a delete of its path.

use std::sync::Arc;

use tracing::warn;

use crate::error::ResultCode;
use crate::kv::KvBackend;

use super::{Delete, DeleteOptions, StorageDriver};

const JOURNAL_SUFFIX: &str = "-journal";
const JOURNAL_KEY: &str = "journal";

/// Driver over the key/value backend
pub struct KvDriver {
    kv: Arc<KvBackend>,
}

impl KvDriver {
    pub const NAME: &'static str = "kvvfs";

    pub fn new(kv: Arc<KvBackend>) -> Self {
        Self { kv }
    }

    /// Class a path's data is stored under
    pub fn class_for(path: &str) -> &'static str {
        let base = path.rsplit('/').next().unwrap_or(path);
        let base = base.strip_suffix(JOURNAL_SUFFIX).unwrap_or(base);
        if base == "session" {
            "session"
        } else {
            "local"
        }
    }

    pub fn is_journal(path: &str) -> bool {
        path.ends_with(JOURNAL_SUFFIX)
    }

    /// Whether `path` exists. A journal exists when its key holds data; the
    /// database file always exists.
    pub fn access(&self, path: &str) -> bool {
        if Self::is_journal(path) {
            self.kv.read(Self::class_for(path), JOURNAL_KEY, &mut []) > 0
        } else {
            true
        }
    }
}

impl StorageDriver for KvDriver {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn deleter(&self) -> Option<&dyn Delete> {
        Some(self)
    }
}

impl Delete for KvDriver {
    fn delete(&self, path: &str, _options: DeleteOptions) -> ResultCode {
        if !Self::is_journal(path) {
            return ResultCode::Success;
        }

        // Removing an absent key already succeeds, so missing_ok holds as-is.
        match self.kv.delete(Self::class_for(path), JOURNAL_KEY) {
            Ok(()) => ResultCode::Success,
            Err(e) => {
                warn!(path, error = %e, "journal delete failed");
                e.code()
            }
        }
    }
}
