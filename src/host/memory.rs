//! In-memory host map
//!
//! BTreeMap wrapped in RwLock, with optional quota accounting.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use super::{HostError, HostStorage};

/// Entries plus the bytes they account for against a quota
#[derive(Debug, Default)]
pub(crate) struct Entries {
    pub(crate) map: BTreeMap<String, String>,
    pub(crate) used: usize,
}

impl Entries {
    pub(crate) fn from_map(map: BTreeMap<String, String>) -> Self {
        let used = map.iter().map(|(k, v)| k.len() + v.len()).sum();
        Self { map, used }
    }

    /// Insert `key`, failing with QuotaExceeded if usage would pass `quota`.
    /// Returns the replaced value so a caller can roll back.
    pub(crate) fn insert_within(
        &mut self,
        key: &str,
        value: &str,
        quota: Option<usize>,
    ) -> Result<Option<String>, HostError> {
        let released = self.map.get(key).map(|old| key.len() + old.len()).unwrap_or(0);
        let needed = self.used - released + key.len() + value.len();

        if let Some(limit) = quota {
            if needed > limit {
                return Err(HostError::quota_exceeded(format!(
                    "setting {:?} needs {} bytes, quota is {}",
                    key, needed, limit
                )));
            }
        }

        self.used = needed;
        Ok(self.map.insert(key.to_string(), value.to_string()))
    }

    pub(crate) fn remove(&mut self, key: &str) -> Option<String> {
        let old = self.map.remove(key)?;
        self.used -= key.len() + old.len();
        Some(old)
    }

    /// Undo an insert_within given what it returned
    pub(crate) fn restore(&mut self, key: &str, previous: Option<String>) {
        match previous {
            Some(value) => {
                self.remove(key);
                self.used += key.len() + value.len();
                self.map.insert(key.to_string(), value);
            }
            None => {
                self.remove(key);
            }
        }
    }
}

/// Host map that lives as long as the process
///
/// Used for the session scope.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<Entries>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: Option<usize>) -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
            quota,
        }
    }

    /// Bytes currently charged against the quota
    pub fn used_bytes(&self) -> usize {
        self.entries.read().used
    }
}

impl HostStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, HostError> {
        Ok(self.entries.read().map.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), HostError> {
        self.entries.write().insert_within(key, value, self.quota)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), HostError> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn len(&self) -> Result<usize, HostError> {
        Ok(self.entries.read().map.len())
    }

    fn key_at(&self, index: usize) -> Result<Option<String>, HostError> {
        Ok(self.entries.read().map.keys().nth(index).cloned())
    }

    fn clear(&self) -> Result<(), HostError> {
        *self.entries.write() = Entries::default();
        Ok(())
    }
}
