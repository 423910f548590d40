//! Key/Value Backend
//!
//! Stores payloads in one of two host maps, addressed by (class, key).
//!
//! ## Dispatch
//! A class whose first byte is `s` goes to the session-scoped map. Every
//! other class, including the empty one, goes to the persistent-scoped map.
//! `"session"` and `"s"` land in the same place, and so do `"local"` and
//! `"p"`.
//!
//! ## Boundary Rules
//! - The derived key is built in a scratch frame that is released on every
//!   exit path
//! - Each host call runs under [`host::guard`]; host errors and panics come
//!   back as this module's own failures and never propagate further
//!
//! ## Payloads
//! Payloads are treated as one byte per character. ASCII round-trips
//! exactly. Bytes that are not valid UTF-8 are replaced on write, and lengths
//! of multi-byte payloads are byte lengths; neither case is supported. Use
//! [`KvBackend::write_encoded`] for arbitrary binary data.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::codec;
use crate::error::{HostKvError, Result};
use crate::host::{self, HostStorage};
use crate::keycodec::KeyCodec;
use crate::scratch::ScratchStack;

/// Returned by [`KvBackend::read`] when the key is absent or unreadable
pub const KEY_NOT_FOUND: isize = -1;

/// Which host map a class addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageClass {
    Session,
    Persistent,
}

impl StorageClass {
    /// Case-sensitive test of the class's first byte against `s`
    pub fn of(class: &str) -> Self {
        match class.as_bytes().first() {
            Some(b's') => StorageClass::Session,
            _ => StorageClass::Persistent,
        }
    }
}

/// Flat key/value backend over the session and persistent host maps
pub struct KvBackend {
    codec: KeyCodec,
    session: Arc<dyn HostStorage>,
    persistent: Arc<dyn HostStorage>,
    scratch: ScratchStack,
}

impl KvBackend {
    pub fn new(
        codec: KeyCodec,
        session: Arc<dyn HostStorage>,
        persistent: Arc<dyn HostStorage>,
        scratch_capacity: usize,
    ) -> Self {
        Self {
            codec,
            session,
            persistent,
            scratch: ScratchStack::new(scratch_capacity),
        }
    }

    /// The host map `class` addresses
    pub fn store(&self, class: StorageClass) -> &dyn HostStorage {
        match class {
            StorageClass::Session => self.session.as_ref(),
            StorageClass::Persistent => self.persistent.as_ref(),
        }
    }

    pub fn codec(&self) -> &KeyCodec {
        &self.codec
    }

    pub fn scratch(&self) -> &ScratchStack {
        &self.scratch
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Store `data` under `class`/`key`.
    ///
    /// Fails with OutOfMemory if the key cannot be built and with an
    /// I/O-class error if the host map rejects the write.
    pub fn write(&self, class: &str, key: &str, data: &[u8]) -> Result<()> {
        let store = self.store(StorageClass::of(class));
        let value = String::from_utf8_lossy(data);

        self.with_storage_key(class, key, |storage_key| {
            debug!(key = storage_key, len = data.len(), "kv write");
            host::guard("set_item", || store.set_item(storage_key, &value)).map_err(|e| {
                warn!(key = storage_key, error = %e, "kv write rejected by host");
                HostKvError::host("set_item", e)
            })
        })
    }

    /// Fetch the full stored value, if any
    pub fn get(&self, class: &str, key: &str) -> Result<Option<Bytes>> {
        let store = self.store(StorageClass::of(class));

        self.with_storage_key(class, key, |storage_key| {
            let value = host::guard("get_item", || store.get_item(storage_key)).map_err(|e| {
                warn!(key = storage_key, error = %e, "kv read failed in host");
                HostKvError::host("get_item", e)
            })?;
            Ok(value.map(|v| Bytes::from(v.into_bytes())))
        })
    }

    /// Copy the value for `class`/`key` into `buf`, NUL-terminated.
    ///
    /// With capacity `buf.len()`:
    /// - absent key (or any failure) → [`KEY_NOT_FOUND`]
    /// - capacity 0 → full stored length, nothing written
    /// - capacity 1 → full stored length, `buf[0] = 0`
    /// - otherwise → `min(len, capacity - 1)` bytes copied and that count
    ///   returned; a truncated copy reports the truncated count
    pub fn read(&self, class: &str, key: &str, buf: &mut [u8]) -> isize {
        match self.get(class, key) {
            Ok(Some(value)) => copy_terminated(&value, buf),
            Ok(None) => KEY_NOT_FOUND,
            Err(e) => {
                debug!(class, key, error = %e, "kv read reporting not found");
                KEY_NOT_FOUND
            }
        }
    }

    /// Remove `class`/`key`. Removing an absent key succeeds.
    pub fn delete(&self, class: &str, key: &str) -> Result<()> {
        let store = self.store(StorageClass::of(class));

        self.with_storage_key(class, key, |storage_key| {
            debug!(key = storage_key, "kv delete");
            host::guard("remove_item", || store.remove_item(storage_key)).map_err(|e| {
                warn!(key = storage_key, error = %e, "kv delete rejected by host");
                HostKvError::host("remove_item", e)
            })
        })
    }

    // =========================================================================
    // Whole-class Operations
    // =========================================================================

    /// Remove every entry stored under `class`, returning how many went.
    ///
    /// Entries belonging to other classes or to unrelated code sharing the
    /// host map are left alone.
    pub fn clear_storage(&self, class: &str) -> Result<usize> {
        let store = self.store(StorageClass::of(class));
        let keys = self.class_keys(store, class)?;

        for storage_key in &keys {
            host::guard("remove_item", || store.remove_item(storage_key))
                .map_err(|e| HostKvError::host("remove_item", e))?;
        }
        debug!(class, removed = keys.len(), "cleared storage class");
        Ok(keys.len())
    }

    /// Bytes used by `class`, counting both storage keys and values
    pub fn storage_size(&self, class: &str) -> Result<usize> {
        let store = self.store(StorageClass::of(class));
        let mut total = 0;

        for storage_key in self.class_keys(store, class)? {
            let value = host::guard("get_item", || store.get_item(&storage_key))
                .map_err(|e| HostKvError::host("get_item", e))?;
            total += storage_key.len() + value.map_or(0, |v| v.len());
        }
        Ok(total)
    }

    // =========================================================================
    // Binary-safe Variants
    // =========================================================================

    /// Store arbitrary bytes using the text codec
    pub fn write_encoded(&self, class: &str, key: &str, data: &[u8]) -> Result<()> {
        let text = codec::encode(data);
        self.write(class, key, text.as_bytes())
    }

    /// Read back a value stored with [`write_encoded`](Self::write_encoded)
    pub fn read_decoded(&self, class: &str, key: &str) -> Result<Option<Vec<u8>>> {
        let Some(value) = self.get(class, key)? else {
            return Ok(None);
        };
        let text = std::str::from_utf8(&value)
            .map_err(|e| HostKvError::Corruption(format!("encoded value is not text: {}", e)))?;
        codec::decode(text).map(Some)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Storage keys in `store` that belong to `class`
    fn class_keys(&self, store: &dyn HostStorage, class: &str) -> Result<Vec<String>> {
        let prefix = format!("{}-{}-", self.codec.prefix(), class);
        let len = host::guard("len", || store.len()).map_err(|e| HostKvError::host("len", e))?;

        let mut keys = Vec::new();
        for index in 0..len {
            let key = host::guard("key_at", || store.key_at(index))
                .map_err(|e| HostKvError::host("key_at", e))?;
            if let Some(key) = key.filter(|k| k.starts_with(&prefix)) {
                keys.push(key);
            }
        }
        Ok(keys)
    }

    /// Build the storage key in a scratch frame and hand it to `op`.
    /// The frame is released when this returns, whatever `op` did.
    fn with_storage_key<T>(
        &self,
        class: &str,
        key: &str,
        op: impl FnOnce(&str) -> Result<T>,
    ) -> Result<T> {
        let mut frame = self.scratch.frame();
        let capacity = self.codec.derive_into(class, key, None);

        let buf = frame.alloc(capacity).ok_or_else(|| {
            HostKvError::OutOfMemory(format!(
                "no scratch space for a {}-byte storage key",
                capacity
            ))
        })?;

        let len = self.codec.derive_into(class, key, Some(&mut *buf));
        let storage_key = std::str::from_utf8(&buf[..len])
            .map_err(|e| HostKvError::Misuse(format!("storage key is not text: {}", e)))?;

        op(storage_key)
    }
}

fn copy_terminated(value: &[u8], buf: &mut [u8]) -> isize {
    let len = value.len();
    match buf.len() {
        0 => len as isize,
        1 => {
            buf[0] = 0;
            len as isize
        }
        capacity => {
            let n = len.min(capacity - 1);
            buf[..n].copy_from_slice(&value[..n]);
            buf[n] = 0;
            n as isize
        }
    }
}
