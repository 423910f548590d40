//! Storage key derivation
//!
//! Builds the fully-qualified key a value is stored under in a host map.
//!
//! ## Key Format
//! ```text
//! ┌──────────┬───┬─────────┬───┬──────────────┬─────┐
//! │  prefix  │ - │  class  │ - │     key      │ NUL │
//! └──────────┴───┴─────────┴───┴──────────────┴─────┘
//!  <───────────── at most capacity - 1 ─────────────>
//! ```
//!
//! ## Truncation
//! The text is cut to `capacity - 1` bytes the way `snprintf` does it: the
//! tail of the logical key goes first, then the class. The prefix always
//! survives because [`Config::validate`](crate::Config::validate) guarantees
//! room for it. A cut never splits a UTF-8 sequence; it backs off to the
//! previous character boundary instead.

use std::fmt;

/// Prefix every storage key starts with
pub const DEFAULT_KEY_PREFIX: &str = "kvvfs";

/// Key capacity in bytes, terminator included (31 usable characters)
pub const DEFAULT_KEY_CAPACITY: usize = 32;

/// A derived, possibly truncated, storage key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derives storage keys from (class, key) pairs
#[derive(Debug, Clone)]
pub struct KeyCodec {
    prefix: String,
    capacity: usize,
}

impl KeyCodec {
    /// A codec whose keys fit in `capacity` bytes, terminator included.
    ///
    /// The prefix always survives truncation, so `capacity` is raised to
    /// [`min_capacity`](Self::min_capacity) when it is smaller.
    pub fn new(prefix: impl Into<String>, capacity: usize) -> Self {
        let prefix = prefix.into();
        let capacity = capacity.max(Self::min_capacity(&prefix));
        Self { prefix, capacity }
    }

    /// Smallest capacity that holds `prefix`, its separator and the NUL
    pub fn min_capacity(prefix: &str) -> usize {
        prefix.len() + 2
    }

    /// Bytes a caller must reserve for a key, terminator included
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Derive the storage key for `class`/`key`
    pub fn derive(&self, class: &str, key: &str) -> StorageKey {
        let budget = self.capacity.saturating_sub(1);
        let mut out = String::with_capacity(budget);
        for part in self.segments(class, key, budget) {
            out.push_str(part);
        }
        StorageKey(out)
    }

    /// Write the key into a caller-owned buffer, NUL-terminated.
    ///
    /// With `None` or an empty buffer nothing is written and the required
    /// capacity is returned so the caller can size its allocation. Otherwise
    /// the number of key bytes written (terminator excluded) is returned. A
    /// buffer shorter than [`capacity`](Self::capacity) truncates further.
    pub fn derive_into(&self, class: &str, key: &str, out: Option<&mut [u8]>) -> usize {
        let out = match out {
            Some(buf) if !buf.is_empty() => buf,
            _ => return self.capacity,
        };

        let budget = out.len().min(self.capacity).saturating_sub(1);
        let mut written = 0;
        for part in self.segments(class, key, budget) {
            out[written..written + part.len()].copy_from_slice(part.as_bytes());
            written += part.len();
        }
        out[written] = 0;
        written
    }

    /// The key's parts, each cut so the total stays within `budget` bytes.
    /// Once one part is cut, every later part is empty.
    fn segments<'a>(
        &'a self,
        class: &'a str,
        key: &'a str,
        budget: usize,
    ) -> impl Iterator<Item = &'a str> + 'a {
        let mut room = budget;
        [self.prefix.as_str(), "-", class, "-", key]
            .into_iter()
            .map(move |part| {
                if part.len() <= room {
                    room -= part.len();
                    return part;
                }
                let mut cut = room;
                while !part.is_char_boundary(cut) {
                    cut -= 1;
                }
                room = 0;
                &part[..cut]
            })
    }
}

impl Default for KeyCodec {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_PREFIX, DEFAULT_KEY_CAPACITY)
    }
}
