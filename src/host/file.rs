//! Snapshot-backed host map
//!
//! Keeps the whole map in memory and rewrites a snapshot file on every
//! mutation, so contents survive a restart. Used for the persistent scope.
//!
//! ## File Format
//! ```text
//! ┌───────────┬─────────────┬───────────┬───────────┬──────────────────┐
//! │ Magic (4) │ Version (2) │ CRC32 (4) │ Len (8)   │ bincode payload  │
//! └───────────┴─────────────┴───────────┴───────────┴──────────────────┘
//! ```
//! The CRC covers the payload only. A snapshot is written to a sibling
//! `.tmp` file and renamed into place.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{HostKvError, Result};

use super::memory::Entries;
use super::{HostError, HostErrorKind, HostStorage};

const MAGIC: &[u8; 4] = b"HKVS";
const VERSION: u16 = 1;
const HEADER_SIZE: usize = 4 + 2 + 4 + 8;

/// Payload of a snapshot file
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    entries: BTreeMap<String, String>,
}

/// Host map persisted to a snapshot file
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: RwLock<Entries>,
    quota: Option<usize>,
}

impl FileStorage {
    /// Open the snapshot at `path`, or start empty if there is none
    pub fn open(path: impl Into<PathBuf>, quota: Option<usize>) -> Result<Self> {
        let path = path.into();

        let map = if path.exists() {
            let bytes = fs::read(&path)?;
            let map = Self::decode_snapshot(&bytes)?;
            debug!(path = %path.display(), entries = map.len(), "loaded persistent map");
            map
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            entries: RwLock::new(Entries::from_map(map)),
            quota,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // =========================================================================
    // Snapshot Encoding
    // =========================================================================

    fn encode_snapshot(map: &BTreeMap<String, String>) -> std::result::Result<Vec<u8>, HostError> {
        let snapshot = Snapshot {
            entries: map.clone(),
        };
        let payload = bincode::serialize(&snapshot)
            .map_err(|e| HostError::new(HostErrorKind::Io, format!("serialize snapshot: {}", e)))?;

        let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&VERSION.to_le_bytes());
        out.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
        out.extend_from_slice(&(payload.len() as u64).to_le_bytes());
        out.extend_from_slice(&payload);
        Ok(out)
    }

    fn decode_snapshot(bytes: &[u8]) -> Result<BTreeMap<String, String>> {
        if bytes.len() < HEADER_SIZE {
            return Err(HostKvError::Corruption(format!(
                "snapshot is {} bytes, shorter than its header",
                bytes.len()
            )));
        }
        if &bytes[0..4] != MAGIC {
            return Err(HostKvError::Corruption("bad snapshot magic".to_string()));
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != VERSION {
            return Err(HostKvError::Corruption(format!(
                "unsupported snapshot version {}",
                version
            )));
        }

        let mut crc = [0u8; 4];
        crc.copy_from_slice(&bytes[6..10]);
        let expected_crc = u32::from_le_bytes(crc);

        let mut len = [0u8; 8];
        len.copy_from_slice(&bytes[10..18]);
        let len = u64::from_le_bytes(len) as usize;

        let payload = &bytes[HEADER_SIZE..];
        if payload.len() != len {
            return Err(HostKvError::Corruption(format!(
                "snapshot payload is {} bytes, header says {}",
                payload.len(),
                len
            )));
        }
        if crc32fast::hash(payload) != expected_crc {
            return Err(HostKvError::Corruption("snapshot checksum mismatch".to_string()));
        }

        let snapshot: Snapshot = bincode::deserialize(payload)
            .map_err(|e| HostKvError::Serialization(e.to_string()))?;
        Ok(snapshot.entries)
    }

    fn persist(&self, map: &BTreeMap<String, String>) -> std::result::Result<(), HostError> {
        let bytes = Self::encode_snapshot(map)?;
        let tmp = self.path.with_extension("tmp");

        let written = File::create(&tmp)
            .and_then(|mut file| {
                file.write_all(&bytes)?;
                file.sync_all()
            })
            .and_then(|()| fs::rename(&tmp, &self.path));

        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

impl HostStorage for FileStorage {
    fn get_item(&self, key: &str) -> std::result::Result<Option<String>, HostError> {
        Ok(self.entries.read().map.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> std::result::Result<(), HostError> {
        let mut entries = self.entries.write();
        let previous = entries.insert_within(key, value, self.quota)?;

        if let Err(e) = self.persist(&entries.map) {
            entries.restore(key, previous);
            return Err(e);
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> std::result::Result<(), HostError> {
        let mut entries = self.entries.write();
        let Some(previous) = entries.remove(key) else {
            return Ok(());
        };

        if let Err(e) = self.persist(&entries.map) {
            entries.restore(key, Some(previous));
            return Err(e);
        }
        Ok(())
    }

    fn len(&self) -> std::result::Result<usize, HostError> {
        Ok(self.entries.read().map.len())
    }

    fn key_at(&self, index: usize) -> std::result::Result<Option<String>, HostError> {
        Ok(self.entries.read().map.keys().nth(index).cloned())
    }

    fn clear(&self) -> std::result::Result<(), HostError> {
        let mut entries = self.entries.write();
        self.persist(&BTreeMap::new())?;
        *entries = Entries::default();
        Ok(())
    }
}
