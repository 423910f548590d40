//! # hostkv
//!
//! Storage virtualization for a database engine running inside a sandboxed
//! host. Two backends share one addressing scheme:
//! - A flat key/value backend split across a session-scoped and a
//!   persistent-scoped host map
//! - A hierarchical backend, created lazily and mounted at a one-component
//!   path in the host's virtual tree
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Database Engine                          │
//! │            (read / write / delete / unlink / mount)          │
//! └──────────────┬──────────────────────────────┬───────────────┘
//!                │                              │
//!                ▼                              ▼
//!   ┌───────────────────────┐        ┌───────────────────────┐
//!   │      KvBackend        │        │    DriverRegistry     │
//!   │ (class → session or   │        │  unlink via default   │
//!   │   persistent map)     │        └───────────┬───────────┘
//!   └──────────┬────────────┘                    │
//!              │                                 ▼
//!   ┌──────────▼────────────┐        ┌───────────────────────┐
//!   │      KeyCodec         │        │     OpfsBackend       │
//!   │ kvvfs-<class>-<key>   │        │ (once-init + mount)   │
//!   └──────────┬────────────┘        └───────────┬───────────┘
//!              │                                 │
//!              ▼                                 ▼
//!   ┌───────────────────────┐        ┌───────────────────────┐
//!   │  HostStorage maps     │        │   HostFileSystem      │
//!   └───────────────────────┘        └───────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod host;
pub mod scratch;
pub mod keycodec;
pub mod codec;
pub mod kv;
pub mod opfs;
pub mod vfs;
pub mod runtime;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{HostKvError, Result, ResultCode};
pub use config::Config;
pub use keycodec::{KeyCodec, StorageKey};
pub use kv::{KvBackend, StorageClass, KEY_NOT_FOUND};
pub use opfs::{MountState, OpfsBackend};
pub use runtime::Runtime;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of hostkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
