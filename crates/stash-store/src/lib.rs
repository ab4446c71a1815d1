//! Uniform key-value storage with interchangeable backends.
//!
//! Callers speak only to the [`KeyValueStore`] trait; the backend is chosen
//! at construction time:
//!
//! - [`MemoryStore`] -- plain in-process mapping, no persistence, no value
//!   restrictions
//! - [`FileStore`] -- one JSON document on disk, whole-file rewrite per
//!   mutation, optional in-memory mirror for repeated reads
//! - [`RemoteStore`] -- synchronous adapter for an external caching service
//!
//! # Design Rules
//!
//! 1. Keys are non-empty strings; the empty key is rejected before any I/O.
//! 2. Absence is distinct from null: `contains` is true for a key mapped to
//!    [`Value::Null`].
//! 3. The file backend's document is always the exact encoding of the full
//!    key set after each operation -- full rewrite, never an incremental
//!    patch.
//! 4. A value the encoding cannot represent is rejected whole; the
//!    persisted document is never disturbed by a failed write.
//! 5. All errors are surfaced to the caller, never silently swallowed;
//!    retry policy belongs to the caller.
//! 6. No cross-process coordination: concurrent writers to one backing
//!    file race, and the last completed whole-file write wins.

pub mod codec;
pub mod error;
pub mod file;
pub mod keys;
pub mod memory;
pub mod remote;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use codec::Document;
pub use error::{StoreError, StoreResult};
pub use file::{FileStore, FileStoreConfig};
pub use memory::MemoryStore;
pub use remote::RemoteStore;
pub use stash_value::Value;
pub use traits::KeyValueStore;
