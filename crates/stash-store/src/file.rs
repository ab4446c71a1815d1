//! File-backed store: one JSON document, rewritten whole on every mutation.
//!
//! [`FileStore`] owns a single file path. Each mutating operation reads the
//! entire current document, applies one logical change, re-encodes the full
//! key set, and atomically replaces the file (write to a temp file in the
//! destination directory, then rename). Reads decode the current document
//! and leave it untouched.
//!
//! There is no cross-process locking around the read-modify-write cycle:
//! concurrent writers to the same path race, and the last completed write
//! wins. Callers needing cross-process safety must serialize access
//! externally.
//!
//! An optional in-memory mirror ([`MemoryStore`]) fronts repeated reads:
//! populated eagerly on `set` and lazily on `get`, invalidated on `remove`,
//! wiped on `clear`. It never changes observable results, only latency.

use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use stash_value::Value;

use crate::codec::{self, Document};
use crate::error::{StoreError, StoreResult};
use crate::keys::validate_key;
use crate::memory::MemoryStore;
use crate::traits::KeyValueStore;

/// Backend name reported in value-restriction errors.
const BACKEND: &str = "file";

/// Configuration for [`FileStore`].
#[derive(Clone, Debug)]
pub struct FileStoreConfig {
    /// Keep an in-memory mirror of values already served, consulted before
    /// the file on reads and updated alongside it on writes.
    pub cache: bool,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self { cache: true }
    }
}

/// Durable key-value store over a single JSON document file.
///
/// The file need not exist up front: an absent or blank file reads as the
/// empty store, and the first persisted mutation creates the file along
/// with any missing parent directories.
pub struct FileStore {
    path: PathBuf,
    mirror: Option<MemoryStore>,
}

impl FileStore {
    /// Open a store over `path`.
    ///
    /// Fails with `InvalidPath` if the path is empty. No I/O happens here;
    /// the file is first touched by the first operation.
    pub fn open(path: impl Into<PathBuf>, config: FileStoreConfig) -> StoreResult<Self> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(StoreError::InvalidPath(
                "backing path must not be empty".to_string(),
            ));
        }
        Ok(Self {
            path,
            mirror: config.cache.then(MemoryStore::new),
        })
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decode the current on-disk document. An absent or blank file is the
    /// empty document; malformed contents abort with a `Read` error before
    /// any mutation is attempted.
    fn load(&self) -> StoreResult<Document> {
        match fs::read_to_string(&self.path) {
            Ok(text) => codec::decode_document(&text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Document::new()),
            Err(e) => Err(StoreError::Read(e.to_string())),
        }
    }

    /// Re-encode the full document and replace the backing file.
    ///
    /// Replacement is temp-file-then-rename in the destination directory, so
    /// a failed write leaves the previously persisted document intact.
    fn persist(&self, doc: &Document) -> StoreResult<()> {
        let text = codec::encode_document(doc)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| StoreError::Write(e.to_string()))?;
        let mut staged = NamedTempFile::new_in(dir).map_err(|e| StoreError::Write(e.to_string()))?;
        staged
            .write_all(text.as_bytes())
            .map_err(|e| StoreError::Write(e.to_string()))?;
        staged
            .persist(&self.path)
            .map_err(|e| StoreError::Write(e.to_string()))?;
        debug!(path = %self.path.display(), entries = doc.len(), "document persisted");
        Ok(())
    }
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("path", &self.path)
            .field("mirrored", &self.mirror.is_some())
            .finish()
    }
}

impl KeyValueStore for FileStore {
    fn set(&self, key: &str, value: Value) -> StoreResult<()> {
        validate_key(key)?;
        // Encode before touching the file so an unrepresentable value can
        // never disturb the persisted document.
        let raw = codec::encode_value(&value, BACKEND)?;
        let mut doc = self.load()?;
        doc.insert(key.to_string(), raw);
        self.persist(&doc)?;
        if let Some(mirror) = &self.mirror {
            mirror.insert_entry(key, value);
        }
        Ok(())
    }

    fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        validate_key(key)?;
        if let Some(mirror) = &self.mirror {
            if let Some(hit) = mirror.lookup_entry(key) {
                return Ok(Some(hit));
            }
        }
        let doc = self.load()?;
        let Some(raw) = doc.get(key) else {
            return Ok(None);
        };
        let value = codec::decode_value(raw)?;
        if let Some(mirror) = &self.mirror {
            mirror.insert_entry(key, value.clone());
        }
        Ok(Some(value))
    }

    fn contains(&self, key: &str) -> StoreResult<bool> {
        validate_key(key)?;
        if let Some(mirror) = &self.mirror {
            if mirror.contains_entry(key) {
                return Ok(true);
            }
        }
        Ok(self.load()?.contains_key(key))
    }

    fn remove(&self, key: &str) -> StoreResult<bool> {
        validate_key(key)?;
        let mut doc = self.load()?;
        let was_present = doc.remove(key).is_some();
        if was_present {
            self.persist(&doc)?;
        }
        if let Some(mirror) = &self.mirror {
            mirror.remove_entry(key);
        }
        Ok(was_present)
    }

    fn clear(&self) -> StoreResult<()> {
        // The result state is independent of the current document, so the
        // file is not decoded first; clearing also recovers a store whose
        // document has been corrupted.
        self.persist(&Document::new())?;
        if let Some(mirror) = &self.mirror {
            mirror.clear_entries();
        }
        Ok(())
    }
}
