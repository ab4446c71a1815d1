//! Error types for store operations.

use thiserror::Error;

/// Errors that can occur across the storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The supplied key failed validation.
    #[error("invalid key: {reason}")]
    InvalidKey { reason: String },

    /// The backing path supplied at construction is unusable.
    #[error("invalid store path: {0}")]
    InvalidPath(String),

    /// The value's kind or magnitude cannot be represented by the backend's
    /// encoding. The mutation is not persisted.
    #[error("{backend} store cannot represent {kind} value: {reason}")]
    UnsupportedValue {
        backend: &'static str,
        kind: &'static str,
        reason: String,
    },

    /// Serialization of an otherwise supported value failed; carries the
    /// underlying cause.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Backing storage could not be read or decoded. The operation aborted
    /// with no mutation applied.
    #[error("read failed: {0}")]
    Read(String),

    /// Backing storage could not be written (I/O error, permission, disk
    /// full). The previously persisted state is left intact.
    #[error("write failed: {0}")]
    Write(String),

    /// The remote service could not be reached at construction time.
    #[error("remote store unavailable at {addr}: {reason}")]
    Unavailable { addr: String, reason: String },
}

/// Convenience alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
