//! The [`KeyValueStore`] trait defining the uniform store interface.
//!
//! Any backend (in-memory, file-backed, remote) implements this trait;
//! callers choose a backend at construction time and never look behind the
//! trait boundary afterwards.

use stash_value::Value;

use crate::error::StoreResult;

/// Uniform key-value storage contract.
///
/// All implementations must satisfy these invariants:
/// - Every operation taking a key rejects the empty string with
///   `InvalidKey` before any I/O is attempted.
/// - Absence is distinct from null: `contains` reports `true` for a key
///   mapped to [`Value::Null`].
/// - `remove` is idempotent; removing an absent key returns `Ok(false)` and
///   leaves the key set unchanged.
/// - All errors are surfaced to the caller, never swallowed. No retries are
///   performed at this layer.
pub trait KeyValueStore: Send + Sync {
    /// Map `key` to `value`, replacing any previous value.
    ///
    /// Fails with `UnsupportedValue` if the backend's encoding cannot
    /// represent the value; no mutation is performed in that case.
    fn set(&self, key: &str, value: Value) -> StoreResult<()>;

    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key is absent; absence is not an error.
    fn get(&self, key: &str) -> StoreResult<Option<Value>>;

    /// Whether `key` is present (`true` even when mapped to null).
    fn contains(&self, key: &str) -> StoreResult<bool>;

    /// Remove `key` if present. Returns whether it was present.
    fn remove(&self, key: &str) -> StoreResult<bool>;

    /// Remove every key, leaving the store equivalent to a freshly created
    /// empty store.
    fn clear(&self) -> StoreResult<()>;

    /// Read the value stored under `key`, or `default` when absent.
    ///
    /// Returns `default` exactly when `contains(key)` is false.
    fn get_or(&self, key: &str, default: Value) -> StoreResult<Value> {
        Ok(self.get(key)?.unwrap_or(default))
    }
}
