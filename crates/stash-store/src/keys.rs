//! Key validation shared by every backend.
//!
//! A key is any non-empty string. Absence of a key is observably distinct
//! from a key mapped to the null value, so the empty string cannot be
//! allowed to alias "no key". Validation runs before any I/O.

use crate::error::{StoreError, StoreResult};

/// Validate a store key, returning `Ok(())` if usable.
///
/// # Examples
///
/// ```
/// use stash_store::keys::validate_key;
///
/// assert!(validate_key("session/current").is_ok());
/// assert!(validate_key("").is_err());
/// ```
pub fn validate_key(key: &str) -> StoreResult<()> {
    if key.is_empty() {
        return Err(StoreError::InvalidKey {
            reason: "key must be a non-empty string".to_string(),
        });
    }
    Ok(())
}
