//! Key-value store port - the "local storage" the core persists into

use crate::domain::result::Result;

/// String key-value storage abstraction
///
/// Shared process-wide. The quota tracker, tier resolver, session and
/// saved-items ledger each own disjoint key namespaces. Writes must have
/// landed when `set`/`remove` return `Ok`.
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` when the key is absent
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or overwrite a value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a key. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
