//! Store wrapper with injectable write failures
//!
//! Used by tests and support tooling to exercise persistence-failure paths.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::domain::result::{Error, Result};
use crate::ports::KeyValueStore;

/// Delegates to an inner store, failing writes to keys with an armed prefix
pub struct FlakyStore {
    inner: Arc<dyn KeyValueStore>,
    failing_prefixes: Mutex<Vec<String>>,
    fail_all: AtomicBool,
}

impl FlakyStore {
    pub fn new(inner: Arc<dyn KeyValueStore>) -> Self {
        Self {
            inner,
            failing_prefixes: Mutex::new(Vec::new()),
            fail_all: AtomicBool::new(false),
        }
    }

    /// Fail every subsequent write to keys starting with `prefix`
    pub fn fail_writes_to(&self, prefix: impl Into<String>) {
        if let Ok(mut prefixes) = self.failing_prefixes.lock() {
            prefixes.push(prefix.into());
        }
    }

    /// Fail every subsequent write regardless of key
    pub fn fail_all_writes(&self) {
        self.fail_all.store(true, Ordering::SeqCst);
    }

    /// Stop injecting failures
    pub fn heal(&self) {
        self.fail_all.store(false, Ordering::SeqCst);
        if let Ok(mut prefixes) = self.failing_prefixes.lock() {
            prefixes.clear();
        }
    }

    fn check(&self, key: &str) -> Result<()> {
        let armed = self.fail_all.load(Ordering::SeqCst)
            || self
                .failing_prefixes
                .lock()
                .map(|p| p.iter().any(|prefix| key.starts_with(prefix.as_str())))
                .unwrap_or(true);
        if armed {
            return Err(Error::persistence(key, "injected write failure"));
        }
        Ok(())
    }
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check(key)?;
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.check(key)?;
        self.inner.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;

    #[test]
    fn test_prefix_failures_and_heal() {
        let store = FlakyStore::new(Arc::new(MemoryStore::new()));
        store.fail_writes_to("savedItems:");

        assert!(store.set("savedItems:u1", "[]").is_err());
        assert!(store.set("userTier", "premium").is_ok());

        store.heal();
        assert!(store.set("savedItems:u1", "[]").is_ok());
        assert_eq!(store.get("savedItems:u1").unwrap().as_deref(), Some("[]"));
    }
}
