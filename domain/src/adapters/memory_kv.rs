use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::{CoreError, KeyValueStore};

/// In-memory key-value store. Clones share the same map, so a test can keep
/// a handle while the store owns another.
///
/// Reads and writes can be made to fail on demand to exercise recovery paths.
#[derive(Clone, Default)]
pub struct InMemoryKv {
    inner: Arc<Shared>,
}

#[derive(Default)]
struct Shared {
    map: Mutex<BTreeMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicU64,
}

impl InMemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, on: bool) {
        self.inner.fail_reads.store(on, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, on: bool) {
        self.inner.fail_writes.store(on, Ordering::SeqCst);
    }

    /// Number of successful `set` calls so far.
    pub fn writes(&self) -> u64 {
        self.inner.writes.load(Ordering::SeqCst)
    }
}

impl KeyValueStore for InMemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        if self.inner.fail_reads.load(Ordering::SeqCst) {
            return Err(CoreError::StorageRead("injected read failure".into()));
        }
        let map = self
            .inner
            .map
            .lock()
            .map_err(|_| CoreError::StorageRead("mutex poisoned".into()))?;
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(CoreError::StorageWrite("injected write failure".into()));
        }
        let mut map = self
            .inner
            .map
            .lock()
            .map_err(|_| CoreError::StorageWrite("mutex poisoned".into()))?;
        map.insert(key.to_string(), value.to_string());
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_value() {
        let kv = InMemoryKv::new();
        assert_eq!(kv.get("planets").unwrap(), None);
        kv.set("planets", "[]").unwrap();
        kv.set("planets", "[1]").unwrap();
        assert_eq!(kv.get("planets").unwrap().as_deref(), Some("[1]"));
        assert_eq!(kv.writes(), 2);
    }

    #[test]
    fn clones_share_state() {
        let a = InMemoryKv::new();
        let b = a.clone();
        a.set("k", "v").unwrap();
        assert_eq!(b.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn injected_failures() {
        let kv = InMemoryKv::new();
        kv.fail_writes(true);
        assert!(matches!(kv.set("k", "v"), Err(CoreError::StorageWrite(_))));
        assert_eq!(kv.writes(), 0);
        kv.fail_reads(true);
        assert!(matches!(kv.get("k"), Err(CoreError::StorageRead(_))));
    }
}
