//! In-process draft store.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::DraftStore;

/// [`DraftStore`] backed by a map in memory. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryDraftStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DraftStore for MemoryDraftStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_owned(), value.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn test_set_and_get() {
        let store = MemoryDraftStore::new();
        assert_eq!(store.get("key"), None);

        store.set("key", "first");
        store.set("key", "second");
        assert_eq!(store.get("key").as_deref(), Some("second"));
    }

    #[test]
    fn test_keys_are_isolated() {
        let store = MemoryDraftStore::new();
        store.set("a", "alpha");
        store.set("b", "beta");

        assert_eq!(store.get("a").as_deref(), Some("alpha"));
        assert_eq!(store.get("b").as_deref(), Some("beta"));
    }

    #[test]
    fn test_shared_across_threads() {
        let store = Arc::new(MemoryDraftStore::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.set(&format!("key-{i}"), "value"))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        for i in 0..4 {
            assert_eq!(store.get(&format!("key-{i}")).as_deref(), Some("value"));
        }
    }
}
