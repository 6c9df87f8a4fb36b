//! The settings-store seam.

use std::collections::HashMap;

/// Key/value settings storage, injected by the orchestrator.
///
/// Implementations decide persistence; the core only reads and writes
/// string values under string keys.
pub trait SettingsStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn clear(&mut self, key: &str);
}

/// In-memory store, for tests and ephemeral sessions.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    fn clear(&mut self, key: &str) {
        self.values.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("k"), None);
        store.set("k", "v");
        assert_eq!(store.get("k"), Some("v".to_string()));
        store.set("k", "w");
        assert_eq!(store.get("k"), Some("w".to_string()));
        store.clear("k");
        assert_eq!(store.get("k"), None);
    }
}
