use super::{KeyValueStore, PrefValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// In-memory preference store
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct MemoryStore {
    values: BTreeMap<String, PrefValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<PrefValue> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: PrefValue) {
        self.values.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }
}
