use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use super::Store;
use crate::error::StoreError;

/// An in-memory store, for tests and for embedding metadata that never
/// touched a disk.
///
/// Keys can be marked as failing to simulate unreachable remote nodes.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    uri: String,
    entries: BTreeMap<String, Vec<u8>>,
    failing: BTreeSet<String>,
}

impl MemoryStore {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            entries: BTreeMap::new(),
            failing: BTreeSet::new(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, bytes: Vec<u8>) {
        self.entries.insert(key.into(), bytes);
    }

    pub fn insert_json(&mut self, key: impl Into<String>, value: &Value) {
        self.insert(key, value.to_string().into_bytes());
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<u8>> {
        self.entries.remove(key)
    }

    /// Makes every read of `key` fail as unreachable.
    pub fn fail_key(&mut self, key: impl Into<String>) {
        self.failing.insert(key.into());
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl Store for MemoryStore {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        if self.failing.contains(key) {
            return Err(StoreError::Unreachable {
                key: key.to_string(),
                message: "simulated failure".to_string(),
            });
        }
        Ok(self.entries.get(key).cloned())
    }

    fn list_children(&self, path: &str) -> Result<Option<Vec<String>>, StoreError> {
        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{}/", path)
        };
        let children: BTreeSet<String> = self
            .entries
            .keys()
            .filter_map(|key| key.strip_prefix(&prefix))
            .filter_map(|rest| rest.split_once('/').map(|(child, _)| child.to_string()))
            .collect();
        Ok(Some(children.into_iter().collect()))
    }
}
