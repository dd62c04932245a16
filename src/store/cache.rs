use std::collections::HashMap;
use std::sync::Mutex;

use super::Store;
use crate::error::StoreError;

/// Memoizes successful reads of an inner store.
///
/// Faults are not cached, so a transient failure is retried on the next read.
#[derive(Debug)]
pub struct CachedStore<S> {
    inner: S,
    reads: Mutex<HashMap<String, Option<Vec<u8>>>>,
}

impl<S: Store> CachedStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            reads: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Number of distinct keys answered so far.
    pub fn cached_keys(&self) -> usize {
        self.reads.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl<S: Store> Store for CachedStore<S> {
    fn uri(&self) -> &str {
        self.inner.uri()
    }

    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        if let Some(hit) = self
            .reads
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
        {
            return Ok(hit.clone());
        }
        let value = self.inner.read(key)?;
        self.reads
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.clone());
        Ok(value)
    }

    fn list_children(&self, path: &str) -> Result<Option<Vec<String>>, StoreError> {
        self.inner.list_children(path)
    }

    fn fs_path(&self, path: &str) -> String {
        self.inner.fs_path(path)
    }
}
