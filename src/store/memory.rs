//! In-memory [`DocumentSink`] used by tests and dry runs.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{DocumentSink, StoreError};

type Collections = BTreeMap<String, BTreeMap<String, Value>>;

/// Document sink that keeps every write in memory, keyed by collection and id.
#[derive(Debug, Default)]
pub struct MemorySink {
    collections: Mutex<Collections>,
    failing: Mutex<HashSet<(String, String)>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make writes to `collection/id` fail with [`StoreError::Rejected`].
    pub fn fail_writes_to(&self, collection: &str, id: &str) {
        lock(&self.failing).insert((collection.to_string(), id.to_string()));
    }

    /// Return the document stored at `collection/id`.
    pub fn document(&self, collection: &str, id: &str) -> Option<Value> {
        lock(&self.collections)
            .get(collection)
            .and_then(|documents| documents.get(id))
            .cloned()
    }

    /// Return the ids stored in `collection`, sorted.
    pub fn ids(&self, collection: &str) -> Vec<String> {
        lock(&self.collections)
            .get(collection)
            .map(|documents| documents.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentSink for MemorySink {
    async fn set_document(
        &self,
        collection: &str,
        id: &str,
        document: &Value,
    ) -> Result<(), StoreError> {
        if lock(&self.failing).contains(&(collection.to_string(), id.to_string())) {
            return Err(StoreError::Rejected(format!("{collection}/{id}")));
        }
        if !document.is_object() {
            return Err(StoreError::NotAnObject);
        }
        lock(&self.collections)
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), document.clone());
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
