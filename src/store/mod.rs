//! Document store integration: the sink trait, Firestore client, and in-memory sink.

pub mod client;
pub mod encode;
pub mod memory;
pub mod types;

pub use client::FirestoreService;
pub use encode::encode_document;
pub use memory::MemorySink;
pub use types::StoreError;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Destination for migrated documents.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    /// Write `document` under `collection/id`, replacing any existing document at that key.
    async fn set_document(
        &self,
        collection: &str,
        id: &str,
        document: &Value,
    ) -> Result<(), StoreError>;
}

#[async_trait]
impl<T> DocumentSink for Arc<T>
where
    T: DocumentSink + ?Sized,
{
    async fn set_document(
        &self,
        collection: &str,
        id: &str,
        document: &Value,
    ) -> Result<(), StoreError> {
        (**self).set_document(collection, id, document).await
    }
}
