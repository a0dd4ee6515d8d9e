//! Relational content source: row model, source trait, and adapters.

pub mod memory;
pub mod postgres;
pub mod value;

pub use memory::MemorySource;
pub use postgres::{PostgresSource, SourceQueries};
pub use value::{FieldError, SourceRow, SqlValue};

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while reading from the content source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The connection pool could not be established.
    #[error("Failed to connect to source database: {0}")]
    Connect(#[source] sqlx::Error),
    /// A query or row scan failed.
    #[error("Source query failed: {0}")]
    Query(#[from] sqlx::Error),
    /// A column value could not be decoded into a [`SqlValue`].
    #[error("Failed to decode column '{column}': {source}")]
    Decode {
        /// Column that failed to decode.
        column: String,
        /// Underlying driver error.
        #[source]
        source: sqlx::Error,
    },
    /// The source reported a failure that did not originate in the database driver.
    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

/// Child row belonging to a content record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRow {
    /// Chunk kind tag (for example `text` or `image`).
    pub chunk_type: String,
    /// Raw chunk payload.
    pub data: String,
    /// Rendering position within the parent.
    pub position: i64,
    /// Soft-delete flag.
    pub archived: bool,
}

/// Read-only access to content records and their chunks.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Stream every content record selected for migration, in source order.
    fn rows(&self) -> BoxStream<'_, Result<SourceRow, SourceError>>;

    /// Fetch the chunk rows belonging to `parent_id`.
    async fn chunk_rows(&self, parent_id: &str) -> Result<Vec<ChunkRow>, SourceError>;
}

#[async_trait]
impl<T> ContentSource for Arc<T>
where
    T: ContentSource + ?Sized,
{
    fn rows(&self) -> BoxStream<'_, Result<SourceRow, SourceError>> {
        (**self).rows()
    }

    async fn chunk_rows(&self, parent_id: &str) -> Result<Vec<ChunkRow>, SourceError> {
        (**self).chunk_rows(parent_id).await
    }
}
