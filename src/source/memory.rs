//! In-memory [`ContentSource`] for tests and local dry runs.

use async_trait::async_trait;
use futures_util::{StreamExt, stream, stream::BoxStream};
use std::collections::{HashMap, HashSet};

use super::{ChunkRow, ContentSource, SourceError, SourceRow};

/// Content source holding its rows in memory.
///
/// Rows are yielded in insertion order. Individual rows or chunk lookups can be made to fail
/// so callers can exercise per-row error handling.
#[derive(Debug, Default)]
pub struct MemorySource {
    rows: Vec<Result<SourceRow, String>>,
    chunks: HashMap<String, Vec<ChunkRow>>,
    failing_parents: HashSet<String>,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a content row.
    pub fn push_row(&mut self, row: SourceRow) -> &mut Self {
        self.rows.push(Ok(row));
        self
    }

    /// Append a row that fails to scan with the given message.
    pub fn push_unreadable_row(&mut self, message: impl Into<String>) -> &mut Self {
        self.rows.push(Err(message.into()));
        self
    }

    /// Register a chunk row for `parent_id`, kept in physical insertion order.
    pub fn push_chunk(&mut self, parent_id: impl Into<String>, chunk: ChunkRow) -> &mut Self {
        self.chunks.entry(parent_id.into()).or_default().push(chunk);
        self
    }

    /// Make chunk lookups for `parent_id` fail.
    pub fn fail_chunks_for(&mut self, parent_id: impl Into<String>) -> &mut Self {
        self.failing_parents.insert(parent_id.into());
        self
    }
}

#[async_trait]
impl ContentSource for MemorySource {
    fn rows(&self) -> BoxStream<'_, Result<SourceRow, SourceError>> {
        stream::iter(self.rows.iter().map(|row| match row {
            Ok(row) => Ok(row.clone()),
            Err(message) => Err(SourceError::Unavailable(message.clone())),
        }))
        .boxed()
    }

    async fn chunk_rows(&self, parent_id: &str) -> Result<Vec<ChunkRow>, SourceError> {
        if self.failing_parents.contains(parent_id) {
            return Err(SourceError::Unavailable(format!(
                "chunk query failed for {parent_id}"
            )));
        }
        Ok(self.chunks.get(parent_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::TryStreamExt;

    #[tokio::test]
    async fn yields_rows_in_insertion_order() {
        let mut source = MemorySource::new();
        source
            .push_row(SourceRow::new().with("id", 2_i64))
            .push_row(SourceRow::new().with("id", 1_i64));

        let rows: Vec<SourceRow> = source.rows().try_collect().await.expect("rows");
        let ids: Vec<String> = rows
            .iter()
            .map(|row| row.identifier("id").expect("id"))
            .collect();
        assert_eq!(ids, vec!["2", "1"]);
    }

    #[tokio::test]
    async fn injected_failures_surface_as_errors() {
        let mut source = MemorySource::new();
        source.push_unreadable_row("scan failed").fail_chunks_for("7");

        let first = source.rows().next().await.expect("one row");
        assert!(matches!(first, Err(SourceError::Unavailable(_))));
        assert!(source.chunk_rows("7").await.is_err());
        assert!(source.chunk_rows("8").await.expect("empty").is_empty());
    }
}
