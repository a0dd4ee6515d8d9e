//! Chunk assembly: ordered, sanitized child rows for one parent record.

use crate::source::{ChunkRow, ContentSource, SourceError};

use super::{sanitize::sanitize_chunk_data, types::Chunk};

/// Fetch the chunks of `parent_id` and return them ready for the content document.
pub async fn assemble_chunks<S>(source: &S, parent_id: &str) -> Result<Vec<Chunk>, SourceError>
where
    S: ContentSource + ?Sized,
{
    let rows = source.chunk_rows(parent_id).await?;
    let chunks = order_chunks(rows);
    tracing::trace!(parent_id, chunks = chunks.len(), "Assembled chunks");
    Ok(chunks)
}

/// Drop archived rows, order by position, and sanitize each payload.
///
/// The sort is stable, so rows sharing a position keep the order the source returned them in.
pub fn order_chunks(mut rows: Vec<ChunkRow>) -> Vec<Chunk> {
    rows.retain(|row| !row.archived);
    rows.sort_by_key(|row| row.position);
    rows.into_iter()
        .map(|row| Chunk {
            data: sanitize_chunk_data(&row.data).into_owned(),
            chunk_type: row.chunk_type,
        })
        .collect()
}
