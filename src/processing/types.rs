//! Core data types and error definitions for the migration pipeline.

use crate::source::{FieldError, SourceError};
use crate::store::StoreError;
use serde::Serialize;
use thiserror::Error;

/// One ordered content fragment of a content document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    /// Chunk kind tag copied from the source.
    #[serde(rename = "type")]
    pub chunk_type: String,
    /// Sanitized chunk payload.
    pub data: String,
}

/// Lightweight document written to the search collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchDocument {
    /// Record title.
    pub title: String,
    /// Record subtitle, empty when the source has none.
    pub subtitle: String,
    /// Sorted whole words and their 2..=6 character prefixes.
    pub keywords: Vec<String>,
    /// Publication flag, `false` when the source has none.
    pub published: bool,
}

/// Full document written to the content collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentDocument {
    /// Chunks in ascending source position.
    pub chunks: Vec<Chunk>,
    /// Sorted whole normalized words.
    pub keywords: Vec<String>,
}

/// Both documents derived from one source row, sharing a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPair {
    /// Document key shared by both collections.
    pub id: String,
    /// Document for the search collection.
    pub search: SearchDocument,
    /// Document for the content collection.
    pub content: ContentDocument,
}

/// Pipeline step at which a row failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Reading the row from the source.
    Source,
    /// Resolving the document key.
    Identifier,
    /// Fetching the row's chunks.
    Chunks,
    /// Converting the row's fields.
    Fields,
    /// Writing the search document.
    WriteSearch,
    /// Writing the content document.
    WriteContent,
}

impl Stage {
    /// Stable name used in structured log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Identifier => "identifier",
            Self::Chunks => "chunks",
            Self::Fields => "fields",
            Self::WriteSearch => "write_search",
            Self::WriteContent => "write_content",
        }
    }
}

/// Per-row failure; the row is skipped and the run continues.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The row could not be read from the source.
    #[error("Failed to read source row: {0}")]
    Source(#[source] SourceError),
    /// The row has no usable identifier.
    #[error("Row rejected: {0}")]
    Identifier(#[source] FieldError),
    /// The row's chunks could not be fetched.
    #[error("Failed to assemble chunks for {id}: {source}")]
    Chunks {
        /// Row identifier.
        id: String,
        /// Underlying source error.
        #[source]
        source: SourceError,
    },
    /// A consumed field was missing or had the wrong type.
    #[error("Row {id} rejected: {source}")]
    Fields {
        /// Row identifier.
        id: String,
        /// Underlying field error.
        #[source]
        source: FieldError,
    },
    /// A document write failed.
    #[error("Failed to write {collection}/{id}: {source}")]
    Write {
        /// Which document was being written.
        stage: Stage,
        /// Target collection.
        collection: String,
        /// Row identifier.
        id: String,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },
}

impl MigrationError {
    /// Step at which the row failed.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Source(_) => Stage::Source,
            Self::Identifier(_) => Stage::Identifier,
            Self::Chunks { .. } => Stage::Chunks,
            Self::Fields { .. } => Stage::Fields,
            Self::Write { stage, .. } => *stage,
        }
    }

    /// Identifier of the failed row, when it was resolved before the failure.
    pub fn row_id(&self) -> Option<&str> {
        match self {
            Self::Source(_) | Self::Identifier(_) => None,
            Self::Chunks { id, .. } | Self::Fields { id, .. } | Self::Write { id, .. } => {
                Some(id)
            }
        }
    }
}

/// Tunables for a migration run.
#[derive(Debug, Clone)]
pub struct MigrationOptions {
    /// Collection receiving search documents.
    pub search_collection: String,
    /// Collection receiving content documents.
    pub content_collection: String,
    /// Number of written rows between progress log lines.
    pub progress_interval: u64,
    /// Maximum number of rows in flight.
    pub concurrency: usize,
    /// Optional cap on the number of rows attempted.
    pub limit: Option<usize>,
    /// Transform rows without writing them.
    pub dry_run: bool,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            search_collection: "search".into(),
            content_collection: "content".into(),
            progress_interval: 100,
            concurrency: 1,
            limit: None,
            dry_run: false,
        }
    }
}

impl MigrationOptions {
    /// Derive options from the loaded configuration.
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            search_collection: config.search_collection.clone(),
            content_collection: config.content_collection.clone(),
            progress_interval: config.progress_interval,
            concurrency: config.concurrency,
            ..Self::default()
        }
    }
}

/// Final report of a migration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationSummary {
    /// Identifier attached to every log line of the run.
    pub run_id: String,
    /// Rows that entered the pipeline.
    pub attempted: u64,
    /// Rows whose two documents were written.
    pub written: u64,
    /// Rows skipped because of a failure.
    pub failed: u64,
    /// Chunks carried by written content documents.
    pub chunks_written: u64,
    /// Whether the run stopped early on a shutdown signal.
    pub cancelled: bool,
    /// Whether writes were skipped.
    pub dry_run: bool,
    /// RFC3339 start time.
    pub started_at: String,
    /// RFC3339 end time.
    pub finished_at: String,
}
