//! Migration service coordinating source reads, transformation, and document writes.

use crate::{
    metrics::MigrationMetrics,
    processing::{
        chunks::assemble_chunks,
        transform::{ID_COLUMN, transform},
        types::{DocumentPair, MigrationError, MigrationOptions, MigrationSummary, Stage},
    },
    source::{ContentSource, SourceError, SourceRow},
    store::{DocumentSink, StoreError},
};
use futures_util::{StreamExt, future, stream::BoxStream};
use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::Instrument;
use uuid::Uuid;

/// Drives a migration: every source row becomes a search document and a content document.
///
/// Rows are independent. A failure in one row is logged with its id and stage, counted, and
/// the run moves on. With `concurrency > 1` up to that many rows are in flight at once; results
/// are still consumed in source order.
pub struct MigrationService {
    source: Box<dyn ContentSource>,
    sink: Box<dyn DocumentSink>,
    options: MigrationOptions,
}

struct RowReport {
    chunk_count: usize,
}

impl MigrationService {
    /// Build a service over the given source and sink.
    pub fn new(
        source: Box<dyn ContentSource>,
        sink: Box<dyn DocumentSink>,
        options: MigrationOptions,
    ) -> Self {
        Self {
            source,
            sink,
            options,
        }
    }

    /// Migrate every source row, stopping early once `shutdown` flips to `true`.
    ///
    /// The shutdown flag is checked before each new row is pulled from the source; rows already
    /// in flight complete and are counted. The summary is returned in every case.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> MigrationSummary {
        let run_id = Uuid::new_v4().to_string();
        let started_at = current_timestamp_rfc3339();
        let metrics = MigrationMetrics::new();
        let concurrency = self.options.concurrency.max(1);
        let progress_interval = self.options.progress_interval.max(1);

        tracing::info!(
            %run_id,
            concurrency,
            dry_run = self.options.dry_run,
            limit = ?self.options.limit,
            search_collection = %self.options.search_collection,
            content_collection = %self.options.content_collection,
            "Starting migration"
        );

        let stop = shutdown.clone();
        let rows = self
            .source
            .rows()
            .take_while(move |_| future::ready(!*stop.borrow()));
        let rows: BoxStream<'_, Result<SourceRow, SourceError>> = match self.options.limit {
            Some(limit) => rows.take(limit).boxed(),
            None => rows.boxed(),
        };

        let mut outcomes = rows
            .map(|row| {
                metrics.record_attempt();
                self.migrate_row(row)
            })
            .buffered(concurrency);

        while let Some(outcome) = outcomes.next().await {
            match outcome {
                Ok(report) => {
                    let written = metrics.record_written(report.chunk_count as u64);
                    if written % progress_interval == 0 {
                        tracing::info!(%run_id, written, "{written} rows migrated");
                    }
                }
                Err(error) => {
                    metrics.record_failed();
                    tracing::warn!(
                        %run_id,
                        id = error.row_id().unwrap_or("<unresolved>"),
                        stage = error.stage().as_str(),
                        error = %error,
                        "Skipping row"
                    );
                }
            }
        }

        let cancelled = *shutdown.borrow();
        let snapshot = metrics.snapshot();
        let summary = MigrationSummary {
            run_id,
            attempted: snapshot.attempted,
            written: snapshot.written,
            failed: snapshot.failed,
            chunks_written: snapshot.chunks_written,
            cancelled,
            dry_run: self.options.dry_run,
            started_at,
            finished_at: current_timestamp_rfc3339(),
        };

        tracing::info!(
            run_id = %summary.run_id,
            attempted = summary.attempted,
            written = summary.written,
            failed = summary.failed,
            chunks = summary.chunks_written,
            cancelled = summary.cancelled,
            "Migration finished"
        );
        summary
    }

    async fn migrate_row(
        &self,
        row: Result<SourceRow, SourceError>,
    ) -> Result<RowReport, MigrationError> {
        let row = row.map_err(MigrationError::Source)?;
        let id = row
            .identifier(ID_COLUMN)
            .map_err(MigrationError::Identifier)?;

        let span = tracing::debug_span!("row", id = %id);
        async move {
            let chunks = assemble_chunks(self.source.as_ref(), &id)
                .await
                .map_err(|source| MigrationError::Chunks {
                    id: id.clone(),
                    source,
                })?;
            let pair = transform(&row, chunks).map_err(|source| MigrationError::Fields {
                id: id.clone(),
                source,
            })?;
            let chunk_count = pair.content.chunks.len();

            if self.options.dry_run {
                tracing::debug!(
                    keywords = pair.search.keywords.len(),
                    chunks = chunk_count,
                    "Dry run; skipping writes"
                );
            } else {
                self.write_pair(&pair).await?;
            }

            Ok::<_, MigrationError>(RowReport { chunk_count })
        }
        .instrument(span)
        .await
    }

    /// Write the search document, then the content document.
    ///
    /// A failed search write skips the content write. A failed content write leaves the
    /// search document in place; the row still counts as failed.
    async fn write_pair(&self, pair: &DocumentPair) -> Result<(), MigrationError> {
        self.write(
            Stage::WriteSearch,
            &self.options.search_collection,
            &pair.id,
            &pair.search,
        )
        .await?;
        self.write(
            Stage::WriteContent,
            &self.options.content_collection,
            &pair.id,
            &pair.content,
        )
        .await
    }

    async fn write<T>(
        &self,
        stage: Stage,
        collection: &str,
        id: &str,
        document: &T,
    ) -> Result<(), MigrationError>
    where
        T: Serialize,
    {
        let to_error = |source: StoreError| MigrationError::Write {
            stage,
            collection: collection.to_string(),
            id: id.to_string(),
            source,
        };
        let value = serde_json::to_value(document).map_err(|err| to_error(err.into()))?;
        self.sink
            .set_document(collection, id, &value)
            .await
            .map_err(to_error)
    }
}

/// Current timestamp formatted for the run summary.
fn current_timestamp_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}
