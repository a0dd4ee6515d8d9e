//! Postgres-backed [`ContentSource`].
//!
//! Content rows are streamed with `SELECT *` and decoded column by column according to the
//! Postgres type name, so the reader needs no knowledge of the table schema beyond the few
//! columns the transformer consumes. Chunk rows are fetched per parent with the parent id bound
//! as a query parameter.

use crate::config::Config;
use async_trait::async_trait;
use futures_util::{StreamExt, stream::BoxStream};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Decode, Postgres, Row, Type, TypeInfo};
use time::{Date, OffsetDateTime, PrimitiveDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

use super::{ChunkRow, ContentSource, SourceError, SourceRow, SqlValue};

/// SQL statements used by [`PostgresSource`], derived from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceQueries {
    /// Statement streaming every content row selected for migration.
    pub content: String,
    /// Statement fetching the chunk rows of one parent, with the parent id bound as `$1`.
    pub chunks: String,
}

impl SourceQueries {
    /// Build the statements from the configured tables and predicates.
    ///
    /// Table names and predicates come from trusted configuration and are interpolated; the
    /// parent id is always bound. The parent column is compared as text so integer, uuid, and
    /// text keys all match the rendered document id. `ctid` breaks ties between equal positions
    /// with the physical row order.
    pub fn from_config(config: &Config) -> Self {
        let mut content = format!(
            "SELECT * FROM {} WHERE {}",
            config.content_table, config.content_filter
        );
        if let Some(order_by) = &config.content_order_by {
            content.push_str(&format!(" ORDER BY {order_by}"));
        }

        let chunks = format!(
            "SELECT chunk_type::text AS chunk_type, data::text AS data, \
             position::bigint AS position, archived::bool AS archived \
             FROM {} WHERE {}::text = $1 AND ({}) ORDER BY position, ctid",
            config.chunk_table, config.chunk_parent_column, config.chunk_filter
        );

        Self { content, chunks }
    }
}

/// Content source reading from Postgres through a `sqlx` connection pool.
pub struct PostgresSource {
    pool: PgPool,
    queries: SourceQueries,
}

impl PostgresSource {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool, queries: SourceQueries) -> Self {
        Self { pool, queries }
    }

    /// Connect to the configured database.
    ///
    /// `max_connections` should leave one connection for the streaming content cursor on top of
    /// the per-row chunk queries.
    pub async fn connect(config: &Config, max_connections: u32) -> Result<Self, SourceError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(2))
            .connect(&config.database_url)
            .await
            .map_err(SourceError::Connect)?;
        tracing::info!(
            table = %config.content_table,
            chunk_table = %config.chunk_table,
            "Connected to source database"
        );
        Ok(Self::new(pool, SourceQueries::from_config(config)))
    }

    /// Close the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl ContentSource for PostgresSource {
    fn rows(&self) -> BoxStream<'_, Result<SourceRow, SourceError>> {
        tracing::debug!(query = %self.queries.content, "Streaming content rows");
        sqlx::query(&self.queries.content)
            .fetch(&self.pool)
            .map(|result| decode_row(&result?))
            .boxed()
    }

    async fn chunk_rows(&self, parent_id: &str) -> Result<Vec<ChunkRow>, SourceError> {
        let rows = sqlx::query(&self.queries.chunks)
            .bind(parent_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(decode_chunk_row).collect()
    }
}

fn decode_chunk_row(row: &PgRow) -> Result<ChunkRow, SourceError> {
    let chunk_type: Option<String> = row.try_get("chunk_type")?;
    let data: Option<String> = row.try_get("data")?;
    let position: Option<i64> = row.try_get("position")?;
    let archived: Option<bool> = row.try_get("archived")?;

    Ok(ChunkRow {
        chunk_type: chunk_type.unwrap_or_default(),
        data: data.unwrap_or_default(),
        position: position.unwrap_or_default(),
        archived: archived.unwrap_or(false),
    })
}

fn decode_row(row: &PgRow) -> Result<SourceRow, SourceError> {
    let mut decoded = SourceRow::new();
    for (index, column) in row.columns().iter().enumerate() {
        let name = column.name();
        let value = match decode_column(row, index, column.type_info().name()) {
            Ok(value) => value,
            Err(source) => {
                return Err(SourceError::Decode {
                    column: name.to_string(),
                    source,
                });
            }
        };
        decoded.push(name, value);
    }
    Ok(decoded)
}

fn decode_column(row: &PgRow, index: usize, type_name: &str) -> Result<SqlValue, sqlx::Error> {
    let value = match type_name {
        "BOOL" => column::<bool>(row, index)?.map(SqlValue::from),
        "INT2" => column::<i16>(row, index)?.map(SqlValue::from),
        "INT4" => column::<i32>(row, index)?.map(SqlValue::from),
        "INT8" => column::<i64>(row, index)?.map(SqlValue::from),
        "FLOAT4" => column::<f32>(row, index)?.map(SqlValue::from),
        "FLOAT8" => column::<f64>(row, index)?.map(SqlValue::from),
        "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" => {
            column::<String>(row, index)?.map(SqlValue::from)
        }
        "UUID" => column::<Uuid>(row, index)?.map(text),
        "DATE" => column::<Date>(row, index)?.map(text),
        "JSON" | "JSONB" => column::<serde_json::Value>(row, index)?.map(text),
        "TIMESTAMPTZ" => timestamp(column::<OffsetDateTime>(row, index)?)?,
        "TIMESTAMP" => {
            let value = column::<PrimitiveDateTime>(row, index)?;
            timestamp(value.map(PrimitiveDateTime::assume_utc))?
        }
        "TEXT[]" | "VARCHAR[]" | "_TEXT" | "_VARCHAR" => {
            let items = column::<Vec<String>>(row, index)?;
            items.map(|items| text(render_array(&items)))
        }
        other => {
            tracing::trace!(
                column = index,
                type_name = other,
                "Skipping undecoded column type"
            );
            None
        }
    };
    Ok(value.unwrap_or(SqlValue::Null))
}

/// Read a nullable column as `T`.
fn column<'r, T>(row: &'r PgRow, index: usize) -> Result<Option<T>, sqlx::Error>
where
    T: Decode<'r, Postgres> + Type<Postgres>,
{
    row.try_get(index)
}

fn text(value: impl ToString) -> SqlValue {
    SqlValue::Text(value.to_string())
}

/// Timestamps travel as RFC3339 text; naive timestamps are read as UTC.
fn timestamp(value: Option<OffsetDateTime>) -> Result<Option<SqlValue>, sqlx::Error> {
    value
        .map(|value| value.format(&Rfc3339).map(SqlValue::Text))
        .transpose()
        .map_err(|err| sqlx::Error::Decode(Box::new(err)))
}

/// Render a text array in the brace-wrapped, comma-separated shape tag lists are stored in.
fn render_array(items: &[String]) -> String {
    format!("{{{}}}", items.join(","))
}
