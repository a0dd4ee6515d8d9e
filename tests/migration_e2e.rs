use std::sync::Arc;

use content_migrate::{
    processing::{MigrationOptions, MigrationService},
    source::{ChunkRow, MemorySource, SourceRow},
    store::MemorySink,
};
use serde_json::json;
use tokio::sync::watch;

fn chunk(chunk_type: &str, data: &str, position: i64, archived: bool) -> ChunkRow {
    ChunkRow {
        chunk_type: chunk_type.into(),
        data: data.into(),
        position,
        archived,
    }
}

fn vectors_source() -> MemorySource {
    let mut source = MemorySource::new();
    source
        .push_row(
            SourceRow::new()
                .with("id", "42")
                .with("title", "Vectors")
                .with("subtitle", "Intro")
                .with("published", true)
                .with("tags", "{vectors,maths}"),
        )
        .push_chunk("42", chunk("text", "second", 2, false))
        .push_chunk("42", chunk("text", "draft", 1, true))
        .push_chunk(
            "42",
            chunk("html", r#"<img src="data:image/png;base64,AAAA">"#, 1, false),
        );
    source
}

#[tokio::test]
async fn migrates_a_record_into_search_and_content_documents() {
    let sink = Arc::new(MemorySink::new());
    let service = MigrationService::new(
        Box::new(vectors_source()),
        Box::new(sink.clone()),
        MigrationOptions::default(),
    );

    let (_tx, rx) = watch::channel(false);
    let summary = service.run(rx).await;

    assert_eq!(summary.attempted, 1);
    assert_eq!(summary.written, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.chunks_written, 2);
    assert!(!summary.run_id.is_empty());

    assert_eq!(
        sink.document("search", "42"),
        Some(json!({
            "title": "Vectors",
            "subtitle": "Intro",
            "keywords": [
                "ma", "mat", "math", "maths",
                "ve", "vec", "vect", "vecto", "vector", "vectors"
            ],
            "published": true
        }))
    );
    assert_eq!(
        sink.document("content", "42"),
        Some(json!({
            "chunks": [
                {
                    "type": "html",
                    "data": r#"<img style="max-width: 90% !important;" src="data:image/png;base64,AAAA">"#
                },
                { "type": "text", "data": "second" }
            ],
            "keywords": ["maths", "vectors"]
        }))
    );
}

#[tokio::test]
async fn rerunning_a_migration_overwrites_with_identical_documents() {
    let sink = Arc::new(MemorySink::new());
    let (_tx, rx) = watch::channel(false);

    MigrationService::new(
        Box::new(vectors_source()),
        Box::new(sink.clone()),
        MigrationOptions::default(),
    )
    .run(rx.clone())
    .await;
    let first_search = sink.document("search", "42");

    MigrationService::new(
        Box::new(vectors_source()),
        Box::new(sink.clone()),
        MigrationOptions::default(),
    )
    .run(rx)
    .await;

    assert_eq!(sink.ids("search"), vec!["42"]);
    assert_eq!(sink.document("search", "42"), first_search);
}

#[tokio::test]
async fn malformed_tags_do_not_fail_the_row() {
    let mut source = MemorySource::new();
    source.push_row(
        SourceRow::new()
            .with("id", 5_i64)
            .with("title", "Area")
            .with("tags", "area,shape"),
    );
    let sink = Arc::new(MemorySink::new());

    let (_tx, rx) = watch::channel(false);
    let summary = MigrationService::new(
        Box::new(source),
        Box::new(sink.clone()),
        MigrationOptions::default(),
    )
    .run(rx)
    .await;

    assert_eq!(summary.written, 1);
    let content = sink.document("content", "5").expect("content document");
    assert_eq!(content["keywords"], json!(["area"]));
    assert_eq!(content["chunks"], json!([]));
}

#[tokio::test]
async fn custom_collections_receive_the_documents() {
    let sink = Arc::new(MemorySink::new());
    let options = MigrationOptions {
        search_collection: "lesson-search".into(),
        content_collection: "lesson-content".into(),
        ..MigrationOptions::default()
    };

    let (_tx, rx) = watch::channel(false);
    MigrationService::new(Box::new(vectors_source()), Box::new(sink.clone()), options)
        .run(rx)
        .await;

    assert_eq!(sink.ids("lesson-search"), vec!["42"]);
    assert_eq!(sink.ids("lesson-content"), vec!["42"]);
    assert!(sink.ids("search").is_empty());
}
