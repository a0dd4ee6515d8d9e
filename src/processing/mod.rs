//! Record pipeline: keyword extraction, chunk assembly, transformation, and the migration driver.

pub mod chunks;
pub mod sanitize;
mod service;
pub mod tokenizer;
pub mod transform;
pub mod types;

pub use chunks::{assemble_chunks, order_chunks};
pub use sanitize::{MalformedTags, parse_tag_list, sanitize_chunk_data};
pub use service::MigrationService;
pub use tokenizer::{KeywordSets, build_keyword_sets, search_tokens};
pub use transform::transform;
pub use types::{
    Chunk, ContentDocument, DocumentPair, MigrationError, MigrationOptions, MigrationSummary,
    SearchDocument, Stage,
};
