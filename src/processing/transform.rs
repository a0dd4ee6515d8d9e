//! Record transformation: one source row plus its chunks into the two target documents.

use crate::source::{FieldError, SourceRow};

use super::{
    tokenizer::build_keyword_sets,
    types::{Chunk, ContentDocument, DocumentPair, SearchDocument},
};

/// Column holding the record identifier.
pub const ID_COLUMN: &str = "id";
/// Column holding the record title.
pub const TITLE_COLUMN: &str = "title";
/// Column holding the optional subtitle.
pub const SUBTITLE_COLUMN: &str = "subtitle";
/// Column holding the publication flag.
pub const PUBLISHED_COLUMN: &str = "published";
/// Column holding the brace-wrapped tag list.
pub const TAGS_COLUMN: &str = "tags";

/// Build the search and content documents for `row`.
///
/// Missing subtitles become empty strings and missing publication flags become `false`. A
/// missing identifier or title rejects the row. `chunks` are stored in the order given.
pub fn transform(row: &SourceRow, chunks: Vec<Chunk>) -> Result<DocumentPair, FieldError> {
    let id = row.identifier(ID_COLUMN)?;
    let title = row.text(TITLE_COLUMN)?;
    let subtitle = row.optional_text(SUBTITLE_COLUMN)?.unwrap_or_default();
    let published = row.flag(PUBLISHED_COLUMN)?.unwrap_or(false);
    let tags = row.optional_text(TAGS_COLUMN)?;

    let keywords = build_keyword_sets(&title, tags.as_deref());

    Ok(DocumentPair {
        id,
        search: SearchDocument {
            title,
            subtitle,
            keywords: keywords.search.into_iter().collect(),
            published,
        },
        content: ContentDocument {
            chunks,
            keywords: keywords.exact.into_iter().collect(),
        },
    })
}
