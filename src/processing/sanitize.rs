//! Helpers for normalizing raw column values: tag lists and chunk markup.

use std::borrow::Cow;
use thiserror::Error;

const TAG_LIST_OPEN: char = '{';
const TAG_LIST_CLOSE: char = '}';
const TAG_SEPARATOR: char = ',';

const INLINE_PNG_IMG: &str = r#"<img src="data:image/png;base64,"#;
const CONSTRAINED_INLINE_PNG_IMG: &str =
    r#"<img style="max-width: 90% !important;" src="data:image/png;base64,"#;

/// Tag list strings that do not carry the expected `{...}` wrapping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedTags {
    /// Too short to hold an opening and a closing delimiter.
    #[error("tag list {0:?} is too short to be wrapped in braces")]
    TooShort(String),
    /// The opening or closing delimiter is missing.
    #[error("tag list {0:?} is not wrapped in braces")]
    Unwrapped(String),
}

/// Split a brace-wrapped, comma-separated tag list (`{a,b,c}`) into its entries.
///
/// Exactly one leading `{` and one trailing `}` are stripped. `{}` yields no entries. Entries
/// are returned verbatim; callers normalize case and whitespace.
pub fn parse_tag_list(raw: &str) -> Result<Vec<&str>, MalformedTags> {
    if raw.chars().count() < 2 {
        return Err(MalformedTags::TooShort(raw.to_string()));
    }
    let inner = raw
        .strip_prefix(TAG_LIST_OPEN)
        .and_then(|rest| rest.strip_suffix(TAG_LIST_CLOSE))
        .ok_or_else(|| MalformedTags::Unwrapped(raw.to_string()))?;

    if inner.is_empty() {
        return Ok(Vec::new());
    }
    Ok(inner.split(TAG_SEPARATOR).collect())
}

/// Constrain the rendered width of inline base64 PNG images in chunk markup.
///
/// Only `<img` tags whose `src` is the first attribute and holds a `data:image/png;base64,`
/// URL are touched; every other byte passes through. Applying it twice is a no-op.
pub fn sanitize_chunk_data(data: &str) -> Cow<'_, str> {
    if data.contains(INLINE_PNG_IMG) {
        Cow::Owned(data.replace(INLINE_PNG_IMG, CONSTRAINED_INLINE_PNG_IMG))
    } else {
        Cow::Borrowed(data)
    }
}
