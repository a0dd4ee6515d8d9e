//! Dynamically typed row values and the per-field conversions consumers rely on.

use std::fmt;
use thiserror::Error;

/// Errors raised when a source row lacks a field in the expected shape.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    /// The identifier column is absent, null, or blank.
    #[error("row has no usable identifier in column '{column}'")]
    MissingIdentifier {
        /// Column expected to carry the identifier.
        column: String,
    },
    /// The identifier column holds a value that cannot become a document key.
    #[error("column '{column}' holds {found}, which cannot be used as an identifier")]
    InvalidIdentifier {
        /// Column expected to carry the identifier.
        column: String,
        /// Rendering of the rejected value.
        found: String,
    },
    /// A required column is absent from the row.
    #[error("row is missing required column '{column}'")]
    MissingColumn {
        /// Name of the missing column.
        column: String,
    },
    /// A column carried a value of the wrong variant.
    #[error("column '{column}' holds {found}, expected {expected}")]
    TypeMismatch {
        /// Name of the offending column.
        column: String,
        /// Variant the consumer asked for.
        expected: &'static str,
        /// Variant actually present.
        found: &'static str,
    },
}

/// Scalar value read from a relational column.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// Text-like column (text, varchar, uuid, timestamps, arrays rendered as text).
    Text(String),
    /// Any integer width, widened to 64 bits.
    Integer(i64),
    /// Any float width, widened to 64 bits.
    Float(f64),
    /// Boolean column.
    Boolean(bool),
    /// SQL `NULL` or a column type the reader does not decode.
    Null,
}

impl SqlValue {
    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Boolean(_) => "boolean",
            Self::Null => "null",
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(value) => f.write_str(value),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Boolean(value) => write!(f, "{value}"),
            Self::Null => f.write_str("null"),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i16> for SqlValue {
    fn from(value: i16) -> Self {
        Self::Integer(value.into())
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f32> for SqlValue {
    fn from(value: f32) -> Self {
        Self::Float(value.into())
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl<T> From<Option<T>> for SqlValue
where
    T: Into<SqlValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// One source record: column names mapped to values, in the order the source returned them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceRow {
    columns: Vec<(String, SqlValue)>,
}

impl SourceRow {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper appending a column.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.push(column, value);
        self
    }

    /// Append a column, replacing any earlier column with the same name.
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<SqlValue>) {
        let column = column.into();
        let value = value.into();
        match self.columns.iter_mut().find(|(name, _)| *name == column) {
            Some(slot) => slot.1 = value,
            None => self.columns.push((column, value)),
        }
    }

    /// Look up a column by name.
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Render the identifier column as a document key.
    ///
    /// Text ids are used verbatim so the key still matches the parent column of the chunk
    /// query; integer and finite float ids use their decimal form. Null, blank, and missing
    /// ids are rejected so a document is never written under an empty key.
    pub fn identifier(&self, column: &str) -> Result<String, FieldError> {
        let missing = || FieldError::MissingIdentifier {
            column: column.to_string(),
        };
        match self.get(column) {
            None | Some(SqlValue::Null) => Err(missing()),
            Some(SqlValue::Text(value)) if value.trim().is_empty() => Err(missing()),
            Some(SqlValue::Text(value)) => Ok(value.clone()),
            Some(value @ SqlValue::Integer(_)) => Ok(value.to_string()),
            Some(SqlValue::Float(value)) if value.is_finite() => Ok(value.to_string()),
            Some(other) => Err(FieldError::InvalidIdentifier {
                column: column.to_string(),
                found: format!("{} {other}", other.kind()),
            }),
        }
    }

    /// Read a required text column.
    pub fn text(&self, column: &str) -> Result<String, FieldError> {
        match self.get(column) {
            None => Err(FieldError::MissingColumn {
                column: column.to_string(),
            }),
            Some(SqlValue::Text(value)) => Ok(value.clone()),
            Some(other) => Err(FieldError::TypeMismatch {
                column: column.to_string(),
                expected: "text",
                found: other.kind(),
            }),
        }
    }

    /// Read an optional text column; missing and null both yield `None`.
    pub fn optional_text(&self, column: &str) -> Result<Option<String>, FieldError> {
        match self.get(column) {
            None | Some(SqlValue::Null) => Ok(None),
            Some(SqlValue::Text(value)) => Ok(Some(value.clone())),
            Some(other) => Err(FieldError::TypeMismatch {
                column: column.to_string(),
                expected: "text",
                found: other.kind(),
            }),
        }
    }

    /// Read an optional boolean column; missing and null both yield `None`.
    pub fn flag(&self, column: &str) -> Result<Option<bool>, FieldError> {
        match self.get(column) {
            None | Some(SqlValue::Null) => Ok(None),
            Some(SqlValue::Boolean(value)) => Ok(Some(*value)),
            Some(other) => Err(FieldError::TypeMismatch {
                column: column.to_string(),
                expected: "boolean",
                found: other.kind(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_accepts_text_and_integers() {
        let row = SourceRow::new().with("id", "42");
        assert_eq!(row.identifier("id"), Ok("42".to_string()));

        let row = SourceRow::new().with("id", 42_i64);
        assert_eq!(row.identifier("id"), Ok("42".to_string()));
    }

    #[test]
    fn text_identifiers_keep_surrounding_whitespace() {
        let row = SourceRow::new().with("id", " 42 ");
        assert_eq!(row.identifier("id"), Ok(" 42 ".to_string()));
    }

    #[test]
    fn identifier_rejects_missing_null_and_blank() {
        let expected = Err(FieldError::MissingIdentifier {
            column: "id".into(),
        });
        assert_eq!(SourceRow::new().identifier("id"), expected);
        assert_eq!(
            SourceRow::new().with("id", SqlValue::Null).identifier("id"),
            expected
        );
        assert_eq!(
            SourceRow::new().with("id", "   ").identifier("id"),
            expected
        );
    }

    #[test]
    fn identifier_rejects_values_that_cannot_be_keys() {
        let err = SourceRow::new()
            .with("id", true)
            .identifier("id")
            .expect_err("boolean id");
        assert_eq!(
            err,
            FieldError::InvalidIdentifier {
                column: "id".into(),
                found: "boolean true".into(),
            }
        );

        let err = SourceRow::new()
            .with("id", f64::NAN)
            .identifier("id")
            .expect_err("nan id");
        assert!(matches!(err, FieldError::InvalidIdentifier { .. }));
    }

    #[test]
    fn text_requires_the_text_variant() {
        let row = SourceRow::new()
            .with("title", "Vectors")
            .with("count", 3_i64)
            .with("subtitle", SqlValue::Null);
        assert_eq!(row.text("title"), Ok("Vectors".into()));
        assert_eq!(
            row.text("count"),
            Err(FieldError::TypeMismatch {
                column: "count".into(),
                expected: "text",
                found: "integer",
            })
        );
        assert!(matches!(
            row.text("subtitle"),
            Err(FieldError::TypeMismatch { found: "null", .. })
        ));
        assert!(matches!(
            row.text("absent"),
            Err(FieldError::MissingColumn { .. })
        ));
    }

    #[test]
    fn optional_readers_treat_null_as_absent() {
        let row = SourceRow::new()
            .with("subtitle", SqlValue::Null)
            .with("published", true);
        assert_eq!(row.optional_text("subtitle"), Ok(None));
        assert_eq!(row.optional_text("missing"), Ok(None));
        assert_eq!(row.flag("published"), Ok(Some(true)));
        assert_eq!(row.flag("missing"), Ok(None));
        assert!(row.flag("subtitle").is_ok());
    }

    #[test]
    fn push_replaces_duplicate_columns_in_place() {
        let mut row = SourceRow::new().with("id", 1_i64).with("title", "a");
        row.push("id", 2_i64);
        assert_eq!(row.get("id"), Some(&SqlValue::Integer(2)));
        assert_eq!(row, SourceRow::new().with("id", 2_i64).with("title", "a"));
    }
}
