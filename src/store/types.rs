//! Shared types used by the document store adapters.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors returned while writing to the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid Firestore URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Firestore responded with an unexpected status code.
    #[error("Unexpected Firestore response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned from Firestore.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// The document id cannot be used as a Firestore document key.
    #[error("Invalid document id {id:?}: {reason}")]
    InvalidDocumentId {
        /// Offending id.
        id: String,
        /// Rule the id violates.
        reason: &'static str,
    },
    /// Documents must serialize to a JSON object.
    #[error("Document must be a JSON object")]
    NotAnObject,
    /// The document could not be serialized.
    #[error("Failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
    /// The store refused the write.
    #[error("Write rejected: {0}")]
    Rejected(String),
}
