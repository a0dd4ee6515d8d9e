#![deny(missing_docs)]

//! Core library for migrating relational content records into Firestore.
//!
//! Each source row becomes two documents under the same key: a search document carrying
//! prefix tokens for search-as-you-type, and a content document carrying the ordered,
//! sanitized chunks of the record.

/// Environment-driven configuration management.
pub mod config;
/// Structured logging and tracing setup.
pub mod logging;
/// Migration counters.
pub mod metrics;
/// Keyword extraction, chunk assembly, and the migration driver.
pub mod processing;
/// Relational source adapters.
pub mod source;
/// Document store adapters.
pub mod store;
