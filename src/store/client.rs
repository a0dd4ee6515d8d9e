//! HTTP client wrapper for writing documents through the Firestore REST API.

use crate::config::Config;
use crate::store::{DocumentSink, encode::encode_document, types::StoreError};
use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use serde_json::Value;

const MAX_DOCUMENT_ID_BYTES: usize = 1500;

/// Lightweight HTTP client for Firestore document writes.
pub struct FirestoreService {
    client: Client,
    documents_url: Url,
    access_token: Option<String>,
}

impl FirestoreService {
    /// Construct a client targeting the configured project and database.
    pub fn new(config: &Config) -> Result<Self, StoreError> {
        Self::with_endpoint(
            &config.firestore_url,
            &config.firestore_project,
            &config.firestore_database,
            config.firestore_access_token.clone(),
        )
    }

    /// Construct a client against an explicit endpoint, such as the Firestore emulator.
    pub fn with_endpoint(
        base_url: &str,
        project: &str,
        database: &str,
        access_token: Option<String>,
    ) -> Result<Self, StoreError> {
        let client = Client::builder()
            .user_agent("content-migrate/0.1")
            .build()?;

        let base_url = normalize_base_url(base_url).map_err(StoreError::InvalidUrl)?;
        let documents_url = Url::parse(&format!(
            "{base_url}/v1/projects/{project}/databases/{database}/documents"
        ))
        .map_err(|err| StoreError::InvalidUrl(err.to_string()))?;

        tracing::debug!(
            url = %documents_url,
            has_access_token = access_token.as_deref().is_some_and(|token| !token.is_empty()),
            "Initialized Firestore HTTP client"
        );

        Ok(Self {
            client,
            documents_url,
            access_token,
        })
    }

    /// Replace the document at `collection/id` with `document`.
    ///
    /// The `PATCH` carries no update mask, so Firestore overwrites every field and creates the
    /// document when it does not exist yet.
    pub async fn set_document(
        &self,
        collection: &str,
        id: &str,
        document: &Value,
    ) -> Result<(), StoreError> {
        validate_document_id(id)?;
        let url = self.document_url(collection, id)?;
        let body = encode_document(document)?;

        let response = self.request(Method::PATCH, url).json(&body).send().await?;

        if response.status().is_success() {
            tracing::debug!(collection, id, "Document written");
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = StoreError::UnexpectedStatus { status, body };
            tracing::error!(collection, id, error = %error, "Firestore write failed");
            Err(error)
        }
    }

    fn document_url(&self, collection: &str, id: &str) -> Result<Url, StoreError> {
        let mut url = self.documents_url.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::InvalidUrl(self.documents_url.to_string()))?
            .extend([collection, id]);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        let mut req = self.client.request(method, url);
        if let Some(token) = &self.access_token
            && !token.is_empty()
        {
            req = req.bearer_auth(token);
        }
        req
    }
}

#[async_trait]
impl DocumentSink for FirestoreService {
    async fn set_document(
        &self,
        collection: &str,
        id: &str,
        document: &Value,
    ) -> Result<(), StoreError> {
        FirestoreService::set_document(self, collection, id, document).await
    }
}

/// Reject ids Firestore cannot store as a document key.
fn validate_document_id(id: &str) -> Result<(), StoreError> {
    let reason = if id.is_empty() {
        Some("id is empty")
    } else if id.contains('/') {
        Some("id contains '/'")
    } else if id == "." || id == ".." {
        Some("id is a relative path segment")
    } else if id.len() > 2 && id.starts_with("__") && id.ends_with("__") {
        Some("id uses the reserved __name__ form")
    } else if id.len() > MAX_DOCUMENT_ID_BYTES {
        Some("id exceeds 1500 bytes")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(StoreError::InvalidDocumentId {
            id: id.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let parsed = Url::parse(url).map_err(|err| err.to_string())?;
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}
