//! Metadata Document Client
//!
//! Fetches the JSON document a comic-state-change event points at.

use crate::domain::repository::MetadataSource;
use crate::error::{IngestError, IngestResult};
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP metadata source
#[derive(Clone)]
pub struct HttpMetadataSource {
    client: reqwest::Client,
}

impl HttpMetadataSource {
    pub fn new() -> IngestResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| IngestError::Metadata(e.to_string()))?;
        Ok(Self { client })
    }
}

impl MetadataSource for HttpMetadataSource {
    async fn fetch(&self, uri: &str) -> IngestResult<serde_json::Value> {
        let value = self
            .client
            .get(uri)
            .send()
            .await
            .map_err(|e| IngestError::Metadata(e.to_string()))?
            .error_for_status()
            .map_err(|e| IngestError::Metadata(e.to_string()))?
            .json()
            .await
            .map_err(|e| IngestError::Metadata(e.to_string()))?;
        Ok(value)
    }
}
