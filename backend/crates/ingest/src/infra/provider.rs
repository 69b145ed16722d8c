//! Webhook-Management API Client
//!
//! Read/replace client for the provider's managed webhook. There is no
//! incremental add/remove upstream; both operations work on the full
//! address list.

use crate::application::config::IngestConfig;
use crate::domain::repository::WatchlistApi;
use crate::error::{IngestError, IngestResult};
use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP watch-list client
#[derive(Clone)]
pub struct HttpWatchlistApi {
    client: reqwest::Client,
    base_url: String,
    webhook_id: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebhookSettings {
    #[serde(default)]
    account_addresses: Vec<String>,
}

impl HttpWatchlistApi {
    pub fn new(config: &IngestConfig) -> IngestResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| IngestError::Provider(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.provider_base_url.trim_end_matches('/').to_string(),
            webhook_id: config.webhook_id.clone(),
            api_key: config.provider_api_key.clone(),
        })
    }

    fn webhook_url(&self) -> String {
        format!(
            "{}/v0/webhooks/{}?api-key={}",
            self.base_url, self.webhook_id, self.api_key
        )
    }
}

impl WatchlistApi for HttpWatchlistApi {
    async fn fetch_addresses(&self) -> IngestResult<Vec<String>> {
        let settings: WebhookSettings = self
            .client
            .get(self.webhook_url())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(settings.account_addresses)
    }

    async fn replace_addresses(&self, addresses: &[String]) -> IngestResult<()> {
        self.client
            .put(self.webhook_url())
            .json(&serde_json::json!({ "accountAddresses": addresses }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
