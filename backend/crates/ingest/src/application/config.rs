//! Application Configuration
//!
//! Configuration for the ingest application layer.

/// Ingest application configuration
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Shared secret the provider sends in the Authorization header.
    /// `None` disables the check (local development).
    pub webhook_secret: Option<String>,
    /// Base URL of the webhook-management API
    pub provider_base_url: String,
    /// API key for the webhook-management API
    pub provider_api_key: String,
    /// Identifier of the managed webhook whose watch-list we own
    pub webhook_id: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            webhook_secret: None,
            provider_base_url: "https://api.helius.xyz".to_string(),
            provider_api_key: String::new(),
            webhook_id: String::new(),
        }
    }
}

impl IngestConfig {
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            webhook_secret: Some(secret.into()),
            ..Default::default()
        }
    }
}
