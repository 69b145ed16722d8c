//! HTTP Handlers

use crate::application::config::IngestConfig;
use crate::application::dispatch::Dispatcher;
use crate::domain::repository::{
    AssetRepository, ListingRepository, MetadataSource, MintProgramRepository,
    MintReceiptRepository, WatchlistApi,
};
use crate::error::{IngestError, IngestResult};
use crate::presentation::dto::EnrichedTransactionDto;
use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use relay::{NonceLeaseRepository, SolanaGateway};
use std::sync::Arc;

/// Shared state for ingest handlers
pub struct IngestAppState<S, N, G, M, W>
where
    S: AssetRepository
        + ListingRepository
        + MintReceiptRepository
        + MintProgramRepository
        + Send
        + Sync
        + 'static,
    N: NonceLeaseRepository + Send + Sync + 'static,
    G: SolanaGateway + Send + Sync + 'static,
    M: MetadataSource + Send + Sync + 'static,
    W: WatchlistApi + Send + Sync + 'static,
{
    pub dispatcher: Arc<Dispatcher<S, N, G, M, W>>,
    pub config: Arc<IngestConfig>,
}

impl<S, N, G, M, W> Clone for IngestAppState<S, N, G, M, W>
where
    S: AssetRepository
        + ListingRepository
        + MintReceiptRepository
        + MintProgramRepository
        + Send
        + Sync
        + 'static,
    N: NonceLeaseRepository + Send + Sync + 'static,
    G: SolanaGateway + Send + Sync + 'static,
    M: MetadataSource + Send + Sync + 'static,
    W: WatchlistApi + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            config: self.config.clone(),
        }
    }
}

/// POST /api/webhooks/events
///
/// Fire-and-forget ingress: the batch is validated, handed to the
/// dispatcher on a spawned task, and the provider gets its 200
/// immediately.
pub async fn receive_events<S, N, G, M, W>(
    State(state): State<IngestAppState<S, N, G, M, W>>,
    headers: HeaderMap,
    Json(batch): Json<Vec<EnrichedTransactionDto>>,
) -> IngestResult<StatusCode>
where
    S: AssetRepository
        + ListingRepository
        + MintReceiptRepository
        + MintProgramRepository
        + Send
        + Sync
        + 'static,
    N: NonceLeaseRepository + Send + Sync + 'static,
    G: SolanaGateway + Send + Sync + 'static,
    M: MetadataSource + Send + Sync + 'static,
    W: WatchlistApi + Send + Sync + 'static,
{
    authorize(&headers, &state.config)?;

    let mut records = Vec::with_capacity(batch.len());
    for dto in batch {
        let signature = dto.signature.clone();
        match dto.into_record() {
            Ok(record) => records.push(record),
            Err(e) => {
                // Malformed records are logged and skipped; the batch
                // continues.
                tracing::warn!(
                    signature = %signature,
                    error = %e,
                    "Malformed webhook record skipped"
                );
            }
        }
    }

    tracing::info!(records = records.len(), "Webhook batch accepted");

    let dispatcher = state.dispatcher.clone();
    tokio::spawn(async move {
        dispatcher.process_batch(records).await;
    });

    Ok(StatusCode::OK)
}

fn authorize(headers: &HeaderMap, config: &IngestConfig) -> IngestResult<()> {
    let Some(secret) = &config.webhook_secret else {
        return Ok(());
    };
    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(IngestError::Unauthorized)?;
    if !platform::crypto::secrets_match(provided, secret) {
        return Err(IngestError::Unauthorized);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_authorize_without_secret_allows_all() {
        let config = IngestConfig::default();
        assert!(authorize(&HeaderMap::new(), &config).is_ok());
    }

    #[test]
    fn test_authorize_checks_header() {
        let config = IngestConfig::with_secret("hook-secret");

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("hook-secret"));
        assert!(authorize(&headers, &config).is_ok());

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("wrong"));
        assert!(matches!(
            authorize(&headers, &config),
            Err(IngestError::Unauthorized)
        ));

        assert!(matches!(
            authorize(&HeaderMap::new(), &config),
            Err(IngestError::Unauthorized)
        ));
    }
}
