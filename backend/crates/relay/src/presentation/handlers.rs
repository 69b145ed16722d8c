//! HTTP Handlers

use crate::application::nonce_pool::NoncePool;
use crate::application::provision::ProvisionPool;
use crate::domain::gateway::SolanaGateway;
use crate::domain::repository::NonceLeaseRepository;
use crate::error::{RelayError, RelayResult};
use crate::presentation::dto::{PoolStatusResponse, ProvisionRequest, ProvisionResponse};
use axum::Json;
use axum::extract::State;
use std::sync::Arc;

/// Shared state for relay handlers
pub struct RelayAppState<R, G>
where
    R: NonceLeaseRepository + Send + Sync + 'static,
    G: SolanaGateway + Send + Sync + 'static,
{
    pub pool: NoncePool<R, G>,
    pub provisioner: Arc<ProvisionPool<R, G>>,
}

impl<R, G> Clone for RelayAppState<R, G>
where
    R: NonceLeaseRepository + Send + Sync + 'static,
    G: SolanaGateway + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            provisioner: self.provisioner.clone(),
        }
    }
}

/// POST /api/nonces/provision
pub async fn provision<R, G>(
    State(state): State<RelayAppState<R, G>>,
    Json(req): Json<ProvisionRequest>,
) -> RelayResult<Json<ProvisionResponse>>
where
    R: NonceLeaseRepository + Send + Sync + 'static,
    G: SolanaGateway + Send + Sync + 'static,
{
    if req.count == 0 || req.count > 64 {
        return Err(RelayError::InvalidRequest(format!(
            "provision count {} out of range 1..=64",
            req.count
        )));
    }

    let nonce_addresses = state.provisioner.execute(req.count).await?;

    Ok(Json(ProvisionResponse { nonce_addresses }))
}

/// GET /api/nonces/status
pub async fn pool_status<R, G>(
    State(state): State<RelayAppState<R, G>>,
) -> RelayResult<Json<PoolStatusResponse>>
where
    R: NonceLeaseRepository + Send + Sync + 'static,
    G: SolanaGateway + Send + Sync + 'static,
{
    let (available, total) = state.pool.counts().await?;
    Ok(Json(PoolStatusResponse { available, total }))
}
