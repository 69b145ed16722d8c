//! Relay Router

use crate::application::config::RelayConfig;
use crate::application::nonce_pool::NoncePool;
use crate::application::provision::ProvisionPool;
use crate::infra::postgres::PgNonceRepository;
use crate::infra::rpc::RpcSolanaGateway;
use crate::presentation::handlers::{self, RelayAppState};
use axum::{
    Router,
    routing::{get, post},
};
use solana_sdk::signature::Keypair;
use std::sync::Arc;

/// Create the relay admin router with the production repository and gateway
pub fn relay_router(
    repo: PgNonceRepository,
    gateway: RpcSolanaGateway,
    signer: Arc<Keypair>,
    config: RelayConfig,
) -> Router {
    let repo = Arc::new(repo);
    let gateway = Arc::new(gateway);
    let config = Arc::new(config);

    let pool = NoncePool::new(
        repo.clone(),
        gateway.clone(),
        signer.clone(),
        config.clone(),
    );
    let provisioner = Arc::new(ProvisionPool::new(repo, gateway, signer, config));

    let state = RelayAppState { pool, provisioner };

    Router::new()
        .route(
            "/provision",
            post(handlers::provision::<PgNonceRepository, RpcSolanaGateway>),
        )
        .route(
            "/status",
            get(handlers::pool_status::<PgNonceRepository, RpcSolanaGateway>),
        )
        .with_state(state)
}
