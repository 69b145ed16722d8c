//! Ingest Router

use crate::application::config::IngestConfig;
use crate::application::dispatch::Dispatcher;
use crate::application::subscriptions::SubscriptionRegistry;
use crate::infra::metadata::HttpMetadataSource;
use crate::infra::postgres::PgMirrorRepository;
use crate::infra::provider::HttpWatchlistApi;
use crate::presentation::handlers::{self, IngestAppState};
use axum::{Router, routing::post};
use relay::{PgNonceRepository, RpcSolanaGateway};
use std::sync::Arc;

type PgDispatcher = Dispatcher<
    PgMirrorRepository,
    PgNonceRepository,
    RpcSolanaGateway,
    HttpMetadataSource,
    HttpWatchlistApi,
>;

/// Create the ingest router with the production repositories and clients
pub fn ingest_router(
    mirror: PgMirrorRepository,
    nonce_repo: PgNonceRepository,
    gateway: RpcSolanaGateway,
    watchlist: HttpWatchlistApi,
    metadata: HttpMetadataSource,
    config: IngestConfig,
) -> Router {
    let registry = Arc::new(SubscriptionRegistry::new(Arc::new(watchlist)));
    let dispatcher = Arc::new(PgDispatcher::new(
        Arc::new(mirror),
        Arc::new(nonce_repo),
        Arc::new(gateway),
        Arc::new(metadata),
        registry,
    ));

    let state = IngestAppState {
        dispatcher,
        config: Arc::new(config),
    };

    Router::new()
        .route(
            "/events",
            post(handlers::receive_events::<
                PgMirrorRepository,
                PgNonceRepository,
                RpcSolanaGateway,
                HttpMetadataSource,
                HttpWatchlistApi,
            >),
        )
        .with_state(state)
}
