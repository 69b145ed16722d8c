//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use axum::Router;
use ingest::{
    HttpMetadataSource, HttpWatchlistApi, IngestConfig, PgMirrorRepository, ingest_router,
};
use relay::{NoncePool, PgNonceRepository, RelayConfig, RpcSolanaGateway, relay_router};
use solana_sdk::signature::Keypair;
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,relay=info,ingest=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Relay configuration and chain gateway
    let rpc_url =
        env::var("RPC_URL").unwrap_or_else(|_| "http://127.0.0.1:8899".to_string());
    let relay_config = RelayConfig::with_rpc_url(rpc_url);
    let gateway = RpcSolanaGateway::confirmed(&relay_config.rpc_url);

    // Fee payer / nonce authority keypair
    let signer = match env::var("RELAY_KEYPAIR") {
        Ok(encoded) => Arc::new(Keypair::from_base58_string(&encoded)),
        Err(_) if cfg!(debug_assertions) => {
            tracing::warn!("RELAY_KEYPAIR not set, using an ephemeral keypair");
            Arc::new(Keypair::new())
        }
        Err(_) => anyhow::bail!("RELAY_KEYPAIR must be set in production"),
    };

    let nonce_repo = PgNonceRepository::new(pool.clone());

    // Startup reclaim: return leases orphaned by a previous crash.
    // Errors here should not prevent server startup
    let nonce_pool = NoncePool::new(
        Arc::new(nonce_repo.clone()),
        Arc::new(gateway.clone()),
        signer.clone(),
        Arc::new(relay_config.clone()),
    );
    match nonce_pool.reclaim_stale().await {
        Ok(reclaimed) => {
            tracing::info!(reclaimed = reclaimed, "Nonce lease reclaim completed");
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Nonce lease reclaim failed, continuing anyway"
            );
        }
    }

    // Ingest configuration and provider clients
    let ingest_config = IngestConfig {
        webhook_secret: env::var("WEBHOOK_SECRET").ok(),
        provider_base_url: env::var("WEBHOOK_PROVIDER_URL")
            .unwrap_or_else(|_| "https://api.helius.xyz".to_string()),
        provider_api_key: env::var("WEBHOOK_PROVIDER_API_KEY").unwrap_or_default(),
        webhook_id: env::var("WEBHOOK_ID").unwrap_or_default(),
    };
    let watchlist = HttpWatchlistApi::new(&ingest_config)?;
    let metadata = HttpMetadataSource::new()?;

    // Build router
    let app = Router::new()
        .nest(
            "/api/nonces",
            relay_router(
                nonce_repo.clone(),
                gateway.clone(),
                signer.clone(),
                relay_config,
            ),
        )
        .nest(
            "/api/webhooks",
            ingest_router(
                PgMirrorRepository::new(pool.clone()),
                nonce_repo,
                gateway,
                watchlist,
                metadata,
                ingest_config,
            ),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(31113);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
