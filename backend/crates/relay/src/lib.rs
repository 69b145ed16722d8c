//! Relay - Durable Transaction Plumbing
//!
//! Clean Architecture structure:
//! - `domain/` - Nonce lease entities, repository and chain gateway traits
//! - `application/` - Nonce pool, broadcaster and provisioning use cases
//! - `infra/` - PostgreSQL repository, Solana RPC gateway
//! - `presentation/` - Admin HTTP handlers (provisioning, pool status)
//!
//! ## Resource Model
//! - The nonce pool is the one shared mutable resource of the backend
//! - A lease is an exclusive-holder claim on one nonce account row,
//!   acquired and returned via compare-and-swap updates, never blind writes
//! - Every lease taken by the broadcaster is released exactly once on
//!   every exit path; leases orphaned by a crash are reclaimed at startup
//!   or through the webhook reconciliation path

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::broadcast::{Broadcaster, BroadcastReport};
pub use application::config::RelayConfig;
pub use application::nonce_pool::NoncePool;
pub use application::provision::ProvisionPool;
pub use domain::entities::{NonceLease, NonceStatus};
pub use domain::gateway::{SignatureStatus, SolanaGateway};
pub use domain::repository::NonceLeaseRepository;
pub use error::{RelayError, RelayResult};
pub use infra::postgres::PgNonceRepository;
pub use infra::rpc::RpcSolanaGateway;
pub use presentation::router::relay_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult, OptionExt, ResultExt},
    kind::ErrorKind,
};

#[cfg(test)]
mod tests;
