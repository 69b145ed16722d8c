//! Ingest - Webhook Reconciliation of On-Chain Asset State
//!
//! Clean Architecture structure:
//! - `domain/` - Asset mirror entities, classification services, repository traits
//! - `application/` - Batch dispatcher, per-event handlers, subscription registry
//! - `infra/` - PostgreSQL mirror, webhook-management and metadata HTTP clients
//! - `presentation/` - Provider callback endpoint
//!
//! ## Delivery Model
//! - The provider delivers enriched transactions at least once; every
//!   handler is an idempotent state transition keyed by natural
//!   identifiers (address, signature), never a blind insert
//! - Records in a batch are processed independently; one failing handler
//!   is logged with its transaction signature and never aborts siblings
//! - Nothing on this path is allowed to crash the process

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::IngestConfig;
pub use application::dispatch::Dispatcher;
pub use application::subscriptions::SubscriptionRegistry;
pub use domain::value_objects::{EventKind, TransactionRecord};
pub use error::{IngestError, IngestResult};
pub use infra::metadata::HttpMetadataSource;
pub use infra::postgres::PgMirrorRepository;
pub use infra::provider::HttpWatchlistApi;
pub use presentation::router::ingest_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult, OptionExt, ResultExt},
    kind::ErrorKind,
};
