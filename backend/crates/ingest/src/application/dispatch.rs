//! Batch Dispatch Use Case
//!
//! Routes each record of a webhook batch to its handler. Records are
//! processed with per-record concurrency; a handler failure is caught,
//! logged with the transaction signature for replay, and never aborts
//! the rest of the batch.

use crate::application::handlers::cancel_listing::CancelListingHandler;
use crate::application::handlers::listing::ListingHandler;
use crate::application::handlers::mint::MintHandler;
use crate::application::handlers::mint_rejected::MintRejectedHandler;
use crate::application::handlers::sale::SaleHandler;
use crate::application::handlers::state_change::StateChangeHandler;
use crate::application::handlers::transfer::TransferHandler;
use crate::application::subscriptions::SubscriptionRegistry;
use crate::domain::repository::{
    AssetRepository, ListingRepository, MetadataSource, MintProgramRepository,
    MintReceiptRepository, WatchlistApi,
};
use crate::domain::services::classify;
use crate::domain::value_objects::{EventKind, TransactionRecord};
use crate::error::IngestResult;
use futures::future::join_all;
use relay::{NonceLeaseRepository, SolanaGateway};
use std::sync::Arc;

/// Webhook Ingest Dispatcher
pub struct Dispatcher<S, N, G, M, W>
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
    mint: MintHandler<S, G, W>,
    transfer: TransferHandler<S>,
    listing: ListingHandler<S>,
    cancel_listing: CancelListingHandler<S>,
    sale: SaleHandler<S>,
    state_change: StateChangeHandler<S, N, M>,
    mint_rejected: MintRejectedHandler<S>,
}

impl<S, N, G, M, W> Dispatcher<S, N, G, M, W>
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
    pub fn new(
        mirror: Arc<S>,
        nonce_repo: Arc<N>,
        gateway: Arc<G>,
        metadata: Arc<M>,
        registry: Arc<SubscriptionRegistry<W>>,
    ) -> Self {
        Self {
            mint: MintHandler::new(mirror.clone(), gateway, registry),
            transfer: TransferHandler::new(mirror.clone()),
            listing: ListingHandler::new(mirror.clone()),
            cancel_listing: CancelListingHandler::new(mirror.clone()),
            sale: SaleHandler::new(mirror.clone()),
            state_change: StateChangeHandler::new(mirror.clone(), nonce_repo, metadata),
            mint_rejected: MintRejectedHandler::new(mirror),
        }
    }

    /// Process a batch of records with per-record concurrency.
    ///
    /// Never returns an error: every failure stays scoped to its record.
    pub async fn process_batch(&self, records: Vec<TransactionRecord>) {
        let work = records
            .into_iter()
            .map(|record| self.process_record(record));
        join_all(work).await;
    }

    async fn process_record(&self, record: TransactionRecord) {
        let signature = record.signature.clone();
        if let Err(e) = self.route(&record).await {
            tracing::error!(
                signature = %signature,
                error = %e,
                "Event handler failed; replay the signature to recover"
            );
        }
    }

    async fn route(&self, record: &TransactionRecord) -> IngestResult<()> {
        let (kind, fallback) = classify(record);
        if fallback {
            let last = record.instructions.last();
            tracing::warn!(
                signature = %record.signature,
                program = last.map(|i| i.program_id.as_str()).unwrap_or("-"),
                discriminator = ?last.map(|i| &i.data[..i.data.len().min(8)]),
                "Unrecognized instruction; routing to state-change fallback"
            );
        }
        tracing::debug!(
            signature = %record.signature,
            kind = kind.as_str(),
            "Dispatching record"
        );

        match kind {
            EventKind::Mint => self.mint.handle(record).await,
            EventKind::Transfer => self.transfer.handle(record).await,
            EventKind::Listing => self.listing.handle(record).await,
            EventKind::CancelListing => self.cancel_listing.handle(record).await,
            EventKind::Sale => self.sale.handle(record).await,
            EventKind::ComicStateChange => self.state_change.handle(record).await,
            EventKind::MintRejected => self.mint_rejected.handle(record).await,
        }
    }
}
