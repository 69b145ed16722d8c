//! Comic State Change Handler
//!
//! Re-derives the off-chain trait flags from the metadata document the
//! event points at, and reconciles orphaned nonce leases: if the
//! transaction's anchor matches an InUse lease, the broadcaster that held
//! it never got to release it (it died between submission and
//! confirmation), and the lease goes back to the pool here.
//!
//! This handler is also the legacy fallback target for unclassified
//! records; those may carry no asset reference at all, in which case only
//! the reconciliation runs.

use crate::domain::repository::{AssetRepository, MetadataSource};
use crate::domain::services::derive_comic_traits;
use crate::domain::value_objects::TransactionRecord;
use crate::error::IngestResult;
use relay::NonceLeaseRepository;
use std::sync::Arc;

/// Comic State Change Handler
pub struct StateChangeHandler<S, N, M>
where
    S: AssetRepository,
    N: NonceLeaseRepository,
    M: MetadataSource,
{
    mirror: Arc<S>,
    nonce_repo: Arc<N>,
    metadata: Arc<M>,
}

impl<S, N, M> StateChangeHandler<S, N, M>
where
    S: AssetRepository,
    N: NonceLeaseRepository,
    M: MetadataSource,
{
    pub fn new(mirror: Arc<S>, nonce_repo: Arc<N>, metadata: Arc<M>) -> Self {
        Self {
            mirror,
            nonce_repo,
            metadata,
        }
    }

    pub async fn handle(&self, record: &TransactionRecord) -> IngestResult<()> {
        // Reconciliation first: it must run even for fallback-routed
        // records that carry nothing else usable.
        if let Some(anchor) = &record.anchor {
            let matched = self.nonce_repo.release_by_value(anchor).await?;
            if matched {
                tracing::info!(
                    signature = %record.signature,
                    anchor = %anchor,
                    "Orphaned nonce lease reconciled from webhook"
                );
            }
        }

        match (record.asset_address(), record.metadata_uri.as_deref()) {
            (Some(asset_address), Some(uri)) => {
                let metadata = self.metadata.fetch(uri).await?;
                let traits = derive_comic_traits(&metadata);
                self.mirror.set_traits(asset_address, &traits).await?;
                tracing::info!(
                    asset = %asset_address,
                    used = traits.used,
                    signed = traits.signed,
                    signature = %record.signature,
                    "Comic state re-derived"
                );
            }
            _ => {
                tracing::debug!(
                    signature = %record.signature,
                    "State change without metadata pointer; traits untouched"
                );
            }
        }
        Ok(())
    }
}
