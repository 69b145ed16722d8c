//! Cancel Listing Handler
//!
//! Sets `canceled_at` on the currently open listing. Re-delivery matches
//! no open row and is a no-op.

use crate::domain::repository::ListingRepository;
use crate::domain::value_objects::TransactionRecord;
use crate::error::{IngestError, IngestResult};
use std::sync::Arc;

/// Cancel Listing Handler
pub struct CancelListingHandler<S>
where
    S: ListingRepository,
{
    mirror: Arc<S>,
}

impl<S> CancelListingHandler<S>
where
    S: ListingRepository,
{
    pub fn new(mirror: Arc<S>) -> Self {
        Self { mirror }
    }

    pub async fn handle(&self, record: &TransactionRecord) -> IngestResult<()> {
        let asset_address = record.asset_address().ok_or_else(|| {
            IngestError::MalformedRecord(format!("{}: cancel without asset", record.signature))
        })?;

        let closed = self
            .mirror
            .close_open(asset_address, record.timestamp)
            .await?;

        if closed {
            tracing::info!(
                asset = %asset_address,
                signature = %record.signature,
                "Listing canceled"
            );
        } else {
            tracing::debug!(
                asset = %asset_address,
                signature = %record.signature,
                "No open listing to cancel"
            );
        }
        Ok(())
    }
}
