//! Transfer Handler
//!
//! Updates ownership and closes any open listing for the asset: a
//! transfer invalidates an outstanding listing, and the two writes form
//! one combined transition as far as observers are concerned.

use crate::application::handlers::{primary_transfer, transfer_recipient};
use crate::domain::repository::{AssetRepository, ListingRepository};
use crate::domain::value_objects::TransactionRecord;
use crate::error::IngestResult;
use std::sync::Arc;

/// Transfer Handler
pub struct TransferHandler<S>
where
    S: AssetRepository + ListingRepository,
{
    mirror: Arc<S>,
}

impl<S> TransferHandler<S>
where
    S: AssetRepository + ListingRepository,
{
    pub fn new(mirror: Arc<S>) -> Self {
        Self { mirror }
    }

    pub async fn handle(&self, record: &TransactionRecord) -> IngestResult<()> {
        let transfer = primary_transfer(record)?;
        let new_owner = transfer_recipient(record, transfer)?;
        let asset_address = transfer.mint.as_str();

        self.mirror
            .set_owner(asset_address, new_owner, record.timestamp)
            .await?;

        let closed = self
            .mirror
            .close_open(asset_address, record.timestamp)
            .await?;

        tracing::info!(
            asset = %asset_address,
            owner = %new_owner,
            listing_closed = closed,
            signature = %record.signature,
            "Transfer mirrored"
        );
        Ok(())
    }
}
