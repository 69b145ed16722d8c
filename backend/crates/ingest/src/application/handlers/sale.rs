//! Sale Handler
//!
//! Closes the open listing with `canceled_at = sold_at = event timestamp`,
//! records the sale signature, and moves ownership to the buyer.

use crate::application::handlers::{primary_transfer, transfer_recipient};
use crate::domain::repository::{AssetRepository, ListingRepository};
use crate::domain::value_objects::TransactionRecord;
use crate::error::IngestResult;
use std::sync::Arc;

/// Sale Handler
pub struct SaleHandler<S>
where
    S: AssetRepository + ListingRepository,
{
    mirror: Arc<S>,
}

impl<S> SaleHandler<S>
where
    S: AssetRepository + ListingRepository,
{
    pub fn new(mirror: Arc<S>) -> Self {
        Self { mirror }
    }

    pub async fn handle(&self, record: &TransactionRecord) -> IngestResult<()> {
        let transfer = primary_transfer(record)?;
        let buyer = transfer_recipient(record, transfer)?;
        let asset_address = transfer.mint.as_str();

        let closed = self
            .mirror
            .close_open_as_sold(asset_address, record.timestamp, &record.signature)
            .await?;

        self.mirror
            .set_owner(asset_address, buyer, record.timestamp)
            .await?;

        tracing::info!(
            asset = %asset_address,
            buyer = %buyer,
            listing_closed = closed,
            signature = %record.signature,
            "Sale mirrored"
        );
        Ok(())
    }
}
