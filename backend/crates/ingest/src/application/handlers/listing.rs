//! Listing Handler
//!
//! Upserts the open listing row for the asset. Uniqueness on
//! (asset, open-sentinel) means a second listing event while one is open
//! updates the price instead of creating a sibling.

use crate::domain::repository::ListingRepository;
use crate::domain::value_objects::TransactionRecord;
use crate::error::{IngestError, IngestResult};
use std::sync::Arc;

/// Listing Handler
pub struct ListingHandler<S>
where
    S: ListingRepository,
{
    mirror: Arc<S>,
}

impl<S> ListingHandler<S>
where
    S: ListingRepository,
{
    pub fn new(mirror: Arc<S>) -> Self {
        Self { mirror }
    }

    pub async fn handle(&self, record: &TransactionRecord) -> IngestResult<()> {
        let asset_address = record.asset_address().ok_or_else(|| {
            IngestError::MalformedRecord(format!("{}: listing without asset", record.signature))
        })?;
        let price = record.amount.ok_or_else(|| {
            IngestError::MalformedRecord(format!("{}: listing without amount", record.signature))
        })?;

        self.mirror
            .upsert_open(asset_address, price, record.timestamp)
            .await?;

        tracing::info!(
            asset = %asset_address,
            price_lamports = price,
            signature = %record.signature,
            "Listing mirrored"
        );
        Ok(())
    }
}
