//! Event Handlers
//!
//! One handler per event kind. Each performs an idempotent state
//! transition against the asset mirror; re-processing an already-seen
//! transaction signature never creates a duplicate receipt, double-closes
//! a listing or double-decrements a counter.

pub mod cancel_listing;
pub mod listing;
pub mod mint;
pub mod mint_rejected;
pub mod sale;
pub mod state_change;
pub mod transfer;

use crate::domain::value_objects::{TokenTransfer, TransactionRecord};
use crate::error::{IngestError, IngestResult};

/// The token movement a mint/transfer/sale record is about
pub(crate) fn primary_transfer(record: &TransactionRecord) -> IngestResult<&TokenTransfer> {
    record.token_transfers.first().ok_or_else(|| {
        IngestError::MalformedRecord(format!(
            "{}: no token transfer in record",
            record.signature
        ))
    })
}

/// Receiving side of the primary token movement
pub(crate) fn transfer_recipient<'a>(
    record: &'a TransactionRecord,
    transfer: &'a TokenTransfer,
) -> IngestResult<&'a str> {
    transfer.to.as_deref().ok_or_else(|| {
        IngestError::MalformedRecord(format!(
            "{}: token transfer without recipient",
            record.signature
        ))
    })
}
