//! Mint Rejected Handler
//!
//! Records a rejected mint against the originating program's counters.
//! No ownership change is issued. Rejections are deduped by transaction
//! signature so re-delivery never double-counts.

use crate::domain::repository::MintProgramRepository;
use crate::domain::value_objects::TransactionRecord;
use crate::error::{IngestError, IngestResult};
use std::sync::Arc;

/// Mint Rejected Handler
pub struct MintRejectedHandler<S>
where
    S: MintProgramRepository,
{
    mirror: Arc<S>,
}

impl<S> MintRejectedHandler<S>
where
    S: MintProgramRepository,
{
    pub fn new(mirror: Arc<S>) -> Self {
        Self { mirror }
    }

    pub async fn handle(&self, record: &TransactionRecord) -> IngestResult<()> {
        let program = record
            .instructions
            .last()
            .map(|i| i.program_id.as_str())
            .ok_or_else(|| {
                IngestError::MalformedRecord(format!(
                    "{}: rejection without originating program",
                    record.signature
                ))
            })?;

        let fresh = self
            .mirror
            .record_rejection(program, &record.signature)
            .await?;

        if fresh {
            tracing::info!(
                program = %program,
                signature = %record.signature,
                "Mint rejection recorded"
            );
        } else {
            tracing::debug!(
                program = %program,
                signature = %record.signature,
                "Mint rejection already recorded"
            );
        }
        Ok(())
    }
}
