//! Mint Handler
//!
//! Mirrors a confirmed mint: upserts the Asset and its MintReceipt, puts
//! the new asset on the provider watch-list, and refreshes the mint
//! program's supply counters from chain. When the drop sells out, the
//! mint program's own subscription is removed.

use crate::application::handlers::{primary_transfer, transfer_recipient};
use crate::application::subscriptions::SubscriptionRegistry;
use crate::domain::entities::{Asset, MintReceipt};
use crate::domain::repository::{
    AssetRepository, MintProgramRepository, MintReceiptRepository, WatchlistApi,
};
use crate::domain::services::parse_mint_counters;
use crate::domain::value_objects::TransactionRecord;
use crate::error::{IngestError, IngestResult};
use kernel::id::MintReceiptId;
use relay::SolanaGateway;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use std::sync::Arc;

const DEFAULT_LABEL: &str = "default";

/// Mint Handler
pub struct MintHandler<S, G, W>
where
    S: AssetRepository + MintReceiptRepository + MintProgramRepository,
    G: SolanaGateway,
    W: WatchlistApi,
{
    mirror: Arc<S>,
    gateway: Arc<G>,
    registry: Arc<SubscriptionRegistry<W>>,
}

impl<S, G, W> MintHandler<S, G, W>
where
    S: AssetRepository + MintReceiptRepository + MintProgramRepository,
    G: SolanaGateway,
    W: WatchlistApi,
{
    pub fn new(
        mirror: Arc<S>,
        gateway: Arc<G>,
        registry: Arc<SubscriptionRegistry<W>>,
    ) -> Self {
        Self {
            mirror,
            gateway,
            registry,
        }
    }

    pub async fn handle(&self, record: &TransactionRecord) -> IngestResult<()> {
        let transfer = primary_transfer(record)?;
        let buyer = transfer_recipient(record, transfer)?.to_string();
        let asset_address = transfer.mint.clone();
        let mint_program = record
            .instructions
            .last()
            .map(|i| i.program_id.clone());
        let price = record.amount.unwrap_or_else(|| record.native_total());

        let asset = Asset::minted(
            asset_address.clone(),
            buyer.clone(),
            mint_program.clone(),
            record.timestamp,
        );
        self.mirror.upsert_minted(&asset).await?;

        let receipt = MintReceipt {
            id: MintReceiptId::new(),
            asset_address: asset_address.clone(),
            buyer,
            price_lamports: price,
            minted_at: record.timestamp,
            label: record
                .label
                .clone()
                .unwrap_or_else(|| DEFAULT_LABEL.to_string()),
            signature: record.signature.clone(),
        };
        self.mirror.upsert_receipt(&receipt).await?;

        // Watch the freshly minted asset for transfers/listings/sales
        self.registry.add(&asset_address).await?;

        tracing::info!(
            asset = %asset_address,
            signature = %record.signature,
            "Mint mirrored"
        );

        if let Some(program) = mint_program {
            self.refresh_supply(&program).await?;
        }

        Ok(())
    }

    /// Re-read the program's supply counters from chain.
    ///
    /// Counters are never incremented locally; missed or duplicated mint
    /// events therefore cannot make them drift.
    async fn refresh_supply(&self, program: &str) -> IngestResult<()> {
        let pubkey = Pubkey::from_str(program).map_err(|_| {
            IngestError::MalformedRecord(format!("invalid mint program address {program}"))
        })?;
        let data = self.gateway.account_data(&pubkey).await?;

        match parse_mint_counters(&data) {
            Some(counters) => {
                self.mirror.upsert_counters(program, &counters).await?;
                if counters.remaining() == 0 {
                    self.registry.remove(program).await?;
                    tracing::info!(
                        program = %program,
                        redeemed = counters.items_redeemed,
                        "Supply exhausted; mint program unsubscribed"
                    );
                }
            }
            None => {
                tracing::warn!(
                    program = %program,
                    "Mint counters unavailable; supply check skipped"
                );
            }
        }
        Ok(())
    }
}
