//! Nonce Pool Use Case
//!
//! Lease/advance/release discipline over the pool of durable nonce
//! accounts. Contention surfaces as `PoolExhausted` after a bounded retry
//! loop, never as indefinite blocking.

use crate::application::config::RelayConfig;
use crate::domain::entities::NonceLease;
use crate::domain::gateway::SolanaGateway;
use crate::domain::repository::NonceLeaseRepository;
use crate::error::{RelayError, RelayResult};
use chrono::Utc;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use solana_sdk::system_instruction;
use solana_sdk::transaction::Transaction;
use std::str::FromStr;
use std::sync::Arc;

/// Nonce Pool Manager
///
/// Cheap to clone; all fields are shared.
pub struct NoncePool<R, G>
where
    R: NonceLeaseRepository,
    G: SolanaGateway,
{
    repo: Arc<R>,
    gateway: Arc<G>,
    /// Signs advance instructions; also the nonce authority of every pool account
    authority: Arc<Keypair>,
    config: Arc<RelayConfig>,
}

impl<R, G> Clone for NoncePool<R, G>
where
    R: NonceLeaseRepository,
    G: SolanaGateway,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            gateway: self.gateway.clone(),
            authority: self.authority.clone(),
            config: self.config.clone(),
        }
    }
}

impl<R, G> NoncePool<R, G>
where
    R: NonceLeaseRepository,
    G: SolanaGateway,
{
    pub fn new(
        repo: Arc<R>,
        gateway: Arc<G>,
        authority: Arc<Keypair>,
        config: Arc<RelayConfig>,
    ) -> Self {
        Self {
            repo,
            gateway,
            authority,
            config,
        }
    }

    /// Acquire an exclusive lease on one nonce account.
    ///
    /// Retries with backoff up to the configured ceiling, then surfaces
    /// `PoolExhausted`. Every successful call must be matched by exactly
    /// one `release`/`advance` on every exit path of the caller.
    pub async fn lease(&self) -> RelayResult<NonceLease> {
        let policy = &self.config.lease_retry;
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            if let Some(lease) = self.repo.acquire().await? {
                tracing::debug!(
                    nonce_address = %lease.address,
                    attempt = attempt,
                    "Nonce leased"
                );
                return Ok(lease);
            }
            if policy.is_exhausted(attempt) {
                tracing::warn!(attempts = attempt, "No available nonce lease");
                return Err(RelayError::PoolExhausted);
            }
            tokio::time::sleep(policy.delay_after(attempt)).await;
        }
    }

    /// Return a leased nonce to the pool.
    ///
    /// Re-reads the on-chain value first (it changes whenever the nonce is
    /// advanced). If the re-read fails the row still goes back to the pool
    /// with its stored value; the next release corrects it.
    pub async fn release(&self, address: &str) -> RelayResult<()> {
        let pubkey = parse_pubkey(address)?;
        match self.gateway.nonce_value(&pubkey).await {
            Ok(value) => {
                self.repo.release(address, &value.to_string()).await?;
                tracing::debug!(nonce_address = %address, "Nonce released");
            }
            Err(e) => {
                tracing::warn!(
                    nonce_address = %address,
                    error = %e,
                    "Nonce value re-read failed, releasing with stored value"
                );
                self.repo.mark_available(address).await?;
            }
        }
        Ok(())
    }

    /// Advance the on-chain nonce value, then release the lease.
    ///
    /// The advance submission is best effort: a transient RPC failure is
    /// logged and the lease still returns to the pool, so a broadcast
    /// failure can never shrink it.
    pub async fn advance(&self, address: &str) -> RelayResult<()> {
        let pubkey = parse_pubkey(address)?;
        if let Err(e) = self.submit_advance(&pubkey).await {
            tracing::warn!(
                nonce_address = %address,
                error = %e,
                "Nonce advance submission failed"
            );
        }
        self.release(address).await
    }

    async fn submit_advance(&self, nonce_account: &Pubkey) -> RelayResult<()> {
        let instruction =
            system_instruction::advance_nonce_account(nonce_account, &self.authority.pubkey());
        let blockhash = self.gateway.latest_blockhash().await?;
        let transaction = Transaction::new_signed_with_payer(
            &[instruction],
            Some(&self.authority.pubkey()),
            &[self.authority.as_ref()],
            blockhash,
        );
        let signature = self.gateway.send_transaction(&transaction).await?;
        tracing::debug!(
            nonce_address = %nonce_account,
            signature = %signature,
            "Advance submitted"
        );
        Ok(())
    }

    /// Release the lease whose stored value matches an observed anchor.
    ///
    /// Reconciliation path for leases whose synchronous `release` never
    /// ran (e.g. the broadcaster died between submission and confirmation
    /// and the confirmed transaction later arrives through the webhook).
    pub async fn release_by_anchor(&self, anchor_value: &str) -> RelayResult<bool> {
        let matched = self.repo.release_by_value(anchor_value).await?;
        if matched {
            tracing::info!(anchor = %anchor_value, "Orphaned nonce lease reconciled");
        }
        Ok(matched)
    }

    /// Startup sweep returning orphaned InUse rows to the pool.
    pub async fn reclaim_stale(&self) -> RelayResult<u64> {
        let cutoff = Utc::now()
            - chrono::Duration::milliseconds(self.config.stale_lease_max_age_ms());
        let stale = self.repo.list_stale_in_use(cutoff).await?;
        let mut reclaimed = 0u64;
        for lease in stale {
            self.release(&lease.address).await?;
            reclaimed += 1;
        }
        if reclaimed > 0 {
            tracing::info!(reclaimed = reclaimed, "Reclaimed stale nonce leases");
        }
        Ok(reclaimed)
    }

    /// Available/total pool counts
    pub async fn counts(&self) -> RelayResult<(i64, i64)> {
        let available = self.repo.count_available().await?;
        let total = self.repo.count_total().await?;
        Ok((available, total))
    }
}

pub(crate) fn parse_pubkey(address: &str) -> RelayResult<Pubkey> {
    Pubkey::from_str(address).map_err(|_| RelayError::InvalidAnchor(address.to_string()))
}
