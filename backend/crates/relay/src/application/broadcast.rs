//! Broadcast Use Case
//!
//! Builds, signs and submits a durable transaction anchored on a leased
//! nonce value, then polls for confirmation. The anchor keeps the signed
//! transaction valid until its nonce is advanced, so submission never
//! races against blockhash expiry.

use crate::application::config::RelayConfig;
use crate::application::nonce_pool::{NoncePool, parse_pubkey};
use crate::domain::entities::NonceLease;
use crate::domain::gateway::{SignatureStatus, SolanaGateway};
use crate::domain::repository::NonceLeaseRepository;
use crate::error::{RelayError, RelayResult};
use solana_sdk::hash::Hash;
use solana_sdk::instruction::Instruction;
use solana_sdk::message::Message;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use solana_sdk::transaction::Transaction;
use std::str::FromStr;
use std::sync::Arc;

/// Outcome of one broadcast attempt.
///
/// A confirmation timeout is a reported failure, not an error: the caller
/// may rebuild and resend with a freshly leased nonce.
#[derive(Debug, Clone)]
pub struct BroadcastReport {
    pub signature: String,
    pub confirmed: bool,
    pub attempts: u32,
    /// On-chain execution error, if the transaction landed but failed
    pub error: Option<String>,
}

/// Transaction Broadcaster
pub struct Broadcaster<R, G>
where
    R: NonceLeaseRepository,
    G: SolanaGateway,
{
    pool: NoncePool<R, G>,
    gateway: Arc<G>,
    /// Fee payer; also the nonce authority of the pool
    signer: Arc<Keypair>,
    config: Arc<RelayConfig>,
}

impl<R, G> Broadcaster<R, G>
where
    R: NonceLeaseRepository,
    G: SolanaGateway,
{
    pub fn new(
        pool: NoncePool<R, G>,
        gateway: Arc<G>,
        signer: Arc<Keypair>,
        config: Arc<RelayConfig>,
    ) -> Self {
        Self {
            pool,
            gateway,
            signer,
            config,
        }
    }

    /// Lease a nonce, submit the instructions anchored on it, poll for
    /// confirmation.
    ///
    /// The lease is advanced-and-released exactly once on every exit path,
    /// including submission errors and confirmation timeouts, so a failed
    /// broadcast can never shrink the pool.
    pub async fn build_and_send(
        &self,
        instructions: Vec<Instruction>,
        extra_signers: &[&Keypair],
    ) -> RelayResult<BroadcastReport> {
        let lease = self.pool.lease().await?;

        let result = self
            .submit_and_confirm(&lease, instructions, extra_signers)
            .await;

        // Single cleanup point. advance() releases internally and tolerates
        // submission failures, so the lease always returns to the pool.
        if let Err(e) = self.pool.advance(&lease.address).await {
            tracing::error!(
                nonce_address = %lease.address,
                error = %e,
                "Failed to return nonce lease to the pool"
            );
        }

        result
    }

    async fn submit_and_confirm(
        &self,
        lease: &NonceLease,
        instructions: Vec<Instruction>,
        extra_signers: &[&Keypair],
    ) -> RelayResult<BroadcastReport> {
        let nonce_account = parse_pubkey(&lease.address)?;
        let anchor = Hash::from_str(&lease.current_value)
            .map_err(|_| RelayError::InvalidAnchor(lease.current_value.clone()))?;

        // The advance-nonce instruction is prepended by the message
        // constructor; the anchor stands in for a recent block reference.
        let message = Message::new_with_nonce(
            instructions,
            Some(&self.signer.pubkey()),
            &nonce_account,
            &self.signer.pubkey(),
        );
        let mut transaction = Transaction::new_unsigned(message);

        let mut signers: Vec<&Keypair> = vec![self.signer.as_ref()];
        signers.extend_from_slice(extra_signers);
        transaction.try_sign(&signers, anchor)?;

        let signature = self.gateway.send_transaction(&transaction).await?;
        tracing::info!(
            signature = %signature,
            nonce_address = %lease.address,
            "Transaction submitted"
        );

        self.poll_confirmation(signature.to_string()).await
    }

    /// Bounded confirmation polling.
    ///
    /// Only the status check is resubmitted; unknown and transient-RPC
    /// responses both count as retryable.
    async fn poll_confirmation(&self, signature: String) -> RelayResult<BroadcastReport> {
        let policy = &self.config.confirm_retry;
        let parsed = solana_sdk::signature::Signature::from_str(&signature)
            .map_err(|_| RelayError::InvalidAnchor(signature.clone()))?;

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.gateway.signature_status(&parsed).await {
                Ok(SignatureStatus::Confirmed) => {
                    tracing::info!(
                        signature = %signature,
                        attempts = attempt,
                        "Transaction confirmed"
                    );
                    return Ok(BroadcastReport {
                        signature,
                        confirmed: true,
                        attempts: attempt,
                        error: None,
                    });
                }
                Ok(SignatureStatus::Failed(err)) => {
                    tracing::warn!(
                        signature = %signature,
                        error = %err,
                        "Transaction landed but failed"
                    );
                    return Ok(BroadcastReport {
                        signature,
                        confirmed: false,
                        attempts: attempt,
                        error: Some(err),
                    });
                }
                Ok(SignatureStatus::Unknown) => {
                    tracing::debug!(
                        signature = %signature,
                        attempt = attempt,
                        "Status unknown"
                    );
                }
                Err(e) => {
                    tracing::debug!(
                        signature = %signature,
                        attempt = attempt,
                        error = %e,
                        "Status check failed, will retry"
                    );
                }
            }

            if policy.is_exhausted(attempt) {
                tracing::warn!(
                    signature = %signature,
                    attempts = attempt,
                    "Confirmation polling exhausted"
                );
                return Ok(BroadcastReport {
                    signature,
                    confirmed: false,
                    attempts: attempt,
                    error: None,
                });
            }
            tokio::time::sleep(policy.delay_after(attempt)).await;
        }
    }
}
