//! Provision Pool Use Case
//!
//! Creates on-chain nonce accounts in a batch and persists them as
//! Available pool rows. Provisioning transactions are anchored on a
//! recent block reference; only the pool's consumers need durability.

use crate::application::config::RelayConfig;
use crate::domain::entities::NonceLease;
use crate::domain::gateway::{SignatureStatus, SolanaGateway};
use crate::domain::repository::NonceLeaseRepository;
use crate::error::{RelayError, RelayResult};
use solana_sdk::nonce::State;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::signer::Signer;
use solana_sdk::system_instruction;
use solana_sdk::transaction::Transaction;
use std::sync::Arc;

/// Provision Pool Use Case
pub struct ProvisionPool<R, G>
where
    R: NonceLeaseRepository,
    G: SolanaGateway,
{
    repo: Arc<R>,
    gateway: Arc<G>,
    /// Pays the rent-exempt balance of new nonce accounts
    payer: Arc<Keypair>,
    config: Arc<RelayConfig>,
}

impl<R, G> ProvisionPool<R, G>
where
    R: NonceLeaseRepository,
    G: SolanaGateway,
{
    pub fn new(
        repo: Arc<R>,
        gateway: Arc<G>,
        payer: Arc<Keypair>,
        config: Arc<RelayConfig>,
    ) -> Self {
        Self {
            repo,
            gateway,
            payer,
            config,
        }
    }

    /// Create `count` nonce accounts and persist them as Available.
    ///
    /// Accounts are provisioned one at a time; a mid-batch failure leaves
    /// the already persisted rows usable.
    pub async fn execute(&self, count: u32) -> RelayResult<Vec<String>> {
        let rent = self.gateway.rent_exempt_minimum(State::size()).await?;
        let mut addresses = Vec::with_capacity(count as usize);

        for _ in 0..count {
            let address = self.provision_one(rent).await?;
            tracing::info!(nonce_address = %address, "Nonce account provisioned");
            addresses.push(address);
        }

        Ok(addresses)
    }

    async fn provision_one(&self, rent: u64) -> RelayResult<String> {
        let nonce_keypair = Keypair::new();
        let instructions = system_instruction::create_nonce_account(
            &self.payer.pubkey(),
            &nonce_keypair.pubkey(),
            // The payer keypair stays the sole advance authority
            &self.payer.pubkey(),
            rent,
        );

        let blockhash = self.gateway.latest_blockhash().await?;
        let transaction = Transaction::new_signed_with_payer(
            &instructions,
            Some(&self.payer.pubkey()),
            &[self.payer.as_ref(), &nonce_keypair],
            blockhash,
        );

        let signature = self.gateway.send_transaction(&transaction).await?;
        self.wait_for_confirmation(&signature).await?;

        let value = self.gateway.nonce_value(&nonce_keypair.pubkey()).await?;
        let lease = NonceLease::provisioned(
            nonce_keypair.pubkey().to_string(),
            value.to_string(),
        );
        self.repo.insert(&lease).await?;

        Ok(lease.address)
    }

    async fn wait_for_confirmation(&self, signature: &Signature) -> RelayResult<()> {
        let policy = &self.config.provision_confirm_retry;
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.gateway.signature_status(signature).await {
                Ok(SignatureStatus::Confirmed) => return Ok(()),
                Ok(SignatureStatus::Failed(err)) => {
                    return Err(RelayError::Internal(format!(
                        "nonce account creation failed on chain: {err}"
                    )));
                }
                Ok(SignatureStatus::Unknown) => {}
                Err(e) => {
                    tracing::debug!(
                        signature = %signature,
                        attempt = attempt,
                        error = %e,
                        "Provision status check failed, will retry"
                    );
                }
            }
            if policy.is_exhausted(attempt) {
                return Err(RelayError::ConfirmationTimeout {
                    signature: signature.to_string(),
                });
            }
            tokio::time::sleep(policy.delay_after(attempt)).await;
        }
    }
}
