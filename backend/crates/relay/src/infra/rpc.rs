//! Solana RPC Gateway Implementation

use crate::domain::gateway::{SignatureStatus, SolanaGateway};
use crate::error::{RelayError, RelayResult};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::nonce::state::{State, Versions};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use std::sync::Arc;

/// Gateway over the nonblocking RPC client
#[derive(Clone)]
pub struct RpcSolanaGateway {
    client: Arc<RpcClient>,
    commitment: CommitmentConfig,
}

impl RpcSolanaGateway {
    pub fn new(rpc_url: impl Into<String>, commitment: CommitmentConfig) -> Self {
        let client = Arc::new(RpcClient::new_with_commitment(rpc_url.into(), commitment));
        Self { client, commitment }
    }

    /// Gateway confirming at the `confirmed` commitment level
    pub fn confirmed(rpc_url: impl Into<String>) -> Self {
        Self::new(rpc_url, CommitmentConfig::confirmed())
    }
}

impl SolanaGateway for RpcSolanaGateway {
    async fn latest_blockhash(&self) -> RelayResult<Hash> {
        Ok(self.client.get_latest_blockhash().await?)
    }

    async fn rent_exempt_minimum(&self, space: usize) -> RelayResult<u64> {
        Ok(self
            .client
            .get_minimum_balance_for_rent_exemption(space)
            .await?)
    }

    async fn account_data(&self, address: &Pubkey) -> RelayResult<Vec<u8>> {
        let account = self.client.get_account(address).await?;
        Ok(account.data)
    }

    async fn nonce_value(&self, address: &Pubkey) -> RelayResult<Hash> {
        let account = self.client.get_account(address).await?;
        let versions: Versions = bincode::deserialize(&account.data).map_err(|e| {
            RelayError::InvalidAnchor(format!("nonce account {address}: {e}"))
        })?;
        match versions.state() {
            State::Initialized(data) => Ok(data.blockhash()),
            State::Uninitialized => Err(RelayError::InvalidAnchor(format!(
                "nonce account {address} is uninitialized"
            ))),
        }
    }

    async fn send_transaction(&self, transaction: &Transaction) -> RelayResult<Signature> {
        // Pre-flight simulation would consume the nonce advance on the
        // simulated bank; submission goes straight to the leader.
        let config = RpcSendTransactionConfig {
            skip_preflight: true,
            ..RpcSendTransactionConfig::default()
        };
        Ok(self
            .client
            .send_transaction_with_config(transaction, config)
            .await?)
    }

    async fn signature_status(&self, signature: &Signature) -> RelayResult<SignatureStatus> {
        let status = self
            .client
            .get_signature_status_with_commitment(signature, self.commitment)
            .await?;
        Ok(match status {
            Some(Ok(())) => SignatureStatus::Confirmed,
            Some(Err(e)) => SignatureStatus::Failed(e.to_string()),
            None => SignatureStatus::Unknown,
        })
    }
}
