//! Chain Gateway Trait
//!
//! RPC abstraction over the blockchain provider. The production
//! implementation wraps the nonblocking RPC client; tests script it.

use crate::error::RelayResult;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;

/// Outcome of one signature status poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureStatus {
    /// Confirmed at or above the configured commitment
    Confirmed,
    /// Landed on chain but the transaction itself failed
    Failed(String),
    /// Not yet visible to the RPC node (retryable)
    Unknown,
}

/// Blockchain RPC gateway trait
#[trait_variant::make(SolanaGateway: Send)]
pub trait LocalSolanaGateway {
    /// Latest block reference, for provisioning-time transactions
    async fn latest_blockhash(&self) -> RelayResult<Hash>;

    /// Rent-exempt minimum balance for an account of `space` bytes
    async fn rent_exempt_minimum(&self, space: usize) -> RelayResult<u64>;

    /// Raw account data fetch
    async fn account_data(&self, address: &Pubkey) -> RelayResult<Vec<u8>>;

    /// Current value stored in a nonce account
    async fn nonce_value(&self, address: &Pubkey) -> RelayResult<Hash>;

    /// Submit a signed transaction without pre-flight simulation
    async fn send_transaction(&self, transaction: &Transaction) -> RelayResult<Signature>;

    /// One status check for a submitted signature
    async fn signature_status(&self, signature: &Signature) -> RelayResult<SignatureStatus>;
}
