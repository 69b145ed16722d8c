//! Unit tests for the relay crate
//!
//! All tests run against in-memory fakes of the repository and the RPC
//! gateway; nothing here talks to a database or a validator.

#![allow(clippy::unwrap_used)]

use crate::application::broadcast::Broadcaster;
use crate::application::config::RelayConfig;
use crate::application::nonce_pool::NoncePool;
use crate::application::provision::ProvisionPool;
use crate::domain::entities::{NonceLease, NonceStatus};
use crate::domain::gateway::{SignatureStatus, SolanaGateway};
use crate::domain::repository::NonceLeaseRepository;
use crate::error::{RelayError, RelayResult};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use platform::retry::RetryPolicy;
use solana_sdk::hash::{Hash, hash};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::signer::Signer;
use solana_sdk::system_instruction;
use solana_sdk::transaction::Transaction;
use std::collections::{HashMap, VecDeque};
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Fakes
// ============================================================================

#[derive(Default)]
struct MockNonceRepo {
    rows: Mutex<HashMap<String, NonceLease>>,
    acquire_calls: AtomicU32,
}

impl MockNonceRepo {
    fn with_rows(rows: Vec<NonceLease>) -> Self {
        Self {
            rows: Mutex::new(rows.into_iter().map(|l| (l.address.clone(), l)).collect()),
            acquire_calls: AtomicU32::new(0),
        }
    }

    fn status_of(&self, address: &str) -> NonceStatus {
        self.rows.lock().unwrap()[address].status
    }

    fn value_of(&self, address: &str) -> String {
        self.rows.lock().unwrap()[address].current_value.clone()
    }
}

impl NonceLeaseRepository for MockNonceRepo {
    async fn insert(&self, lease: &NonceLease) -> RelayResult<()> {
        self.rows
            .lock()
            .unwrap()
            .insert(lease.address.clone(), lease.clone());
        Ok(())
    }

    async fn acquire(&self) -> RelayResult<Option<NonceLease>> {
        self.acquire_calls.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock().unwrap();
        let mut addresses: Vec<String> = rows
            .values()
            .filter(|l| l.status == NonceStatus::Available)
            .map(|l| l.address.clone())
            .collect();
        addresses.sort();
        match addresses.first() {
            Some(address) => {
                let lease = rows.get_mut(address).unwrap();
                lease.status = NonceStatus::InUse;
                lease.updated_at = Utc::now();
                Ok(Some(lease.clone()))
            }
            None => Ok(None),
        }
    }

    async fn release(&self, address: &str, new_value: &str) -> RelayResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let lease = rows.get_mut(address).unwrap();
        lease.status = NonceStatus::Available;
        lease.current_value = new_value.to_string();
        lease.updated_at = Utc::now();
        Ok(())
    }

    async fn mark_available(&self, address: &str) -> RelayResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let lease = rows.get_mut(address).unwrap();
        lease.status = NonceStatus::Available;
        lease.updated_at = Utc::now();
        Ok(())
    }

    async fn release_by_value(&self, anchor_value: &str) -> RelayResult<bool> {
        let mut rows = self.rows.lock().unwrap();
        for lease in rows.values_mut() {
            if lease.current_value == anchor_value && lease.status == NonceStatus::InUse {
                lease.status = NonceStatus::Available;
                lease.updated_at = Utc::now();
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn list_stale_in_use(&self, cutoff: DateTime<Utc>) -> RelayResult<Vec<NonceLease>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|l| l.status == NonceStatus::InUse && l.updated_at < cutoff)
            .cloned()
            .collect())
    }

    async fn count_available(&self) -> RelayResult<i64> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|l| l.status == NonceStatus::Available)
            .count() as i64)
    }

    async fn count_total(&self) -> RelayResult<i64> {
        Ok(self.rows.lock().unwrap().len() as i64)
    }
}

/// One scripted response per status poll
enum ScriptedStatus {
    Confirmed,
    Failed(&'static str),
    Unknown,
    RpcError,
}

#[derive(Default)]
struct MockGateway {
    nonce_values: Mutex<HashMap<Pubkey, Hash>>,
    statuses: Mutex<VecDeque<ScriptedStatus>>,
    sent: AtomicU32,
    fail_nonce_reads: std::sync::atomic::AtomicBool,
}

impl MockGateway {
    fn script_statuses(&self, statuses: Vec<ScriptedStatus>) {
        *self.statuses.lock().unwrap() = statuses.into();
    }

    fn set_nonce_value(&self, address: Pubkey, value: Hash) {
        self.nonce_values.lock().unwrap().insert(address, value);
    }

    fn sent_count(&self) -> u32 {
        self.sent.load(Ordering::SeqCst)
    }
}

impl SolanaGateway for MockGateway {
    async fn latest_blockhash(&self) -> RelayResult<Hash> {
        Ok(hash(b"latest"))
    }

    async fn rent_exempt_minimum(&self, _space: usize) -> RelayResult<u64> {
        Ok(1_447_680)
    }

    async fn account_data(&self, _address: &Pubkey) -> RelayResult<Vec<u8>> {
        Ok(Vec::new())
    }

    async fn nonce_value(&self, address: &Pubkey) -> RelayResult<Hash> {
        if self.fail_nonce_reads.load(Ordering::SeqCst) {
            return Err(RelayError::TransientRpc("scripted nonce read failure".into()));
        }
        // Freshly provisioned accounts fall back to a fixed initial value
        Ok(self
            .nonce_values
            .lock()
            .unwrap()
            .get(address)
            .copied()
            .unwrap_or_else(|| hash(b"fresh-nonce")))
    }

    async fn send_transaction(&self, transaction: &Transaction) -> RelayResult<Signature> {
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(transaction.signatures[0])
    }

    async fn signature_status(&self, _signature: &Signature) -> RelayResult<SignatureStatus> {
        match self.statuses.lock().unwrap().pop_front() {
            Some(ScriptedStatus::Confirmed) => Ok(SignatureStatus::Confirmed),
            Some(ScriptedStatus::Failed(e)) => Ok(SignatureStatus::Failed(e.to_string())),
            Some(ScriptedStatus::Unknown) | None => Ok(SignatureStatus::Unknown),
            Some(ScriptedStatus::RpcError) => {
                Err(RelayError::TransientRpc("scripted rpc failure".into()))
            }
        }
    }
}

// ============================================================================
// Fixtures
// ============================================================================

fn fast_config() -> Arc<RelayConfig> {
    Arc::new(RelayConfig {
        rpc_url: "http://127.0.0.1:8899".to_string(),
        lease_retry: RetryPolicy::new(
            6,
            Duration::from_millis(1),
            Duration::from_millis(2),
        ),
        confirm_retry: RetryPolicy::fixed(30, Duration::from_millis(1)),
        provision_confirm_retry: RetryPolicy::fixed(5, Duration::from_millis(1)),
        stale_lease_max_age: Duration::from_secs(600),
    })
}

fn seeded(
    count: usize,
) -> (Arc<MockNonceRepo>, Arc<MockGateway>, Vec<String>) {
    let gateway = Arc::new(MockGateway::default());
    let mut rows = Vec::new();
    let mut addresses = Vec::new();
    for i in 0..count {
        let pubkey = Pubkey::new_unique();
        let value = hash(format!("nonce-{i}").as_bytes());
        gateway.set_nonce_value(pubkey, hash(format!("advanced-{i}").as_bytes()));
        rows.push(NonceLease::provisioned(
            pubkey.to_string(),
            value.to_string(),
        ));
        addresses.push(pubkey.to_string());
    }
    addresses.sort();
    (Arc::new(MockNonceRepo::with_rows(rows)), gateway, addresses)
}

fn pool(
    repo: Arc<MockNonceRepo>,
    gateway: Arc<MockGateway>,
    config: Arc<RelayConfig>,
) -> NoncePool<MockNonceRepo, MockGateway> {
    NoncePool::new(repo, gateway, Arc::new(Keypair::new()), config)
}

fn transfer_instruction(from: &Keypair) -> solana_sdk::instruction::Instruction {
    system_instruction::transfer(&from.pubkey(), &Pubkey::new_unique(), 1)
}

// ============================================================================
// Nonce pool
// ============================================================================

#[cfg(test)]
mod nonce_pool_tests {
    use super::*;

    #[tokio::test]
    async fn concurrent_leases_never_share_a_row() {
        let (repo, gateway, _) = seeded(3);
        let pool = pool(repo.clone(), gateway, fast_config());

        let mut handles = Vec::new();
        for _ in 0..3 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move { pool.lease().await.unwrap() }));
        }

        let mut leased = Vec::new();
        for handle in handles {
            leased.push(handle.await.unwrap().address);
        }
        leased.sort();
        leased.dedup();
        assert_eq!(leased.len(), 3, "every holder got a distinct nonce");
        assert_eq!(repo.count_available().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn lease_retries_then_reports_exhaustion() {
        let (repo, gateway, _) = seeded(0);
        let pool = pool(repo.clone(), gateway, fast_config());

        let err = pool.lease().await.unwrap_err();
        assert!(matches!(err, RelayError::PoolExhausted));
        // Bounded: exactly the configured ceiling, no runaway retries
        assert_eq!(repo.acquire_calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn release_rereads_the_on_chain_value() {
        let (repo, gateway, addresses) = seeded(1);
        let pool = pool(repo.clone(), gateway.clone(), fast_config());

        let lease = pool.lease().await.unwrap();
        let old_value = lease.current_value.clone();
        pool.release(&lease.address).await.unwrap();

        assert_eq!(repo.status_of(&addresses[0]), NonceStatus::Available);
        assert_ne!(repo.value_of(&addresses[0]), old_value);
    }

    #[tokio::test]
    async fn release_survives_a_failed_reread() {
        let (repo, gateway, addresses) = seeded(1);
        let pool = pool(repo.clone(), gateway.clone(), fast_config());

        let lease = pool.lease().await.unwrap();
        gateway.fail_nonce_reads.store(true, Ordering::SeqCst);
        pool.release(&lease.address).await.unwrap();

        // Row is back in the pool with the stored (stale) value
        assert_eq!(repo.status_of(&addresses[0]), NonceStatus::Available);
        assert_eq!(repo.value_of(&addresses[0]), lease.current_value);
    }

    #[tokio::test]
    async fn advance_submits_then_releases() {
        let (repo, gateway, addresses) = seeded(1);
        let pool = pool(repo.clone(), gateway.clone(), fast_config());

        let lease = pool.lease().await.unwrap();
        pool.advance(&lease.address).await.unwrap();

        assert_eq!(gateway.sent_count(), 1);
        assert_eq!(repo.status_of(&addresses[0]), NonceStatus::Available);
    }

    #[tokio::test]
    async fn release_by_anchor_is_idempotent() {
        let (repo, gateway, addresses) = seeded(1);
        let pool = pool(repo.clone(), gateway, fast_config());

        let lease = pool.lease().await.unwrap();
        assert!(pool.release_by_anchor(&lease.current_value).await.unwrap());
        assert_eq!(repo.status_of(&addresses[0]), NonceStatus::Available);

        // Second delivery of the same anchor matches nothing
        assert!(!pool.release_by_anchor(&lease.current_value).await.unwrap());
    }

    #[tokio::test]
    async fn reclaim_stale_returns_orphans_to_the_pool() {
        let (repo, gateway, addresses) = seeded(2);
        let pool = pool(repo.clone(), gateway, fast_config());

        let lease = pool.lease().await.unwrap();
        {
            let mut rows = repo.rows.lock().unwrap();
            rows.get_mut(&lease.address).unwrap().updated_at =
                Utc::now() - ChronoDuration::hours(1);
        }

        let reclaimed = pool.reclaim_stale().await.unwrap();
        assert_eq!(reclaimed, 1);
        for address in &addresses {
            assert_eq!(repo.status_of(address), NonceStatus::Available);
        }
    }
}

// ============================================================================
// Provisioning
// ============================================================================

#[cfg(test)]
mod provision_tests {
    use super::*;

    #[tokio::test]
    async fn provisions_a_batch_of_available_leases() {
        let (repo, gateway, _) = seeded(0);
        gateway.script_statuses(vec![ScriptedStatus::Confirmed, ScriptedStatus::Confirmed]);
        let provisioner = ProvisionPool::new(
            repo.clone(),
            gateway.clone(),
            Arc::new(Keypair::new()),
            fast_config(),
        );

        let addresses = provisioner.execute(2).await.unwrap();

        assert_eq!(addresses.len(), 2);
        assert_eq!(repo.count_total().await.unwrap(), 2);
        assert_eq!(repo.count_available().await.unwrap(), 2);
        for address in &addresses {
            assert!(Pubkey::from_str(address).is_ok());
        }
        // One creation transaction per account
        assert_eq!(gateway.sent_count(), 2);
    }

    #[tokio::test]
    async fn unconfirmed_creation_surfaces_a_timeout() {
        let (repo, gateway, _) = seeded(0);
        // No scripted statuses: creation never confirms
        let provisioner = ProvisionPool::new(
            repo.clone(),
            gateway,
            Arc::new(Keypair::new()),
            fast_config(),
        );

        let err = provisioner.execute(1).await.unwrap_err();
        assert!(matches!(err, RelayError::ConfirmationTimeout { .. }));
        assert_eq!(repo.count_total().await.unwrap(), 0);
    }
}

// ============================================================================
// Broadcaster
// ============================================================================

#[cfg(test)]
mod broadcaster_tests {
    use super::*;

    fn broadcaster(
        repo: Arc<MockNonceRepo>,
        gateway: Arc<MockGateway>,
        signer: Arc<Keypair>,
    ) -> Broadcaster<MockNonceRepo, MockGateway> {
        let config = fast_config();
        let pool = NoncePool::new(repo, gateway.clone(), signer.clone(), config.clone());
        Broadcaster::new(pool, gateway, signer, config)
    }

    #[tokio::test]
    async fn confirmed_broadcast_reports_success_and_releases() {
        let (repo, gateway, _) = seeded(2);
        gateway.script_statuses(vec![ScriptedStatus::Unknown, ScriptedStatus::Confirmed]);
        let signer = Arc::new(Keypair::new());
        let broadcaster = broadcaster(repo.clone(), gateway.clone(), signer.clone());

        let report = broadcaster
            .build_and_send(vec![transfer_instruction(&signer)], &[])
            .await
            .unwrap();

        assert!(report.confirmed);
        assert_eq!(report.attempts, 2);
        assert!(report.error.is_none());
        // Transaction itself plus the cleanup advance
        assert_eq!(gateway.sent_count(), 2);
        assert_eq!(repo.count_available().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn thirty_unknown_polls_report_failure_with_pool_intact() {
        let (repo, gateway, _) = seeded(2);
        // No scripted statuses: every poll comes back Unknown
        let signer = Arc::new(Keypair::new());
        let broadcaster = broadcaster(repo.clone(), gateway.clone(), signer.clone());

        let report = broadcaster
            .build_and_send(vec![transfer_instruction(&signer)], &[])
            .await
            .unwrap();

        assert!(!report.confirmed);
        assert_eq!(report.attempts, 30);
        assert_eq!(repo.count_available().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn transient_rpc_errors_count_as_retryable_polls() {
        let (repo, gateway, _) = seeded(1);
        gateway.script_statuses(vec![
            ScriptedStatus::RpcError,
            ScriptedStatus::RpcError,
            ScriptedStatus::Confirmed,
        ]);
        let signer = Arc::new(Keypair::new());
        let broadcaster = broadcaster(repo.clone(), gateway.clone(), signer.clone());

        let report = broadcaster
            .build_and_send(vec![transfer_instruction(&signer)], &[])
            .await
            .unwrap();

        assert!(report.confirmed);
        assert_eq!(report.attempts, 3);
    }

    #[tokio::test]
    async fn on_chain_failure_is_reported_not_thrown() {
        let (repo, gateway, _) = seeded(1);
        gateway.script_statuses(vec![ScriptedStatus::Failed("custom program error: 0x1")]);
        let signer = Arc::new(Keypair::new());
        let broadcaster = broadcaster(repo.clone(), gateway.clone(), signer.clone());

        let report = broadcaster
            .build_and_send(vec![transfer_instruction(&signer)], &[])
            .await
            .unwrap();

        assert!(!report.confirmed);
        assert_eq!(report.error.as_deref(), Some("custom program error: 0x1"));
        assert_eq!(repo.count_available().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn empty_pool_surfaces_exhaustion_before_any_submission() {
        let (repo, gateway, _) = seeded(0);
        let signer = Arc::new(Keypair::new());
        let broadcaster = broadcaster(repo, gateway.clone(), signer.clone());

        let err = broadcaster
            .build_and_send(vec![transfer_instruction(&signer)], &[])
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::PoolExhausted));
        assert_eq!(gateway.sent_count(), 0);
    }

    #[tokio::test]
    async fn anchor_round_trips_through_the_signed_transaction() {
        let (repo, gateway, _) = seeded(1);
        gateway.script_statuses(vec![ScriptedStatus::Confirmed]);
        let signer = Arc::new(Keypair::new());

        let lease_value = {
            let rows = repo.rows.lock().unwrap();
            rows.values().next().unwrap().current_value.clone()
        };

        let broadcaster = broadcaster(repo, gateway, signer.clone());
        let report = broadcaster
            .build_and_send(vec![transfer_instruction(&signer)], &[])
            .await
            .unwrap();

        // The report signature is a real signature over a message anchored
        // on the leased value, so it parses and is non-default.
        let signature = Signature::from_str(&report.signature).unwrap();
        assert_ne!(signature, Signature::default());
        assert!(Hash::from_str(&lease_value).is_ok());
    }
}
