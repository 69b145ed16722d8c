//! Repository Traits
//!
//! Interfaces for nonce lease persistence. Implementation is in the
//! infrastructure layer.

use crate::domain::entities::NonceLease;
use crate::error::RelayResult;
use chrono::{DateTime, Utc};

/// Nonce lease repository trait
///
/// All status transitions are conditional on the previously stored status
/// so that concurrent callers can never observe the same row as leased.
#[trait_variant::make(NonceLeaseRepository: Send)]
pub trait LocalNonceLeaseRepository {
    /// Persist a freshly provisioned lease row
    async fn insert(&self, lease: &NonceLease) -> RelayResult<()>;

    /// Atomically flip one Available row to InUse and return it.
    ///
    /// Returns `None` when no row currently satisfies the predicate; the
    /// caller decides whether to retry.
    async fn acquire(&self) -> RelayResult<Option<NonceLease>>;

    /// Return a row to the pool with a freshly observed nonce value
    async fn release(&self, address: &str, new_value: &str) -> RelayResult<()>;

    /// Return a row to the pool keeping the stored value.
    ///
    /// Fallback for release paths where the on-chain re-read failed; the
    /// stale value is corrected on the next successful release.
    async fn mark_available(&self, address: &str) -> RelayResult<()>;

    /// Release the InUse row whose stored value matches an observed
    /// transaction anchor. Returns whether a row matched.
    async fn release_by_value(&self, anchor_value: &str) -> RelayResult<bool>;

    /// Rows stuck InUse since before `cutoff`
    async fn list_stale_in_use(&self, cutoff: DateTime<Utc>) -> RelayResult<Vec<NonceLease>>;

    /// Number of Available rows
    async fn count_available(&self) -> RelayResult<i64>;

    /// Total number of pool rows
    async fn count_total(&self) -> RelayResult<i64>;
}
