//! Domain Entities
//!
//! Core entities for the nonce pool domain.

use chrono::{DateTime, Utc};

/// Lease status of a nonce account row.
///
/// Transitions are compare-and-swap on the stored status, never blind
/// writes: `Available -> InUse` on lease, `InUse -> Available` on release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonceStatus {
    Available,
    InUse,
}

impl NonceStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            NonceStatus::Available => "available",
            NonceStatus::InUse => "in_use",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "available" => Some(NonceStatus::Available),
            "in_use" => Some(NonceStatus::InUse),
            _ => None,
        }
    }
}

/// NonceLease entity - one durable nonce account owned by the pool
///
/// `current_value` is the base58 nonce value last observed on chain. It is
/// only authoritative while the row is Available; an in-flight transaction
/// advances the on-chain value, and `release` re-reads it before the row
/// returns to the pool.
#[derive(Debug, Clone)]
pub struct NonceLease {
    pub address: String,
    pub current_value: String,
    pub status: NonceStatus,
    pub updated_at: DateTime<Utc>,
}

impl NonceLease {
    /// Create a freshly provisioned lease row
    pub fn provisioned(address: String, current_value: String) -> Self {
        Self {
            address,
            current_value,
            status: NonceStatus::Available,
            updated_at: Utc::now(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == NonceStatus::Available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        assert_eq!(NonceStatus::parse("available"), Some(NonceStatus::Available));
        assert_eq!(NonceStatus::parse("in_use"), Some(NonceStatus::InUse));
        assert_eq!(NonceStatus::parse("leased"), None);
        assert_eq!(NonceStatus::Available.as_str(), "available");
    }

    #[test]
    fn test_provisioned_is_available() {
        let lease = NonceLease::provisioned("addr".into(), "value".into());
        assert!(lease.is_available());
    }
}
