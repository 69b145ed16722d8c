//! Domain Entities
//!
//! Core entities of the off-chain asset mirror.

use chrono::{DateTime, Utc};
use kernel::id::{AssetId, ListingId, MintReceiptId};

/// Sentinel value of `canceled_at` marking a listing as open.
///
/// Uniqueness is enforced on (asset_address, canceled_at), so representing
/// "open" with a fixed timestamp instead of NULL gives at most one open
/// listing per asset.
pub fn open_listing_sentinel() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// Off-chain trait flags re-derived from asset metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComicTraits {
    pub used: bool,
    pub signed: bool,
    pub rarity: Option<String>,
}

/// Asset entity - the mirrored record of one on-chain asset
///
/// `owner` is only authoritative after an ownership-changing event has
/// been applied; it is never mutated speculatively. `owner_changed_at`
/// orders competing ownership writes under at-least-once delivery.
#[derive(Debug, Clone)]
pub struct Asset {
    pub id: AssetId,
    pub address: String,
    pub owner: String,
    /// Originating collection / mint program reference
    pub collection: Option<String>,
    pub traits: ComicTraits,
    pub owner_changed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Asset {
    /// Create the mirror row for a freshly minted asset
    pub fn minted(
        address: String,
        owner: String,
        collection: Option<String>,
        minted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AssetId::new(),
            address,
            owner,
            collection,
            traits: ComicTraits::default(),
            owner_changed_at: minted_at,
            created_at: Utc::now(),
        }
    }
}

/// Listing entity
///
/// Rows are created on first listing and logically closed (never deleted)
/// by cancel, sale or transfer.
#[derive(Debug, Clone)]
pub struct Listing {
    pub id: ListingId,
    pub asset_address: String,
    pub price_lamports: i64,
    pub created_at: DateTime<Utc>,
    pub canceled_at: DateTime<Utc>,
    pub sold_at: Option<DateTime<Utc>>,
    pub sale_signature: Option<String>,
}

impl Listing {
    pub fn is_open(&self) -> bool {
        self.canceled_at == open_listing_sentinel()
    }
}

/// MintReceipt entity - keyed by (asset_address, signature) to dedupe
/// re-delivered mint events
#[derive(Debug, Clone)]
pub struct MintReceipt {
    pub id: MintReceiptId,
    pub asset_address: String,
    pub buyer: String,
    pub price_lamports: i64,
    pub minted_at: DateTime<Utc>,
    pub label: String,
    pub signature: String,
}

/// Supply counters of one mint program instance
///
/// Counters are always re-read from chain, never incremented locally, so
/// missed or duplicated events cannot make them drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintCounters {
    pub items_available: u64,
    pub items_redeemed: u64,
}

impl MintCounters {
    pub fn remaining(&self) -> u64 {
        self.items_available.saturating_sub(self.items_redeemed)
    }
}

/// Mirrored mint program row
#[derive(Debug, Clone)]
pub struct MintProgram {
    pub address: String,
    pub items_available: i64,
    pub items_redeemed: i64,
    pub rejected_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_listing_uses_sentinel() {
        let listing = Listing {
            id: ListingId::new(),
            asset_address: "asset".into(),
            price_lamports: 1_000,
            created_at: Utc::now(),
            canceled_at: open_listing_sentinel(),
            sold_at: None,
            sale_signature: None,
        };
        assert!(listing.is_open());
    }

    #[test]
    fn test_counters_remaining_saturates() {
        let counters = MintCounters {
            items_available: 5,
            items_redeemed: 7,
        };
        assert_eq!(counters.remaining(), 0);

        let counters = MintCounters {
            items_available: 10,
            items_redeemed: 4,
        };
        assert_eq!(counters.remaining(), 6);
    }
}
