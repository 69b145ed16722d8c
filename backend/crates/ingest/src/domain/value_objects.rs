//! Domain Value Objects
//!
//! Provider-independent form of an enriched transaction and its event
//! classification.

use chrono::{DateTime, Utc};

/// Event kinds the dispatcher can route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Mint,
    Transfer,
    Listing,
    CancelListing,
    Sale,
    ComicStateChange,
    MintRejected,
}

impl EventKind {
    /// Map the provider's type tag, if recognized
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "NFT_MINT" => Some(EventKind::Mint),
            "TRANSFER" => Some(EventKind::Transfer),
            "NFT_LISTING" => Some(EventKind::Listing),
            "NFT_CANCEL_LISTING" => Some(EventKind::CancelListing),
            "NFT_SALE" => Some(EventKind::Sale),
            "COMIC_STATE_CHANGE" => Some(EventKind::ComicStateChange),
            "NFT_MINT_REJECTED" => Some(EventKind::MintRejected),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            EventKind::Mint => "mint",
            EventKind::Transfer => "transfer",
            EventKind::Listing => "listing",
            EventKind::CancelListing => "cancel_listing",
            EventKind::Sale => "sale",
            EventKind::ComicStateChange => "comic_state_change",
            EventKind::MintRejected => "mint_rejected",
        }
    }
}

/// One raw instruction of an enriched transaction
#[derive(Debug, Clone)]
pub struct InstructionRecord {
    pub program_id: String,
    /// Decoded instruction payload; the leading bytes are the operation
    /// discriminator
    pub data: Vec<u8>,
    pub accounts: Vec<String>,
}

/// Decoded token movement summary
#[derive(Debug, Clone)]
pub struct TokenTransfer {
    pub from: Option<String>,
    pub to: Option<String>,
    pub mint: String,
    pub amount: u64,
}

/// Decoded native (lamport) movement summary
#[derive(Debug, Clone)]
pub struct NativeTransfer {
    pub from: String,
    pub to: String,
    pub lamports: u64,
}

/// Provider-annotated description of one confirmed transaction
#[derive(Debug, Clone)]
pub struct TransactionRecord {
    pub signature: String,
    pub timestamp: DateTime<Utc>,
    /// Provider classification, if any
    pub kind: Option<EventKind>,
    /// Subject asset, when the provider annotates one
    pub asset: Option<String>,
    pub instructions: Vec<InstructionRecord>,
    pub token_transfers: Vec<TokenTransfer>,
    pub native_transfers: Vec<NativeTransfer>,
    /// Provider-decoded lamport amount (listing price, sale price)
    pub amount: Option<i64>,
    /// Mint group label
    pub label: Option<String>,
    /// Replay-protection anchor of the transaction (the durable nonce
    /// value it was signed against), when the provider includes it
    pub anchor: Option<String>,
    /// Pointer to the asset's current metadata document
    pub metadata_uri: Option<String>,
}

impl TransactionRecord {
    /// Subject asset of the record: the provider annotation if present,
    /// otherwise the mint of the first decoded token movement.
    pub fn asset_address(&self) -> Option<&str> {
        self.asset
            .as_deref()
            .or_else(|| self.token_transfers.first().map(|t| t.mint.as_str()))
    }

    /// Total lamports moved, as a price fallback
    pub fn native_total(&self) -> i64 {
        self.native_transfers
            .iter()
            .map(|t| t.lamports as i64)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_mapping() {
        assert_eq!(EventKind::from_tag("NFT_MINT"), Some(EventKind::Mint));
        assert_eq!(EventKind::from_tag("NFT_SALE"), Some(EventKind::Sale));
        assert_eq!(EventKind::from_tag("UNKNOWN"), None);
        assert_eq!(EventKind::from_tag(""), None);
    }
}
