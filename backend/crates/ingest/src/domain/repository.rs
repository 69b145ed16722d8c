//! Repository Traits
//!
//! Interfaces for mirror persistence and the external provider surfaces.
//! Implementations live in the infrastructure layer.
//!
//! Writes to a single asset or listing row serialize through the storage
//! layer's atomic row update; there is no cross-asset transaction.

use crate::domain::entities::{
    Asset, ComicTraits, Listing, MintCounters, MintProgram, MintReceipt,
};
use crate::error::IngestResult;
use chrono::{DateTime, Utc};

/// Asset mirror repository trait
#[trait_variant::make(AssetRepository: Send)]
pub trait LocalAssetRepository {
    /// Idempotent upsert of a freshly minted asset.
    ///
    /// A re-delivered mint never regresses ownership applied by a later
    /// event: the update is conditional on `owner_changed_at`.
    async fn upsert_minted(&self, asset: &Asset) -> IngestResult<()>;

    async fn get(&self, address: &str) -> IngestResult<Option<Asset>>;

    /// Conditional ownership update keyed on the event timestamp
    async fn set_owner(
        &self,
        address: &str,
        owner: &str,
        changed_at: DateTime<Utc>,
    ) -> IngestResult<()>;

    /// Replace the off-chain trait flags
    async fn set_traits(&self, address: &str, traits: &ComicTraits) -> IngestResult<()>;
}

/// Listing repository trait
#[trait_variant::make(ListingRepository: Send)]
pub trait LocalListingRepository {
    /// Upsert the open listing row keyed by (asset, open-sentinel)
    async fn upsert_open(
        &self,
        asset_address: &str,
        price_lamports: i64,
        created_at: DateTime<Utc>,
    ) -> IngestResult<()>;

    async fn get_open(&self, asset_address: &str) -> IngestResult<Option<Listing>>;

    /// Close the open listing, if any. Returns whether a row matched.
    async fn close_open(
        &self,
        asset_address: &str,
        canceled_at: DateTime<Utc>,
    ) -> IngestResult<bool>;

    /// Close the open listing as sold, recording the sale signature
    async fn close_open_as_sold(
        &self,
        asset_address: &str,
        sold_at: DateTime<Utc>,
        signature: &str,
    ) -> IngestResult<bool>;
}

/// Mint receipt repository trait
#[trait_variant::make(MintReceiptRepository: Send)]
pub trait LocalMintReceiptRepository {
    /// Insert keyed by (asset_address, signature); re-delivery is a no-op
    async fn upsert_receipt(&self, receipt: &MintReceipt) -> IngestResult<()>;

    async fn get_receipt(
        &self,
        asset_address: &str,
        signature: &str,
    ) -> IngestResult<Option<MintReceipt>>;
}

/// Mint program repository trait
#[trait_variant::make(MintProgramRepository: Send)]
pub trait LocalMintProgramRepository {
    /// Store chain-read supply counters
    async fn upsert_counters(
        &self,
        program_address: &str,
        counters: &MintCounters,
    ) -> IngestResult<()>;

    /// Record a rejected mint, deduped by transaction signature.
    /// Returns false when the signature was already recorded.
    async fn record_rejection(
        &self,
        program_address: &str,
        signature: &str,
    ) -> IngestResult<bool>;

    async fn get_program(&self, program_address: &str) -> IngestResult<Option<MintProgram>>;
}

/// Webhook-management API of the external provider.
///
/// The provider has no incremental add/remove; the watch-list is read and
/// replaced wholesale.
#[trait_variant::make(WatchlistApi: Send)]
pub trait LocalWatchlistApi {
    async fn fetch_addresses(&self) -> IngestResult<Vec<String>>;

    async fn replace_addresses(&self, addresses: &[String]) -> IngestResult<()>;
}

/// Metadata document source
#[trait_variant::make(MetadataSource: Send)]
pub trait LocalMetadataSource {
    async fn fetch(&self, uri: &str) -> IngestResult<serde_json::Value>;
}
