//! PostgreSQL Mirror Repository Implementation
//!
//! Every write is an upsert or a conditional update keyed by natural
//! identifiers; idempotency under at-least-once delivery comes from the
//! statements themselves, not from application-level locking.

use crate::domain::entities::{
    Asset, ComicTraits, Listing, MintCounters, MintProgram, MintReceipt, open_listing_sentinel,
};
use crate::domain::repository::{
    AssetRepository, ListingRepository, MintProgramRepository, MintReceiptRepository,
};
use crate::error::IngestResult;
use chrono::{DateTime, Utc};
use kernel::id::{AssetId, ListingId, MintReceiptId};
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL-backed mirror repository
#[derive(Clone)]
pub struct PgMirrorRepository {
    pool: PgPool,
}

impl PgMirrorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl AssetRepository for PgMirrorRepository {
    async fn upsert_minted(&self, asset: &Asset) -> IngestResult<()> {
        // A re-delivered mint may arrive after a later transfer was
        // applied; the owner_changed_at guard keeps ownership from
        // regressing.
        sqlx::query(
            r#"
            INSERT INTO assets (
                asset_id, address, owner, collection,
                is_used, is_signed, rarity, owner_changed_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (address) DO UPDATE SET
                owner = EXCLUDED.owner,
                collection = EXCLUDED.collection,
                owner_changed_at = EXCLUDED.owner_changed_at,
                updated_at = NOW()
            WHERE assets.owner_changed_at <= EXCLUDED.owner_changed_at
            "#,
        )
        .bind(asset.id.into_uuid())
        .bind(&asset.address)
        .bind(&asset.owner)
        .bind(&asset.collection)
        .bind(asset.traits.used)
        .bind(asset.traits.signed)
        .bind(&asset.traits.rarity)
        .bind(asset.owner_changed_at)
        .execute(&self.pool)
        .await?;

        tracing::info!(asset = %asset.address, owner = %asset.owner, "Asset upserted");
        Ok(())
    }

    async fn get(&self, address: &str) -> IngestResult<Option<Asset>> {
        let row = sqlx::query_as::<_, AssetRow>(
            r#"
            SELECT asset_id, address, owner, collection,
                   is_used, is_signed, rarity, owner_changed_at, created_at
            FROM assets
            WHERE address = $1
            "#,
        )
        .bind(address)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(AssetRow::into_asset))
    }

    async fn set_owner(
        &self,
        address: &str,
        owner: &str,
        changed_at: DateTime<Utc>,
    ) -> IngestResult<()> {
        // Conditional on the event timestamp: re-delivery (same instant)
        // re-applies the same value, older events never regress newer ones.
        sqlx::query(
            r#"
            UPDATE assets
            SET owner = $2, owner_changed_at = $3, updated_at = NOW()
            WHERE address = $1 AND owner_changed_at <= $3
            "#,
        )
        .bind(address)
        .bind(owner)
        .bind(changed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_traits(&self, address: &str, traits: &ComicTraits) -> IngestResult<()> {
        sqlx::query(
            r#"
            UPDATE assets
            SET is_used = $2, is_signed = $3, rarity = $4, updated_at = NOW()
            WHERE address = $1
            "#,
        )
        .bind(address)
        .bind(traits.used)
        .bind(traits.signed)
        .bind(&traits.rarity)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

impl ListingRepository for PgMirrorRepository {
    async fn upsert_open(
        &self,
        asset_address: &str,
        price_lamports: i64,
        created_at: DateTime<Utc>,
    ) -> IngestResult<()> {
        sqlx::query(
            r#"
            INSERT INTO listings (listing_id, asset_address, price_lamports, created_at, canceled_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (asset_address, canceled_at) DO UPDATE SET
                price_lamports = EXCLUDED.price_lamports,
                created_at = EXCLUDED.created_at
            "#,
        )
        .bind(ListingId::new().into_uuid())
        .bind(asset_address)
        .bind(price_lamports)
        .bind(created_at)
        .bind(open_listing_sentinel())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_open(&self, asset_address: &str) -> IngestResult<Option<Listing>> {
        let row = sqlx::query_as::<_, ListingRow>(
            r#"
            SELECT listing_id, asset_address, price_lamports, created_at,
                   canceled_at, sold_at, sale_signature
            FROM listings
            WHERE asset_address = $1 AND canceled_at = $2
            "#,
        )
        .bind(asset_address)
        .bind(open_listing_sentinel())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ListingRow::into_listing))
    }

    async fn close_open(
        &self,
        asset_address: &str,
        canceled_at: DateTime<Utc>,
    ) -> IngestResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE listings
            SET canceled_at = $2
            WHERE asset_address = $1 AND canceled_at = $3
            "#,
        )
        .bind(asset_address)
        .bind(canceled_at)
        .bind(open_listing_sentinel())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn close_open_as_sold(
        &self,
        asset_address: &str,
        sold_at: DateTime<Utc>,
        signature: &str,
    ) -> IngestResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE listings
            SET canceled_at = $2, sold_at = $2, sale_signature = $3
            WHERE asset_address = $1 AND canceled_at = $4
            "#,
        )
        .bind(asset_address)
        .bind(sold_at)
        .bind(signature)
        .bind(open_listing_sentinel())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl MintReceiptRepository for PgMirrorRepository {
    async fn upsert_receipt(&self, receipt: &MintReceipt) -> IngestResult<()> {
        sqlx::query(
            r#"
            INSERT INTO mint_receipts (
                receipt_id, asset_address, buyer, price_lamports,
                minted_at, label, signature
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (asset_address, signature) DO NOTHING
            "#,
        )
        .bind(receipt.id.into_uuid())
        .bind(&receipt.asset_address)
        .bind(&receipt.buyer)
        .bind(receipt.price_lamports)
        .bind(receipt.minted_at)
        .bind(&receipt.label)
        .bind(&receipt.signature)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_receipt(
        &self,
        asset_address: &str,
        signature: &str,
    ) -> IngestResult<Option<MintReceipt>> {
        let row = sqlx::query_as::<_, MintReceiptRow>(
            r#"
            SELECT receipt_id, asset_address, buyer, price_lamports,
                   minted_at, label, signature
            FROM mint_receipts
            WHERE asset_address = $1 AND signature = $2
            "#,
        )
        .bind(asset_address)
        .bind(signature)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(MintReceiptRow::into_receipt))
    }
}

impl MintProgramRepository for PgMirrorRepository {
    async fn upsert_counters(
        &self,
        program_address: &str,
        counters: &MintCounters,
    ) -> IngestResult<()> {
        sqlx::query(
            r#"
            INSERT INTO mint_programs (program_address, items_available, items_redeemed, rejected_count)
            VALUES ($1, $2, $3, 0)
            ON CONFLICT (program_address) DO UPDATE SET
                items_available = EXCLUDED.items_available,
                items_redeemed = EXCLUDED.items_redeemed,
                updated_at = NOW()
            "#,
        )
        .bind(program_address)
        .bind(counters.items_available as i64)
        .bind(counters.items_redeemed as i64)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn record_rejection(
        &self,
        program_address: &str,
        signature: &str,
    ) -> IngestResult<bool> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO mint_rejections (signature, program_address)
            VALUES ($1, $2)
            ON CONFLICT (signature) DO NOTHING
            "#,
        )
        .bind(signature)
        .bind(program_address)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if inserted == 0 {
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO mint_programs (program_address, items_available, items_redeemed, rejected_count)
            VALUES ($1, 0, 0, 1)
            ON CONFLICT (program_address) DO UPDATE SET
                rejected_count = mint_programs.rejected_count + 1,
                updated_at = NOW()
            "#,
        )
        .bind(program_address)
        .execute(&self.pool)
        .await?;

        Ok(true)
    }

    async fn get_program(&self, program_address: &str) -> IngestResult<Option<MintProgram>> {
        let row = sqlx::query_as::<_, MintProgramRow>(
            r#"
            SELECT program_address, items_available, items_redeemed, rejected_count
            FROM mint_programs
            WHERE program_address = $1
            "#,
        )
        .bind(program_address)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(MintProgramRow::into_program))
    }
}

// Internal row types for sqlx mapping

#[derive(sqlx::FromRow)]
struct AssetRow {
    asset_id: Uuid,
    address: String,
    owner: String,
    collection: Option<String>,
    is_used: bool,
    is_signed: bool,
    rarity: Option<String>,
    owner_changed_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl AssetRow {
    fn into_asset(self) -> Asset {
        Asset {
            id: AssetId::from_uuid(self.asset_id),
            address: self.address,
            owner: self.owner,
            collection: self.collection,
            traits: ComicTraits {
                used: self.is_used,
                signed: self.is_signed,
                rarity: self.rarity,
            },
            owner_changed_at: self.owner_changed_at,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ListingRow {
    listing_id: Uuid,
    asset_address: String,
    price_lamports: i64,
    created_at: DateTime<Utc>,
    canceled_at: DateTime<Utc>,
    sold_at: Option<DateTime<Utc>>,
    sale_signature: Option<String>,
}

impl ListingRow {
    fn into_listing(self) -> Listing {
        Listing {
            id: ListingId::from_uuid(self.listing_id),
            asset_address: self.asset_address,
            price_lamports: self.price_lamports,
            created_at: self.created_at,
            canceled_at: self.canceled_at,
            sold_at: self.sold_at,
            sale_signature: self.sale_signature,
        }
    }
}

#[derive(sqlx::FromRow)]
struct MintReceiptRow {
    receipt_id: Uuid,
    asset_address: String,
    buyer: String,
    price_lamports: i64,
    minted_at: DateTime<Utc>,
    label: String,
    signature: String,
}

impl MintReceiptRow {
    fn into_receipt(self) -> MintReceipt {
        MintReceipt {
            id: MintReceiptId::from_uuid(self.receipt_id),
            asset_address: self.asset_address,
            buyer: self.buyer,
            price_lamports: self.price_lamports,
            minted_at: self.minted_at,
            label: self.label,
            signature: self.signature,
        }
    }
}

#[derive(sqlx::FromRow)]
struct MintProgramRow {
    program_address: String,
    items_available: i64,
    items_redeemed: i64,
    rejected_count: i64,
}

impl MintProgramRow {
    fn into_program(self) -> MintProgram {
        MintProgram {
            address: self.program_address,
            items_available: self.items_available,
            items_redeemed: self.items_redeemed,
            rejected_count: self.rejected_count,
        }
    }
}
