//! PostgreSQL Repository Implementation

use crate::domain::entities::{NonceLease, NonceStatus};
use crate::domain::repository::NonceLeaseRepository;
use crate::error::{RelayError, RelayResult};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// PostgreSQL-backed nonce lease repository
#[derive(Clone)]
pub struct PgNonceRepository {
    pool: PgPool,
}

impl PgNonceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl NonceLeaseRepository for PgNonceRepository {
    async fn insert(&self, lease: &NonceLease) -> RelayResult<()> {
        sqlx::query(
            r#"
            INSERT INTO nonce_leases (nonce_address, current_value, status, updated_at)
            VALUES ($1, $2, $3, NOW())
            "#,
        )
        .bind(&lease.address)
        .bind(&lease.current_value)
        .bind(lease.status.as_str())
        .execute(&self.pool)
        .await?;

        tracing::info!(nonce_address = %lease.address, "Nonce lease row created");
        Ok(())
    }

    async fn acquire(&self) -> RelayResult<Option<NonceLease>> {
        // Conditional flip keyed on the old status; SKIP LOCKED keeps
        // concurrent acquirers from ever selecting the same row.
        let row = sqlx::query_as::<_, NonceLeaseRow>(
            r#"
            UPDATE nonce_leases
            SET status = 'in_use', updated_at = NOW()
            WHERE nonce_address = (
                SELECT nonce_address
                FROM nonce_leases
                WHERE status = 'available'
                ORDER BY updated_at ASC
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            AND status = 'available'
            RETURNING nonce_address, current_value, status, updated_at
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        row.map(NonceLeaseRow::into_lease).transpose()
    }

    async fn release(&self, address: &str, new_value: &str) -> RelayResult<()> {
        sqlx::query(
            r#"
            UPDATE nonce_leases
            SET status = 'available', current_value = $2, updated_at = NOW()
            WHERE nonce_address = $1
            "#,
        )
        .bind(address)
        .bind(new_value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_available(&self, address: &str) -> RelayResult<()> {
        sqlx::query(
            r#"
            UPDATE nonce_leases
            SET status = 'available', updated_at = NOW()
            WHERE nonce_address = $1
            "#,
        )
        .bind(address)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn release_by_value(&self, anchor_value: &str) -> RelayResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE nonce_leases
            SET status = 'available', updated_at = NOW()
            WHERE current_value = $1 AND status = 'in_use'
            "#,
        )
        .bind(anchor_value)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_stale_in_use(&self, cutoff: DateTime<Utc>) -> RelayResult<Vec<NonceLease>> {
        let rows = sqlx::query_as::<_, NonceLeaseRow>(
            r#"
            SELECT nonce_address, current_value, status, updated_at
            FROM nonce_leases
            WHERE status = 'in_use' AND updated_at < $1
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(NonceLeaseRow::into_lease).collect()
    }

    async fn count_available(&self) -> RelayResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM nonce_leases WHERE status = 'available'",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn count_total(&self) -> RelayResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM nonce_leases")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// Internal row type for sqlx mapping
#[derive(sqlx::FromRow)]
struct NonceLeaseRow {
    nonce_address: String,
    current_value: String,
    status: String,
    updated_at: DateTime<Utc>,
}

impl NonceLeaseRow {
    fn into_lease(self) -> RelayResult<NonceLease> {
        let status = NonceStatus::parse(&self.status).ok_or_else(|| {
            RelayError::Internal(format!(
                "unexpected lease status '{}' for {}",
                self.status, self.nonce_address
            ))
        })?;
        Ok(NonceLease {
            address: self.nonce_address,
            current_value: self.current_value,
            status,
            updated_at: self.updated_at,
        })
    }
}
