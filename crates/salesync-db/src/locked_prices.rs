//! Database operations for `locked_prices`.
//!
//! Locks freeze the discounted price of a tracking-disabled campaign for one
//! (product, variant). The store does no campaign-validity checking — the
//! resolution algorithm decides when a lock may be read or must be created.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `locked_prices` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LockedPriceRow {
    pub id: i64,
    pub shop: String,
    pub campaign_id: Uuid,
    pub product_id: String,
    /// Empty string when the lock covers the whole product.
    pub variant_id: String,
    /// Base price in effect when the lock was (re)computed.
    pub base_price: Decimal,
    pub locked_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fetches the lock for an exact (campaign, product, variant) triple.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_lock(
    pool: &PgPool,
    campaign_id: Uuid,
    product_id: &str,
    variant_id: Option<&str>,
) -> Result<Option<LockedPriceRow>, DbError> {
    let row = sqlx::query_as::<_, LockedPriceRow>(
        "SELECT id, shop, campaign_id, product_id, variant_id, \
                base_price, locked_price, created_at, updated_at \
         FROM locked_prices \
         WHERE campaign_id = $1 AND product_id = $2 AND variant_id = $3",
    )
    .bind(campaign_id)
    .bind(product_id)
    .bind(variant_id.unwrap_or(""))
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Creates or replaces a lock, touching `updated_at` on replacement.
///
/// A second upsert on the same triple overwrites both prices — this is how a
/// campaign edit or manual recompute replaces a stale lock. Last write wins;
/// no versioning is applied.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_lock(
    pool: &PgPool,
    shop: &str,
    campaign_id: Uuid,
    product_id: &str,
    variant_id: Option<&str>,
    base_price: Decimal,
    locked_price: Decimal,
) -> Result<LockedPriceRow, DbError> {
    let row = sqlx::query_as::<_, LockedPriceRow>(
        "INSERT INTO locked_prices \
             (shop, campaign_id, product_id, variant_id, base_price, locked_price) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (campaign_id, product_id, variant_id) DO UPDATE SET \
             base_price   = EXCLUDED.base_price, \
             locked_price = EXCLUDED.locked_price, \
             updated_at   = NOW() \
         RETURNING id, shop, campaign_id, product_id, variant_id, \
                   base_price, locked_price, created_at, updated_at",
    )
    .bind(shop)
    .bind(campaign_id)
    .bind(product_id)
    .bind(variant_id.unwrap_or(""))
    .bind(base_price)
    .bind(locked_price)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Loads every campaign's locked price for one (product, variant) in a single
/// query, keyed by campaign id — the shape the resolution algorithm consumes.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn lock_snapshot(
    pool: &PgPool,
    product_id: &str,
    variant_id: Option<&str>,
) -> Result<HashMap<Uuid, Decimal>, DbError> {
    let rows = sqlx::query_as::<_, LockedPriceRow>(
        "SELECT id, shop, campaign_id, product_id, variant_id, \
                base_price, locked_price, created_at, updated_at \
         FROM locked_prices \
         WHERE product_id = $1 AND variant_id = $2",
    )
    .bind(product_id)
    .bind(variant_id.unwrap_or(""))
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| (row.campaign_id, row.locked_price))
        .collect())
}
