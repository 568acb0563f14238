//! Database operations for `campaigns`, `campaign_products`, and
//! `campaign_collections`.
//!
//! Target assignment rows use the empty string as the "whole product"
//! variant sentinel so the unique constraints deduplicate correctly; the
//! conversion to domain types maps it back to `None`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use salesync_core::{Campaign, DiscountType, ProductTarget};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `campaigns` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CampaignRow {
    pub id: Uuid,
    pub shop: String,
    pub name: String,
    pub description: Option<String>,
    /// Wire name of the discount type; converted to the domain enum (and
    /// validated) by [`campaign_from_parts`].
    pub discount_type: String,
    pub discount_value: Decimal,
    pub instock: bool,
    pub tracking: bool,
    pub active: bool,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row from the `campaign_products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CampaignProductRow {
    pub id: i64,
    pub campaign_id: Uuid,
    pub product_id: String,
    /// Empty string means the whole product.
    pub variant_id: String,
    pub created_at: DateTime<Utc>,
}

/// A row from the `campaign_collections` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CampaignCollectionRow {
    pub id: i64,
    pub campaign_id: Uuid,
    pub collection_id: String,
    pub created_at: DateTime<Utc>,
}

/// Fields for creating a campaign.
#[derive(Debug, Clone)]
pub struct NewCampaign {
    pub shop: String,
    pub name: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub instock: bool,
    pub tracking: bool,
    pub active: bool,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Full replacement of a campaign's mutable fields.
///
/// Callers merge a partial edit over the existing row first; a full-row
/// update keeps "clear this date" expressible without sentinel values.
#[derive(Debug, Clone)]
pub struct CampaignUpdate {
    pub name: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub instock: bool,
    pub tracking: bool,
    pub active: bool,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

const CAMPAIGN_COLUMNS: &str = "id, shop, name, description, discount_type, discount_value, \
     instock, tracking, active, start_date, end_date, created_at, updated_at";

// ---------------------------------------------------------------------------
// campaigns operations
// ---------------------------------------------------------------------------

/// Lists all campaigns for a shop, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_campaigns(pool: &PgPool, shop: &str) -> Result<Vec<CampaignRow>, DbError> {
    let rows = sqlx::query_as::<_, CampaignRow>(&format!(
        "SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE shop = $1 ORDER BY created_at DESC"
    ))
    .bind(shop)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Fetches one campaign by id, regardless of its active flag.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_campaign(pool: &PgPool, id: Uuid) -> Result<Option<CampaignRow>, DbError> {
    let row = sqlx::query_as::<_, CampaignRow>(&format!(
        "SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Inserts a campaign and returns the stored row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_campaign(pool: &PgPool, new: &NewCampaign) -> Result<CampaignRow, DbError> {
    let row = sqlx::query_as::<_, CampaignRow>(&format!(
        "INSERT INTO campaigns \
             (shop, name, description, discount_type, discount_value, \
              instock, tracking, active, start_date, end_date) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         RETURNING {CAMPAIGN_COLUMNS}"
    ))
    .bind(&new.shop)
    .bind(&new.name)
    .bind(&new.description)
    .bind(new.discount_type.as_str())
    .bind(new.discount_value)
    .bind(new.instock)
    .bind(new.tracking)
    .bind(new.active)
    .bind(new.start_date)
    .bind(new.end_date)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Replaces a campaign's mutable fields and touches `updated_at`.
///
/// Returns `None` when no campaign with that id exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn update_campaign(
    pool: &PgPool,
    id: Uuid,
    update: &CampaignUpdate,
) -> Result<Option<CampaignRow>, DbError> {
    let row = sqlx::query_as::<_, CampaignRow>(&format!(
        "UPDATE campaigns SET \
             name           = $2, \
             description    = $3, \
             discount_type  = $4, \
             discount_value = $5, \
             instock        = $6, \
             tracking       = $7, \
             active         = $8, \
             start_date     = $9, \
             end_date       = $10, \
             updated_at     = NOW() \
         WHERE id = $1 \
         RETURNING {CAMPAIGN_COLUMNS}"
    ))
    .bind(id)
    .bind(&update.name)
    .bind(&update.description)
    .bind(update.discount_type.as_str())
    .bind(update.discount_value)
    .bind(update.instock)
    .bind(update.tracking)
    .bind(update.active)
    .bind(update.start_date)
    .bind(update.end_date)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Deletes a campaign; target rows and locked prices cascade.
///
/// Returns `true` when a row was actually deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_campaign(pool: &PgPool, id: Uuid) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM campaigns WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ---------------------------------------------------------------------------
// target assignment operations
// ---------------------------------------------------------------------------

/// Adds product assignments to a campaign; duplicates are ignored.
///
/// Returns the number of rows actually inserted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if an insert fails.
pub async fn add_campaign_products(
    pool: &PgPool,
    campaign_id: Uuid,
    targets: &[ProductTarget],
) -> Result<u64, DbError> {
    let mut inserted = 0u64;
    for target in targets {
        let result = sqlx::query(
            "INSERT INTO campaign_products (campaign_id, product_id, variant_id) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (campaign_id, product_id, variant_id) DO NOTHING",
        )
        .bind(campaign_id)
        .bind(&target.product_id)
        .bind(target.variant_id.as_deref().unwrap_or(""))
        .execute(pool)
        .await?;
        inserted += result.rows_affected();
    }
    Ok(inserted)
}

/// Removes all assignments of the given products from a campaign.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn remove_campaign_products(
    pool: &PgPool,
    campaign_id: Uuid,
    product_ids: &[String],
) -> Result<u64, DbError> {
    let result = sqlx::query(
        "DELETE FROM campaign_products WHERE campaign_id = $1 AND product_id = ANY($2)",
    )
    .bind(campaign_id)
    .bind(product_ids)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Adds collection assignments to a campaign; duplicates are ignored.
///
/// Returns the number of rows actually inserted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if an insert fails.
pub async fn add_campaign_collections(
    pool: &PgPool,
    campaign_id: Uuid,
    collection_ids: &[String],
) -> Result<u64, DbError> {
    let mut inserted = 0u64;
    for collection_id in collection_ids {
        let result = sqlx::query(
            "INSERT INTO campaign_collections (campaign_id, collection_id) \
             VALUES ($1, $2) \
             ON CONFLICT (campaign_id, collection_id) DO NOTHING",
        )
        .bind(campaign_id)
        .bind(collection_id)
        .execute(pool)
        .await?;
        inserted += result.rows_affected();
    }
    Ok(inserted)
}

/// Removes collection assignments from a campaign.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn remove_campaign_collections(
    pool: &PgPool,
    campaign_id: Uuid,
    collection_ids: &[String],
) -> Result<u64, DbError> {
    let result = sqlx::query(
        "DELETE FROM campaign_collections WHERE campaign_id = $1 AND collection_id = ANY($2)",
    )
    .bind(campaign_id)
    .bind(collection_ids)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Lists a campaign's product assignments.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_campaign_products(
    pool: &PgPool,
    campaign_id: Uuid,
) -> Result<Vec<CampaignProductRow>, DbError> {
    let rows = sqlx::query_as::<_, CampaignProductRow>(
        "SELECT id, campaign_id, product_id, variant_id, created_at \
         FROM campaign_products WHERE campaign_id = $1 ORDER BY id",
    )
    .bind(campaign_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Lists a campaign's collection assignments.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_campaign_collections(
    pool: &PgPool,
    campaign_id: Uuid,
) -> Result<Vec<CampaignCollectionRow>, DbError> {
    let rows = sqlx::query_as::<_, CampaignCollectionRow>(
        "SELECT id, campaign_id, collection_id, created_at \
         FROM campaign_collections WHERE campaign_id = $1 ORDER BY id",
    )
    .bind(campaign_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// domain loads
// ---------------------------------------------------------------------------

/// Loads every campaign of a shop with its target assignments attached,
/// ready for the resolution algorithm. Inactive and out-of-window campaigns
/// are included; the applicability filter handles them.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure or [`DbError::Core`] when a
/// stored discount type is not recognized.
pub async fn load_campaigns_with_targets(
    pool: &PgPool,
    shop: &str,
) -> Result<Vec<Campaign>, DbError> {
    let rows = list_campaigns(pool, shop).await?;
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

    let products = sqlx::query_as::<_, CampaignProductRow>(
        "SELECT id, campaign_id, product_id, variant_id, created_at \
         FROM campaign_products WHERE campaign_id = ANY($1)",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let collections = sqlx::query_as::<_, CampaignCollectionRow>(
        "SELECT id, campaign_id, collection_id, created_at \
         FROM campaign_collections WHERE campaign_id = ANY($1)",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| {
            let row_products = products
                .iter()
                .filter(|p| p.campaign_id == row.id)
                .map(product_target_from_row)
                .collect();
            let row_collections = collections
                .iter()
                .filter(|c| c.campaign_id == row.id)
                .map(|c| c.collection_id.clone())
                .collect();
            campaign_from_parts(row, row_products, row_collections)
        })
        .collect()
}

/// Loads a single campaign with its target assignments, even when inactive —
/// deactivation and deletion flows need the target set to restore prices.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure or [`DbError::Core`] when the
/// stored discount type is not recognized.
pub async fn load_campaign_with_targets(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<Campaign>, DbError> {
    let Some(row) = get_campaign(pool, id).await? else {
        return Ok(None);
    };

    let products = list_campaign_products(pool, id)
        .await?
        .iter()
        .map(product_target_from_row)
        .collect();
    let collections = list_campaign_collections(pool, id)
        .await?
        .into_iter()
        .map(|c| c.collection_id)
        .collect();

    campaign_from_parts(row, products, collections).map(Some)
}

fn product_target_from_row(row: &CampaignProductRow) -> ProductTarget {
    ProductTarget {
        product_id: row.product_id.clone(),
        variant_id: if row.variant_id.is_empty() {
            None
        } else {
            Some(row.variant_id.clone())
        },
    }
}

fn campaign_from_parts(
    row: CampaignRow,
    products: Vec<ProductTarget>,
    collections: Vec<String>,
) -> Result<Campaign, DbError> {
    let discount_type: DiscountType = row.discount_type.parse()?;
    Ok(Campaign {
        id: row.id,
        shop: row.shop,
        name: row.name,
        discount_type,
        discount_value: row.discount_value,
        instock: row.instock,
        tracking: row.tracking,
        active: row.active,
        start_date: row.start_date,
        end_date: row.end_date,
        products,
        collections,
    })
}
