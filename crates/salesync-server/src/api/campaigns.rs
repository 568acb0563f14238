//! Campaign management handlers.
//!
//! Every mutation triggers a reconciliation pass for the affected campaign
//! before responding, so catalog prices and the campaign store never drift
//! apart for longer than one request. Deletion captures the target product
//! set before the row (and its cascading price locks) disappears, then
//! reconciles that captured set to restore prices.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use salesync_core::{DiscountType, ProductTarget};
use salesync_db::{self as db, CampaignRow, CampaignUpdate, NewCampaign};
use salesync_engine::{ReconcileOutcome, ReconcileSummary};

use crate::middleware::RequestId;

use super::{map_db_error, map_engine_error, ApiError, ApiResponse, AppState, ReconcileBody, ResponseMeta};

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(in crate::api) struct ListQuery {
    pub shop: String,
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct CreateCampaignRequest {
    pub shop: String,
    pub name: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    #[serde(default)]
    pub instock: bool,
    #[serde(default = "default_true")]
    pub tracking: bool,
    #[serde(default = "default_true")]
    pub active: bool,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

// Option<Option<T>> is intentional: outer None = "not in request" (keep current),
// Some(None) = "explicitly cleared", Some(Some(v)) = "set to value".
#[allow(clippy::option_option)]
#[derive(Debug, Deserialize)]
pub(in crate::api) struct UpdateCampaignRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub discount_type: Option<DiscountType>,
    pub discount_value: Option<Decimal>,
    pub instock: Option<bool>,
    pub tracking: Option<bool>,
    pub active: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub start_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub end_date: Option<Option<DateTime<Utc>>>,
}

/// Keeps "field absent" and "field: null" distinguishable: a present field,
/// null included, lands in the outer `Some`.
#[allow(clippy::option_option)]
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct AddProductsRequest {
    pub products: Vec<TargetBody>,
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct RemoveProductsRequest {
    pub product_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct CollectionsRequest {
    pub collection_ids: Vec<String>,
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub(in crate::api) struct TargetBody {
    pub product_id: String,
    pub variant_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct CampaignBody {
    pub id: Uuid,
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub products: Vec<TargetBody>,
    pub collections: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct CampaignWithReconcile {
    pub campaign: CampaignBody,
    pub reconcile: ReconcileBody,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct DeleteResponse {
    pub deleted: bool,
    pub reconcile: ReconcileBody,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct TargetMutationResponse {
    pub affected: u64,
    pub reconcile: ReconcileBody,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn validate_campaign_fields(
    req_id: &str,
    name: &str,
    discount_type: DiscountType,
    discount_value: Decimal,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
) -> Result<(), ApiError> {
    if name.trim().is_empty() || name.len() > 200 {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "name must be 1-200 characters",
        ));
    }
    if discount_value < Decimal::ZERO {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "discount_value must not be negative",
        ));
    }
    if discount_type == DiscountType::Percentage && discount_value > Decimal::ONE_HUNDRED {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "percentage discount_value must not exceed 100",
        ));
    }
    if let (Some(start), Some(end)) = (start_date, end_date) {
        if end < start {
            return Err(ApiError::new(
                req_id,
                "validation_error",
                "end_date must not be before start_date",
            ));
        }
    }
    Ok(())
}

/// Merges a partial edit over the stored row into a full-field update.
fn merged_update(row: &CampaignRow, body: UpdateCampaignRequest) -> Result<CampaignUpdate, String> {
    let discount_type = match body.discount_type {
        Some(dt) => dt,
        None => row.discount_type.parse().map_err(|_| {
            format!("stored discount type '{}' is not recognized", row.discount_type)
        })?,
    };
    Ok(CampaignUpdate {
        name: body.name.unwrap_or_else(|| row.name.clone()),
        description: body
            .description
            .unwrap_or_else(|| row.description.clone()),
        discount_type,
        discount_value: body.discount_value.unwrap_or(row.discount_value),
        instock: body.instock.unwrap_or(row.instock),
        tracking: body.tracking.unwrap_or(row.tracking),
        active: body.active.unwrap_or(row.active),
        start_date: body.start_date.unwrap_or(row.start_date),
        end_date: body.end_date.unwrap_or(row.end_date),
    })
}

async fn campaign_body(
    state: &AppState,
    req_id: &str,
    row: CampaignRow,
) -> Result<CampaignBody, ApiError> {
    let products = db::list_campaign_products(&state.pool, row.id)
        .await
        .map_err(|e| map_db_error(req_id.to_owned(), &e))?
        .into_iter()
        .map(|p| TargetBody {
            product_id: p.product_id,
            variant_id: if p.variant_id.is_empty() {
                None
            } else {
                Some(p.variant_id)
            },
        })
        .collect();
    let collections = db::list_campaign_collections(&state.pool, row.id)
        .await
        .map_err(|e| map_db_error(req_id.to_owned(), &e))?
        .into_iter()
        .map(|c| c.collection_id)
        .collect();

    let discount_type: DiscountType = row.discount_type.parse().map_err(|_| {
        tracing::error!(campaign_id = %row.id, value = %row.discount_type, "stored discount type is not recognized");
        ApiError::new(req_id, "internal_error", "stored campaign is invalid")
    })?;

    Ok(CampaignBody {
        id: row.id,
        shop: row.shop,
        name: row.name,
        description: row.description,
        discount_type,
        discount_value: row.discount_value,
        instock: row.instock,
        tracking: row.tracking,
        active: row.active,
        start_date: row.start_date,
        end_date: row.end_date,
        created_at: row.created_at,
        updated_at: row.updated_at,
        products,
        collections,
    })
}

async fn run_campaign_reconcile(
    state: &AppState,
    req_id: &str,
    shop: &str,
    campaign_id: Uuid,
) -> Result<ReconcileBody, ApiError> {
    match state.engine.reconcile(shop, Some(campaign_id)).await {
        Ok(ReconcileOutcome::Completed(summary)) => Ok(summary.into()),
        Ok(ReconcileOutcome::CampaignNotFound) => Ok(ReconcileSummary::default().into()),
        Err(e) => Err(map_engine_error(req_id.to_owned(), &e)),
    }
}

async fn require_campaign(
    state: &AppState,
    req_id: &str,
    id: Uuid,
) -> Result<CampaignRow, ApiError> {
    db::get_campaign(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.to_owned(), &e))?
        .ok_or_else(|| ApiError::new(req_id, "not_found", format!("no campaign with id {id}")))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /campaigns?shop= — list a shop's campaigns with their targets.
pub(in crate::api) async fn list_campaigns(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<CampaignBody>>>, ApiError> {
    let rid = req_id.0;

    let rows = db::list_campaigns(&state.pool, &query.shop)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    let mut bodies = Vec::with_capacity(rows.len());
    for row in rows {
        bodies.push(campaign_body(&state, &rid, row).await?);
    }

    Ok(Json(ApiResponse {
        data: bodies,
        meta: ResponseMeta::new(rid),
    }))
}

/// GET /campaigns/{id} — fetch one campaign with its targets.
pub(in crate::api) async fn get_campaign(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CampaignBody>>, ApiError> {
    let rid = req_id.0;

    let row = require_campaign(&state, &rid, id).await?;
    let body = campaign_body(&state, &rid, row).await?;

    Ok(Json(ApiResponse {
        data: body,
        meta: ResponseMeta::new(rid),
    }))
}

/// POST /campaigns — create a campaign and reconcile it.
pub(in crate::api) async fn create_campaign(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CampaignWithReconcile>>), ApiError> {
    let rid = req_id.0;

    if body.shop.trim().is_empty() {
        return Err(ApiError::new(&rid, "validation_error", "shop is required"));
    }
    validate_campaign_fields(
        &rid,
        &body.name,
        body.discount_type,
        body.discount_value,
        body.start_date,
        body.end_date,
    )?;

    let row = db::create_campaign(
        &state.pool,
        &NewCampaign {
            shop: body.shop.trim().to_owned(),
            name: body.name.trim().to_owned(),
            description: body.description,
            discount_type: body.discount_type,
            discount_value: body.discount_value,
            instock: body.instock,
            tracking: body.tracking,
            active: body.active,
            start_date: body.start_date,
            end_date: body.end_date,
        },
    )
    .await
    .map_err(|e| map_db_error(rid.clone(), &e))?;

    let reconcile = run_campaign_reconcile(&state, &rid, &row.shop, row.id).await?;
    let campaign = campaign_body(&state, &rid, row).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: CampaignWithReconcile {
                campaign,
                reconcile,
            },
            meta: ResponseMeta::new(rid),
        }),
    ))
}

/// PUT /campaigns/{id} — merge a partial edit over the stored campaign,
/// then reconcile. Deactivating or narrowing a campaign this way restores
/// prices on the next pass.
pub(in crate::api) async fn update_campaign(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateCampaignRequest>,
) -> Result<Json<ApiResponse<CampaignWithReconcile>>, ApiError> {
    let rid = req_id.0;

    let existing = require_campaign(&state, &rid, id).await?;
    let update = merged_update(&existing, body)
        .map_err(|reason| ApiError::new(&rid, "internal_error", reason))?;
    validate_campaign_fields(
        &rid,
        &update.name,
        update.discount_type,
        update.discount_value,
        update.start_date,
        update.end_date,
    )?;

    let row = db::update_campaign(&state.pool, id, &update)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(&rid, "not_found", format!("no campaign with id {id}")))?;

    let reconcile = run_campaign_reconcile(&state, &rid, &row.shop, row.id).await?;
    let campaign = campaign_body(&state, &rid, row).await?;

    Ok(Json(ApiResponse {
        data: CampaignWithReconcile {
            campaign,
            reconcile,
        },
        meta: ResponseMeta::new(rid),
    }))
}

/// DELETE /campaigns/{id} — capture the target set, delete, restore prices.
pub(in crate::api) async fn delete_campaign(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeleteResponse>>, ApiError> {
    let rid = req_id.0;

    let campaign = db::load_campaign_with_targets(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(&rid, "not_found", format!("no campaign with id {id}")))?;

    // The target set must be expanded before the delete: collection
    // assignments and locked prices are gone once the row is.
    let product_ids = state
        .engine
        .campaign_target_products(&campaign)
        .await
        .map_err(|e| map_engine_error(rid.clone(), &e))?;

    db::delete_campaign(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    let summary = state
        .engine
        .reconcile_products(&campaign.shop, &product_ids)
        .await
        .map_err(|e| map_engine_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: DeleteResponse {
            deleted: true,
            reconcile: summary.into(),
        },
        meta: ResponseMeta::new(rid),
    }))
}

/// POST /campaigns/{id}/products — add product targets (duplicates ignored).
pub(in crate::api) async fn add_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
    Json(body): Json<AddProductsRequest>,
) -> Result<Json<ApiResponse<TargetMutationResponse>>, ApiError> {
    let rid = req_id.0;

    let row = require_campaign(&state, &rid, id).await?;
    let targets: Vec<ProductTarget> = body
        .products
        .into_iter()
        .map(|t| ProductTarget {
            product_id: t.product_id,
            variant_id: t.variant_id,
        })
        .collect();

    let affected = db::add_campaign_products(&state.pool, id, &targets)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    let reconcile = run_campaign_reconcile(&state, &rid, &row.shop, id).await?;

    Ok(Json(ApiResponse {
        data: TargetMutationResponse {
            affected,
            reconcile,
        },
        meta: ResponseMeta::new(rid),
    }))
}

/// DELETE /campaigns/{id}/products — remove product targets and restore.
pub(in crate::api) async fn remove_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
    Json(body): Json<RemoveProductsRequest>,
) -> Result<Json<ApiResponse<TargetMutationResponse>>, ApiError> {
    let rid = req_id.0;

    let row = require_campaign(&state, &rid, id).await?;
    let affected = db::remove_campaign_products(&state.pool, id, &body.product_ids)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    // Removed products still need a pass so their prices are restored;
    // reconcile the explicit product list instead of the shrunken target set.
    let removed: std::collections::BTreeSet<String> = body.product_ids.into_iter().collect();
    let summary = state
        .engine
        .reconcile_products(&row.shop, &removed)
        .await
        .map_err(|e| map_engine_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: TargetMutationResponse {
            affected,
            reconcile: summary.into(),
        },
        meta: ResponseMeta::new(rid),
    }))
}

/// POST /campaigns/{id}/collections — add collection targets.
pub(in crate::api) async fn add_collections(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
    Json(body): Json<CollectionsRequest>,
) -> Result<Json<ApiResponse<TargetMutationResponse>>, ApiError> {
    let rid = req_id.0;

    let row = require_campaign(&state, &rid, id).await?;
    let affected = db::add_campaign_collections(&state.pool, id, &body.collection_ids)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    let reconcile = run_campaign_reconcile(&state, &rid, &row.shop, id).await?;

    Ok(Json(ApiResponse {
        data: TargetMutationResponse {
            affected,
            reconcile,
        },
        meta: ResponseMeta::new(rid),
    }))
}

/// DELETE /campaigns/{id}/collections — remove collection targets and
/// restore their products.
pub(in crate::api) async fn remove_collections(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
    Json(body): Json<CollectionsRequest>,
) -> Result<Json<ApiResponse<TargetMutationResponse>>, ApiError> {
    let rid = req_id.0;

    let row = require_campaign(&state, &rid, id).await?;

    // Expand the collections before unassigning them, for the same reason
    // the delete flow does.
    let mut product_ids = std::collections::BTreeSet::new();
    for collection_id in &body.collection_ids {
        let ids = state
            .engine
            .collection_products(&row.shop, collection_id)
            .await
            .map_err(|e| map_engine_error(rid.clone(), &e))?;
        product_ids.extend(ids);
    }

    let affected = db::remove_campaign_collections(&state.pool, id, &body.collection_ids)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    let summary = state
        .engine
        .reconcile_products(&row.shop, &product_ids)
        .await
        .map_err(|e| map_engine_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: TargetMutationResponse {
            affected,
            reconcile: summary.into(),
        },
        meta: ResponseMeta::new(rid),
    }))
}
