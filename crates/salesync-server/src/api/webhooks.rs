//! Catalog webhook handlers.
//!
//! Both payloads are minimal: the handlers only need to know which product
//! changed, then run a single-product reconciliation pass against the shop's
//! full campaign set. Transport authentication is expected from the upstream
//! proxy that delivers the webhooks.

use axum::{extract::State, Extension, Json};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_engine_error, ApiError, ApiResponse, AppState, ReconcileBody, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(in crate::api) struct ProductsUpdatePayload {
    pub shop: String,
    pub product_id: String,
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct InventoryLevelsPayload {
    pub shop: String,
    pub product_id: String,
    // Passed through by inventory webhooks; the pass re-reads live
    // quantities from the catalog, so only product_id matters here.
    pub variant_id: Option<String>,
    pub inventory_item_id: Option<String>,
    pub available: Option<i64>,
}

/// POST /webhooks/products-update — a product's prices or variants changed.
pub(in crate::api) async fn products_update(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(payload): Json<ProductsUpdatePayload>,
) -> Result<Json<ApiResponse<ReconcileBody>>, ApiError> {
    let rid = req_id.0;

    tracing::info!(
        shop = %payload.shop,
        product_id = %payload.product_id,
        "product update webhook received"
    );
    let summary = state
        .engine
        .reconcile_product(&payload.shop, &payload.product_id)
        .await
        .map_err(|e| map_engine_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: summary.into(),
        meta: ResponseMeta::new(rid),
    }))
}

/// POST /webhooks/inventory-levels — stock moved; instock campaigns may now
/// apply or stop applying.
pub(in crate::api) async fn inventory_levels(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(payload): Json<InventoryLevelsPayload>,
) -> Result<Json<ApiResponse<ReconcileBody>>, ApiError> {
    let rid = req_id.0;

    tracing::info!(
        shop = %payload.shop,
        product_id = %payload.product_id,
        variant_id = payload.variant_id.as_deref().unwrap_or("<all>"),
        inventory_item_id = payload.inventory_item_id.as_deref(),
        available = payload.available,
        "inventory level webhook received"
    );
    let summary = state
        .engine
        .reconcile_product(&payload.shop, &payload.product_id)
        .await
        .map_err(|e| map_engine_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: summary.into(),
        meta: ResponseMeta::new(rid),
    }))
}
