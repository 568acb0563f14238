//! Wire types for the catalog admin API.
//!
//! Prices travel as decimal strings (e.g. `"162.00"`); `compare_at_price` is
//! explicitly `null` — not `"0.00"` — when the variant is not on sale.
//! Parsing to `Decimal` happens at the engine boundary, keeping this crate a
//! plain transport layer.

use serde::{Deserialize, Serialize};

/// Envelope for `GET /admin/products/{id}.json`.
#[derive(Debug, Deserialize)]
pub struct ProductEnvelope {
    pub product: CatalogProduct,
}

/// A product as the catalog returns it: variants plus collection memberships.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogProduct {
    pub id: String,
    /// Ids of the collections this product belongs to.
    #[serde(default)]
    pub collection_ids: Vec<String>,
    pub variants: Vec<CatalogVariant>,
}

/// A purchasable variant of a [`CatalogProduct`].
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogVariant {
    pub id: String,
    /// Current selling price as a decimal string. Never null.
    pub price: String,
    /// Pre-discount price as a decimal string, or `null` when the variant is
    /// not discounted.
    #[serde(default)]
    pub compare_at_price: Option<String>,
    /// Available stock; `null` when the catalog does not track inventory for
    /// this variant.
    #[serde(default)]
    pub inventory_quantity: Option<i64>,
}

/// One page of `GET /admin/collections/{id}/products.json`.
#[derive(Debug, Deserialize)]
pub struct CollectionProductsPage {
    pub products: Vec<ProductRef>,
}

/// A bare product reference inside a collection page.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductRef {
    pub id: String,
}

/// One variant's new price state for a bulk write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantPriceUpdate {
    pub id: String,
    pub price: String,
    /// `None` serializes as `null`, clearing the discount marker.
    pub compare_at_price: Option<String>,
}

/// Request body for `PUT /admin/products/{id}/variants.json`.
#[derive(Debug, Serialize)]
pub(crate) struct VariantUpdateEnvelope<'a> {
    pub variants: &'a [VariantPriceUpdate],
}

/// A field-level failure reported by a bulk variant write.
#[derive(Debug, Clone, Deserialize)]
pub struct PriceUpdateError {
    #[serde(default)]
    pub field: Option<String>,
    pub message: String,
}

/// Response body of a bulk variant write; `user_errors` is empty on full
/// success and lists per-field failures on partial failure.
#[derive(Debug, Deserialize)]
pub(crate) struct VariantUpdateResponse {
    #[serde(default)]
    pub user_errors: Vec<PriceUpdateError>,
}
