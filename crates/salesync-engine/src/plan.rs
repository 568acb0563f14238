//! Pure per-product planning.
//!
//! Separates deciding what to write (resolution + state decision against the
//! catalog's current values) from performing the writes, so the heart of a
//! reconciliation pass is unit-testable without a database or HTTP server.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use salesync_catalog::{CatalogProduct, VariantPriceUpdate};
use salesync_core::{
    derive_base_price, needs_write, price_state, resolve_price, target_prices, Campaign,
    CurrentPrices, LockSnapshot, VariantContext,
};

use crate::error::EngineError;

/// A lock the caller must persist for a tracking-disabled campaign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockWrite {
    pub campaign_id: Uuid,
    pub variant_id: String,
    /// Base price in effect when the lock value was computed.
    pub base_price: Decimal,
    pub locked_price: Decimal,
}

/// Everything a reconciliation pass must do for one product: catalog writes
/// for variants whose state actually changes, and new price locks.
#[derive(Debug, Default)]
pub struct ProductPlan {
    pub writes: Vec<VariantPriceUpdate>,
    pub lock_writes: Vec<LockWrite>,
}

/// Plans the reconciliation of one product against the campaign set.
///
/// `locks_by_variant` holds the existing lock snapshot per variant id.
/// Variants whose current catalog values already match the resolved target
/// produce no write, which is what makes a repeated pass a no-op.
///
/// # Errors
///
/// Returns [`EngineError::InvalidPrice`] when a variant's price or
/// compare-at price does not parse as a decimal.
pub fn plan_product(
    campaigns: &[Campaign],
    locks_by_variant: &HashMap<String, LockSnapshot>,
    product: &CatalogProduct,
    now: DateTime<Utc>,
) -> Result<ProductPlan, EngineError> {
    let empty_locks = LockSnapshot::new();
    let mut plan = ProductPlan::default();

    for variant in &product.variants {
        let current_price = parse_price(&variant.id, &variant.price)?;
        let compare_at = variant
            .compare_at_price
            .as_deref()
            .map(|raw| parse_price(&variant.id, raw))
            .transpose()?;

        let base_price = derive_base_price(compare_at, current_price);
        // Null inventory means the catalog does not track stock for this
        // variant; instock-gated campaigns then treat it as unavailable.
        let inventory_available = variant.inventory_quantity.unwrap_or(0) > 0;

        let locks = locks_by_variant.get(&variant.id).unwrap_or(&empty_locks);
        let resolution = resolve_price(
            campaigns,
            locks,
            &VariantContext {
                product_id: &product.id,
                variant_id: Some(&variant.id),
                base_price,
                inventory_available,
                collection_ids: &product.collection_ids,
            },
            now,
        );

        for pending in &resolution.pending_locks {
            plan.lock_writes.push(LockWrite {
                campaign_id: pending.campaign_id,
                variant_id: variant.id.clone(),
                base_price,
                locked_price: pending.discounted_price,
            });
        }

        let state = price_state(resolution.final_price, base_price, resolution.restore_original);
        let target = target_prices(state, resolution.final_price, base_price);
        let current = CurrentPrices {
            price: current_price,
            compare_at_price: compare_at,
        };

        if needs_write(&current, &target) {
            tracing::debug!(
                variant_id = %variant.id,
                current_price = %current_price,
                target_price = %target.price,
                "variant price out of sync, scheduling write"
            );
            plan.writes.push(VariantPriceUpdate {
                id: variant.id.clone(),
                price: format_price(target.price),
                compare_at_price: target.compare_at_price.map(format_price),
            });
        }
    }

    Ok(plan)
}

fn parse_price(variant_id: &str, raw: &str) -> Result<Decimal, EngineError> {
    raw.trim()
        .parse::<Decimal>()
        .map_err(|_| EngineError::InvalidPrice {
            variant_id: variant_id.to_owned(),
            value: raw.to_owned(),
        })
}

/// Renders a price for the catalog wire format with two decimal places.
fn format_price(price: Decimal) -> String {
    format!("{price:.2}")
}

#[cfg(test)]
#[path = "plan_test.rs"]
mod tests;
