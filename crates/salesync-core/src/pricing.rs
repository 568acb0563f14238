//! Price resolution and the reconcile decision.
//!
//! `resolve_price` is the core algorithm: given the full campaign set for a
//! shop, the existing lock snapshot for one variant, and that variant's
//! current market facts, it produces the lowest eligible price plus the set
//! of tracking-disabled campaigns that still need a lock persisted. It is
//! pure — campaign loading and lock persistence belong to the caller — and
//! order-independent across campaigns.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::campaigns::{applicable_campaigns, Campaign};
use crate::discount::discounted_price;

/// Writes differing by at most this much are treated as unchanged, absorbing
/// floating-point noise from external representations.
#[must_use]
pub fn write_tolerance() -> Decimal {
    Decimal::new(1, 2) // 0.01
}

/// Existing locked prices for one (product, variant), keyed by campaign id.
pub type LockSnapshot = HashMap<Uuid, Decimal>;

/// The variant-level facts resolution needs.
#[derive(Debug, Clone, Copy)]
pub struct VariantContext<'a> {
    pub product_id: &'a str,
    pub variant_id: Option<&'a str>,
    /// Pre-discount price, per [`derive_base_price`].
    pub base_price: Decimal,
    pub inventory_available: bool,
    pub collection_ids: &'a [String],
}

/// A tracking-disabled campaign whose freshly computed price must be
/// persisted to the lock store after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLock {
    pub campaign_id: Uuid,
    pub discounted_price: Decimal,
}

/// Outcome of resolving one variant against all campaigns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Lowest candidate price, or the base price when nothing applied.
    pub final_price: Decimal,
    /// True when the catalog must show no discount: either no campaign
    /// contributed a candidate, or none beat the base price.
    pub restore_original: bool,
    pub pending_locks: Vec<PendingLock>,
}

/// Recovers the pre-discount price from catalog state.
///
/// A non-null `compare_at_price` always holds the original price, so using
/// it (rather than the possibly already-discounted current price) makes
/// repeated resolution idempotent — discounts never compound.
#[must_use]
pub fn derive_base_price(compare_at_price: Option<Decimal>, current_price: Decimal) -> Decimal {
    compare_at_price.unwrap_or(current_price)
}

/// Resolves the final price for one variant across all campaigns.
///
/// Per applicable campaign, in no particular order:
/// - instock-gated campaigns are skipped entirely when the variant has no
///   inventory (no candidate, no new lock);
/// - tracking-disabled campaigns use their existing lock as the candidate
///   regardless of the current base price, or compute from the current base
///   and emit a [`PendingLock`] when none exists yet;
/// - tracking-enabled campaigns always compute from the current base.
///
/// Inactive or out-of-window campaigns never contribute, even when a stale
/// lock exists for them — such locks are inert, not deleted.
#[must_use]
pub fn resolve_price(
    campaigns: &[Campaign],
    locks: &LockSnapshot,
    ctx: &VariantContext<'_>,
    now: DateTime<Utc>,
) -> Resolution {
    let applicable = applicable_campaigns(
        campaigns,
        ctx.product_id,
        ctx.variant_id,
        ctx.collection_ids,
        now,
    );

    let mut candidates: Vec<Decimal> = Vec::new();
    let mut pending_locks: Vec<PendingLock> = Vec::new();

    for campaign in applicable {
        if campaign.instock && !ctx.inventory_available {
            continue;
        }

        if !campaign.tracking {
            if let Some(locked) = locks.get(&campaign.id) {
                // The lock is authoritative until explicitly replaced.
                candidates.push(*locked);
                continue;
            }
        }

        let price = discounted_price(ctx.base_price, campaign.discount_type, campaign.discount_value);
        candidates.push(price);

        if !campaign.tracking {
            pending_locks.push(PendingLock {
                campaign_id: campaign.id,
                discounted_price: price,
            });
        }
    }

    let final_price = candidates.iter().copied().min().unwrap_or(ctx.base_price);
    let restore_original = candidates.is_empty() || final_price >= ctx.base_price;

    Resolution {
        final_price,
        restore_original,
        pending_locks,
    }
}

/// The two states a variant's catalog entry can converge to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceState {
    /// `price = final_price`, `compare_at_price = base_price`.
    Discounted,
    /// `price = base_price`, `compare_at_price = None`.
    Restored,
}

/// Decides the target state from a resolution outcome.
#[must_use]
pub fn price_state(final_price: Decimal, base_price: Decimal, restore_original: bool) -> PriceState {
    if restore_original || final_price >= base_price {
        PriceState::Restored
    } else {
        PriceState::Discounted
    }
}

/// The (price, compare-at) pair the catalog must converge to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetPrices {
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
}

/// Variant pricing as currently stored in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentPrices {
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
}

/// Maps a [`PriceState`] to the concrete values to write.
#[must_use]
pub fn target_prices(state: PriceState, final_price: Decimal, base_price: Decimal) -> TargetPrices {
    match state {
        PriceState::Discounted => TargetPrices {
            price: final_price,
            compare_at_price: Some(base_price),
        },
        PriceState::Restored => TargetPrices {
            price: base_price,
            compare_at_price: None,
        },
    }
}

/// Whether writing `target` would actually change catalog state.
///
/// This comparison, not the state label, is what makes consecutive passes
/// over an unchanged campaign set produce zero writes.
#[must_use]
pub fn needs_write(current: &CurrentPrices, target: &TargetPrices) -> bool {
    let price_changed = (target.price - current.price).abs() > write_tolerance();
    let compare_at_changed = target.compare_at_price != current.compare_at_price;
    price_changed || compare_at_changed
}

#[cfg(test)]
#[path = "pricing_test.rs"]
mod tests;
