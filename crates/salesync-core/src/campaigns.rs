//! Campaign domain types and the applicability filter.
//!
//! A campaign is "in effect" at an instant when it is active and that instant
//! falls inside its (inclusive, optionally open-ended) date window. Whether it
//! applies to a concrete variant additionally depends on its target
//! assignments: direct product rows (optionally restricted to one variant)
//! and collection rows matched against the product's collection memberships.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::CoreError;

/// How a campaign's `discount_value` is interpreted.
///
/// This is a closed set: unknown strings are rejected when campaigns enter
/// the system (API deserialization, DB row conversion) rather than silently
/// treated as a no-op discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    /// `value` percent off the base price.
    Percentage,
    /// `value` currency units off the base price.
    Fixed,
    /// The sale price is `value` itself, regardless of the base price.
    FixedPrice,
}

impl DiscountType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DiscountType::Percentage => "PERCENTAGE",
            DiscountType::Fixed => "FIXED",
            DiscountType::FixedPrice => "FIXED_PRICE",
        }
    }
}

impl FromStr for DiscountType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PERCENTAGE" => Ok(DiscountType::Percentage),
            "FIXED" => Ok(DiscountType::Fixed),
            "FIXED_PRICE" => Ok(DiscountType::FixedPrice),
            other => Err(CoreError::UnknownDiscountType(other.to_owned())),
        }
    }
}

impl std::fmt::Display for DiscountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A direct product assignment on a campaign.
///
/// `variant_id = None` covers the whole product; `Some` restricts the
/// campaign to that single variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductTarget {
    pub product_id: String,
    pub variant_id: Option<String>,
}

/// A promotional campaign with its target assignments loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub shop: String,
    pub name: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    /// When true the campaign only applies to variants with positive
    /// available inventory.
    pub instock: bool,
    /// When false the discounted price is computed once and frozen in the
    /// lock store; later base-price changes do not move it.
    pub tracking: bool,
    pub active: bool,
    /// Inclusive start of the campaign window; `None` means "already started".
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive end of the campaign window; `None` means "never ends".
    pub end_date: Option<DateTime<Utc>>,
    pub products: Vec<ProductTarget>,
    pub collections: Vec<String>,
}

impl Campaign {
    /// Whether the campaign is active and `now` lies inside its date window.
    #[must_use]
    pub fn in_effect(&self, now: DateTime<Utc>) -> bool {
        self.active
            && self.start_date.is_none_or(|start| start <= now)
            && self.end_date.is_none_or(|end| end >= now)
    }

    /// Whether the campaign's target assignments cover the given variant.
    ///
    /// A direct product row matches when the product id is equal and either
    /// side has no variant restriction, or both name the same variant.
    /// Collection membership is checked against the product's own
    /// memberships; either path alone is sufficient.
    #[must_use]
    pub fn targets_variant(
        &self,
        product_id: &str,
        variant_id: Option<&str>,
        collection_ids: &[String],
    ) -> bool {
        let direct = self.products.iter().any(|target| {
            target.product_id == product_id
                && (variant_id.is_none()
                    || target.variant_id.is_none()
                    || target.variant_id.as_deref() == variant_id)
        });

        direct
            || self
                .collections
                .iter()
                .any(|collection_id| collection_ids.contains(collection_id))
    }
}

/// Filters `campaigns` down to those in effect at `now` that target the
/// given variant.
#[must_use]
pub fn applicable_campaigns<'a>(
    campaigns: &'a [Campaign],
    product_id: &str,
    variant_id: Option<&str>,
    collection_ids: &[String],
    now: DateTime<Utc>,
) -> Vec<&'a Campaign> {
    campaigns
        .iter()
        .filter(|campaign| {
            campaign.in_effect(now)
                && campaign.targets_variant(product_id, variant_id, collection_ids)
        })
        .collect()
}

#[cfg(test)]
#[path = "campaigns_test.rs"]
mod tests;
