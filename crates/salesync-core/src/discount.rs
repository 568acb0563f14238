//! Discount arithmetic.

use rust_decimal::Decimal;

use crate::campaigns::DiscountType;

/// Computes the discounted price for a single campaign.
///
/// `Percentage` and `Fixed` are floored at zero. `FixedPrice` is returned
/// as-is, even above the base price: a flat sale price can legitimately sit
/// above the base, and the resolution step's min-across-campaigns treats it
/// like any other candidate.
#[must_use]
pub fn discounted_price(base_price: Decimal, discount_type: DiscountType, value: Decimal) -> Decimal {
    match discount_type {
        DiscountType::Percentage => {
            let factor = (Decimal::ONE_HUNDRED - value) / Decimal::ONE_HUNDRED;
            (base_price * factor).max(Decimal::ZERO)
        }
        DiscountType::Fixed => (base_price - value).max(Decimal::ZERO),
        DiscountType::FixedPrice => value,
    }
}

#[cfg(test)]
#[path = "discount_test.rs"]
mod tests;
