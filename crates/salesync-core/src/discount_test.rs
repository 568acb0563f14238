use rust_decimal::Decimal;

use super::*;

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

#[test]
fn percentage_takes_value_percent_off_base() {
    assert_eq!(
        discounted_price(dec("500"), DiscountType::Percentage, dec("20")),
        dec("400")
    );
}

#[test]
fn percentage_zero_leaves_base_unchanged() {
    assert_eq!(
        discounted_price(dec("99.95"), DiscountType::Percentage, dec("0")),
        dec("99.95")
    );
}

#[test]
fn percentage_hundred_goes_to_zero() {
    assert_eq!(
        discounted_price(dec("99.95"), DiscountType::Percentage, dec("100")),
        Decimal::ZERO
    );
}

#[test]
fn percentage_never_negative_and_never_exceeds_base() {
    let base = dec("250.00");
    for v in ["0", "1", "33.33", "50", "99.99", "100"] {
        let price = discounted_price(base, DiscountType::Percentage, dec(v));
        assert!(price >= Decimal::ZERO, "negative for {v}");
        assert!(price <= base, "exceeds base for {v}");
    }
}

#[test]
fn fixed_subtracts_value_from_base() {
    assert_eq!(
        discounted_price(dec("500"), DiscountType::Fixed, dec("50")),
        dec("450")
    );
}

#[test]
fn fixed_is_floored_at_zero() {
    assert_eq!(
        discounted_price(dec("30"), DiscountType::Fixed, dec("45")),
        Decimal::ZERO
    );
}

#[test]
fn fixed_price_replaces_base_entirely() {
    assert_eq!(
        discounted_price(dec("1000"), DiscountType::FixedPrice, dec("300")),
        dec("300")
    );
}

#[test]
fn fixed_price_may_exceed_base() {
    // Not clamped: a flat sale price above base is a legal candidate; the
    // min-across-campaigns step keeps it from ever lowering the shown price.
    assert_eq!(
        discounted_price(dec("100"), DiscountType::FixedPrice, dec("150")),
        dec("150")
    );
}
