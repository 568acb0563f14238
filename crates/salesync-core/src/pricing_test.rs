use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::*;
use crate::campaigns::{Campaign, DiscountType, ProductTarget};

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn campaign(discount_type: DiscountType, value: &str) -> Campaign {
    Campaign {
        id: Uuid::new_v4(),
        shop: "demo.myshop.test".to_owned(),
        name: "test".to_owned(),
        discount_type,
        discount_value: dec(value),
        instock: false,
        tracking: true,
        active: true,
        start_date: None,
        end_date: None,
        products: vec![ProductTarget {
            product_id: "prod-1".to_owned(),
            variant_id: None,
        }],
        collections: vec![],
    }
}

fn ctx(base: &str, inventory_available: bool) -> VariantContext<'static> {
    VariantContext {
        product_id: "prod-1",
        variant_id: Some("var-1"),
        base_price: dec(base),
        inventory_available,
        collection_ids: &[],
    }
}

#[test]
fn no_campaigns_restores_base_price() {
    let resolution = resolve_price(&[], &LockSnapshot::new(), &ctx("500", true), Utc::now());
    assert_eq!(resolution.final_price, dec("500"));
    assert!(resolution.restore_original);
    assert!(resolution.pending_locks.is_empty());
}

#[test]
fn lowest_price_wins_across_campaigns() {
    // 20% off 500 = 400; 50 off 500 = 450 — customer sees 400.
    let campaigns = vec![
        campaign(DiscountType::Percentage, "20"),
        campaign(DiscountType::Fixed, "50"),
    ];
    let resolution = resolve_price(&campaigns, &LockSnapshot::new(), &ctx("500", true), Utc::now());
    assert_eq!(resolution.final_price, dec("400"));
    assert!(!resolution.restore_original);
}

#[test]
fn result_is_order_independent() {
    let a = campaign(DiscountType::Percentage, "20");
    let b = campaign(DiscountType::Fixed, "50");
    let forward = resolve_price(
        &[a.clone(), b.clone()],
        &LockSnapshot::new(),
        &ctx("500", true),
        Utc::now(),
    );
    let reverse = resolve_price(&[b, a], &LockSnapshot::new(), &ctx("500", true), Utc::now());
    assert_eq!(forward.final_price, reverse.final_price);
    assert_eq!(forward.restore_original, reverse.restore_original);
}

#[test]
fn tracking_disabled_without_lock_emits_pending_lock() {
    let mut c = campaign(DiscountType::FixedPrice, "300");
    c.tracking = false;
    let resolution = resolve_price(
        &[c.clone()],
        &LockSnapshot::new(),
        &ctx("1000", true),
        Utc::now(),
    );
    assert_eq!(resolution.final_price, dec("300"));
    assert_eq!(
        resolution.pending_locks,
        vec![PendingLock {
            campaign_id: c.id,
            discounted_price: dec("300"),
        }]
    );
}

#[test]
fn existing_lock_wins_over_recomputation() {
    // Locked at 300 when base was 1000; base has since risen to 1200.
    let mut c = campaign(DiscountType::FixedPrice, "300");
    c.tracking = false;
    let mut locks = LockSnapshot::new();
    locks.insert(c.id, dec("300"));

    let resolution = resolve_price(&[c], &locks, &ctx("1200", true), Utc::now());
    assert_eq!(resolution.final_price, dec("300"));
    assert!(
        resolution.pending_locks.is_empty(),
        "locked campaigns must not re-lock"
    );
}

#[test]
fn stale_lock_for_inactive_campaign_is_inert() {
    let mut c = campaign(DiscountType::Percentage, "50");
    c.tracking = false;
    c.active = false;
    let mut locks = LockSnapshot::new();
    locks.insert(c.id, dec("250"));

    let resolution = resolve_price(&[c], &locks, &ctx("500", true), Utc::now());
    assert_eq!(resolution.final_price, dec("500"));
    assert!(resolution.restore_original);
}

#[test]
fn instock_campaign_is_skipped_when_out_of_stock() {
    let mut c = campaign(DiscountType::Percentage, "10");
    c.instock = true;
    let resolution = resolve_price(&[c], &LockSnapshot::new(), &ctx("500", false), Utc::now());
    assert_eq!(resolution.final_price, dec("500"));
    assert!(resolution.restore_original);
    assert!(resolution.pending_locks.is_empty());
}

#[test]
fn instock_gating_never_creates_a_lock() {
    let mut c = campaign(DiscountType::Percentage, "10");
    c.instock = true;
    c.tracking = false;
    let resolution = resolve_price(&[c], &LockSnapshot::new(), &ctx("500", false), Utc::now());
    assert!(resolution.pending_locks.is_empty());
}

#[test]
fn candidates_at_or_above_base_restore_original() {
    // FIXED_PRICE above base produces a candidate, but nothing beats base.
    let c = campaign(DiscountType::FixedPrice, "600");
    let resolution = resolve_price(&[c], &LockSnapshot::new(), &ctx("500", true), Utc::now());
    assert_eq!(resolution.final_price, dec("600"));
    assert!(resolution.restore_original);
}

#[test]
fn resolution_is_idempotent_against_its_own_output() {
    // First pass: base 500, 20% off → price 400, compare_at 500.
    let campaigns = vec![campaign(DiscountType::Percentage, "20")];
    let first = resolve_price(&campaigns, &LockSnapshot::new(), &ctx("500", true), Utc::now());
    assert_eq!(first.final_price, dec("400"));

    // Second pass reads catalog state written by the first: price = 400,
    // compare_at = 500 — base derives back to 500, so no compounding.
    let base = derive_base_price(Some(dec("500")), first.final_price);
    let second_ctx = VariantContext {
        base_price: base,
        ..ctx("0", true)
    };
    let second = resolve_price(&campaigns, &LockSnapshot::new(), &second_ctx, Utc::now());
    assert_eq!(second.final_price, first.final_price);
}

#[test]
fn derive_base_price_prefers_compare_at() {
    assert_eq!(derive_base_price(Some(dec("500")), dec("400")), dec("500"));
    assert_eq!(derive_base_price(None, dec("400")), dec("400"));
}

#[test]
fn price_state_discounted_only_when_strictly_below_base() {
    assert_eq!(
        price_state(dec("400"), dec("500"), false),
        PriceState::Discounted
    );
    assert_eq!(
        price_state(dec("500"), dec("500"), false),
        PriceState::Restored
    );
    assert_eq!(
        price_state(dec("400"), dec("500"), true),
        PriceState::Restored
    );
}

#[test]
fn target_prices_per_state() {
    assert_eq!(
        target_prices(PriceState::Discounted, dec("400"), dec("500")),
        TargetPrices {
            price: dec("400"),
            compare_at_price: Some(dec("500")),
        }
    );
    assert_eq!(
        target_prices(PriceState::Restored, dec("400"), dec("500")),
        TargetPrices {
            price: dec("500"),
            compare_at_price: None,
        }
    );
}

#[test]
fn needs_write_absorbs_sub_cent_noise() {
    let current = CurrentPrices {
        price: dec("400.00"),
        compare_at_price: Some(dec("500.00")),
    };
    let same = TargetPrices {
        price: dec("400.005"),
        compare_at_price: Some(dec("500.00")),
    };
    assert!(!needs_write(&current, &same));

    let moved = TargetPrices {
        price: dec("400.02"),
        compare_at_price: Some(dec("500.00")),
    };
    assert!(needs_write(&current, &moved));
}

#[test]
fn needs_write_detects_compare_at_presence_change() {
    let current = CurrentPrices {
        price: dec("500.00"),
        compare_at_price: Some(dec("500.00")),
    };
    let target = TargetPrices {
        price: dec("500.00"),
        compare_at_price: None,
    };
    assert!(needs_write(&current, &target));
}

#[test]
fn converged_state_needs_no_write() {
    let current = CurrentPrices {
        price: dec("400"),
        compare_at_price: Some(dec("500")),
    };
    let target = TargetPrices {
        price: dec("400.00"),
        compare_at_price: Some(dec("500.00")),
    };
    assert!(!needs_write(&current, &target));
}
