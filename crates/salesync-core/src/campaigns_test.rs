use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::*;

fn campaign(products: Vec<ProductTarget>, collections: Vec<String>) -> Campaign {
    Campaign {
        id: Uuid::new_v4(),
        shop: "demo.myshop.test".to_owned(),
        name: "Summer sale".to_owned(),
        discount_type: DiscountType::Percentage,
        discount_value: Decimal::from(10),
        instock: false,
        tracking: true,
        active: true,
        start_date: None,
        end_date: None,
        products,
        collections,
    }
}

fn product_target(product_id: &str, variant_id: Option<&str>) -> ProductTarget {
    ProductTarget {
        product_id: product_id.to_owned(),
        variant_id: variant_id.map(ToOwned::to_owned),
    }
}

#[test]
fn in_effect_with_open_window_is_always_true() {
    let c = campaign(vec![], vec![]);
    assert!(c.in_effect(Utc::now()));
}

#[test]
fn not_in_effect_before_start_date() {
    let mut c = campaign(vec![], vec![]);
    c.start_date = Some(Utc::now() + Duration::seconds(1));
    assert!(!c.in_effect(Utc::now()));
}

#[test]
fn not_in_effect_after_end_date() {
    let mut c = campaign(vec![], vec![]);
    c.end_date = Some(Utc::now() - Duration::seconds(1));
    assert!(!c.in_effect(Utc::now()));
}

#[test]
fn window_bounds_are_inclusive() {
    let now = Utc::now();
    let mut c = campaign(vec![], vec![]);
    c.start_date = Some(now);
    c.end_date = Some(now);
    assert!(c.in_effect(now));
}

#[test]
fn inactive_campaign_is_never_in_effect() {
    let mut c = campaign(vec![], vec![]);
    c.active = false;
    assert!(!c.in_effect(Utc::now()));
}

#[test]
fn direct_product_without_variant_restriction_matches_any_variant() {
    let c = campaign(vec![product_target("prod-1", None)], vec![]);
    assert!(c.targets_variant("prod-1", Some("var-9"), &[]));
    assert!(c.targets_variant("prod-1", None, &[]));
    assert!(!c.targets_variant("prod-2", Some("var-9"), &[]));
}

#[test]
fn variant_restriction_only_matches_that_variant() {
    let c = campaign(vec![product_target("prod-1", Some("var-1"))], vec![]);
    assert!(c.targets_variant("prod-1", Some("var-1"), &[]));
    assert!(!c.targets_variant("prod-1", Some("var-2"), &[]));
    // A caller without variant knowledge still matches the product.
    assert!(c.targets_variant("prod-1", None, &[]));
}

#[test]
fn collection_membership_is_sufficient() {
    let c = campaign(vec![], vec!["col-summer".to_owned()]);
    let memberships = vec!["col-other".to_owned(), "col-summer".to_owned()];
    assert!(c.targets_variant("prod-1", Some("var-1"), &memberships));
    assert!(!c.targets_variant("prod-1", Some("var-1"), &["col-other".to_owned()]));
}

#[test]
fn applicable_campaigns_honors_window_and_targets() {
    let now = Utc::now();

    let direct = campaign(vec![product_target("prod-1", None)], vec![]);
    let mut not_started = campaign(vec![product_target("prod-1", None)], vec![]);
    not_started.start_date = Some(now + Duration::seconds(1));
    let mut ended = campaign(vec![product_target("prod-1", None)], vec![]);
    ended.end_date = Some(now - Duration::seconds(1));
    let unrelated = campaign(vec![product_target("prod-9", None)], vec![]);
    let via_collection = campaign(vec![], vec!["col-1".to_owned()]);

    let campaigns = vec![
        direct.clone(),
        not_started,
        ended,
        unrelated,
        via_collection.clone(),
    ];
    let memberships = vec!["col-1".to_owned()];

    let applicable = applicable_campaigns(&campaigns, "prod-1", Some("var-1"), &memberships, now);
    let ids: Vec<Uuid> = applicable.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![direct.id, via_collection.id]);
}

#[test]
fn discount_type_parses_known_wire_names() {
    assert_eq!(
        "PERCENTAGE".parse::<DiscountType>().unwrap(),
        DiscountType::Percentage
    );
    assert_eq!("FIXED".parse::<DiscountType>().unwrap(), DiscountType::Fixed);
    assert_eq!(
        "FIXED_PRICE".parse::<DiscountType>().unwrap(),
        DiscountType::FixedPrice
    );
}

#[test]
fn discount_type_rejects_unknown_names() {
    let err = "BOGO".parse::<DiscountType>().unwrap_err();
    assert!(matches!(err, crate::CoreError::UnknownDiscountType(s) if s == "BOGO"));
}

#[test]
fn discount_type_serde_uses_screaming_snake_case() {
    let json = serde_json::to_string(&DiscountType::FixedPrice).unwrap();
    assert_eq!(json, "\"FIXED_PRICE\"");
    assert!(serde_json::from_str::<DiscountType>("\"BOGO\"").is_err());
}
