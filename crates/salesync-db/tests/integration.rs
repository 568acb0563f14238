//! Offline unit tests for salesync-db pool configuration and row types.
//! These tests do not require a live database connection.

use chrono::Utc;
use rust_decimal::Decimal;
use salesync_core::{AppConfig, Environment};
use salesync_db::{CampaignRow, LockedPriceRow, PoolConfig};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use uuid::Uuid;

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        catalog_request_timeout_secs: 30,
        catalog_user_agent: "ua".to_string(),
        catalog_token: None,
        catalog_page_limit: 250,
        catalog_inter_request_delay_ms: 250,
        catalog_max_retries: 3,
        catalog_retry_backoff_base_secs: 5,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

/// Compile-time smoke test: confirm that [`CampaignRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn campaign_row_has_expected_fields() {
    let row = CampaignRow {
        id: Uuid::new_v4(),
        shop: "demo.myshop.test".to_string(),
        name: "Winter clearance".to_string(),
        description: None,
        discount_type: "PERCENTAGE".to_string(),
        discount_value: Decimal::from(20),
        instock: false,
        tracking: true,
        active: true,
        start_date: None,
        end_date: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    assert_eq!(row.discount_type, "PERCENTAGE");
    assert!(row.active);
    assert!(row.start_date.is_none());
}

#[test]
fn locked_price_row_uses_empty_string_for_whole_product() {
    let row = LockedPriceRow {
        id: 1,
        shop: "demo.myshop.test".to_string(),
        campaign_id: Uuid::new_v4(),
        product_id: "prod-1".to_string(),
        variant_id: String::new(),
        base_price: Decimal::from(1000),
        locked_price: Decimal::from(300),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    assert!(row.variant_id.is_empty());
    assert!(row.locked_price < row.base_price);
}
