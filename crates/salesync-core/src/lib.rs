pub mod app_config;
pub mod campaigns;
pub mod discount;
pub mod pricing;

pub use app_config::{
    load_app_config, load_app_config_from_env, AppConfig, ConfigError, Environment,
};
pub use campaigns::{applicable_campaigns, Campaign, DiscountType, ProductTarget};
pub use discount::discounted_price;
pub use pricing::{
    derive_base_price, needs_write, price_state, resolve_price, target_prices, CurrentPrices,
    LockSnapshot, PendingLock, PriceState, Resolution, TargetPrices, VariantContext,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown discount type: {0}")]
    UnknownDiscountType(String),
}
