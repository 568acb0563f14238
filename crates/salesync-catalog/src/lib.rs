pub mod client;
pub mod error;
pub mod pagination;
pub mod retry;
pub mod types;

pub use client::CatalogClient;
pub use error::CatalogError;
pub use types::{
    CatalogProduct, CatalogVariant, PriceUpdateError, ProductRef, VariantPriceUpdate,
};
