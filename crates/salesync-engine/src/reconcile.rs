//! The reconciliation engine.
//!
//! A pass enumerates the products a campaign (or the whole shop) can have
//! touched, resolves every variant against the full campaign set, persists
//! fresh price locks, and writes back only the variants whose catalog state
//! actually changed — one bulk write per product. Failures are isolated per
//! product: they increment the error counter and the loop moves on.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use salesync_catalog::CatalogClient;
use salesync_core::{resolve_price, AppConfig, Campaign, LockSnapshot, Resolution, VariantContext};
use salesync_db::{self as db, LockedPriceRow};

use crate::error::EngineError;
use crate::plan::plan_product;

/// Pass-level tuning, lifted from [`AppConfig`].
#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    /// Page size for collection → product expansion.
    pub page_limit: u32,
    /// Delay between collection pages, in milliseconds.
    pub inter_request_delay_ms: u64,
}

impl EngineSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            page_limit: config.catalog_page_limit,
            inter_request_delay_ms: config.catalog_inter_request_delay_ms,
        }
    }
}

/// Aggregate result of one reconciliation pass.
///
/// No error is fatal to a pass; the counters are the whole story.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Variants whose price state was actually rewritten.
    pub updated_variants: u64,
    /// Products that failed to fetch or write, plus field-level write errors.
    pub errors: u64,
    /// Size of the deduplicated target product set.
    pub products_considered: u64,
}

/// Outcome of [`Engine::reconcile`]: a missing campaign is a distinguishable
/// no-op, not an error.
#[derive(Debug)]
pub enum ReconcileOutcome {
    Completed(ReconcileSummary),
    CampaignNotFound,
}

/// Ties the campaign store, lock store, and catalog client together.
pub struct Engine {
    pool: PgPool,
    catalog: CatalogClient,
    settings: EngineSettings,
}

impl Engine {
    #[must_use]
    pub fn new(pool: PgPool, catalog: CatalogClient, settings: EngineSettings) -> Self {
        Self {
            pool,
            catalog,
            settings,
        }
    }

    /// Builds an engine from application config, constructing the catalog
    /// client with the configured timeout, token, and retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Catalog`] if the HTTP client cannot be built.
    pub fn from_config(pool: PgPool, config: &AppConfig) -> Result<Self, EngineError> {
        let catalog = CatalogClient::new(
            config.catalog_request_timeout_secs,
            &config.catalog_user_agent,
            config.catalog_token.clone(),
            config.catalog_max_retries,
            config.catalog_retry_backoff_base_secs,
        )?;
        Ok(Self::new(pool, catalog, EngineSettings::from_app_config(config)))
    }

    /// Resolves the final price for one variant, loading the shop's campaign
    /// set and the variant's lock snapshot from the store.
    ///
    /// Pending locks in the returned resolution still need persisting via
    /// [`Engine::persist_lock`]; the full reconcile path does this itself.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Db`] on store failures.
    pub async fn resolve_final_price(
        &self,
        shop: &str,
        product_id: &str,
        variant_id: Option<&str>,
        base_price: Decimal,
        inventory_available: bool,
        collection_ids: &[String],
    ) -> Result<Resolution, EngineError> {
        let campaigns = db::load_campaigns_with_targets(&self.pool, shop).await?;
        let locks = db::lock_snapshot(&self.pool, product_id, variant_id).await?;
        Ok(resolve_price(
            &campaigns,
            &locks,
            &VariantContext {
                product_id,
                variant_id,
                base_price,
                inventory_available,
                collection_ids,
            },
            Utc::now(),
        ))
    }

    /// Persists a freshly computed lock for a tracking-disabled campaign.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Db`] if the upsert fails.
    pub async fn persist_lock(
        &self,
        shop: &str,
        campaign_id: Uuid,
        product_id: &str,
        variant_id: Option<&str>,
        base_price: Decimal,
        locked_price: Decimal,
    ) -> Result<LockedPriceRow, EngineError> {
        Ok(db::upsert_lock(
            &self.pool,
            shop,
            campaign_id,
            product_id,
            variant_id,
            base_price,
            locked_price,
        )
        .await?)
    }

    /// Runs a reconciliation pass.
    ///
    /// With a campaign id, the pass covers that campaign's target set — the
    /// campaign is loaded even when inactive, so deactivating or expiring a
    /// campaign restores its products. Without one, the pass covers every
    /// campaign's target set, collection-derived membership included.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Db`] or [`EngineError::Catalog`] only for
    /// failures before the per-product loop starts (campaign load, target
    /// enumeration); per-product failures are counted, never raised.
    pub async fn reconcile(
        &self,
        shop: &str,
        campaign_id: Option<Uuid>,
    ) -> Result<ReconcileOutcome, EngineError> {
        let campaigns = db::load_campaigns_with_targets(&self.pool, shop).await?;

        let product_ids = match campaign_id {
            Some(id) => {
                let Some(campaign) = db::load_campaign_with_targets(&self.pool, id).await? else {
                    tracing::info!(%id, "reconcile requested for unknown campaign");
                    return Ok(ReconcileOutcome::CampaignNotFound);
                };
                // A campaign id from another shop must not drive writes
                // against this shop's catalog.
                if !campaign_belongs_to_shop(&campaign, shop) {
                    tracing::info!(%id, shop, campaign_shop = %campaign.shop, "campaign belongs to a different shop");
                    return Ok(ReconcileOutcome::CampaignNotFound);
                }
                self.campaign_target_products(&campaign).await?
            }
            None => {
                let mut all = BTreeSet::new();
                for campaign in &campaigns {
                    all.extend(self.campaign_target_products(campaign).await?);
                }
                all
            }
        };

        tracing::info!(
            shop,
            campaign = ?campaign_id,
            products = product_ids.len(),
            "starting reconciliation pass"
        );
        let summary = self.process_products(shop, &campaigns, &product_ids).await;
        Ok(ReconcileOutcome::Completed(summary))
    }

    /// Reconciles one product, e.g. from a product-update or inventory
    /// webhook.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Db`] if the campaign set cannot be loaded.
    pub async fn reconcile_product(
        &self,
        shop: &str,
        product_id: &str,
    ) -> Result<ReconcileSummary, EngineError> {
        let mut product_ids = BTreeSet::new();
        product_ids.insert(product_id.to_owned());
        self.reconcile_products(shop, &product_ids).await
    }

    /// Reconciles an explicit product set against the shop's current
    /// campaigns. Used by the campaign-delete flow, which captures the
    /// target set before the row (and its locks) disappear.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Db`] if the campaign set cannot be loaded.
    pub async fn reconcile_products(
        &self,
        shop: &str,
        product_ids: &BTreeSet<String>,
    ) -> Result<ReconcileSummary, EngineError> {
        let campaigns = db::load_campaigns_with_targets(&self.pool, shop).await?;
        Ok(self.process_products(shop, &campaigns, product_ids).await)
    }

    /// Expands a campaign's target assignments into a deduplicated product
    /// set: direct products plus every product of every targeted collection.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Catalog`] if a collection expansion fails.
    pub async fn campaign_target_products(
        &self,
        campaign: &Campaign,
    ) -> Result<BTreeSet<String>, EngineError> {
        let mut product_ids: BTreeSet<String> = campaign
            .products
            .iter()
            .map(|target| target.product_id.clone())
            .collect();

        for collection_id in &campaign.collections {
            product_ids.extend(self.collection_products(&campaign.shop, collection_id).await?);
        }

        Ok(product_ids)
    }

    /// Lists a collection's product ids with the engine's paging settings.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Catalog`] if the catalog request fails.
    pub async fn collection_products(
        &self,
        shop: &str,
        collection_id: &str,
    ) -> Result<Vec<String>, EngineError> {
        Ok(self
            .catalog
            .collection_product_ids(
                shop,
                collection_id,
                self.settings.page_limit,
                self.settings.inter_request_delay_ms,
            )
            .await?)
    }

    /// The sequential per-product loop with failure isolation.
    async fn process_products(
        &self,
        shop: &str,
        campaigns: &[Campaign],
        product_ids: &BTreeSet<String>,
    ) -> ReconcileSummary {
        let now = Utc::now();
        let mut summary = ReconcileSummary {
            products_considered: product_ids.len() as u64,
            ..ReconcileSummary::default()
        };

        for product_id in product_ids {
            match self.process_product(shop, campaigns, product_id, now).await {
                Ok((updated, write_errors)) => {
                    summary.updated_variants += updated;
                    summary.errors += write_errors;
                }
                Err(err) => {
                    tracing::error!(shop, product_id, error = %err, "product reconciliation failed");
                    summary.errors += 1;
                }
            }
        }

        tracing::info!(
            shop,
            updated_variants = summary.updated_variants,
            errors = summary.errors,
            products_considered = summary.products_considered,
            "reconciliation pass finished"
        );
        summary
    }

    /// Fetches, resolves, locks, and writes one product.
    ///
    /// Returns (variants updated, field-level write errors).
    async fn process_product(
        &self,
        shop: &str,
        campaigns: &[Campaign],
        product_id: &str,
        now: chrono::DateTime<Utc>,
    ) -> Result<(u64, u64), EngineError> {
        let product = self.catalog.get_product(shop, product_id).await?;

        let mut locks_by_variant: HashMap<String, LockSnapshot> = HashMap::new();
        for variant in &product.variants {
            let snapshot =
                db::lock_snapshot(&self.pool, &product.id, Some(variant.id.as_str())).await?;
            if !snapshot.is_empty() {
                locks_by_variant.insert(variant.id.clone(), snapshot);
            }
        }

        let plan = plan_product(campaigns, &locks_by_variant, &product, now)?;

        // Persist locks first so the stored value always matches the price
        // that was actually chosen as a candidate.
        for lock in &plan.lock_writes {
            db::upsert_lock(
                &self.pool,
                shop,
                lock.campaign_id,
                &product.id,
                Some(lock.variant_id.as_str()),
                lock.base_price,
                lock.locked_price,
            )
            .await?;
        }

        if plan.writes.is_empty() {
            return Ok((0, 0));
        }

        let user_errors = self
            .catalog
            .update_variant_prices(shop, &product.id, &plan.writes)
            .await?;
        if user_errors.is_empty() {
            Ok((plan.writes.len() as u64, 0))
        } else {
            for user_error in &user_errors {
                tracing::error!(
                    shop,
                    product_id,
                    field = user_error.field.as_deref().unwrap_or("<unknown>"),
                    message = %user_error.message,
                    "catalog rejected a variant price write"
                );
            }
            Ok((0, user_errors.len() as u64))
        }
    }
}

/// Whether a campaign loaded by id may be reconciled under the given shop.
/// A mismatch means the caller referenced another shop's campaign; the pass
/// treats that like an unknown id rather than expanding targets against the
/// wrong catalog.
fn campaign_belongs_to_shop(campaign: &Campaign, shop: &str) -> bool {
    campaign.shop == shop
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use salesync_core::{Campaign, DiscountType};

    use super::campaign_belongs_to_shop;

    fn campaign_for_shop(shop: &str) -> Campaign {
        Campaign {
            id: Uuid::new_v4(),
            shop: shop.to_owned(),
            name: "test".to_owned(),
            discount_type: DiscountType::Percentage,
            discount_value: Decimal::from(10),
            instock: false,
            tracking: true,
            active: true,
            start_date: None,
            end_date: None,
            products: vec![],
            collections: vec![],
        }
    }

    #[test]
    fn campaign_from_another_shop_is_rejected() {
        let campaign = campaign_for_shop("shop-a.myshop.test");
        assert!(!campaign_belongs_to_shop(&campaign, "shop-b.myshop.test"));
    }

    #[test]
    fn campaign_from_same_shop_is_accepted() {
        let campaign = campaign_for_shop("shop-a.myshop.test");
        assert!(campaign_belongs_to_shop(&campaign, "shop-a.myshop.test"));
    }
}
