use std::time::Duration;

use reqwest::Client;

use crate::error::CatalogError;
use crate::pagination::extract_next_cursor;
use crate::retry::retry_with_backoff;
use crate::types::{
    CatalogProduct, CollectionProductsPage, PriceUpdateError, ProductEnvelope,
    VariantPriceUpdate, VariantUpdateEnvelope, VariantUpdateResponse,
};

/// Maximum number of collection pages to fetch before returning an error.
/// Prevents infinite loops on cycling cursors.
const MAX_PAGES: usize = 200;

/// HTTP client for the catalog admin API.
///
/// Covers the three calls the reconciliation engine needs: product read
/// (variants + collection memberships), collection → product-id expansion
/// with cursor pagination, and the bulk variant price write. Rate limiting
/// (429) and network failures are retried with exponential backoff; other
/// non-2xx statuses are typed errors.
pub struct CatalogClient {
    client: Client,
    /// Bearer token for the admin API, when the catalog requires one.
    token: Option<String>,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl CatalogClient {
    /// Creates a `CatalogClient` with configured timeout, `User-Agent`, and
    /// retry policy.
    ///
    /// `max_retries` is the number of additional attempts after the first
    /// failure for retriable errors; `0` disables retries.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        token: Option<String>,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            token,
            max_retries,
            backoff_base_secs,
        })
    }

    /// Fetches a product with its variants and collection memberships.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::NotFound`] — the product does not exist (not retried).
    /// - [`CatalogError::RateLimited`] — HTTP 429 after all retries exhausted.
    /// - [`CatalogError::UnexpectedStatus`] — any other non-2xx status.
    /// - [`CatalogError::Http`] — network failure after all retries exhausted.
    /// - [`CatalogError::Deserialize`] — response body does not match the
    ///   expected shape.
    pub async fn get_product(
        &self,
        shop: &str,
        product_id: &str,
    ) -> Result<CatalogProduct, CatalogError> {
        let origin = shop_origin(shop)?;
        let url = format!("{origin}/admin/products/{product_id}.json");

        let (body, _) = self.get_with_retry(&url, shop).await?;
        let envelope: ProductEnvelope =
            serde_json::from_str(&body).map_err(|e| CatalogError::Deserialize {
                context: format!("product {product_id} from {shop}"),
                source: e,
            })?;
        Ok(envelope.product)
    }

    /// Fetches one page of a collection's products.
    ///
    /// Returns the parsed page and the next-page cursor extracted from the
    /// `Link` response header, if any.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`Self::get_product`].
    pub async fn fetch_collection_page(
        &self,
        shop: &str,
        collection_id: &str,
        limit: u32,
        page_info: Option<&str>,
    ) -> Result<(CollectionProductsPage, Option<String>), CatalogError> {
        let url = collection_products_url(shop, collection_id, limit, page_info)?;

        let (body, link_header) = self.get_with_retry(&url, shop).await?;
        let page: CollectionProductsPage =
            serde_json::from_str(&body).map_err(|e| CatalogError::Deserialize {
                context: format!("collection {collection_id} page from {shop}"),
                source: e,
            })?;
        Ok((page, extract_next_cursor(link_header.as_deref())))
    }

    /// Fetches every product id in a collection by following page cursors.
    ///
    /// `inter_request_delay_ms` is applied between pages (not before the
    /// first one).
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Self::fetch_collection_page`]; returns
    /// [`CatalogError::PaginationLimit`] after [`MAX_PAGES`] pages.
    pub async fn collection_product_ids(
        &self,
        shop: &str,
        collection_id: &str,
        limit: u32,
        inter_request_delay_ms: u64,
    ) -> Result<Vec<String>, CatalogError> {
        let mut product_ids: Vec<String> = Vec::new();
        let mut cursor: Option<String> = None;
        let mut page_count = 0usize;

        loop {
            page_count += 1;
            if page_count > MAX_PAGES {
                return Err(CatalogError::PaginationLimit {
                    collection_id: collection_id.to_owned(),
                    max_pages: MAX_PAGES,
                });
            }

            if page_count > 1 && inter_request_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(inter_request_delay_ms)).await;
            }

            let (page, next) = self
                .fetch_collection_page(shop, collection_id, limit, cursor.as_deref())
                .await?;
            product_ids.extend(page.products.into_iter().map(|p| p.id));

            cursor = next;
            if cursor.is_none() {
                break;
            }
        }

        Ok(product_ids)
    }

    /// Writes new prices for several variants of one product in a single
    /// call.
    ///
    /// Returns the per-field errors the catalog reported; an empty vec means
    /// every variant was accepted. Partial failures are not retried — the
    /// caller counts them.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`Self::get_product`].
    pub async fn update_variant_prices(
        &self,
        shop: &str,
        product_id: &str,
        updates: &[VariantPriceUpdate],
    ) -> Result<Vec<PriceUpdateError>, CatalogError> {
        let origin = shop_origin(shop)?;
        let url = format!("{origin}/admin/products/{product_id}/variants.json");
        let payload =
            serde_json::to_string(&VariantUpdateEnvelope { variants: updates }).map_err(|e| {
                CatalogError::Deserialize {
                    context: format!("variant update payload for {product_id}"),
                    source: e,
                }
            })?;

        let max_retries = self.max_retries;
        let backoff_base_secs = self.backoff_base_secs;

        retry_with_backoff(max_retries, backoff_base_secs, || {
            let url = url.clone();
            let payload = payload.clone();
            async move {
                let mut request = self
                    .client
                    .put(&url)
                    .header(reqwest::header::CONTENT_TYPE, "application/json")
                    .body(payload);
                if let Some(token) = &self.token {
                    request = request.bearer_auth(token);
                }

                let response = request.send().await?;
                let status = response.status();
                check_status(status, &url, shop, &response)?;

                let body = response.text().await?;
                let parsed: VariantUpdateResponse =
                    serde_json::from_str(&body).map_err(|e| CatalogError::Deserialize {
                        context: format!("variant update response for {url}"),
                        source: e,
                    })?;
                Ok(parsed.user_errors)
            }
        })
        .await
    }

    /// Issues a GET with retry, returning the body and the raw `Link` header.
    async fn get_with_retry(
        &self,
        url: &str,
        shop: &str,
    ) -> Result<(String, Option<String>), CatalogError> {
        let max_retries = self.max_retries;
        let backoff_base_secs = self.backoff_base_secs;

        retry_with_backoff(max_retries, backoff_base_secs, || {
            let url = url.to_owned();
            async move {
                let mut request = self.client.get(&url);
                if let Some(token) = &self.token {
                    request = request.bearer_auth(token);
                }

                let response = request.send().await?;
                let status = response.status();
                check_status(status, &url, shop, &response)?;

                let link_header = response
                    .headers()
                    .get(reqwest::header::LINK)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_owned);

                let body = response.text().await?;
                Ok((body, link_header))
            }
        })
        .await
    }
}

/// Maps non-2xx statuses to typed errors; 2xx passes through.
fn check_status(
    status: reqwest::StatusCode,
    url: &str,
    shop: &str,
    response: &reqwest::Response,
) -> Result<(), CatalogError> {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(60);
        return Err(CatalogError::RateLimited {
            host: extract_host(shop),
            retry_after_secs,
        });
    }
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(CatalogError::NotFound {
            url: url.to_owned(),
        });
    }
    if !status.is_success() {
        return Err(CatalogError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_owned(),
        });
    }
    Ok(())
}

/// Resolves the scheme+host origin to call for a shop.
///
/// A bare domain (the usual case) gets `https://`; a value that already
/// carries a scheme is reduced to its origin, which lets tests point the
/// client at a local mock server.
pub(crate) fn shop_origin(shop: &str) -> Result<String, CatalogError> {
    let candidate = if shop.contains("://") {
        shop.to_owned()
    } else {
        format!("https://{shop}")
    };

    let url = reqwest::Url::parse(&candidate).map_err(|e| CatalogError::InvalidShop {
        shop: shop.to_owned(),
        reason: e.to_string(),
    })?;
    if url.host_str().is_none() {
        return Err(CatalogError::InvalidShop {
            shop: shop.to_owned(),
            reason: "no host".to_owned(),
        });
    }
    Ok(url.origin().ascii_serialization())
}

/// Builds the collection-products URL with page size and optional cursor.
///
/// The cursor is URL-encoded via `reqwest::Url` to avoid injecting unescaped
/// characters.
pub(crate) fn collection_products_url(
    shop: &str,
    collection_id: &str,
    limit: u32,
    page_info: Option<&str>,
) -> Result<String, CatalogError> {
    let origin = shop_origin(shop)?;
    let base = format!("{origin}/admin/collections/{collection_id}/products.json");

    let mut url = reqwest::Url::parse(&base).map_err(|e| CatalogError::InvalidShop {
        shop: shop.to_owned(),
        reason: e.to_string(),
    })?;
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("limit", &limit.to_string());
        if let Some(cursor) = page_info {
            pairs.append_pair("page_info", cursor);
        }
    }
    Ok(url.to_string())
}

/// Extracts the hostname from a shop value for error messages.
fn extract_host(shop: &str) -> String {
    let without_scheme = shop
        .split_once("://")
        .map_or(shop, |(_, rest)| rest);
    without_scheme
        .split('/')
        .next()
        .unwrap_or(shop)
        .to_owned()
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
