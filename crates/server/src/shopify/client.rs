//! Shopify Admin API client.
//!
//! Thin REST client with short-lived caches for product and variant
//! enrichment lookups. Webhook bursts for the same products would
//! otherwise hammer the Admin API rate limit.

use std::time::Duration;

use moka::future::Cache;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;

use packhouse_core::{ProductId, ShopifyOrderId, VariantId};

use crate::config::ShopifyConfig;

use super::ShopifyError;
use super::types::{
    OrderEnvelope, OrderPayload, ProductDetail, ProductEnvelope, VariantDetail, VariantEnvelope,
};

/// How long enrichment lookups stay cached.
const ENRICHMENT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Maximum entries per enrichment cache.
const ENRICHMENT_CACHE_CAPACITY: u64 = 10_000;

/// Remote product catalog operations used by the reconciliation engine.
///
/// Abstracted behind a trait so the engine can be exercised against a stub
/// catalog without network access.
#[async_trait::async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Fetch a full order snapshot. `Ok(None)` means the order does not
    /// exist upstream.
    async fn fetch_order(&self, id: ShopifyOrderId) -> Result<Option<OrderPayload>, ShopifyError>;

    /// Fetch true weight data for a variant.
    async fn variant_detail(&self, id: VariantId) -> Result<VariantDetail, ShopifyError>;

    /// Fetch display data for a product.
    async fn product_detail(&self, id: ProductId) -> Result<ProductDetail, ShopifyError>;

    /// Push a confirmed weight (in grams) to the variant matching `sku`.
    async fn update_variant_weight(&self, sku: &str, grams: Decimal) -> Result<(), ShopifyError>;
}

/// Client for the Shopify Admin REST and GraphQL APIs.
#[derive(Clone)]
pub struct ShopifyClient {
    http: reqwest::Client,
    base_url: String,
    variant_cache: Cache<i64, VariantDetail>,
    product_cache: Cache<i64, ProductDetail>,
}

impl ShopifyClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError` if the access token is not a valid header
    /// value or the HTTP client cannot be constructed.
    pub fn new(config: &ShopifyConfig) -> Result<Self, ShopifyError> {
        let mut headers = HeaderMap::new();
        let mut token = HeaderValue::from_str(config.access_token.expose_secret())
            .map_err(|e| ShopifyError::Parse(format!("invalid access token: {e}")))?;
        token.set_sensitive(true);
        headers.insert("X-Shopify-Access-Token", token);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        let base_url = format!(
            "https://{}/admin/api/{}",
            config.store, config.api_version
        );

        Ok(Self {
            http,
            base_url,
            variant_cache: Cache::builder()
                .max_capacity(ENRICHMENT_CACHE_CAPACITY)
                .time_to_live(ENRICHMENT_CACHE_TTL)
                .build(),
            product_cache: Cache::builder()
                .max_capacity(ENRICHMENT_CACHE_CAPACITY)
                .time_to_live(ENRICHMENT_CACHE_TTL)
                .build(),
        })
    }

    /// GET a REST resource and deserialize its envelope. `Ok(None)` on 404.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Option<T>, ShopifyError> {
        let url = format!("{}{path}", self.base_url);
        let response = self.http.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response).await?;
        let body = response.json::<T>().await?;
        Ok(Some(body))
    }

    /// Look up a variant's numeric ID by SKU through the GraphQL API.
    async fn variant_id_for_sku(&self, sku: &str) -> Result<i64, ShopifyError> {
        let url = format!("{}/graphql.json", self.base_url);
        // Escape quotes so a SKU can't break out of the search string.
        let escaped = sku.replace('\\', "\\\\").replace('"', "\\\"");
        let query = format!(
            "{{ productVariants(first: 1, query: \"sku:{escaped}\") \
             {{ edges {{ node {{ id sku }} }} }} }}"
        );
        let response = self
            .http
            .post(&url)
            .json(&json!({ "query": query }))
            .send()
            .await?;
        let response = check_status(response).await?;
        let body = response.json::<GraphQlResponse>().await?;

        // The search is a prefix match; require an exact SKU.
        let node = body
            .data
            .product_variants
            .edges
            .into_iter()
            .map(|e| e.node)
            .find(|n| n.sku.as_deref() == Some(sku))
            .ok_or_else(|| ShopifyError::VariantNotFound(sku.to_string()))?;

        parse_gid(&node.id)
            .ok_or_else(|| ShopifyError::Parse(format!("unexpected variant gid: {}", node.id)))
    }
}

#[async_trait::async_trait]
impl ProductCatalog for ShopifyClient {
    async fn fetch_order(&self, id: ShopifyOrderId) -> Result<Option<OrderPayload>, ShopifyError> {
        let envelope: Option<OrderEnvelope> = self.get_json(&format!("/orders/{id}.json")).await?;
        Ok(envelope.map(|e| e.order))
    }

    async fn variant_detail(&self, id: VariantId) -> Result<VariantDetail, ShopifyError> {
        if let Some(detail) = self.variant_cache.get(&id.as_i64()).await {
            return Ok(detail);
        }

        let envelope: VariantEnvelope = self
            .get_json(&format!("/variants/{id}.json"))
            .await?
            .ok_or_else(|| ShopifyError::VariantNotFound(id.to_string()))?;
        let detail = VariantDetail {
            weight: Decimal::from_f64_retain(envelope.variant.weight).unwrap_or_default(),
            weight_unit: envelope.variant.weight_unit.unwrap_or_else(|| "g".to_string()),
        };

        self.variant_cache.insert(id.as_i64(), detail.clone()).await;
        Ok(detail)
    }

    async fn product_detail(&self, id: ProductId) -> Result<ProductDetail, ShopifyError> {
        if let Some(detail) = self.product_cache.get(&id.as_i64()).await {
            return Ok(detail);
        }

        let envelope: ProductEnvelope = self
            .get_json(&format!("/products/{id}.json"))
            .await?
            .ok_or_else(|| ShopifyError::Api {
                status: 404,
                message: format!("product {id} not found"),
            })?;
        let product = envelope.product;
        let detail = ProductDetail {
            image_url: product.images.first().map(|i| i.src.clone()).unwrap_or_default(),
            handle: product.handle,
            product_type: product.product_type,
        };

        self.product_cache.insert(id.as_i64(), detail.clone()).await;
        Ok(detail)
    }

    async fn update_variant_weight(&self, sku: &str, grams: Decimal) -> Result<(), ShopifyError> {
        let variant_id = self.variant_id_for_sku(sku).await?;
        let url = format!("{}/variants/{variant_id}.json", self.base_url);
        let body = json!({
            "variant": {
                "id": variant_id,
                "weight": grams,
                "weight_unit": "g",
            }
        });
        let response = self.http.put(&url).json(&body).send().await?;
        check_status(response).await?;
        // The stale cached detail would mask the new weight.
        self.variant_cache.invalidate(&variant_id).await;
        Ok(())
    }
}

/// Turn a non-success response into `ShopifyError::Api`.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ShopifyError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(ShopifyError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Extract the numeric tail of a `gid://shopify/ProductVariant/123` ID.
fn parse_gid(gid: &str) -> Option<i64> {
    gid.rsplit('/').next()?.parse().ok()
}

// GraphQL response shapes for the SKU lookup.

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: ProductVariantsData,
}

#[derive(Debug, Deserialize)]
struct ProductVariantsData {
    #[serde(rename = "productVariants")]
    product_variants: VariantConnection,
}

#[derive(Debug, Default, Deserialize)]
struct VariantConnection {
    #[serde(default)]
    edges: Vec<VariantEdge>,
}

#[derive(Debug, Deserialize)]
struct VariantEdge {
    node: VariantNode,
}

#[derive(Debug, Deserialize)]
struct VariantNode {
    id: String,
    #[serde(default)]
    sku: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gid() {
        assert_eq!(
            parse_gid("gid://shopify/ProductVariant/447654529"),
            Some(447_654_529)
        );
        assert_eq!(parse_gid("not-a-gid"), None);
    }

    #[test]
    fn test_graphql_response_shape() {
        let json = r#"{
            "data": {
                "productVariants": {
                    "edges": [
                        {"node": {"id": "gid://shopify/ProductVariant/42", "sku": "ABC-1"}}
                    ]
                }
            }
        }"#;
        let response: GraphQlResponse = serde_json::from_str(json).expect("deserialize");
        let node = &response.data.product_variants.edges[0].node;
        assert_eq!(parse_gid(&node.id), Some(42));
        assert_eq!(node.sku.as_deref(), Some("ABC-1"));
    }
}
