//! Shopify Admin API integration.
//!
//! Inbound webhook payload types and the outbound Admin REST client the
//! reconciliation engine uses for order fetches and product/variant
//! enrichment.

pub mod client;
pub mod types;

pub use client::{ProductCatalog, ShopifyClient};

use thiserror::Error;

/// Errors that can occur when talking to the Shopify Admin API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// No variant matched the given SKU.
    #[error("variant not found for sku: {0}")]
    VariantNotFound(String),

    /// Failed to parse a response body.
    #[error("parse error: {0}")]
    Parse(String),
}
