//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::shopify::{ShopifyClient, ShopifyError};
use crate::sync::{PgStore, ReconciliationEngine};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; provides access to the database pool, the
/// Shopify client, and the reconciliation engine.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    pool: PgPool,
    shopify: ShopifyClient,
    engine: ReconciliationEngine<PgStore, ShopifyClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the Shopify client cannot be constructed.
    pub fn new(config: Config, pool: PgPool) -> Result<Self, ShopifyError> {
        let shopify = ShopifyClient::new(&config.shopify)?;
        let engine = ReconciliationEngine::new(PgStore::new(pool.clone()), shopify.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                shopify,
                engine,
            }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the Shopify Admin API client.
    #[must_use]
    pub fn shopify(&self) -> &ShopifyClient {
        &self.inner.shopify
    }

    /// Get a reference to the reconciliation engine.
    #[must_use]
    pub fn engine(&self) -> &ReconciliationEngine<PgStore, ShopifyClient> {
        &self.inner.engine
    }
}
