//! Durable store abstraction for reconciliation passes.
//!
//! The engine reads current rows, computes a plan, and hands the whole plan
//! back for application. Plan application is atomic: either every mutation
//! commits or none do, so a mid-plan write failure never leaves a
//! half-repaired order behind.

use async_trait::async_trait;

use packhouse_core::{FulfillmentStatus, LineItemRowId, ShopifyOrderId, TransferStatus};

use crate::db::RepositoryError;
use crate::models::{LineItem, NewLineItem, NewOrder, Order};

/// Planned mutations for one order, produced by the diff pass.
#[derive(Debug, Default)]
pub struct StorePlan {
    /// Rows to insert (new remote line items and increase fragments).
    pub inserts: Vec<NewLineItem>,
    /// Rows to shrink to a new, smaller quantity.
    pub shrinks: Vec<(LineItemRowId, i64)>,
    /// Rows to delete outright. Still-`transferring` transfer records
    /// referencing these rows are deleted with them.
    pub deletes: Vec<LineItemRowId>,
    /// Recomputed total active quantity for the order.
    pub total_quantity: i64,
    /// New mirrored fulfillment status, when the snapshot carries one.
    pub fulfillment_status: Option<FulfillmentStatus>,
    /// Set the order's edited flag (committed edit reconciled).
    pub mark_edited: bool,
}

/// Store operations a reconciliation pass needs.
#[async_trait]
pub trait FulfillmentStore: Send + Sync {
    /// Load an order by remote ID.
    async fn find_order(&self, id: ShopifyOrderId) -> Result<Option<Order>, RepositoryError>;

    /// Load all line item rows for an order.
    async fn line_items(&self, id: ShopifyOrderId) -> Result<Vec<LineItem>, RepositoryError>;

    /// Create an order with its initial line item rows, atomically.
    async fn create_order(
        &self,
        order: NewOrder,
        items: Vec<NewLineItem>,
    ) -> Result<(), RepositoryError>;

    /// Apply a full mutation plan to an order, atomically.
    async fn apply(&self, id: ShopifyOrderId, plan: StorePlan) -> Result<(), RepositoryError>;

    /// Purge an order and its line items. Transfer records still in the
    /// `transferring` stage go with them; records past that stage survive
    /// with their row reference cleared.
    async fn purge_order(&self, id: ShopifyOrderId) -> Result<(), RepositoryError>;
}

/// Postgres-backed [`FulfillmentStore`].
///
/// `create_order`, `apply` and `purge_order` each run in one transaction.
#[derive(Clone)]
pub struct PgStore {
    pool: sqlx::PgPool,
}

impl PgStore {
    /// Wrap a connection pool.
    #[must_use]
    pub const fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FulfillmentStore for PgStore {
    async fn find_order(&self, id: ShopifyOrderId) -> Result<Option<Order>, RepositoryError> {
        crate::db::OrderRepository::new(&self.pool).get(id).await
    }

    async fn line_items(&self, id: ShopifyOrderId) -> Result<Vec<LineItem>, RepositoryError> {
        crate::db::LineItemRepository::new(&self.pool)
            .list_for_order(id)
            .await
    }

    async fn create_order(
        &self,
        order: NewOrder,
        items: Vec<NewLineItem>,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO orders (shopify_order_id, order_number, name, fulfillment_status, \
             total_quantity, subtotal_price, created_at, \
             shipping_code, shipping_name, shipping_address1, shipping_address2, \
             shipping_city, shipping_province, shipping_zip, shipping_country) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
        )
        .bind(order.shopify_order_id)
        .bind(&order.order_number)
        .bind(&order.name)
        .bind(order.fulfillment_status.as_str())
        .bind(order.total_quantity)
        .bind(order.subtotal_price)
        .bind(order.created_at)
        .bind(&order.shipping.code)
        .bind(&order.shipping.name)
        .bind(&order.shipping.address1)
        .bind(&order.shipping.address2)
        .bind(&order.shipping.city)
        .bind(&order.shipping.province)
        .bind(&order.shipping.zip)
        .bind(&order.shipping.country)
        .execute(&mut *tx)
        .await?;

        for item in &items {
            insert_line_item(&mut tx, item).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn apply(&self, id: ShopifyOrderId, plan: StorePlan) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let deleted_ids: Vec<i64> = plan.deletes.iter().map(|d| d.as_i64()).collect();
        if !deleted_ids.is_empty() {
            sqlx::query(
                "DELETE FROM transfer_items \
                 WHERE line_item_row_id = ANY($1) AND status = $2",
            )
            .bind(&deleted_ids)
            .bind(TransferStatus::Transferring.as_str())
            .execute(&mut *tx)
            .await?;

            sqlx::query("DELETE FROM line_items WHERE id = ANY($1)")
                .bind(&deleted_ids)
                .execute(&mut *tx)
                .await?;
        }

        for (row_id, quantity) in &plan.shrinks {
            sqlx::query("UPDATE line_items SET quantity = $2, updated_at = now() WHERE id = $1")
                .bind(row_id)
                .bind(quantity)
                .execute(&mut *tx)
                .await?;
        }

        for item in &plan.inserts {
            insert_line_item(&mut tx, item).await?;
        }

        sqlx::query(
            "UPDATE orders SET total_quantity = $2, \
             fulfillment_status = COALESCE($3, fulfillment_status), \
             edited = edited OR $4, updated_at = now() \
             WHERE shopify_order_id = $1",
        )
        .bind(id)
        .bind(plan.total_quantity)
        .bind(plan.fulfillment_status.map(|s| s.as_str()))
        .bind(plan.mark_edited)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn purge_order(&self, id: ShopifyOrderId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM transfer_items WHERE shopify_order_id = $1 AND status = $2",
        )
        .bind(id)
        .bind(TransferStatus::Transferring.as_str())
        .execute(&mut *tx)
        .await?;

        // Line items cascade; surviving transfer records get a NULL row
        // reference from the FK.
        sqlx::query("DELETE FROM orders WHERE shopify_order_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

async fn insert_line_item(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    item: &NewLineItem,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO line_items (shopify_order_id, order_number, base_line_item_id, \
         quantity, title, name, brand, size, image_url, sku, url_handle, product_type, \
         variant_title, weight, weight_unit, weight_needs_confirmation, \
         pick_status, pack_status) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
         $17, $18)",
    )
    .bind(item.shopify_order_id)
    .bind(&item.order_number)
    .bind(item.base_line_item_id)
    .bind(item.quantity)
    .bind(&item.title)
    .bind(&item.name)
    .bind(&item.brand)
    .bind(&item.size)
    .bind(&item.image_url)
    .bind(&item.sku)
    .bind(&item.url_handle)
    .bind(&item.product_type)
    .bind(&item.variant_title)
    .bind(item.weight)
    .bind(&item.weight_unit)
    .bind(item.weight_needs_confirmation)
    .bind(item.pick_status.as_str())
    .bind(item.pack_status.as_str())
    .execute(&mut **tx)
    .await?;
    Ok(())
}
