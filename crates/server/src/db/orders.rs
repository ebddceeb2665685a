//! Order repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use packhouse_core::{OrderWorkflowStatus, ShopifyOrderId};

use crate::models::{Order, ShippingInfo};

use super::{RepositoryError, parse_status};

/// Database row for an order, decoded before status parsing.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct OrderRow {
    pub shopify_order_id: ShopifyOrderId,
    pub order_number: String,
    pub name: String,
    pub fulfillment_status: String,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub total_quantity: i64,
    pub subtotal_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub shipping_code: String,
    pub shipping_name: String,
    pub shipping_address1: String,
    pub shipping_address2: String,
    pub shipping_city: String,
    pub shipping_province: String,
    pub shipping_zip: String,
    pub shipping_country: String,
    pub status: String,
    pub box_type: Option<String>,
    pub weight: Option<String>,
    pub packer_note: Option<String>,
    pub edited: bool,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Self {
            shopify_order_id: row.shopify_order_id,
            order_number: row.order_number,
            name: row.name,
            fulfillment_status: parse_status(&row.fulfillment_status)?,
            cancelled_at: row.cancelled_at,
            total_quantity: row.total_quantity,
            subtotal_price: row.subtotal_price,
            created_at: row.created_at,
            shipping: ShippingInfo {
                code: row.shipping_code,
                name: row.shipping_name,
                address1: row.shipping_address1,
                address2: row.shipping_address2,
                city: row.shipping_city,
                province: row.shipping_province,
                zip: row.shipping_zip,
                country: row.shipping_country,
            },
            status: parse_status(&row.status)?,
            box_type: row.box_type,
            weight: row.weight,
            packer_note: row.packer_note,
            edited: row.edited,
            updated_at: row.updated_at,
        })
    }
}

const ORDER_COLUMNS: &str = "shopify_order_id, order_number, name, fulfillment_status, \
     cancelled_at, total_quantity, subtotal_price, created_at, \
     shipping_code, shipping_name, shipping_address1, shipping_address2, \
     shipping_city, shipping_province, shipping_zip, shipping_country, \
     status, box_type, weight, packer_note, edited, updated_at";

/// Repository for order operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new repository backed by the given pool.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch an order by its Shopify order ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` on database failure or corrupt status data.
    pub async fn get(&self, id: ShopifyOrderId) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE shopify_order_id = $1");
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        row.map(Order::try_from).transpose()
    }

    /// List all mirrored orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` on database failure or corrupt status data.
    pub async fn list(&self) -> Result<Vec<Order>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC");
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .fetch_all(self.pool)
            .await?;
        rows.into_iter().map(Order::try_from).collect()
    }

    /// Set the warehouse workflow status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn set_status(
        &self,
        id: ShopifyOrderId,
        status: OrderWorkflowStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders SET status = $2, updated_at = now() WHERE shopify_order_id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Set or clear the packer note. An empty note clears it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn set_packer_note(
        &self,
        id: ShopifyOrderId,
        note: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders SET packer_note = $2, updated_at = now() WHERE shopify_order_id = $1",
        )
        .bind(id)
        .bind(note)
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Record packing completion: box type and final packed weight.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn complete_packing(
        &self,
        id: ShopifyOrderId,
        box_type: &str,
        weight: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders SET box_type = $2, weight = $3, updated_at = now() \
             WHERE shopify_order_id = $1",
        )
        .bind(id)
        .bind(box_type)
        .bind(weight)
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete an order and, via cascade, its line item rows.
    ///
    /// Transfer records keep a nullable row reference and are not touched
    /// here; callers decide their fate separately.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` on database failure.
    pub async fn delete(&self, id: ShopifyOrderId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM orders WHERE shopify_order_id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
