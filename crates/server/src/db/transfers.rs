//! Transfer record repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use packhouse_core::{LineItemRowId, ShopifyOrderId, TransferItemId, TransferStatus};

use crate::models::{NewTransferItem, TransferItem, TransferUpdate};

use super::{RepositoryError, parse_status};

/// Database row for a transfer record, decoded before status parsing.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct TransferRow {
    pub id: TransferItemId,
    pub line_item_row_id: Option<LineItemRowId>,
    pub shopify_order_id: ShopifyOrderId,
    pub order_number: String,
    pub quantity: i64,
    pub sku: String,
    pub title: String,
    pub brand: String,
    pub size: String,
    pub image_url: String,
    pub variant_title: String,
    pub transfer_from: Option<String>,
    pub estimate_month: Option<i32>,
    pub estimate_day: Option<i32>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<TransferRow> for TransferItem {
    type Error = RepositoryError;

    fn try_from(row: TransferRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            line_item_row_id: row.line_item_row_id,
            shopify_order_id: row.shopify_order_id,
            order_number: row.order_number,
            quantity: row.quantity,
            sku: row.sku,
            title: row.title,
            brand: row.brand,
            size: row.size,
            image_url: row.image_url,
            variant_title: row.variant_title,
            transfer_from: row.transfer_from,
            estimate_month: row.estimate_month,
            estimate_day: row.estimate_day,
            status: parse_status(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const TRANSFER_COLUMNS: &str = "id, line_item_row_id, shopify_order_id, order_number, \
     quantity, sku, title, brand, size, image_url, variant_title, \
     transfer_from, estimate_month, estimate_day, status, created_at, updated_at";

/// Repository for transfer record operations.
pub struct TransferRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TransferRepository<'a> {
    /// Create a new repository backed by the given pool.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch a transfer record by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` on database failure or corrupt status data.
    pub async fn get(&self, id: TransferItemId) -> Result<Option<TransferItem>, RepositoryError> {
        let sql = format!("SELECT {TRANSFER_COLUMNS} FROM transfer_items WHERE id = $1");
        let row = sqlx::query_as::<_, TransferRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        row.map(TransferItem::try_from).transpose()
    }

    /// List all transfer records, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` on database failure or corrupt status data.
    pub async fn list(&self) -> Result<Vec<TransferItem>, RepositoryError> {
        let sql = format!("SELECT {TRANSFER_COLUMNS} FROM transfer_items ORDER BY created_at, id");
        let rows = sqlx::query_as::<_, TransferRow>(&sql)
            .fetch_all(self.pool)
            .await?;
        rows.into_iter().map(TransferItem::try_from).collect()
    }

    /// List transfer records belonging to an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` on database failure or corrupt status data.
    pub async fn list_for_order(
        &self,
        order_id: ShopifyOrderId,
    ) -> Result<Vec<TransferItem>, RepositoryError> {
        let sql = format!(
            "SELECT {TRANSFER_COLUMNS} FROM transfer_items \
             WHERE shopify_order_id = $1 ORDER BY created_at, id"
        );
        let rows = sqlx::query_as::<_, TransferRow>(&sql)
            .bind(order_id)
            .fetch_all(self.pool)
            .await?;
        rows.into_iter().map(TransferItem::try_from).collect()
    }

    /// Open a new transfer record in the `transferring` stage, returning
    /// the stored row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` on database failure or corrupt status data.
    pub async fn insert(&self, item: &NewTransferItem) -> Result<TransferItem, RepositoryError> {
        let sql = format!(
            "INSERT INTO transfer_items (line_item_row_id, shopify_order_id, order_number, \
             quantity, sku, title, brand, size, image_url, variant_title) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {TRANSFER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, TransferRow>(&sql)
            .bind(item.line_item_row_id)
            .bind(item.shopify_order_id)
            .bind(&item.order_number)
            .bind(item.quantity)
            .bind(&item.sku)
            .bind(&item.title)
            .bind(&item.brand)
            .bind(&item.size)
            .bind(&item.image_url)
            .bind(&item.variant_title)
            .fetch_one(self.pool)
            .await?;
        TransferItem::try_from(row)
    }

    /// Apply a partial update to a transfer record, returning the updated
    /// row. Absent fields are left unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the record does not exist.
    pub async fn update(
        &self,
        id: TransferItemId,
        update: &TransferUpdate,
    ) -> Result<TransferItem, RepositoryError> {
        let sql = format!(
            "UPDATE transfer_items SET \
             status = COALESCE($2, status), \
             transfer_from = COALESCE($3, transfer_from), \
             estimate_month = COALESCE($4, estimate_month), \
             estimate_day = COALESCE($5, estimate_day), \
             updated_at = now() \
             WHERE id = $1 \
             RETURNING {TRANSFER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, TransferRow>(&sql)
            .bind(id)
            .bind(update.status.map(|s| s.as_str()))
            .bind(update.transfer_from.as_deref())
            .bind(update.estimate_month)
            .bind(update.estimate_day)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        TransferItem::try_from(row)
    }

    /// Reduce a record's quantity during a transfer split. The split
    /// remainder is inserted separately.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the record does not exist.
    pub async fn set_quantity(
        &self,
        id: TransferItemId,
        quantity: i64,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE transfer_items SET quantity = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(quantity)
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete a batch of transfer records, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` on database failure.
    pub async fn delete_many(&self, ids: &[TransferItemId]) -> Result<u64, RepositoryError> {
        let raw: Vec<i64> = ids.iter().map(|id| id.as_i64()).collect();
        let result = sqlx::query("DELETE FROM transfer_items WHERE id = ANY($1)")
            .bind(&raw)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete every transfer record of an order, regardless of stage. Used
    /// by the packer's hard delete, where the whole warehouse workflow for
    /// the order is being discarded.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` on database failure.
    pub async fn delete_for_order(
        &self,
        order_id: ShopifyOrderId,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM transfer_items WHERE shopify_order_id = $1")
            .bind(order_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete still-`transferring` records tied to a line item row. Used
    /// when the picker finds the stock after all, making the transfer moot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` on database failure.
    pub async fn delete_transferring_for_row(
        &self,
        row_id: LineItemRowId,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM transfer_items WHERE line_item_row_id = $1 AND status = $2",
        )
        .bind(row_id)
        .bind(TransferStatus::Transferring.as_str())
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
