//! Line item repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use packhouse_core::{
    BaseLineItemId, LineItemRowId, PackStatus, PickStatus, ShopifyOrderId,
};

use crate::models::{LineItem, NewLineItem};

use super::{RepositoryError, parse_status};

/// Database row for a line item, decoded before status parsing.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct LineItemRow {
    pub id: LineItemRowId,
    pub shopify_order_id: ShopifyOrderId,
    pub order_number: String,
    pub base_line_item_id: BaseLineItemId,
    pub quantity: i64,
    pub title: String,
    pub name: String,
    pub brand: String,
    pub size: String,
    pub image_url: String,
    pub sku: String,
    pub url_handle: String,
    pub product_type: String,
    pub variant_title: String,
    pub weight: Decimal,
    pub weight_unit: String,
    pub weight_needs_confirmation: bool,
    pub pick_status: String,
    pub pack_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<LineItemRow> for LineItem {
    type Error = RepositoryError;

    fn try_from(row: LineItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            shopify_order_id: row.shopify_order_id,
            order_number: row.order_number,
            base_line_item_id: row.base_line_item_id,
            quantity: row.quantity,
            title: row.title,
            name: row.name,
            brand: row.brand,
            size: row.size,
            image_url: row.image_url,
            sku: row.sku,
            url_handle: row.url_handle,
            product_type: row.product_type,
            variant_title: row.variant_title,
            weight: row.weight,
            weight_unit: row.weight_unit,
            weight_needs_confirmation: row.weight_needs_confirmation,
            pick_status: parse_status(&row.pick_status)?,
            pack_status: parse_status(&row.pack_status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const LINE_ITEM_COLUMNS: &str = "id, shopify_order_id, order_number, base_line_item_id, \
     quantity, title, name, brand, size, image_url, sku, url_handle, product_type, \
     variant_title, weight, weight_unit, weight_needs_confirmation, \
     pick_status, pack_status, created_at, updated_at";

/// A line item joined with the shipping code of its order, for the picker
/// list view.
#[derive(Debug, Clone)]
pub struct PickerItem {
    /// The line item row.
    pub item: LineItem,
    /// Order display name.
    pub order_name: String,
    /// Shipping rate code of the order.
    pub shipping_code: String,
}

#[derive(Debug, sqlx::FromRow)]
struct PickerItemRow {
    #[sqlx(flatten)]
    item: LineItemRow,
    order_name: String,
    shipping_code: String,
}

/// Repository for line item operations.
pub struct LineItemRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> LineItemRepository<'a> {
    /// Create a new repository backed by the given pool.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch a line item row by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` on database failure or corrupt status data.
    pub async fn get(&self, id: LineItemRowId) -> Result<Option<LineItem>, RepositoryError> {
        let sql = format!("SELECT {LINE_ITEM_COLUMNS} FROM line_items WHERE id = $1");
        let row = sqlx::query_as::<_, LineItemRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        row.map(LineItem::try_from).transpose()
    }

    /// List all line items for an order, oldest row first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` on database failure or corrupt status data.
    pub async fn list_for_order(
        &self,
        order_id: ShopifyOrderId,
    ) -> Result<Vec<LineItem>, RepositoryError> {
        let sql = format!(
            "SELECT {LINE_ITEM_COLUMNS} FROM line_items \
             WHERE shopify_order_id = $1 ORDER BY created_at, id"
        );
        let rows = sqlx::query_as::<_, LineItemRow>(&sql)
            .bind(order_id)
            .fetch_all(self.pool)
            .await?;
        rows.into_iter().map(LineItem::try_from).collect()
    }

    /// List every line item across live orders for the picker view,
    /// joined with its order's display name and shipping code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` on database failure or corrupt status data.
    pub async fn list_for_picker(&self) -> Result<Vec<PickerItem>, RepositoryError> {
        let sql = format!(
            "SELECT li.{}, o.name AS order_name, o.shipping_code \
             FROM line_items li \
             JOIN orders o ON o.shopify_order_id = li.shopify_order_id \
             ORDER BY o.created_at, li.id",
            LINE_ITEM_COLUMNS.replace(", ", ", li.")
        );
        let rows = sqlx::query_as::<_, PickerItemRow>(&sql)
            .fetch_all(self.pool)
            .await?;
        rows.into_iter()
            .map(|row| {
                Ok(PickerItem {
                    item: LineItem::try_from(row.item)?,
                    order_name: row.order_name,
                    shipping_code: row.shipping_code,
                })
            })
            .collect()
    }

    /// Insert a line item row, returning the stored row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` on database failure or corrupt status data.
    pub async fn insert(&self, item: &NewLineItem) -> Result<LineItem, RepositoryError> {
        let sql = format!(
            "INSERT INTO line_items (shopify_order_id, order_number, base_line_item_id, \
             quantity, title, name, brand, size, image_url, sku, url_handle, product_type, \
             variant_title, weight, weight_unit, weight_needs_confirmation, \
             pick_status, pack_status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
             $17, $18) \
             RETURNING {LINE_ITEM_COLUMNS}"
        );
        let row = sqlx::query_as::<_, LineItemRow>(&sql)
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
            .fetch_one(self.pool)
            .await?;
        LineItem::try_from(row)
    }

    /// Set the pick status of a row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the row does not exist.
    pub async fn set_pick_status(
        &self,
        id: LineItemRowId,
        status: PickStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE line_items SET pick_status = $2, updated_at = now() WHERE id = $1",
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

    /// Set the pack status of a row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the row does not exist.
    pub async fn set_pack_status(
        &self,
        id: LineItemRowId,
        status: PackStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE line_items SET pack_status = $2, updated_at = now() WHERE id = $1",
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

    /// Reduce a row's quantity during a picker split, leaving its statuses
    /// untouched. The split remainder is inserted separately.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the row does not exist.
    pub async fn set_quantity(
        &self,
        id: LineItemRowId,
        quantity: i64,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE line_items SET quantity = $2, updated_at = now() WHERE id = $1")
                .bind(id)
                .bind(quantity)
                .execute(self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Record a confirmed true weight on a row, normalizing to grams.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the row does not exist.
    pub async fn set_weight(
        &self,
        id: LineItemRowId,
        weight: Decimal,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE line_items SET weight = $2, weight_unit = 'g', \
             weight_needs_confirmation = FALSE, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(weight)
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
