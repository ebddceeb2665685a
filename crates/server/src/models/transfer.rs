//! Transfer record domain model.
//!
//! Transfer records are a warehouse-only ledger. They denormalize display
//! data from the originating line item row because that row may be deleted
//! (by a Shopify-side decrease or a terminal purge) while the transfer is
//! still in flight.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use packhouse_core::{LineItemRowId, ShopifyOrderId, TransferItemId, TransferStatus};

use super::line_item::LineItem;

/// A transfer ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferItem {
    /// Local row ID.
    pub id: TransferItemId,
    /// Originating line item row; NULL once that row is gone.
    pub line_item_row_id: Option<LineItemRowId>,
    /// Order the transfer belongs to.
    pub shopify_order_id: ShopifyOrderId,
    /// Order number (denormalized).
    pub order_number: String,
    /// Quantity being transferred.
    pub quantity: i64,
    /// SKU (denormalized).
    pub sku: String,
    /// Product title (denormalized).
    pub title: String,
    /// Vendor/brand (denormalized).
    pub brand: String,
    /// Size property (denormalized).
    pub size: String,
    /// Product image URL (denormalized).
    pub image_url: String,
    /// Variant title (denormalized).
    pub variant_title: String,
    /// Source location code, set when dispatched.
    pub transfer_from: Option<String>,
    /// Estimated arrival month.
    pub estimate_month: Option<i32>,
    /// Estimated arrival day.
    pub estimate_day: Option<i32>,
    /// Lifecycle status.
    pub status: TransferStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to open a transfer record; status starts at
/// [`TransferStatus::Transferring`].
#[derive(Debug, Clone)]
pub struct NewTransferItem {
    /// Originating line item row, when it still exists.
    pub line_item_row_id: Option<LineItemRowId>,
    /// Order the transfer belongs to.
    pub shopify_order_id: ShopifyOrderId,
    /// Order number.
    pub order_number: String,
    /// Quantity being transferred.
    pub quantity: i64,
    /// SKU.
    pub sku: String,
    /// Product title.
    pub title: String,
    /// Vendor/brand.
    pub brand: String,
    /// Size property.
    pub size: String,
    /// Product image URL.
    pub image_url: String,
    /// Variant title.
    pub variant_title: String,
}

impl NewTransferItem {
    /// Open a transfer for `quantity` units of a line item row,
    /// denormalizing its display fields.
    #[must_use]
    pub fn for_line_item(item: &LineItem, quantity: i64) -> Self {
        Self {
            line_item_row_id: Some(item.id),
            shopify_order_id: item.shopify_order_id,
            order_number: item.order_number.clone(),
            quantity,
            sku: item.sku.clone(),
            title: item.title.clone(),
            brand: item.brand.clone(),
            size: item.size.clone(),
            image_url: item.image_url.clone(),
            variant_title: item.variant_title.clone(),
        }
    }
}

impl TransferItem {
    /// Build an insertable remainder of this record at `quantity`,
    /// preserving the denormalized display fields. Used by the transfer
    /// split flow; the remainder starts back at `transferring`.
    #[must_use]
    pub fn split_remainder(&self, quantity: i64) -> NewTransferItem {
        NewTransferItem {
            line_item_row_id: self.line_item_row_id,
            shopify_order_id: self.shopify_order_id,
            order_number: self.order_number.clone(),
            quantity,
            sku: self.sku.clone(),
            title: self.title.clone(),
            brand: self.brand.clone(),
            size: self.size.clone(),
            image_url: self.image_url.clone(),
            variant_title: self.variant_title.clone(),
        }
    }
}

/// Partial update for a transfer record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransferUpdate {
    /// New lifecycle status.
    pub status: Option<TransferStatus>,
    /// Source location code.
    pub transfer_from: Option<String>,
    /// Estimated arrival month.
    pub estimate_month: Option<i32>,
    /// Estimated arrival day.
    pub estimate_day: Option<i32>,
}

impl TransferUpdate {
    /// Whether the update carries no changes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.transfer_from.is_none()
            && self.estimate_month.is_none()
            && self.estimate_day.is_none()
    }
}
