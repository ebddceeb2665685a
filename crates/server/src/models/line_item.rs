//! Line item domain model.
//!
//! A line item row is either a 1:1 mirror of a remote line item or a split
//! descendant sharing its `base_line_item_id`. The sum of quantities across
//! all rows with the same base ID is the locally known active quantity for
//! that remote line item.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use packhouse_core::{BaseLineItemId, LineItemRowId, PackStatus, PickStatus, ShopifyOrderId};

/// A single line item row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    /// Local row ID.
    pub id: LineItemRowId,
    /// Order this row belongs to.
    pub shopify_order_id: ShopifyOrderId,
    /// Order number (denormalized for list views).
    pub order_number: String,
    /// Remote line item identity shared by all split descendants.
    pub base_line_item_id: BaseLineItemId,
    /// Quantity held by this row; always > 0 for a live row.
    pub quantity: i64,
    /// Product title.
    pub title: String,
    /// Full line item name (title + variant).
    pub name: String,
    /// Vendor/brand.
    pub brand: String,
    /// Size property, when present.
    pub size: String,
    /// Product image URL.
    pub image_url: String,
    /// SKU.
    pub sku: String,
    /// Product URL handle.
    pub url_handle: String,
    /// Canonical product type.
    pub product_type: String,
    /// Variant title.
    pub variant_title: String,
    /// True weight from the variant, in `weight_unit`.
    pub weight: Decimal,
    /// Weight unit; `g` is canonical.
    pub weight_unit: String,
    /// Set when weight is zero or the unit is not canonical.
    pub weight_needs_confirmation: bool,
    /// Pick-stage status (independent of pack status).
    pub pick_status: PickStatus,
    /// Pack-stage status (independent of pick status).
    pub pack_status: PackStatus,
    /// Row creation time; split descendants order newest-first on this.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to insert a line item row.
#[derive(Debug, Clone)]
pub struct NewLineItem {
    /// Order this row belongs to.
    pub shopify_order_id: ShopifyOrderId,
    /// Order number.
    pub order_number: String,
    /// Remote line item identity.
    pub base_line_item_id: BaseLineItemId,
    /// Quantity; must be > 0.
    pub quantity: i64,
    /// Product title.
    pub title: String,
    /// Full line item name.
    pub name: String,
    /// Vendor/brand.
    pub brand: String,
    /// Size property.
    pub size: String,
    /// Product image URL.
    pub image_url: String,
    /// SKU.
    pub sku: String,
    /// Product URL handle.
    pub url_handle: String,
    /// Canonical product type.
    pub product_type: String,
    /// Variant title.
    pub variant_title: String,
    /// True weight from the variant.
    pub weight: Decimal,
    /// Weight unit.
    pub weight_unit: String,
    /// Weight confirmation flag.
    pub weight_needs_confirmation: bool,
    /// Initial pick status.
    pub pick_status: PickStatus,
    /// Initial pack status.
    pub pack_status: PackStatus,
}

impl LineItem {
    /// Build an insertable copy of this row with a different quantity and
    /// pick status, preserving display metadata. Used by the picker split
    /// flow.
    #[must_use]
    pub fn split_fragment(&self, quantity: i64, pick_status: PickStatus) -> NewLineItem {
        NewLineItem {
            shopify_order_id: self.shopify_order_id,
            order_number: self.order_number.clone(),
            base_line_item_id: self.base_line_item_id,
            quantity,
            title: self.title.clone(),
            name: self.name.clone(),
            brand: self.brand.clone(),
            size: self.size.clone(),
            image_url: self.image_url.clone(),
            sku: self.sku.clone(),
            url_handle: self.url_handle.clone(),
            product_type: self.product_type.clone(),
            variant_title: self.variant_title.clone(),
            weight: self.weight,
            weight_unit: self.weight_unit.clone(),
            weight_needs_confirmation: self.weight_needs_confirmation,
            pick_status,
            pack_status: PackStatus::Packing,
        }
    }
}
