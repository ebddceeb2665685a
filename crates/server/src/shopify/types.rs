//! Shopify webhook payload and Admin REST response types.
//!
//! These mirror the Admin REST shapes delivered by order webhooks. Fields
//! the reconciliation engine does not read are simply not modeled; optional
//! upstream fields default rather than failing deserialization, because a
//! rejected webhook is redelivered with the same body.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use packhouse_core::{
    BaseLineItemId, FulfillmentStatus, ProductId, ShopifyOrderId, VariantId,
};

use crate::models::ShippingInfo;

/// A full order snapshot as delivered by `orders/*` webhooks or fetched
/// from `GET /orders/{id}.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderPayload {
    /// Remote order ID.
    pub id: ShopifyOrderId,
    /// Order number.
    pub order_number: i64,
    /// Display name (e.g. "#1001").
    pub name: String,
    /// Raw fulfillment status; `null` means unfulfilled.
    #[serde(default)]
    pub fulfillment_status: Option<String>,
    /// Cancellation timestamp, when cancelled.
    #[serde(default)]
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Subtotal price (decimal string in REST).
    #[serde(default)]
    pub subtotal_price: Decimal,
    /// Order creation time.
    pub created_at: DateTime<Utc>,
    /// Shipping lines; only the first code is mirrored.
    #[serde(default)]
    pub shipping_lines: Vec<ShippingLinePayload>,
    /// Shipping address.
    #[serde(default)]
    pub shipping_address: Option<AddressPayload>,
    /// Line items.
    #[serde(default)]
    pub line_items: Vec<LineItemPayload>,
    /// Refunds already applied to this order.
    #[serde(default)]
    pub refunds: Vec<RefundPayload>,
}

impl OrderPayload {
    /// Parsed fulfillment status; unknown strings degrade to partial so a
    /// new upstream value never reads as "nothing fulfilled".
    #[must_use]
    pub fn fulfillment_status(&self) -> FulfillmentStatus {
        match self.fulfillment_status.as_deref() {
            None => FulfillmentStatus::Unfulfilled,
            Some("fulfilled") => FulfillmentStatus::Fulfilled,
            Some("partial") => FulfillmentStatus::Partial,
            Some(other) => {
                tracing::warn!(status = other, "unknown fulfillment status in payload");
                FulfillmentStatus::Partial
            }
        }
    }

    /// Flatten shipping lines and address into the mirrored shipping info.
    #[must_use]
    pub fn shipping_info(&self) -> ShippingInfo {
        let address = self.shipping_address.clone().unwrap_or_default();
        ShippingInfo {
            code: self
                .shipping_lines
                .first()
                .map(|l| l.code.clone().unwrap_or_default())
                .unwrap_or_default(),
            name: address.name.unwrap_or_default(),
            address1: address.address1.unwrap_or_default(),
            address2: address.address2.unwrap_or_default(),
            city: address.city.unwrap_or_default(),
            province: address.province.unwrap_or_default(),
            zip: address.zip.unwrap_or_default(),
            country: address.country.unwrap_or_default(),
        }
    }
}

/// A shipping line on an order payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShippingLinePayload {
    /// Shipping rate code.
    #[serde(default)]
    pub code: Option<String>,
}

/// A shipping address on an order payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address1: Option<String>,
    #[serde(default)]
    pub address2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// A remote line item on an order payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LineItemPayload {
    /// Remote line item ID; the base identity for local split rows.
    pub id: BaseLineItemId,
    /// Ordered quantity (before refund folding).
    pub quantity: i64,
    /// SKU.
    #[serde(default)]
    pub sku: Option<String>,
    /// Product title.
    #[serde(default)]
    pub title: String,
    /// Full name (title + variant).
    #[serde(default)]
    pub name: String,
    /// Vendor/brand.
    #[serde(default)]
    pub vendor: String,
    /// Variant ID, absent for custom items.
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    /// Product ID, absent for custom items.
    #[serde(default)]
    pub product_id: Option<ProductId>,
    /// Weight in grams as reported on the order.
    #[serde(default)]
    pub grams: i64,
    /// Variant title.
    #[serde(default)]
    pub variant_title: Option<String>,
    /// Product type as reported on the order.
    #[serde(default)]
    pub product_type: Option<String>,
    /// Custom line item properties.
    #[serde(default)]
    pub properties: Vec<PropertyPayload>,
}

impl LineItemPayload {
    /// The `Size` custom property, when present and a string.
    #[must_use]
    pub fn size_property(&self) -> String {
        self.properties
            .iter()
            .find(|p| p.name == "Size")
            .and_then(|p| p.value.as_ref())
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string()
    }
}

/// A custom property on a line item.
#[derive(Debug, Clone, Deserialize)]
pub struct PropertyPayload {
    /// Property name.
    pub name: String,
    /// Property value; Shopify allows non-string values here.
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

/// A refund entry embedded in an order payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefundPayload {
    /// Line items covered by this refund.
    #[serde(default)]
    pub refund_line_items: Vec<RefundLineItemPayload>,
}

/// One refunded line item.
#[derive(Debug, Clone, Deserialize)]
pub struct RefundLineItemPayload {
    /// Remote line item the refund applies to.
    pub line_item_id: BaseLineItemId,
    /// Refunded quantity.
    pub quantity: i64,
    /// The remote line item as embedded in `refunds/create` bodies. Its
    /// ordered quantity is what makes replaying a refund a no-op.
    #[serde(default)]
    pub line_item: Option<RefundedLineItemPayload>,
}

/// The line item object embedded in a refund entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RefundedLineItemPayload {
    /// Ordered quantity at refund time.
    pub quantity: i64,
}

/// A standalone `refunds/create` webhook body.
#[derive(Debug, Clone, Deserialize)]
pub struct RefundNotice {
    /// Order the refund belongs to.
    pub order_id: ShopifyOrderId,
    /// Refunded line items.
    #[serde(default)]
    pub refund_line_items: Vec<RefundLineItemPayload>,
}

/// An `order_edits/complete`-style notification.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderEditNotice {
    /// Order the edit applies to; its absence is an invalid notification.
    #[serde(default)]
    pub order_id: Option<ShopifyOrderId>,
    /// When the edit was committed; an uncommitted edit is a no-op.
    #[serde(default)]
    pub committed_at: Option<DateTime<Utc>>,
}

/// True variant data fetched for enrichment.
#[derive(Debug, Clone)]
pub struct VariantDetail {
    /// Variant weight in `weight_unit`.
    pub weight: Decimal,
    /// Weight unit; `g` is canonical.
    pub weight_unit: String,
}

/// Product data fetched for enrichment.
#[derive(Debug, Clone, Default)]
pub struct ProductDetail {
    /// First product image URL.
    pub image_url: String,
    /// Product URL handle.
    pub handle: String,
    /// Canonical product type.
    pub product_type: String,
}

// REST response envelopes.

#[derive(Debug, Deserialize)]
pub(crate) struct OrderEnvelope {
    pub order: OrderPayload,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductEnvelope {
    pub product: ProductBody,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ProductBody {
    #[serde(default)]
    pub images: Vec<ImageBody>,
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub product_type: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ImageBody {
    #[serde(default)]
    pub src: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VariantEnvelope {
    pub variant: VariantBody,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct VariantBody {
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub weight_unit: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_payload_minimal() {
        let json = r##"{
            "id": 820982911946154500,
            "order_number": 1234,
            "name": "#1234",
            "created_at": "2026-01-09T10:00:00-05:00",
            "line_items": [
                {"id": 100, "quantity": 3, "title": "Tee", "vendor": "Acme",
                 "grams": 200, "properties": [{"name": "Size", "value": "M"}]}
            ]
        }"##;
        let payload: OrderPayload = serde_json::from_str(json).expect("deserialize");
        assert_eq!(payload.fulfillment_status(), FulfillmentStatus::Unfulfilled);
        assert!(payload.cancelled_at.is_none());
        assert_eq!(payload.line_items.len(), 1);
        let item = payload.line_items.first().expect("one item");
        assert_eq!(item.size_property(), "M");
        assert_eq!(item.grams, 200);
    }

    #[test]
    fn test_fulfillment_status_mapping() {
        let mut payload: OrderPayload = serde_json::from_str(
            r##"{"id": 1, "order_number": 1, "name": "#1",
                "created_at": "2026-01-09T10:00:00Z"}"##,
        )
        .expect("deserialize");
        assert_eq!(payload.fulfillment_status(), FulfillmentStatus::Unfulfilled);

        payload.fulfillment_status = Some("fulfilled".into());
        assert_eq!(payload.fulfillment_status(), FulfillmentStatus::Fulfilled);

        payload.fulfillment_status = Some("restocked".into());
        assert_eq!(payload.fulfillment_status(), FulfillmentStatus::Partial);
    }

    #[test]
    fn test_non_string_property_value_tolerated() {
        let json = r#"{"id": 100, "quantity": 1,
                       "properties": [{"name": "Size", "value": 42}]}"#;
        let item: LineItemPayload = serde_json::from_str(json).expect("deserialize");
        assert_eq!(item.size_property(), "");
    }

    #[test]
    fn test_edit_notice_missing_fields() {
        let notice: OrderEditNotice = serde_json::from_str("{}").expect("deserialize");
        assert!(notice.order_id.is_none());
        assert!(notice.committed_at.is_none());
    }
}
