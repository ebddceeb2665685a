//! Order domain model and workflow status derivation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use packhouse_core::{FulfillmentStatus, OrderWorkflowStatus, ShopifyOrderId, TransferStatus};

use super::line_item::LineItem;
use super::transfer::TransferItem;

/// Maximum length of a packer note.
pub const MAX_PACKER_NOTE_LEN: usize = 50;

/// Shipping metadata mirrored from the order snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShippingInfo {
    /// Shipping rate code (first shipping line).
    pub code: String,
    /// Recipient name.
    pub name: String,
    /// Address line 1.
    pub address1: String,
    /// Address line 2.
    pub address2: String,
    /// City.
    pub city: String,
    /// Province or state.
    pub province: String,
    /// Postal code.
    pub zip: String,
    /// Country.
    pub country: String,
}

/// A locally mirrored order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Remote Shopify order ID (primary key).
    pub shopify_order_id: ShopifyOrderId,
    /// Order number (e.g. "1001").
    pub order_number: String,
    /// Display name (e.g. "#1001").
    pub name: String,
    /// Fulfillment status mirrored from Shopify.
    pub fulfillment_status: FulfillmentStatus,
    /// Cancellation timestamp, if cancelled upstream.
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Sum of all live line item quantities (derived on reconciliation).
    pub total_quantity: i64,
    /// Subtotal price.
    pub subtotal_price: Decimal,
    /// Order creation time at Shopify.
    pub created_at: DateTime<Utc>,
    /// Shipping metadata.
    pub shipping: ShippingInfo,
    /// Warehouse workflow status.
    pub status: OrderWorkflowStatus,
    /// Assigned box type.
    pub box_type: Option<String>,
    /// Recorded packed weight.
    pub weight: Option<String>,
    /// Free-text packer note (≤ [`MAX_PACKER_NOTE_LEN`] chars).
    pub packer_note: Option<String>,
    /// Set once any committed Shopify edit has been reconciled.
    pub edited: bool,
    /// Last local update time.
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to create a new order row.
#[derive(Debug, Clone)]
pub struct NewOrder {
    /// Remote Shopify order ID.
    pub shopify_order_id: ShopifyOrderId,
    /// Order number.
    pub order_number: String,
    /// Display name.
    pub name: String,
    /// Fulfillment status from the snapshot.
    pub fulfillment_status: FulfillmentStatus,
    /// Total active quantity at creation.
    pub total_quantity: i64,
    /// Subtotal price.
    pub subtotal_price: Decimal,
    /// Order creation time at Shopify.
    pub created_at: DateTime<Utc>,
    /// Shipping metadata.
    pub shipping: ShippingInfo,
}

/// Derive the packer-facing workflow status of an order.
///
/// Staff holds win over everything; any live transfer puts the order in
/// `waiting`; an order whose every row is pack-ready is `ready`; otherwise
/// it is still `packing`.
#[must_use]
pub fn derive_workflow_status(
    order: &Order,
    line_items: &[LineItem],
    transfers: &[TransferItem],
) -> OrderWorkflowStatus {
    if order.status == OrderWorkflowStatus::Holding {
        return OrderWorkflowStatus::Holding;
    }

    let has_live_transfer = transfers.iter().any(|t| {
        matches!(
            t.status,
            TransferStatus::Transferring | TransferStatus::Waiting
        )
    });
    if has_live_transfer {
        return OrderWorkflowStatus::Waiting;
    }

    let all_ready = !line_items.is_empty()
        && line_items
            .iter()
            .all(|li| li.pack_status == packhouse_core::PackStatus::Ready);
    if all_ready {
        return OrderWorkflowStatus::Ready;
    }

    OrderWorkflowStatus::Packing
}

/// Validate a packer note, returning a rejection message when too long.
///
/// An empty note is valid (it clears the note).
pub fn validate_packer_note(note: &str) -> Result<(), String> {
    if note.chars().count() > MAX_PACKER_NOTE_LEN {
        return Err(format!(
            "note must be {MAX_PACKER_NOTE_LEN} characters or less"
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::line_item::LineItem;
    use crate::models::transfer::TransferItem;
    use packhouse_core::{
        BaseLineItemId, LineItemRowId, PackStatus, PickStatus, TransferItemId, TransferStatus,
    };

    fn order_with_status(status: OrderWorkflowStatus) -> Order {
        Order {
            shopify_order_id: ShopifyOrderId::new(1),
            order_number: "1001".into(),
            name: "#1001".into(),
            fulfillment_status: FulfillmentStatus::Unfulfilled,
            cancelled_at: None,
            total_quantity: 1,
            subtotal_price: Decimal::ZERO,
            created_at: Utc::now(),
            shipping: ShippingInfo::default(),
            status,
            box_type: None,
            weight: None,
            packer_note: None,
            edited: false,
            updated_at: Utc::now(),
        }
    }

    fn line_item(pack_status: PackStatus) -> LineItem {
        LineItem {
            id: LineItemRowId::new(1),
            shopify_order_id: ShopifyOrderId::new(1),
            order_number: "1001".into(),
            base_line_item_id: BaseLineItemId::new(100),
            quantity: 1,
            title: String::new(),
            name: String::new(),
            brand: String::new(),
            size: String::new(),
            image_url: String::new(),
            sku: String::new(),
            url_handle: String::new(),
            product_type: String::new(),
            variant_title: String::new(),
            weight: Decimal::ZERO,
            weight_unit: "g".into(),
            weight_needs_confirmation: true,
            pick_status: PickStatus::Picking,
            pack_status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn transfer(status: TransferStatus) -> TransferItem {
        TransferItem {
            id: TransferItemId::new(1),
            line_item_row_id: Some(LineItemRowId::new(1)),
            shopify_order_id: ShopifyOrderId::new(1),
            order_number: "1001".into(),
            quantity: 1,
            sku: String::new(),
            title: String::new(),
            brand: String::new(),
            size: String::new(),
            image_url: String::new(),
            variant_title: String::new(),
            transfer_from: None,
            estimate_month: None,
            estimate_day: None,
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_holding_wins() {
        let order = order_with_status(OrderWorkflowStatus::Holding);
        let items = vec![line_item(PackStatus::Ready)];
        let transfers = vec![transfer(TransferStatus::Waiting)];
        assert_eq!(
            derive_workflow_status(&order, &items, &transfers),
            OrderWorkflowStatus::Holding
        );
    }

    #[test]
    fn test_live_transfer_means_waiting() {
        let order = order_with_status(OrderWorkflowStatus::Packing);
        let items = vec![line_item(PackStatus::Ready)];
        for status in [TransferStatus::Transferring, TransferStatus::Waiting] {
            assert_eq!(
                derive_workflow_status(&order, &items, &[transfer(status)]),
                OrderWorkflowStatus::Waiting
            );
        }
    }

    #[test]
    fn test_terminal_transfers_do_not_block_ready() {
        let order = order_with_status(OrderWorkflowStatus::Packing);
        let items = vec![line_item(PackStatus::Ready)];
        for status in [TransferStatus::Found, TransferStatus::Received] {
            assert_eq!(
                derive_workflow_status(&order, &items, &[transfer(status)]),
                OrderWorkflowStatus::Ready
            );
        }
    }

    #[test]
    fn test_all_ready_required() {
        let order = order_with_status(OrderWorkflowStatus::Packing);
        let items = vec![line_item(PackStatus::Ready), line_item(PackStatus::Packing)];
        assert_eq!(
            derive_workflow_status(&order, &items, &[]),
            OrderWorkflowStatus::Packing
        );
        // No line items at all is still packing, not ready.
        assert_eq!(
            derive_workflow_status(&order, &[], &[]),
            OrderWorkflowStatus::Packing
        );
    }

    #[test]
    fn test_validate_packer_note() {
        assert!(validate_packer_note("").is_ok());
        assert!(validate_packer_note(&"x".repeat(MAX_PACKER_NOTE_LEN)).is_ok());
        assert!(validate_packer_note(&"x".repeat(MAX_PACKER_NOTE_LEN + 1)).is_err());
    }
}
