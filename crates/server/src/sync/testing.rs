//! In-memory store and stub catalog for engine tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;

use packhouse_core::{
    LineItemRowId, OrderWorkflowStatus, PickStatus, ProductId, ShopifyOrderId, TransferItemId,
    TransferStatus, VariantId,
};

use crate::db::RepositoryError;
use crate::models::{LineItem, NewLineItem, NewOrder, Order, TransferItem};
use crate::shopify::types::{OrderPayload, ProductDetail, VariantDetail};
use crate::shopify::{ProductCatalog, ShopifyError};

use super::store::{FulfillmentStore, StorePlan};

#[derive(Default)]
struct State {
    orders: HashMap<i64, Order>,
    items: BTreeMap<i64, LineItem>,
    transfers: BTreeMap<i64, TransferItem>,
    next_row_id: i64,
    next_transfer_id: i64,
    ticks: i64,
}

impl State {
    /// Monotonic timestamps so "newest-created-first" ordering is
    /// deterministic.
    fn tick(&mut self) -> chrono::DateTime<Utc> {
        self.ticks += 1;
        Utc.with_ymd_and_hms(2026, 1, 9, 10, 0, 0).unwrap() + Duration::seconds(self.ticks)
    }

    fn insert_item(&mut self, new: &NewLineItem) -> LineItemRowId {
        self.next_row_id += 1;
        let id = LineItemRowId::new(self.next_row_id);
        let now = self.tick();
        self.items.insert(
            id.as_i64(),
            LineItem {
                id,
                shopify_order_id: new.shopify_order_id,
                order_number: new.order_number.clone(),
                base_line_item_id: new.base_line_item_id,
                quantity: new.quantity,
                title: new.title.clone(),
                name: new.name.clone(),
                brand: new.brand.clone(),
                size: new.size.clone(),
                image_url: new.image_url.clone(),
                sku: new.sku.clone(),
                url_handle: new.url_handle.clone(),
                product_type: new.product_type.clone(),
                variant_title: new.variant_title.clone(),
                weight: new.weight,
                weight_unit: new.weight_unit.clone(),
                weight_needs_confirmation: new.weight_needs_confirmation,
                pick_status: new.pick_status,
                pack_status: new.pack_status,
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    fn delete_item(&mut self, id: LineItemRowId) {
        self.items.remove(&id.as_i64());
        // Mirror the database: still-transferring records go with the row,
        // later-stage records survive with a cleared reference.
        self.transfers
            .retain(|_, t| t.line_item_row_id != Some(id) || !t.status.is_discardable());
        for transfer in self.transfers.values_mut() {
            if transfer.line_item_row_id == Some(id) {
                transfer.line_item_row_id = None;
            }
        }
    }
}

/// In-memory [`FulfillmentStore`] mimicking the Postgres semantics.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn order(&self, id: ShopifyOrderId) -> Option<Order> {
        self.state.lock().unwrap().orders.get(&id.as_i64()).cloned()
    }

    /// Line items for an order, oldest row first.
    pub fn items_for(&self, id: ShopifyOrderId) -> Vec<LineItem> {
        self.state
            .lock()
            .unwrap()
            .items
            .values()
            .filter(|i| i.shopify_order_id == id)
            .cloned()
            .collect()
    }

    pub fn transfer(&self, id: TransferItemId) -> Option<TransferItem> {
        self.state
            .lock()
            .unwrap()
            .transfers
            .get(&id.as_i64())
            .cloned()
    }

    pub fn set_pick_status(&self, id: LineItemRowId, status: PickStatus) {
        let mut state = self.state.lock().unwrap();
        state
            .items
            .get_mut(&id.as_i64())
            .expect("row exists")
            .pick_status = status;
    }

    /// Split `quantity` off a row into a new, newer row.
    pub fn split_row(&self, id: LineItemRowId, quantity: i64) -> LineItemRowId {
        let mut state = self.state.lock().unwrap();
        let original = state.items.get_mut(&id.as_i64()).expect("row exists");
        original.quantity -= quantity;
        let fragment = original.split_fragment(quantity, PickStatus::Picking);
        state.insert_item(&fragment)
    }

    /// Open a transfer record for a row in the given stage.
    pub fn open_transfer(&self, row_id: LineItemRowId, status: TransferStatus) -> TransferItemId {
        let mut state = self.state.lock().unwrap();
        let item = state.items.get(&row_id.as_i64()).expect("row exists").clone();
        state.next_transfer_id += 1;
        let id = TransferItemId::new(state.next_transfer_id);
        let now = state.tick();
        state.transfers.insert(
            id.as_i64(),
            TransferItem {
                id,
                line_item_row_id: Some(row_id),
                shopify_order_id: item.shopify_order_id,
                order_number: item.order_number,
                quantity: item.quantity,
                sku: item.sku,
                title: item.title,
                brand: item.brand,
                size: item.size,
                image_url: item.image_url,
                variant_title: item.variant_title,
                transfer_from: None,
                estimate_month: None,
                estimate_day: None,
                status,
                created_at: now,
                updated_at: now,
            },
        );
        id
    }
}

#[async_trait]
impl FulfillmentStore for MemoryStore {
    async fn find_order(&self, id: ShopifyOrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.order(id))
    }

    async fn line_items(&self, id: ShopifyOrderId) -> Result<Vec<LineItem>, RepositoryError> {
        Ok(self.items_for(id))
    }

    async fn create_order(
        &self,
        order: NewOrder,
        items: Vec<NewLineItem>,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let now = state.tick();
        state.orders.insert(
            order.shopify_order_id.as_i64(),
            Order {
                shopify_order_id: order.shopify_order_id,
                order_number: order.order_number,
                name: order.name,
                fulfillment_status: order.fulfillment_status,
                cancelled_at: None,
                total_quantity: order.total_quantity,
                subtotal_price: order.subtotal_price,
                created_at: order.created_at,
                shipping: order.shipping,
                status: OrderWorkflowStatus::Packing,
                box_type: None,
                weight: None,
                packer_note: None,
                edited: false,
                updated_at: now,
            },
        );
        for item in &items {
            state.insert_item(item);
        }
        Ok(())
    }

    async fn apply(&self, id: ShopifyOrderId, plan: StorePlan) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        for row_id in &plan.deletes {
            state.delete_item(*row_id);
        }
        for (row_id, quantity) in &plan.shrinks {
            state
                .items
                .get_mut(&row_id.as_i64())
                .expect("shrunk row exists")
                .quantity = *quantity;
        }
        for item in &plan.inserts {
            state.insert_item(item);
        }
        let order = state.orders.get_mut(&id.as_i64()).expect("order exists");
        order.total_quantity = plan.total_quantity;
        if let Some(status) = plan.fulfillment_status {
            order.fulfillment_status = status;
        }
        order.edited |= plan.mark_edited;
        Ok(())
    }

    async fn purge_order(&self, id: ShopifyOrderId) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let row_ids: Vec<LineItemRowId> = state
            .items
            .values()
            .filter(|i| i.shopify_order_id == id)
            .map(|i| i.id)
            .collect();
        for row_id in row_ids {
            state.delete_item(row_id);
        }
        state.orders.remove(&id.as_i64());
        Ok(())
    }
}

/// [`ProductCatalog`] stub with canned responses.
#[derive(Default)]
pub struct StubCatalog {
    fail_enrichment: bool,
    orders: HashMap<i64, OrderPayload>,
}

impl StubCatalog {
    /// A catalog whose enrichment calls all fail.
    pub fn failing() -> Self {
        Self {
            fail_enrichment: true,
            orders: HashMap::new(),
        }
    }

    /// Serve `snapshot` from `fetch_order`.
    #[must_use]
    pub fn with_order(mut self, snapshot: OrderPayload) -> Self {
        self.orders.insert(snapshot.id.as_i64(), snapshot);
        self
    }
}

#[async_trait]
impl ProductCatalog for StubCatalog {
    async fn fetch_order(&self, id: ShopifyOrderId) -> Result<Option<OrderPayload>, ShopifyError> {
        Ok(self.orders.get(&id.as_i64()).cloned())
    }

    async fn variant_detail(&self, id: VariantId) -> Result<VariantDetail, ShopifyError> {
        if self.fail_enrichment {
            return Err(ShopifyError::VariantNotFound(id.to_string()));
        }
        Ok(VariantDetail {
            weight: Decimal::new(150, 0),
            weight_unit: "g".to_string(),
        })
    }

    async fn product_detail(&self, id: ProductId) -> Result<ProductDetail, ShopifyError> {
        if self.fail_enrichment {
            return Err(ShopifyError::Api {
                status: 500,
                message: id.to_string(),
            });
        }
        Ok(ProductDetail {
            image_url: "https://cdn.example.com/tee.jpg".to_string(),
            handle: "tee".to_string(),
            product_type: "Apparel".to_string(),
        })
    }

    async fn update_variant_weight(&self, _sku: &str, _grams: Decimal) -> Result<(), ShopifyError> {
        Ok(())
    }
}
