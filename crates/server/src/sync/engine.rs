//! Reconciliation engine: notification dispatch and enrichment.
//!
//! One public operation per webhook kind. Every operation is idempotent:
//! replaying a notification diffs against the current local rows, so the
//! second application converges to the same state as the first.

use rust_decimal::Decimal;

use packhouse_core::{FulfillmentStatus, PackStatus, PickStatus, ShopifyOrderId};

use crate::models::{NewLineItem, NewOrder};
use crate::shopify::ProductCatalog;
use crate::shopify::types::{
    LineItemPayload, OrderEditNotice, OrderPayload, ProductDetail, RefundNotice, VariantDetail,
};

use super::diff;
use super::store::{FulfillmentStore, StorePlan};
use super::{SyncError, SyncOutcome};

/// The canonical weight unit; anything else flags the row for confirmation.
const CANONICAL_WEIGHT_UNIT: &str = "g";

/// The order state reconciliation engine.
///
/// Notifications for the same order must be handed in sequentially; the
/// engine reads local rows, plans, and applies, so a concurrent writer on
/// the same order could invalidate the plan.
pub struct ReconciliationEngine<S, C> {
    store: S,
    catalog: C,
}

impl<S: FulfillmentStore, C: ProductCatalog> ReconciliationEngine<S, C> {
    /// Build an engine over a store and a product catalog.
    pub const fn new(store: S, catalog: C) -> Self {
        Self { store, catalog }
    }

    /// Handle `orders/create`. An order already known locally is diffed
    /// instead, which makes webhook redelivery harmless.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` on storage failure.
    pub async fn order_created(&self, snapshot: &OrderPayload) -> Result<SyncOutcome, SyncError> {
        if self.store.find_order(snapshot.id).await?.is_some() {
            return self.order_updated(snapshot).await;
        }
        if is_terminal(snapshot) {
            tracing::info!(order_id = %snapshot.id, "Ignoring create for terminal order");
            return Ok(SyncOutcome::Skipped);
        }

        let active = diff::fold_refunds(snapshot);
        let total_quantity: i64 = active.iter().map(|l| l.quantity).sum();

        let mut items = Vec::with_capacity(active.len());
        for line in &active {
            items.push(self.enrich(snapshot, line.payload, line.quantity).await);
        }

        let order = NewOrder {
            shopify_order_id: snapshot.id,
            order_number: snapshot.order_number.to_string(),
            name: snapshot.name.clone(),
            fulfillment_status: snapshot.fulfillment_status(),
            total_quantity,
            subtotal_price: snapshot.subtotal_price,
            created_at: snapshot.created_at,
            shipping: snapshot.shipping_info(),
        };

        self.store.create_order(order, items).await?;
        tracing::info!(order_id = %snapshot.id, total_quantity, "Order created");
        Ok(SyncOutcome::Created)
    }

    /// Handle `orders/updated`: the full diff-and-repair pass. Delegates to
    /// the terminal purge when the snapshot is cancelled or fulfilled, and
    /// to creation when the order is not yet known locally.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` on storage failure.
    pub async fn order_updated(&self, snapshot: &OrderPayload) -> Result<SyncOutcome, SyncError> {
        self.reconcile(snapshot, false).await
    }

    /// Handle `order_edits/complete`: fetch a fresh snapshot, mark the
    /// order edited, and diff. An uncommitted edit is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::InvalidNotification` when the notice carries no
    /// order ID, `SyncError::Upstream` when the snapshot fetch fails, and
    /// `SyncError` on storage failure.
    pub async fn order_edit_committed(
        &self,
        notice: &OrderEditNotice,
    ) -> Result<SyncOutcome, SyncError> {
        let Some(order_id) = notice.order_id else {
            return Err(SyncError::InvalidNotification(
                "edit notification without order_id".to_string(),
            ));
        };
        if notice.committed_at.is_none() {
            tracing::debug!(%order_id, "Ignoring uncommitted order edit");
            return Ok(SyncOutcome::Skipped);
        }

        let Some(snapshot) = self.catalog.fetch_order(order_id).await? else {
            tracing::warn!(%order_id, "Edited order no longer exists upstream");
            return Ok(SyncOutcome::Skipped);
        };

        self.reconcile(&snapshot, true).await
    }

    /// Handle `refunds/create`: the fast path that trims quantities from a
    /// refund notice alone, without re-fetching the order.
    ///
    /// Replaying a refund (or following an update snapshot that already
    /// folded it in) is a no-op: once the rows reflect the refund there is
    /// no excess left to remove.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` on storage failure.
    pub async fn refund_created(&self, notice: &RefundNotice) -> Result<SyncOutcome, SyncError> {
        if self.store.find_order(notice.order_id).await?.is_none() {
            // Unknown order: already purged or never mirrored. The refund
            // is already satisfied from our point of view.
            tracing::info!(order_id = %notice.order_id, "Refund for unknown order, skipping");
            return Ok(SyncOutcome::Skipped);
        }

        let local = self.store.line_items(notice.order_id).await?;
        let plan = diff::plan_refund(&notice.refund_line_items, &local);

        let plan = StorePlan {
            inserts: Vec::new(),
            shrinks: plan.shrinks,
            deletes: plan.deletes,
            total_quantity: plan.total_quantity,
            fulfillment_status: None,
            mark_edited: false,
        };
        self.store.apply(notice.order_id, plan).await?;
        tracing::info!(order_id = %notice.order_id, "Refund reconciled");
        Ok(SyncOutcome::Updated)
    }

    /// Handle `orders/cancelled`: purge the local mirror.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` on storage failure.
    pub async fn order_cancelled(&self, order_id: ShopifyOrderId) -> Result<SyncOutcome, SyncError> {
        self.purge(order_id, "cancelled").await
    }

    /// Handle `orders/fulfilled`: purge the local mirror.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` on storage failure.
    pub async fn order_fulfilled(&self, order_id: ShopifyOrderId) -> Result<SyncOutcome, SyncError> {
        self.purge(order_id, "fulfilled").await
    }

    async fn purge(
        &self,
        order_id: ShopifyOrderId,
        reason: &'static str,
    ) -> Result<SyncOutcome, SyncError> {
        if self.store.find_order(order_id).await?.is_none() {
            tracing::debug!(%order_id, reason, "Purge for unknown order, skipping");
            return Ok(SyncOutcome::Skipped);
        }
        self.store.purge_order(order_id).await?;
        tracing::info!(%order_id, reason, "Order purged");
        Ok(SyncOutcome::Purged)
    }

    /// The diff-and-repair pass shared by update and edit handling.
    ///
    /// Only planned inserts are enriched; rows that survive the diff keep
    /// the display metadata they were created with. Refreshing it here
    /// would cost a catalog round-trip per line item on every webhook for
    /// data that only changes when staff edit the product.
    async fn reconcile(
        &self,
        snapshot: &OrderPayload,
        mark_edited: bool,
    ) -> Result<SyncOutcome, SyncError> {
        if is_terminal(snapshot) {
            return self.purge_terminal(snapshot).await;
        }

        if self.store.find_order(snapshot.id).await?.is_none() {
            return Box::pin(self.order_created(snapshot)).await;
        }

        let active = diff::fold_refunds(snapshot);
        let local = self.store.line_items(snapshot.id).await?;
        let plan = diff::plan_update(&active, &local);

        let mut inserts = Vec::with_capacity(plan.inserts.len());
        for insert in &plan.inserts {
            inserts.push(self.enrich(snapshot, insert.payload, insert.quantity).await);
        }

        let plan = StorePlan {
            inserts,
            shrinks: plan.shrinks,
            deletes: plan.deletes,
            total_quantity: plan.total_quantity,
            fulfillment_status: Some(snapshot.fulfillment_status()),
            mark_edited,
        };
        self.store.apply(snapshot.id, plan).await?;
        tracing::info!(order_id = %snapshot.id, "Order reconciled");
        Ok(SyncOutcome::Updated)
    }

    async fn purge_terminal(&self, snapshot: &OrderPayload) -> Result<SyncOutcome, SyncError> {
        if snapshot.cancelled_at.is_some() {
            self.order_cancelled(snapshot.id).await
        } else {
            self.order_fulfilled(snapshot.id).await
        }
    }

    /// Build an insertable row for a remote line item, enriching it with
    /// variant and product detail. Enrichment happens once, at insert;
    /// existing rows are never re-enriched on later passes. Failures are
    /// logged and replaced with defaults; a zero or non-gram weight flags
    /// the row for manual confirmation.
    async fn enrich(
        &self,
        snapshot: &OrderPayload,
        payload: &LineItemPayload,
        quantity: i64,
    ) -> NewLineItem {
        let variant = match payload.variant_id {
            Some(id) => match self.catalog.variant_detail(id).await {
                Ok(detail) => Some(detail),
                Err(error) => {
                    tracing::warn!(variant_id = %id, %error, "Variant enrichment failed");
                    None
                }
            },
            None => None,
        };
        let product = match payload.product_id {
            Some(id) => match self.catalog.product_detail(id).await {
                Ok(detail) => Some(detail),
                Err(error) => {
                    tracing::warn!(product_id = %id, %error, "Product enrichment failed");
                    None
                }
            },
            None => None,
        };

        let VariantDetail {
            weight,
            weight_unit,
        } = variant.unwrap_or_else(|| VariantDetail {
            weight: Decimal::ZERO,
            weight_unit: CANONICAL_WEIGHT_UNIT.to_string(),
        });
        let product = product.unwrap_or_else(|| ProductDetail {
            image_url: String::new(),
            handle: String::new(),
            product_type: payload.product_type.clone().unwrap_or_default(),
        });

        NewLineItem {
            shopify_order_id: snapshot.id,
            order_number: snapshot.order_number.to_string(),
            base_line_item_id: payload.id,
            quantity,
            title: payload.title.clone(),
            name: payload.name.clone(),
            brand: payload.vendor.clone(),
            size: payload.size_property(),
            image_url: product.image_url,
            sku: payload.sku.clone().unwrap_or_default(),
            url_handle: product.handle,
            product_type: product.product_type,
            variant_title: payload.variant_title.clone().unwrap_or_default(),
            weight_needs_confirmation: weight.is_zero() || weight_unit != CANONICAL_WEIGHT_UNIT,
            weight,
            weight_unit,
            pick_status: PickStatus::Picking,
            pack_status: PackStatus::Packing,
        }
    }
}

/// Whether the snapshot describes an order whose warehouse workflow is
/// over.
fn is_terminal(snapshot: &OrderPayload) -> bool {
    snapshot.cancelled_at.is_some()
        || snapshot.fulfillment_status() == FulfillmentStatus::Fulfilled
}
