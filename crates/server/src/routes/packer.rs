//! Packer workflow route handlers.
//!
//! Packers see whole orders: line items, transfer context, a derived
//! workflow status, and weight warnings. Pack-side mutations never touch
//! pick progress, and weight corrections are pushed back to Shopify on a
//! best-effort basis.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use packhouse_core::{
    LineItemRowId, OrderWorkflowStatus, PackStatus, ShopifyOrderId, TransferStatus,
};

use crate::db::{LineItemRepository, OrderRepository, TransferRepository};
use crate::error::{AppError, Result};
use crate::models::{
    LineItem, Order, TransferItem, derive_workflow_status, validate_packer_note,
};
use crate::shopify::ProductCatalog;
use crate::state::AppState;

/// Aggregate transfer context for an order's packer view.
#[derive(Debug, Default, Serialize)]
pub struct TransferSummary {
    /// Total quantity across `waiting`-stage records.
    pub waiting_quantity: i64,
    /// Distinct dispatch sources among `waiting`-stage records.
    pub sources: Vec<String>,
    /// Latest (month, day) arrival estimate among `waiting`-stage records.
    pub latest_estimate: Option<(i32, i32)>,
}

impl TransferSummary {
    fn for_transfers(transfers: &[TransferItem]) -> Self {
        let mut summary = Self::default();
        for transfer in transfers {
            if transfer.status != TransferStatus::Waiting {
                continue;
            }
            summary.waiting_quantity += transfer.quantity;
            if let Some(source) = &transfer.transfer_from {
                if !summary.sources.contains(source) {
                    summary.sources.push(source.clone());
                }
            }
            if let (Some(month), Some(day)) = (transfer.estimate_month, transfer.estimate_day) {
                if summary.latest_estimate.is_none_or(|e| (month, day) > e) {
                    summary.latest_estimate = Some((month, day));
                }
            }
        }
        summary
    }
}

/// One order as the packer list and detail views show it.
#[derive(Debug, Serialize)]
pub struct PackerOrderResponse {
    #[serde(flatten)]
    pub order: Order,
    /// Derived workflow status (the stored status is only the staff
    /// override input).
    pub derived_status: OrderWorkflowStatus,
    /// Whether any row still needs its weight confirmed.
    pub weight_warning: bool,
    pub line_items: Vec<LineItem>,
    pub transfer_summary: TransferSummary,
}

async fn build_order_response(
    state: &AppState,
    order: Order,
) -> Result<PackerOrderResponse> {
    let line_items = LineItemRepository::new(state.pool())
        .list_for_order(order.shopify_order_id)
        .await?;
    let transfers = TransferRepository::new(state.pool())
        .list_for_order(order.shopify_order_id)
        .await?;

    let derived_status = derive_workflow_status(&order, &line_items, &transfers);
    let weight_warning = line_items.iter().any(|li| li.weight_needs_confirmation);
    let transfer_summary = TransferSummary::for_transfers(&transfers);

    Ok(PackerOrderResponse {
        order,
        derived_status,
        weight_warning,
        line_items,
        transfer_summary,
    })
}

/// List all mirrored orders with their packer context.
#[instrument(skip_all)]
pub async fn list_orders(
    State(state): State<AppState>,
) -> Result<Json<Vec<PackerOrderResponse>>> {
    let orders = OrderRepository::new(state.pool()).list().await?;
    let mut responses = Vec::with_capacity(orders.len());
    for order in orders {
        responses.push(build_order_response(&state, order).await?);
    }
    Ok(Json(responses))
}

/// Show one order with its packer context.
#[instrument(skip(state))]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<ShopifyOrderId>,
) -> Result<Json<PackerOrderResponse>> {
    let order = OrderRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;
    Ok(Json(build_order_response(&state, order).await?))
}

/// Body for a workflow status change.
#[derive(Debug, Deserialize)]
pub struct OrderStatusBody {
    pub status: OrderWorkflowStatus,
}

/// Set an order's workflow status (staff override).
#[instrument(skip(state))]
pub async fn set_order_status(
    State(state): State<AppState>,
    Path(id): Path<ShopifyOrderId>,
    Json(body): Json<OrderStatusBody>,
) -> Result<StatusCode> {
    OrderRepository::new(state.pool())
        .set_status(id, body.status)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Body for a packer note change.
#[derive(Debug, Deserialize)]
pub struct PackerNoteBody {
    pub note: String,
}

/// Set or clear an order's packer note.
#[instrument(skip(state, body))]
pub async fn set_packer_note(
    State(state): State<AppState>,
    Path(id): Path<ShopifyOrderId>,
    Json(body): Json<PackerNoteBody>,
) -> Result<StatusCode> {
    let note = body.note.trim();
    validate_packer_note(note).map_err(AppError::BadRequest)?;

    let note = (!note.is_empty()).then_some(note);
    OrderRepository::new(state.pool())
        .set_packer_note(id, note)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Body for packing completion.
#[derive(Debug, Deserialize)]
pub struct CompleteBody {
    pub box_type: String,
    pub weight: String,
}

/// Record packing completion: box type, final weight, status `ready`.
#[instrument(skip(state, body))]
pub async fn complete_order(
    State(state): State<AppState>,
    Path(id): Path<ShopifyOrderId>,
    Json(body): Json<CompleteBody>,
) -> Result<StatusCode> {
    if body.box_type.trim().is_empty() || body.weight.trim().is_empty() {
        return Err(AppError::BadRequest(
            "box type and weight are required".to_string(),
        ));
    }

    let orders = OrderRepository::new(state.pool());
    orders
        .complete_packing(id, body.box_type.trim(), body.weight.trim())
        .await?;
    orders.set_status(id, OrderWorkflowStatus::Ready).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Body for a pack status change.
#[derive(Debug, Deserialize)]
pub struct PackStatusBody {
    pub pack_status: PackStatus,
}

/// Set a row's pack status.
#[instrument(skip(state))]
pub async fn set_pack_status(
    State(state): State<AppState>,
    Path(id): Path<LineItemRowId>,
    Json(body): Json<PackStatusBody>,
) -> Result<StatusCode> {
    LineItemRepository::new(state.pool())
        .set_pack_status(id, body.pack_status)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Body for a weight correction.
#[derive(Debug, Deserialize)]
pub struct WeightBody {
    /// Confirmed true weight in grams.
    pub grams: Decimal,
}

/// Response for a weight correction.
#[derive(Debug, Serialize)]
pub struct WeightResponse {
    pub item: LineItem,
    /// Whether the correction also reached Shopify. A false here means the
    /// local row is right but the catalog still carries the old weight.
    pub shopify_updated: bool,
}

/// Record a confirmed weight on a row and push it to Shopify by SKU.
///
/// The local write is authoritative; an upstream failure is reported in
/// the response rather than failing the request.
#[instrument(skip(state))]
pub async fn set_weight(
    State(state): State<AppState>,
    Path(id): Path<LineItemRowId>,
    Json(body): Json<WeightBody>,
) -> Result<Json<WeightResponse>> {
    if body.grams <= Decimal::ZERO {
        return Err(AppError::BadRequest("weight must be positive".to_string()));
    }

    let items = LineItemRepository::new(state.pool());
    let item = items
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("line item {id}")))?;

    items.set_weight(id, body.grams).await?;

    let shopify_updated = if item.sku.is_empty() {
        tracing::warn!(row_id = %id, "Row has no SKU, weight not pushed to Shopify");
        false
    } else {
        match state
            .shopify()
            .update_variant_weight(&item.sku, body.grams)
            .await
        {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(row_id = %id, sku = %item.sku, %error, "Weight push to Shopify failed");
                false
            }
        }
    };

    let item = items
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("line item {id}")))?;
    Ok(Json(WeightResponse {
        item,
        shopify_updated,
    }))
}

/// Hard-delete an order from the app, its line items and every transfer
/// record with it. This discards warehouse work; it is a staff action, not
/// part of reconciliation.
#[instrument(skip(state))]
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<ShopifyOrderId>,
) -> Result<StatusCode> {
    TransferRepository::new(state.pool())
        .delete_for_order(id)
        .await?;
    let deleted = OrderRepository::new(state.pool()).delete(id).await?;
    if !deleted {
        return Err(AppError::NotFound(format!("order {id}")));
    }
    tracing::info!(order_id = %id, "Order hard-deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use packhouse_core::TransferItemId;

    fn transfer(
        status: TransferStatus,
        quantity: i64,
        from: Option<&str>,
        estimate: Option<(i32, i32)>,
    ) -> TransferItem {
        TransferItem {
            id: TransferItemId::new(1),
            line_item_row_id: None,
            shopify_order_id: ShopifyOrderId::new(1),
            order_number: "1001".into(),
            quantity,
            sku: String::new(),
            title: String::new(),
            brand: String::new(),
            size: String::new(),
            image_url: String::new(),
            variant_title: String::new(),
            transfer_from: from.map(str::to_string),
            estimate_month: estimate.map(|(m, _)| m),
            estimate_day: estimate.map(|(_, d)| d),
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_transfer_summary_waiting_only() {
        let transfers = vec![
            transfer(TransferStatus::Waiting, 2, Some("Osaka"), Some((3, 12))),
            transfer(TransferStatus::Waiting, 1, Some("Osaka"), Some((4, 2))),
            transfer(TransferStatus::Transferring, 5, None, None),
            transfer(TransferStatus::Received, 3, Some("Nagoya"), Some((9, 9))),
        ];
        let summary = TransferSummary::for_transfers(&transfers);
        assert_eq!(summary.waiting_quantity, 3);
        assert_eq!(summary.sources, vec!["Osaka".to_string()]);
        assert_eq!(summary.latest_estimate, Some((4, 2)));
    }

    #[test]
    fn test_transfer_summary_empty() {
        let summary = TransferSummary::for_transfers(&[]);
        assert_eq!(summary.waiting_quantity, 0);
        assert!(summary.sources.is_empty());
        assert!(summary.latest_estimate.is_none());
    }
}
