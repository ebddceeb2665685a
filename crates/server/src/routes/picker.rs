//! Picker workflow route handlers.
//!
//! Pickers work from a flat list of line item rows across all live orders.
//! Marking a row missing opens a `transferring` transfer record for it;
//! finding it after all (picked, or undoing the miss) discards records
//! that are still in that stage. A partially found row is split into a
//! picked fragment and a missing fragment so pack progress can continue on
//! what is in hand.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use packhouse_core::{LineItemRowId, PickStatus};

use crate::db::{LineItemRepository, TransferRepository};
use crate::error::{AppError, Result};
use crate::models::{LineItem, NewTransferItem, TransferItem};
use crate::state::AppState;

/// A line item row with its order context, as the picker list shows it.
#[derive(Debug, Serialize)]
pub struct PickerItemResponse {
    #[serde(flatten)]
    pub item: LineItem,
    pub order_name: String,
    pub shipping_code: String,
}

/// List every pickable line item row.
#[instrument(skip_all)]
pub async fn list_items(State(state): State<AppState>) -> Result<Json<Vec<PickerItemResponse>>> {
    let items = LineItemRepository::new(state.pool()).list_for_picker().await?;
    Ok(Json(
        items
            .into_iter()
            .map(|p| PickerItemResponse {
                item: p.item,
                order_name: p.order_name,
                shipping_code: p.shipping_code,
            })
            .collect(),
    ))
}

/// Body for a pick status change.
#[derive(Debug, Deserialize)]
pub struct PickStatusBody {
    pub pick_status: PickStatus,
}

/// Set a row's pick status, maintaining its transfer records.
#[instrument(skip(state))]
pub async fn set_pick_status(
    State(state): State<AppState>,
    Path(id): Path<LineItemRowId>,
    Json(body): Json<PickStatusBody>,
) -> Result<Json<LineItem>> {
    let items = LineItemRepository::new(state.pool());
    let transfers = TransferRepository::new(state.pool());

    let item = items
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("line item {id}")))?;

    items.set_pick_status(id, body.pick_status).await?;

    match body.pick_status {
        PickStatus::Missing => {
            let record = transfers
                .insert(&NewTransferItem::for_line_item(&item, item.quantity))
                .await?;
            tracing::info!(row_id = %id, transfer_id = %record.id, "Transfer opened for missing item");
        }
        PickStatus::Picked | PickStatus::Picking => {
            // The stock turned up (or the miss was undone); a transfer not
            // yet dispatched is moot.
            let discarded = transfers.delete_transferring_for_row(id).await?;
            if discarded > 0 {
                tracing::info!(row_id = %id, discarded, "Discarded undispatched transfers");
            }
        }
    }

    let updated = items
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("line item {id}")))?;
    Ok(Json(updated))
}

/// Body for a picker split.
#[derive(Debug, Deserialize)]
pub struct PickerSplitBody {
    /// How many units are missing; the rest count as picked.
    pub missing_quantity: i64,
}

/// Response for a picker split.
#[derive(Debug, Serialize)]
pub struct PickerSplitResponse {
    /// The original row, now the picked fragment.
    pub picked: LineItem,
    /// The new missing fragment.
    pub missing: LineItem,
    /// The transfer record opened for the missing fragment.
    pub transfer: TransferItem,
}

/// Split a partially found row into picked and missing fragments.
#[instrument(skip(state))]
pub async fn split_item(
    State(state): State<AppState>,
    Path(id): Path<LineItemRowId>,
    Json(body): Json<PickerSplitBody>,
) -> Result<Json<PickerSplitResponse>> {
    let items = LineItemRepository::new(state.pool());
    let transfers = TransferRepository::new(state.pool());

    let item = items
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("line item {id}")))?;

    if body.missing_quantity < 1 || body.missing_quantity >= item.quantity {
        return Err(AppError::BadRequest(format!(
            "missing quantity must be between 1 and {}",
            item.quantity - 1
        )));
    }

    items
        .set_quantity(id, item.quantity - body.missing_quantity)
        .await?;
    items.set_pick_status(id, PickStatus::Picked).await?;

    let fragment = item.split_fragment(body.missing_quantity, PickStatus::Missing);
    let missing = items.insert(&fragment).await?;
    let transfer = transfers
        .insert(&NewTransferItem::for_line_item(&missing, missing.quantity))
        .await?;

    let picked = items
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("line item {id}")))?;

    tracing::info!(
        row_id = %id,
        missing_row_id = %missing.id,
        transfer_id = %transfer.id,
        "Row split into picked and missing fragments"
    );
    Ok(Json(PickerSplitResponse {
        picked,
        missing,
        transfer,
    }))
}
