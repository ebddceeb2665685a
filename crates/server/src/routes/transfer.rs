//! Transfer workflow route handlers.
//!
//! The transfer screen works off the denormalized ledger alone; no join
//! back to line items is needed (the originating row may already be gone).

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use packhouse_core::{TransferItemId, TransferStatus};

use crate::db::TransferRepository;
use crate::error::{AppError, Result};
use crate::models::{TransferItem, TransferUpdate};
use crate::state::AppState;

/// List all transfer records.
#[instrument(skip_all)]
pub async fn list_items(State(state): State<AppState>) -> Result<Json<Vec<TransferItem>>> {
    let items = TransferRepository::new(state.pool()).list().await?;
    Ok(Json(items))
}

/// Apply a partial update to a transfer record.
#[instrument(skip(state, update))]
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<TransferItemId>,
    Json(update): Json<TransferUpdate>,
) -> Result<Json<TransferItem>> {
    if update.is_empty() {
        return Err(AppError::BadRequest("empty update".to_string()));
    }
    let item = TransferRepository::new(state.pool()).update(id, &update).await?;
    Ok(Json(item))
}

/// Body for a transfer split: the dispatched portion and its logistics.
#[derive(Debug, Deserialize)]
pub struct TransferSplitBody {
    /// How many units were dispatched.
    pub quantity: i64,
    /// Where the dispatched units ship from.
    pub transfer_from: String,
    /// Estimated arrival month.
    pub estimate_month: i32,
    /// Estimated arrival day.
    pub estimate_day: i32,
}

/// Response for a transfer split.
#[derive(Debug, Serialize)]
pub struct TransferSplitResponse {
    /// The dispatched record, now `waiting`.
    pub dispatched: TransferItem,
    /// The leftover record still `transferring`, when the dispatch was
    /// partial.
    pub remainder: Option<TransferItem>,
}

/// Mark part (or all) of a `transferring` record as dispatched.
///
/// The dispatched portion moves to `waiting` with its source and arrival
/// estimate; any remainder becomes a fresh `transferring` record.
#[instrument(skip(state, body))]
pub async fn split_item(
    State(state): State<AppState>,
    Path(id): Path<TransferItemId>,
    Json(body): Json<TransferSplitBody>,
) -> Result<Json<TransferSplitResponse>> {
    let transfers = TransferRepository::new(state.pool());

    let item = transfers
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("transfer {id}")))?;

    if item.status != TransferStatus::Transferring {
        return Err(AppError::BadRequest(format!(
            "only a transferring record can be dispatched (status is {})",
            item.status
        )));
    }
    if body.quantity < 1 || body.quantity > item.quantity {
        return Err(AppError::BadRequest(format!(
            "dispatched quantity must be between 1 and {}",
            item.quantity
        )));
    }

    let remainder_quantity = item.quantity - body.quantity;
    if remainder_quantity > 0 {
        transfers.set_quantity(id, body.quantity).await?;
    }

    let dispatched = transfers
        .update(
            id,
            &TransferUpdate {
                status: Some(TransferStatus::Waiting),
                transfer_from: Some(body.transfer_from.clone()),
                estimate_month: Some(body.estimate_month),
                estimate_day: Some(body.estimate_day),
            },
        )
        .await?;

    let remainder = if remainder_quantity > 0 {
        Some(
            transfers
                .insert(&item.split_remainder(remainder_quantity))
                .await?,
        )
    } else {
        None
    };

    tracing::info!(
        transfer_id = %id,
        dispatched = body.quantity,
        remainder = remainder_quantity,
        "Transfer dispatched"
    );
    Ok(Json(TransferSplitResponse {
        dispatched,
        remainder,
    }))
}

/// Body for a bulk delete.
#[derive(Debug, Deserialize)]
pub struct BulkDeleteBody {
    pub ids: Vec<TransferItemId>,
}

/// Response for a bulk delete.
#[derive(Debug, Serialize)]
pub struct BulkDeleteResponse {
    pub deleted: u64,
}

/// Delete a batch of transfer records.
#[instrument(skip(state, body))]
pub async fn bulk_delete(
    State(state): State<AppState>,
    Json(body): Json<BulkDeleteBody>,
) -> Result<Json<BulkDeleteResponse>> {
    if body.ids.is_empty() {
        return Err(AppError::BadRequest("no ids given".to_string()));
    }
    let deleted = TransferRepository::new(state.pool())
        .delete_many(&body.ids)
        .await?;
    Ok(Json(BulkDeleteResponse { deleted }))
}
