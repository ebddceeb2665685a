//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                              - Health check
//!
//! # Webhooks (Shopify)
//! POST /webhooks/orders/create              - orders/create
//! POST /webhooks/orders/updated             - orders/updated
//! POST /webhooks/orders/cancelled           - orders/cancelled
//! POST /webhooks/orders/fulfilled           - orders/fulfilled
//! POST /webhooks/order-edits/complete       - order_edits/complete
//! POST /webhooks/refunds/create             - refunds/create
//!
//! # Picker
//! GET   /api/picker/items                   - List pickable rows
//! PATCH /api/picker/items/{id}/status       - Set pick status
//! POST  /api/picker/items/{id}/split        - Split into picked + missing
//!
//! # Packer
//! GET    /api/packer/orders                 - List orders with context
//! GET    /api/packer/orders/{id}            - Order detail
//! PATCH  /api/packer/orders/{id}/status     - Set workflow status
//! PATCH  /api/packer/orders/{id}/note       - Set packer note
//! POST   /api/packer/orders/{id}/complete   - Record box type + weight
//! DELETE /api/packer/orders/{id}            - Hard-delete from the app
//! PATCH  /api/packer/items/{id}/pack-status - Set pack status
//! PATCH  /api/packer/items/{id}/weight      - Confirm weight, push to Shopify
//!
//! # Transfer
//! GET   /api/transfer/items                 - List transfer records
//! PATCH /api/transfer/items/{id}            - Update lifecycle fields
//! POST  /api/transfer/items/{id}/split      - Dispatch part of a record
//! POST  /api/transfer/items/bulk-delete     - Delete a batch
//! ```

pub mod packer;
pub mod picker;
pub mod transfer;
pub mod webhooks;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

/// Create the webhook routes router.
pub fn webhook_routes() -> Router<AppState> {
    Router::new()
        .route("/orders/create", post(webhooks::order_created))
        .route("/orders/updated", post(webhooks::order_updated))
        .route("/orders/cancelled", post(webhooks::order_cancelled))
        .route("/orders/fulfilled", post(webhooks::order_fulfilled))
        .route("/order-edits/complete", post(webhooks::order_edit_complete))
        .route("/refunds/create", post(webhooks::refund_created))
}

/// Create the picker routes router.
pub fn picker_routes() -> Router<AppState> {
    Router::new()
        .route("/items", get(picker::list_items))
        .route("/items/{id}/status", patch(picker::set_pick_status))
        .route("/items/{id}/split", post(picker::split_item))
}

/// Create the packer routes router.
pub fn packer_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(packer::list_orders))
        .route(
            "/orders/{id}",
            get(packer::get_order).delete(packer::delete_order),
        )
        .route("/orders/{id}/status", patch(packer::set_order_status))
        .route("/orders/{id}/note", patch(packer::set_packer_note))
        .route("/orders/{id}/complete", post(packer::complete_order))
        .route("/items/{id}/pack-status", patch(packer::set_pack_status))
        .route("/items/{id}/weight", patch(packer::set_weight))
}

/// Create the transfer routes router.
pub fn transfer_routes() -> Router<AppState> {
    Router::new()
        .route("/items", get(transfer::list_items))
        .route("/items/{id}", patch(transfer::update_item))
        .route("/items/{id}/split", post(transfer::split_item))
        .route("/items/bulk-delete", post(transfer::bulk_delete))
}

/// Create all routes for the server.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/webhooks", webhook_routes())
        .nest("/api/picker", picker_routes())
        .nest("/api/packer", packer_routes())
        .nest("/api/transfer", transfer_routes())
}

/// Health check.
async fn health() -> &'static str {
    "ok"
}
