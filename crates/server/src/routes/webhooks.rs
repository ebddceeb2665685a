//! Shopify webhook handlers.
//!
//! Each handler hands its payload to the reconciliation engine and answers
//! with a bare status code: Shopify redelivers on non-2xx, and engine
//! idempotence makes those redeliveries safe.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use packhouse_core::ShopifyOrderId;

use crate::error::Result;
use crate::shopify::types::{OrderEditNotice, OrderPayload, RefundNotice};
use crate::state::AppState;

/// Minimal body for webhooks where only the order identity matters.
#[derive(Debug, Deserialize)]
pub struct OrderRef {
    /// Remote order ID.
    pub id: ShopifyOrderId,
}

/// `order_edits/complete` bodies arrive either flat or wrapped in an
/// `order_edit` object depending on the API version.
#[derive(Debug, Deserialize)]
pub struct OrderEditWebhook {
    #[serde(default)]
    order_edit: Option<OrderEditNotice>,
    #[serde(flatten)]
    flat: OrderEditNotice,
}

impl OrderEditWebhook {
    fn into_notice(self) -> OrderEditNotice {
        self.order_edit.unwrap_or(self.flat)
    }
}

/// Handle `orders/create`.
#[instrument(skip_all, fields(order_id = %snapshot.id))]
pub async fn order_created(
    State(state): State<AppState>,
    Json(snapshot): Json<OrderPayload>,
) -> Result<StatusCode> {
    state.engine().order_created(&snapshot).await?;
    Ok(StatusCode::OK)
}

/// Handle `orders/updated`.
#[instrument(skip_all, fields(order_id = %snapshot.id))]
pub async fn order_updated(
    State(state): State<AppState>,
    Json(snapshot): Json<OrderPayload>,
) -> Result<StatusCode> {
    state.engine().order_updated(&snapshot).await?;
    Ok(StatusCode::OK)
}

/// Handle `orders/cancelled`.
#[instrument(skip_all, fields(order_id = %order.id))]
pub async fn order_cancelled(
    State(state): State<AppState>,
    Json(order): Json<OrderRef>,
) -> Result<StatusCode> {
    state.engine().order_cancelled(order.id).await?;
    Ok(StatusCode::OK)
}

/// Handle `orders/fulfilled`.
#[instrument(skip_all, fields(order_id = %order.id))]
pub async fn order_fulfilled(
    State(state): State<AppState>,
    Json(order): Json<OrderRef>,
) -> Result<StatusCode> {
    state.engine().order_fulfilled(order.id).await?;
    Ok(StatusCode::OK)
}

/// Handle `order_edits/complete`.
#[instrument(skip_all)]
pub async fn order_edit_complete(
    State(state): State<AppState>,
    Json(body): Json<OrderEditWebhook>,
) -> Result<StatusCode> {
    state.engine().order_edit_committed(&body.into_notice()).await?;
    Ok(StatusCode::OK)
}

/// Handle `refunds/create`.
#[instrument(skip_all, fields(order_id = %notice.order_id))]
pub async fn refund_created(
    State(state): State<AppState>,
    Json(notice): Json<RefundNotice>,
) -> Result<StatusCode> {
    state.engine().refund_created(&notice).await?;
    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_webhook_flat_and_wrapped() {
        let flat: OrderEditWebhook = serde_json::from_str(
            r#"{"order_id": 7, "committed_at": "2026-01-09T10:00:00Z"}"#,
        )
        .expect("deserialize");
        let notice = flat.into_notice();
        assert_eq!(notice.order_id, Some(ShopifyOrderId::new(7)));
        assert!(notice.committed_at.is_some());

        let wrapped: OrderEditWebhook = serde_json::from_str(
            r#"{"order_edit": {"order_id": 7, "committed_at": "2026-01-09T10:00:00Z"}}"#,
        )
        .expect("deserialize");
        assert_eq!(wrapped.into_notice().order_id, Some(ShopifyOrderId::new(7)));
    }
}
