//! Shared types for the Packhouse warehouse companion.
//!
//! This crate holds the vocabulary shared by every Packhouse binary:
//! type-safe entity IDs and the status enums for orders, line items and
//! transfer records. It deliberately contains no I/O; database support is
//! limited to optional sqlx trait impls behind the `postgres` feature.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::id::{
    BaseLineItemId, LineItemRowId, ProductId, ShopifyOrderId, TransferItemId, VariantId,
};
pub use types::status::{
    FulfillmentStatus, OrderWorkflowStatus, PackStatus, PickStatus, TransferStatus,
};
