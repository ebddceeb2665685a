//! Canonical domain models.
//!
//! One record shape per entity, used by every route and by the
//! reconciliation engine; optional fields are explicit rather than
//! call-site-dependent.

pub mod line_item;
pub mod order;
pub mod transfer;

pub use line_item::{LineItem, NewLineItem};
pub use order::{
    MAX_PACKER_NOTE_LEN, NewOrder, Order, ShippingInfo, derive_workflow_status,
    validate_packer_note,
};
pub use transfer::{NewTransferItem, TransferItem, TransferUpdate};
