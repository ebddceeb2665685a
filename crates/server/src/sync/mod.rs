//! Order state reconciliation.
//!
//! Converges the local order mirror toward Shopify's authoritative state as
//! webhook notifications arrive, while preserving warehouse-only work (pick
//! and pack progress, transfer records) that has no upstream equivalent.
//!
//! The flow is split in three: [`diff`] computes a pure mutation plan from a
//! remote snapshot and the current local rows, [`store`] applies a plan
//! atomically, and [`engine`] dispatches notifications, fetches snapshots
//! and enrichment data, and wires the two together.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::shopify::ShopifyError;

pub mod diff;
pub mod engine;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::ReconciliationEngine;
pub use store::{FulfillmentStore, PgStore, StorePlan};

/// Errors from a reconciliation pass.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The durable store rejected a read or write. The pass aborts without
    /// committing a partial plan.
    #[error("storage failure: {0}")]
    Store(#[from] RepositoryError),

    /// A required upstream fetch failed. Enrichment failures are absorbed
    /// and never surface here.
    #[error("upstream failure: {0}")]
    Upstream(#[from] ShopifyError),

    /// The notification is missing required fields.
    #[error("invalid notification: {0}")]
    InvalidNotification(String),
}

/// What a reconciliation pass did, for logging and handler responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// A new local order was created.
    Created,
    /// An existing local order was diffed and repaired.
    Updated,
    /// The order reached a terminal state and was purged.
    Purged,
    /// Nothing to do (uncommitted edit, unknown order on a refund, ...).
    Skipped,
}
