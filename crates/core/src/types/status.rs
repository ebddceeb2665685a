//! Status enums for orders, line items and transfer records.
//!
//! Every enum stores as lowercase text in Postgres; `as_str`/`FromStr` are
//! the single source of truth for that mapping. Unknown stored values are a
//! data-corruption condition surfaced by the repositories, never a panic.

use serde::{Deserialize, Serialize};

/// Order fulfillment status as mirrored from Shopify.
///
/// Shopify's order webhooks carry `null` for unfulfilled orders; the
/// payload layer maps that to [`FulfillmentStatus::Unfulfilled`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentStatus {
    /// No items have been fulfilled.
    #[default]
    Unfulfilled,
    /// Some items have been fulfilled.
    Partial,
    /// All items have been fulfilled.
    Fulfilled,
}

impl FulfillmentStatus {
    /// Stable string form, matching the stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unfulfilled => "unfulfilled",
            Self::Partial => "partial",
            Self::Fulfilled => "fulfilled",
        }
    }
}

impl std::fmt::Display for FulfillmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FulfillmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unfulfilled" => Ok(Self::Unfulfilled),
            "partial" => Ok(Self::Partial),
            "fulfilled" => Ok(Self::Fulfilled),
            _ => Err(format!("invalid fulfillment status: {s}")),
        }
    }
}

/// Warehouse-side workflow status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderWorkflowStatus {
    /// Order is being packed.
    #[default]
    Packing,
    /// Order is waiting on a stock transfer.
    Waiting,
    /// Order is held back by staff.
    Holding,
    /// Order is packed and ready to ship.
    Ready,
}

impl OrderWorkflowStatus {
    /// Stable string form, matching the stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Packing => "packing",
            Self::Waiting => "waiting",
            Self::Holding => "holding",
            Self::Ready => "ready",
        }
    }
}

impl std::fmt::Display for OrderWorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderWorkflowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "packing" => Ok(Self::Packing),
            "waiting" => Ok(Self::Waiting),
            "holding" => Ok(Self::Holding),
            "ready" => Ok(Self::Ready),
            _ => Err(format!("invalid order workflow status: {s}")),
        }
    }
}

/// Pick-stage status of a single line item row.
///
/// Orthogonal to [`PackStatus`]; reconciliation never touches either on
/// rows it does not insert or delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PickStatus {
    /// Not yet picked.
    #[default]
    Picking,
    /// Reported missing by a picker; a transfer record tracks it.
    Missing,
    /// Picked from the shelf.
    Picked,
}

impl PickStatus {
    /// Stable string form, matching the stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Picking => "picking",
            Self::Missing => "missing",
            Self::Picked => "picked",
        }
    }
}

impl std::fmt::Display for PickStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PickStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "picking" => Ok(Self::Picking),
            "missing" => Ok(Self::Missing),
            "picked" => Ok(Self::Picked),
            _ => Err(format!("invalid pick status: {s}")),
        }
    }
}

/// Pack-stage status of a single line item row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PackStatus {
    /// Not yet packed.
    #[default]
    Packing,
    /// Packed and ready.
    Ready,
}

impl PackStatus {
    /// Stable string form, matching the stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Packing => "packing",
            Self::Ready => "ready",
        }
    }
}

impl std::fmt::Display for PackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PackStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "packing" => Ok(Self::Packing),
            "ready" => Ok(Self::Ready),
            _ => Err(format!("invalid pack status: {s}")),
        }
    }
}

/// Lifecycle status of a transfer record.
///
/// `Transferring → Waiting → Received`, with `Found` as an alternate
/// terminal reached when the stock turns up without a transfer. Only
/// `Transferring`-stage records are ever deleted by reconciliation; the
/// later stages represent warehouse commitments that survive Shopify-side
/// edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    /// Transfer requested, not yet dispatched.
    #[default]
    Transferring,
    /// Dispatched from another location; carries source and estimate.
    Waiting,
    /// Stock located locally without a transfer.
    Found,
    /// Transfer arrived at the warehouse.
    Received,
}

impl TransferStatus {
    /// Stable string form, matching the stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transferring => "transferring",
            Self::Waiting => "waiting",
            Self::Found => "found",
            Self::Received => "received",
        }
    }

    /// Whether this stage may still be discarded by reconciliation.
    ///
    /// Anything past `Transferring` is a warehouse commitment.
    #[must_use]
    pub const fn is_discardable(self) -> bool {
        matches!(self, Self::Transferring)
    }
}

impl std::fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransferStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transferring" => Ok(Self::Transferring),
            "waiting" => Ok(Self::Waiting),
            "found" => Ok(Self::Found),
            "received" => Ok(Self::Received),
            _ => Err(format!("invalid transfer status: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_fulfillment_status_parse() {
        assert_eq!(
            FulfillmentStatus::from_str("partial"),
            Ok(FulfillmentStatus::Partial)
        );
        assert!(FulfillmentStatus::from_str("PARTIAL").is_err());
        assert!(FulfillmentStatus::from_str("").is_err());
    }

    #[test]
    fn test_transfer_status_discardable() {
        assert!(TransferStatus::Transferring.is_discardable());
        assert!(!TransferStatus::Waiting.is_discardable());
        assert!(!TransferStatus::Found.is_discardable());
        assert!(!TransferStatus::Received.is_discardable());
    }

    #[test]
    fn test_display_matches_as_str() {
        assert_eq!(OrderWorkflowStatus::Holding.to_string(), "holding");
        assert_eq!(PickStatus::Missing.to_string(), "missing");
        assert_eq!(PackStatus::Ready.to_string(), "ready");
    }
}
