//! Pure diff planning for reconciliation passes.
//!
//! Everything here is side-effect free: given a remote snapshot (or refund
//! notice) and the current local rows, produce the mutation plan the store
//! applies atomically. Keeping planning pure makes the convergence rules
//! testable without a database.
//!
//! The rules:
//! - Refunded quantity is folded out first; a remote line item whose active
//!   quantity is zero or negative is treated as absent.
//! - An increase inserts a new split fragment at the difference. Existing
//!   rows are never grown, so pick and pack progress on them is untouched.
//! - A decrease consumes rows newest-created-first: the oldest row is most
//!   likely already picked or transferred and is disturbed last. Rows shrink
//!   to the remainder or are deleted; a row never persists at zero.
//! - A local group absent from the active list is removed outright.

use std::collections::HashMap;

use packhouse_core::{BaseLineItemId, LineItemRowId};

use crate::models::LineItem;
use crate::shopify::types::{LineItemPayload, OrderPayload, RefundLineItemPayload};

/// A remote line item with refunds folded out. Active quantity is always
/// positive; zero-quantity items never make the list.
#[derive(Debug)]
pub struct ActiveLine<'a> {
    /// The remote line item payload.
    pub payload: &'a LineItemPayload,
    /// Remote quantity minus all refunded quantity.
    pub quantity: i64,
}

/// Fold a snapshot's refunds into its line item list, producing the active
/// remote line item list for this pass.
#[must_use]
pub fn fold_refunds(snapshot: &OrderPayload) -> Vec<ActiveLine<'_>> {
    let mut refunded: HashMap<BaseLineItemId, i64> = HashMap::new();
    for refund in &snapshot.refunds {
        for line in &refund.refund_line_items {
            *refunded.entry(line.line_item_id).or_default() += line.quantity;
        }
    }

    snapshot
        .line_items
        .iter()
        .filter_map(|item| {
            let active = item.quantity - refunded.get(&item.id).copied().unwrap_or(0);
            (active > 0).then_some(ActiveLine {
                payload: item,
                quantity: active,
            })
        })
        .collect()
}

/// A planned insert: a new row for `payload` at `quantity`, pending
/// enrichment.
#[derive(Debug)]
pub struct PlannedInsert<'a> {
    /// Remote line item the new row mirrors.
    pub payload: &'a LineItemPayload,
    /// Quantity for the new row (full active quantity for a new item, the
    /// positive difference for an increase).
    pub quantity: i64,
}

/// The mutation plan for one update pass.
#[derive(Debug, Default)]
pub struct DiffPlan<'a> {
    /// New rows to insert, pending enrichment.
    pub inserts: Vec<PlannedInsert<'a>>,
    /// Rows to shrink to a new quantity.
    pub shrinks: Vec<(LineItemRowId, i64)>,
    /// Rows to delete.
    pub deletes: Vec<LineItemRowId>,
    /// Post-pass total active quantity for the order.
    pub total_quantity: i64,
}

/// Plan the repair of `local` rows toward the `active` remote list.
#[must_use]
pub fn plan_update<'a>(active: &[ActiveLine<'a>], local: &[LineItem]) -> DiffPlan<'a> {
    let mut plan = DiffPlan::default();
    let mut groups = group_by_base(local);

    for line in active {
        plan.total_quantity += line.quantity;

        match groups.remove(&line.payload.id) {
            None => plan.inserts.push(PlannedInsert {
                payload: line.payload,
                quantity: line.quantity,
            }),
            Some(rows) => {
                let local_sum: i64 = rows.iter().map(|r| r.quantity).sum();
                if local_sum < line.quantity {
                    plan.inserts.push(PlannedInsert {
                        payload: line.payload,
                        quantity: line.quantity - local_sum,
                    });
                } else if local_sum > line.quantity {
                    consume_excess(&rows, local_sum - line.quantity, &mut plan);
                }
            }
        }
    }

    // Groups with no active remote counterpart are removed outright.
    for rows in groups.into_values() {
        plan.deletes.extend(rows.iter().map(|r| r.id));
    }

    plan
}

/// Plan the application of a refund's (line item, quantity) pairs against
/// `local` rows, without a full snapshot.
///
/// When the notice embeds the ordered quantity, the excess to remove is
/// computed against the expected active quantity (ordered minus refunded),
/// so a replayed refund — or one an update snapshot already folded in —
/// finds no excess and becomes a no-op. Without the embedded quantity the
/// refunded amount is removed outright.
#[must_use]
pub fn plan_refund<'a>(
    refund_lines: &[RefundLineItemPayload],
    local: &[LineItem],
) -> DiffPlan<'a> {
    #[derive(Default)]
    struct Target {
        refunded: i64,
        ordered: Option<i64>,
    }

    let mut plan = DiffPlan::default();
    let groups = group_by_base(local);

    // A refund may arrive as several entries for the same line item.
    let mut targets: HashMap<BaseLineItemId, Target> = HashMap::new();
    for line in refund_lines {
        let target = targets.entry(line.line_item_id).or_default();
        target.refunded += line.quantity;
        if let Some(item) = &line.line_item {
            target.ordered = Some(item.quantity);
        }
    }

    let mut removed: i64 = 0;
    for (base_id, target) in targets {
        let Some(rows) = groups.get(&base_id) else {
            // No matching rows: the refund is already reflected locally.
            continue;
        };
        let local_sum: i64 = rows.iter().map(|r| r.quantity).sum();
        let excess = match target.ordered {
            Some(ordered) => {
                (local_sum - (ordered - target.refunded)).clamp(0, target.refunded)
            }
            None => target.refunded,
        };
        removed += consume_excess(rows, excess, &mut plan);
    }

    let local_sum: i64 = local.iter().map(|r| r.quantity).sum();
    plan.total_quantity = local_sum - removed;
    plan
}

/// Group local rows by base remote ID, each group ordered newest-created
/// first (creation time, then row ID, descending).
fn group_by_base(local: &[LineItem]) -> HashMap<BaseLineItemId, Vec<&LineItem>> {
    let mut groups: HashMap<BaseLineItemId, Vec<&LineItem>> = HashMap::new();
    for item in local {
        groups.entry(item.base_line_item_id).or_default().push(item);
    }
    for rows in groups.values_mut() {
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
    }
    groups
}

/// Remove `excess` quantity from `rows` (already newest-first): delete rows
/// that fit entirely in the remaining excess, shrink the first one that
/// does not, then stop. Returns how much was actually removed.
fn consume_excess(rows: &[&LineItem], excess: i64, plan: &mut DiffPlan<'_>) -> i64 {
    let mut remaining = excess;
    for row in rows {
        if remaining == 0 {
            break;
        }
        if row.quantity <= remaining {
            plan.deletes.push(row.id);
            remaining -= row.quantity;
        } else {
            plan.shrinks.push((row.id, row.quantity - remaining));
            remaining = 0;
        }
    }
    excess - remaining
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use packhouse_core::{PackStatus, PickStatus, ShopifyOrderId};
    use rust_decimal::Decimal;

    fn remote_item(id: i64, quantity: i64) -> LineItemPayload {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "quantity": quantity,
            "title": "Tee",
            "vendor": "Acme",
        }))
        .expect("valid payload")
    }

    fn snapshot(items: Vec<LineItemPayload>, refunds: Vec<(i64, i64)>) -> OrderPayload {
        let mut payload: OrderPayload = serde_json::from_value(serde_json::json!({
            "id": 1,
            "order_number": 1001,
            "name": "#1001",
            "created_at": "2026-01-09T10:00:00Z",
        }))
        .expect("valid payload");
        payload.line_items = items;
        payload.refunds = vec![crate::shopify::types::RefundPayload {
            refund_line_items: refunds
                .into_iter()
                .map(|(id, quantity)| RefundLineItemPayload {
                    line_item_id: BaseLineItemId::new(id),
                    quantity,
                    line_item: None,
                })
                .collect(),
        }];
        payload
    }

    /// Local row with `age` controlling creation order: higher = older.
    fn local_row(row_id: i64, base_id: i64, quantity: i64, age: i64) -> LineItem {
        let now = Utc::now();
        LineItem {
            id: LineItemRowId::new(row_id),
            shopify_order_id: ShopifyOrderId::new(1),
            order_number: "1001".into(),
            base_line_item_id: BaseLineItemId::new(base_id),
            quantity,
            title: String::new(),
            name: String::new(),
            brand: String::new(),
            size: String::new(),
            image_url: String::new(),
            sku: String::new(),
            url_handle: String::new(),
            product_type: String::new(),
            variant_title: String::new(),
            weight: Decimal::ZERO,
            weight_unit: "g".into(),
            weight_needs_confirmation: false,
            pick_status: PickStatus::Picking,
            pack_status: PackStatus::Packing,
            created_at: now - Duration::minutes(age),
            updated_at: now,
        }
    }

    fn refund_lines(pairs: &[(i64, i64)]) -> Vec<RefundLineItemPayload> {
        pairs
            .iter()
            .map(|&(id, quantity)| RefundLineItemPayload {
                line_item_id: BaseLineItemId::new(id),
                quantity,
                line_item: None,
            })
            .collect()
    }

    /// Refund entries carrying the embedded ordered quantity, as real
    /// `refunds/create` bodies do.
    fn refund_lines_with_ordered(pairs: &[(i64, i64, i64)]) -> Vec<RefundLineItemPayload> {
        pairs
            .iter()
            .map(|&(id, quantity, ordered)| RefundLineItemPayload {
                line_item_id: BaseLineItemId::new(id),
                quantity,
                line_item: Some(crate::shopify::types::RefundedLineItemPayload {
                    quantity: ordered,
                }),
            })
            .collect()
    }

    #[test]
    fn test_fold_refunds_excludes_fully_refunded() {
        let snap = snapshot(
            vec![remote_item(100, 5), remote_item(200, 2)],
            vec![(100, 2), (200, 2)],
        );
        let active = fold_refunds(&snap);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].payload.id, BaseLineItemId::new(100));
        assert_eq!(active[0].quantity, 3);
    }

    #[test]
    fn test_fold_refunds_sums_across_refund_entries() {
        let mut snap = snapshot(vec![remote_item(100, 5)], vec![(100, 1)]);
        snap.refunds.push(crate::shopify::types::RefundPayload {
            refund_line_items: refund_lines(&[(100, 2)]),
        });
        let active = fold_refunds(&snap);
        assert_eq!(active[0].quantity, 2);
    }

    #[test]
    fn test_new_item_inserted_at_active_quantity() {
        let snap = snapshot(vec![remote_item(100, 5)], vec![]);
        let active = fold_refunds(&snap);
        let plan = plan_update(&active, &[]);
        assert_eq!(plan.inserts.len(), 1);
        assert_eq!(plan.inserts[0].quantity, 5);
        assert!(plan.shrinks.is_empty());
        assert!(plan.deletes.is_empty());
        assert_eq!(plan.total_quantity, 5);
    }

    #[test]
    fn test_increase_inserts_fragment_not_mutation() {
        let snap = snapshot(vec![remote_item(100, 7)], vec![]);
        let active = fold_refunds(&snap);
        let local = vec![local_row(1, 100, 3, 10), local_row(2, 100, 2, 5)];
        let plan = plan_update(&active, &local);
        assert_eq!(plan.inserts.len(), 1);
        assert_eq!(plan.inserts[0].quantity, 2);
        assert!(plan.shrinks.is_empty());
        assert!(plan.deletes.is_empty());
    }

    #[test]
    fn test_equal_quantities_is_noop() {
        let snap = snapshot(vec![remote_item(100, 5)], vec![]);
        let active = fold_refunds(&snap);
        let local = vec![local_row(1, 100, 3, 10), local_row(2, 100, 2, 5)];
        let plan = plan_update(&active, &local);
        assert!(plan.inserts.is_empty());
        assert!(plan.shrinks.is_empty());
        assert!(plan.deletes.is_empty());
        assert_eq!(plan.total_quantity, 5);
    }

    #[test]
    fn test_decrease_consumes_newest_row_first() {
        // Rows 3 (older) and 2 (newer); remote drops 5 -> 4. The newer row
        // shrinks to 1, the older row is untouched.
        let snap = snapshot(vec![remote_item(100, 4)], vec![]);
        let active = fold_refunds(&snap);
        let local = vec![local_row(1, 100, 3, 10), local_row(2, 100, 2, 5)];
        let plan = plan_update(&active, &local);
        assert!(plan.inserts.is_empty());
        assert!(plan.deletes.is_empty());
        assert_eq!(plan.shrinks, vec![(LineItemRowId::new(2), 1)]);
    }

    #[test]
    fn test_decrease_deletes_then_shrinks() {
        // 3 + 2 with the quantity-2 row newer; dropping to 1 deletes the
        // newer row and shrinks the older one.
        let snap = snapshot(vec![remote_item(100, 1)], vec![]);
        let active = fold_refunds(&snap);
        let local = vec![local_row(1, 100, 3, 10), local_row(2, 100, 2, 5)];
        let plan = plan_update(&active, &local);
        assert_eq!(plan.deletes, vec![LineItemRowId::new(2)]);
        assert_eq!(plan.shrinks, vec![(LineItemRowId::new(1), 1)]);
    }

    #[test]
    fn test_decrease_never_leaves_zero_quantity_row() {
        // Exact fit: the whole newer row is consumed, so it must be deleted
        // rather than shrunk to zero.
        let snap = snapshot(vec![remote_item(100, 3)], vec![]);
        let active = fold_refunds(&snap);
        let local = vec![local_row(1, 100, 3, 10), local_row(2, 100, 2, 5)];
        let plan = plan_update(&active, &local);
        assert_eq!(plan.deletes, vec![LineItemRowId::new(2)]);
        assert!(plan.shrinks.is_empty());
    }

    #[test]
    fn test_absent_group_removed_entirely() {
        let snap = snapshot(vec![remote_item(200, 1)], vec![]);
        let active = fold_refunds(&snap);
        let local = vec![local_row(1, 100, 3, 10), local_row(2, 100, 2, 5)];
        let plan = plan_update(&active, &local);
        assert_eq!(plan.inserts.len(), 1);
        let mut deletes = plan.deletes.clone();
        deletes.sort();
        assert_eq!(deletes, vec![LineItemRowId::new(1), LineItemRowId::new(2)]);
        assert_eq!(plan.total_quantity, 1);
    }

    #[test]
    fn test_update_plan_is_idempotent_at_convergence() {
        // Once local matches the active list, replanning the same snapshot
        // produces an empty plan.
        let snap = snapshot(vec![remote_item(100, 4)], vec![(100, 1)]);
        let active = fold_refunds(&snap);
        let local = vec![local_row(1, 100, 3, 10)];
        let plan = plan_update(&active, &local);
        assert!(plan.inserts.is_empty());
        assert!(plan.shrinks.is_empty());
        assert!(plan.deletes.is_empty());
        assert_eq!(plan.total_quantity, 3);
    }

    #[test]
    fn test_refund_shrinks_newest_first() {
        let local = vec![local_row(1, 100, 3, 10), local_row(2, 100, 2, 5)];
        let plan = plan_refund(&refund_lines(&[(100, 1)]), &local);
        assert_eq!(plan.shrinks, vec![(LineItemRowId::new(2), 1)]);
        assert!(plan.deletes.is_empty());
        assert_eq!(plan.total_quantity, 4);
    }

    #[test]
    fn test_refund_for_unknown_line_item_is_noop() {
        let local = vec![local_row(1, 100, 3, 10)];
        let plan = plan_refund(&refund_lines(&[(999, 2)]), &local);
        assert!(plan.shrinks.is_empty());
        assert!(plan.deletes.is_empty());
        assert_eq!(plan.total_quantity, 3);
    }

    #[test]
    fn test_refund_exceeding_local_quantity_removes_group_only() {
        // Upstream already reflects part of the refund locally; removing
        // more than exists deletes the group and stops, never going
        // negative.
        let local = vec![local_row(1, 100, 2, 10)];
        let plan = plan_refund(&refund_lines(&[(100, 5)]), &local);
        assert_eq!(plan.deletes, vec![LineItemRowId::new(1)]);
        assert!(plan.shrinks.is_empty());
        assert_eq!(plan.total_quantity, 0);
    }

    #[test]
    fn test_refund_with_ordered_quantity_removes_excess() {
        // Ordered 5, refunding 2, local still at 5: remove 2.
        let local = vec![local_row(1, 100, 5, 10)];
        let plan = plan_refund(&refund_lines_with_ordered(&[(100, 2, 5)]), &local);
        assert_eq!(plan.shrinks, vec![(LineItemRowId::new(1), 3)]);
        assert_eq!(plan.total_quantity, 3);
    }

    #[test]
    fn test_refund_replay_with_ordered_quantity_is_noop() {
        // Local already reflects the refund (5 ordered, 2 refunded, 3
        // left): no excess remains.
        let local = vec![local_row(1, 100, 3, 10)];
        let plan = plan_refund(&refund_lines_with_ordered(&[(100, 2, 5)]), &local);
        assert!(plan.shrinks.is_empty());
        assert!(plan.deletes.is_empty());
        assert_eq!(plan.total_quantity, 3);
    }

    #[test]
    fn test_refund_excess_capped_at_refunded_quantity() {
        // Local is above the ordered quantity (stale increase); the refund
        // pass still never removes more than it refunded.
        let local = vec![local_row(1, 100, 9, 10)];
        let plan = plan_refund(&refund_lines_with_ordered(&[(100, 2, 5)]), &local);
        assert_eq!(plan.shrinks, vec![(LineItemRowId::new(1), 7)]);
    }

    #[test]
    fn test_refund_duplicate_entries_summed() {
        let local = vec![local_row(1, 100, 5, 10)];
        let plan = plan_refund(&refund_lines(&[(100, 1), (100, 2)]), &local);
        assert_eq!(plan.shrinks, vec![(LineItemRowId::new(1), 2)]);
        assert_eq!(plan.total_quantity, 2);
    }

    #[test]
    fn test_quantity_conservation_across_plan() {
        // Mixed pass: one increase, one decrease, one removal, one new
        // item. Total equals the sum of active quantities.
        let snap = snapshot(
            vec![remote_item(100, 6), remote_item(200, 1), remote_item(400, 2)],
            vec![],
        );
        let active = fold_refunds(&snap);
        let local = vec![
            local_row(1, 100, 3, 10),
            local_row(2, 100, 1, 5),
            local_row(3, 200, 4, 10),
            local_row(4, 300, 2, 10),
        ];
        let plan = plan_update(&active, &local);
        assert_eq!(plan.total_quantity, 9);

        // Increase on 100 inserts a fragment of 2; decrease on 200 deletes
        // then nothing to shrink (4 -> 1 shrinks row 3); 300 removed; 400
        // inserted fresh.
        let insert_total: i64 = plan.inserts.iter().map(|i| i.quantity).sum();
        assert_eq!(insert_total, 4);
        assert_eq!(plan.shrinks, vec![(LineItemRowId::new(3), 1)]);
        assert!(plan.deletes.contains(&LineItemRowId::new(4)));
    }
}
