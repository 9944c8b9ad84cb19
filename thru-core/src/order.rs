//! Order aggregation and the vendor-portion status machine.
//!
//! [`OrderAggregator`] rolls an [`AssignmentPlan`] into a persisted
//! [`FinalOrder`]: one status-bearing portion per vendor, a grand total
//! including platform fees, and a single idempotent write to the order
//! store. Portion status transitions are driven later by the asynchronous
//! vendor-response workflow; this module only defines and enforces the
//! legal moves.

use std::time::{Duration, SystemTime};

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::plan::{AssignmentPlan, VendorPlanEntry};
use crate::store::{OrderStore, OrderStoreError};

/// How long vendors get to react to a new order before it expires.
pub const VENDOR_RESPONSE_DEADLINE: Duration = Duration::from_secs(5 * 60);

/// Platform charges applied on top of vendor subtotals.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FeeSchedule {
    /// Flat platform fee per order.
    pub platform_fee: f64,
    /// Payment gateway fee per order.
    pub gateway_fee: f64,
}

/// Lifecycle of one vendor's portion of an order.
///
/// `New → Preparing → ReadyForPickup → PickedUp`, with `Cancelled`
/// reachable from `New` and `Preparing`. `PickedUp` and `Cancelled` are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PortionStatus {
    /// Awaiting the vendor's first reaction.
    New,
    /// The vendor accepted and is picking the items.
    Preparing,
    /// Ready for the customer to collect.
    ReadyForPickup,
    /// Collected; terminal.
    PickedUp,
    /// Rejected or withdrawn; terminal.
    Cancelled,
}

impl PortionStatus {
    /// Whether no further transitions are allowed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::PickedUp | Self::Cancelled)
    }

    /// Whether moving to `next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::New, Self::Preparing)
                | (Self::Preparing, Self::ReadyForPickup)
                | (Self::ReadyForPickup, Self::PickedUp)
                | (Self::New | Self::Preparing, Self::Cancelled)
        )
    }
}

/// Overall order status, derived from the portion statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OrderStatus {
    /// No vendor has reacted yet.
    New,
    /// At least one vendor is working the order.
    InProgress,
    /// At least one portion awaits collection.
    ReadyForPickup,
    /// Every surviving portion was collected; terminal.
    Completed,
    /// Every portion was cancelled; terminal.
    Cancelled,
    /// No vendor responded within the deadline; terminal.
    CancelledNoResponse,
}

impl OrderStatus {
    /// Whether the order can still change.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Cancelled | Self::CancelledNoResponse
        )
    }
}

/// One item line within a vendor portion.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PortionItem {
    /// Item identifier.
    pub item_id: String,
    /// Display name captured at aggregation time.
    pub name: String,
    /// Units ordered from this vendor.
    pub quantity: u32,
    /// Unit price captured at aggregation time.
    pub unit_price: f64,
    /// Price × quantity.
    pub total_price: f64,
}

/// One vendor's share of a multi-vendor order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VendorPortion {
    /// Serving vendor id (synthetic vendors keep their generated id).
    pub vendor_id: String,
    /// Vendor display name.
    pub vendor_name: String,
    /// Current lifecycle state.
    pub status: PortionStatus,
    /// Items the vendor fulfils.
    pub items: Vec<PortionItem>,
    /// Sum of line totals.
    pub subtotal: f64,
}

/// A placed order. Created exactly once per successful aggregation and
/// immutable afterwards except for portion-status transitions.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FinalOrder {
    /// Opaque order identifier, supplied by the caller.
    pub order_id: String,
    /// Creation instant.
    pub created_at: SystemTime,
    /// Derived overall status.
    pub status: OrderStatus,
    /// One portion per vendor in the plan.
    pub portions: Vec<VendorPortion>,
    /// Platform fee applied.
    pub platform_fee: f64,
    /// Gateway fee applied.
    pub gateway_fee: f64,
    /// Vendor subtotals plus fees.
    pub grand_total: f64,
}

/// Errors applying a vendor response to an order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderUpdateError {
    /// The order has already reached a terminal status.
    #[error("order is closed and accepts no further updates")]
    OrderClosed,
    /// No portion belongs to the named vendor.
    #[error("order has no portion for vendor {vendor_id}")]
    UnknownVendor {
        /// The vendor that tried to respond.
        vendor_id: String,
    },
    /// The requested portion transition is illegal.
    #[error("portion for vendor {vendor_id} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        /// The responding vendor.
        vendor_id: String,
        /// Current portion status.
        from: PortionStatus,
        /// Requested portion status.
        to: PortionStatus,
    },
}

impl FinalOrder {
    /// Apply a vendor's status update and re-derive the order status.
    ///
    /// # Errors
    ///
    /// [`OrderUpdateError::OrderClosed`] once the order is terminal,
    /// [`OrderUpdateError::UnknownVendor`] for a vendor without a portion,
    /// and [`OrderUpdateError::InvalidTransition`] for an illegal move.
    pub fn apply_portion_status(
        &mut self,
        vendor_id: &str,
        next: PortionStatus,
    ) -> Result<(), OrderUpdateError> {
        if self.status.is_terminal() {
            return Err(OrderUpdateError::OrderClosed);
        }

        let portion = self
            .portions
            .iter_mut()
            .find(|portion| portion.vendor_id == vendor_id)
            .ok_or_else(|| OrderUpdateError::UnknownVendor {
                vendor_id: vendor_id.to_owned(),
            })?;

        if !portion.status.can_transition_to(next) {
            return Err(OrderUpdateError::InvalidTransition {
                vendor_id: vendor_id.to_owned(),
                from: portion.status,
                to: next,
            });
        }

        portion.status = next;
        self.status = derived_status(&self.portions);
        Ok(())
    }

    /// Whether the order is still waiting on a first vendor response past
    /// the deadline.
    #[must_use]
    pub fn is_response_overdue(&self, now: SystemTime) -> bool {
        self.status == OrderStatus::New
            && self
                .portions
                .iter()
                .all(|portion| portion.status == PortionStatus::New)
            && now
                .duration_since(self.created_at)
                .is_ok_and(|elapsed| elapsed > VENDOR_RESPONSE_DEADLINE)
    }

    /// Expire an order nobody responded to.
    ///
    /// Cancels every portion and marks the order
    /// [`OrderStatus::CancelledNoResponse`]. Returns whether the order was
    /// expired by this call.
    pub fn cancel_if_unresponsive(&mut self, now: SystemTime) -> bool {
        if !self.is_response_overdue(now) {
            return false;
        }
        for portion in &mut self.portions {
            portion.status = PortionStatus::Cancelled;
        }
        self.status = OrderStatus::CancelledNoResponse;
        true
    }
}

fn derived_status(portions: &[VendorPortion]) -> OrderStatus {
    if portions
        .iter()
        .all(|p| p.status == PortionStatus::Cancelled)
    {
        return OrderStatus::Cancelled;
    }
    if portions
        .iter()
        .all(|p| matches!(p.status, PortionStatus::PickedUp | PortionStatus::Cancelled))
    {
        return OrderStatus::Completed;
    }
    if portions
        .iter()
        .any(|p| p.status == PortionStatus::ReadyForPickup)
    {
        return OrderStatus::ReadyForPickup;
    }
    if portions
        .iter()
        .any(|p| matches!(p.status, PortionStatus::Preparing | PortionStatus::PickedUp))
    {
        return OrderStatus::InProgress;
    }
    OrderStatus::New
}

/// Errors from [`OrderAggregator::aggregate`].
#[derive(Debug, Error)]
pub enum AggregateError {
    /// The plan holds no items at all; nothing is persisted.
    #[error("assignment plan holds no items")]
    EmptyPlan,
    /// Persisting the order failed; no partial write occurred.
    #[error("failed to persist order: {0}")]
    Store(#[from] OrderStoreError),
}

/// Rolls assignment plans into persisted orders.
pub struct OrderAggregator<S> {
    store: S,
    fees: FeeSchedule,
}

impl<S> OrderAggregator<S>
where
    S: OrderStore,
{
    /// Build an aggregator writing through `store` with `fees` applied.
    pub const fn new(store: S, fees: FeeSchedule) -> Self {
        Self { store, fees }
    }

    /// Roll `plan` into a [`FinalOrder`] and persist it.
    ///
    /// Empty entries are ignored; a plan with no items at all is rejected
    /// before anything touches the store. The write is a single idempotent
    /// insert: an id collision surfaces as
    /// [`OrderStoreError::Duplicate`] without a partial document.
    ///
    /// # Errors
    ///
    /// [`AggregateError::EmptyPlan`] when no entry holds items;
    /// [`AggregateError::Store`] when the write fails.
    pub fn aggregate(
        &self,
        plan: &AssignmentPlan,
        order_id: impl Into<String>,
        created_at: SystemTime,
    ) -> Result<FinalOrder, AggregateError> {
        let portions: Vec<VendorPortion> = plan
            .entries
            .iter()
            .filter(|entry| !entry.items.is_empty())
            .map(to_portion)
            .collect();
        if portions.is_empty() {
            return Err(AggregateError::EmptyPlan);
        }

        let subtotal: f64 = portions.iter().map(|portion| portion.subtotal).sum();
        let order = FinalOrder {
            order_id: order_id.into(),
            created_at,
            status: OrderStatus::New,
            portions,
            platform_fee: self.fees.platform_fee,
            gateway_fee: self.fees.gateway_fee,
            grand_total: subtotal + self.fees.platform_fee + self.fees.gateway_fee,
        };

        self.store.insert_order(&order)?;
        log::debug!(
            "persisted order {} across {} vendors, grand total {:.2}",
            order.order_id,
            order.portions.len(),
            order.grand_total
        );
        Ok(order)
    }
}

fn to_portion(entry: &VendorPlanEntry) -> VendorPortion {
    VendorPortion {
        vendor_id: entry.vendor.id().to_owned(),
        vendor_name: entry.vendor.name().to_owned(),
        status: PortionStatus::New,
        items: entry
            .items
            .iter()
            .map(|item| PortionItem {
                item_id: item.item_id.clone(),
                name: item.name.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                total_price: item.line_total(),
            })
            .collect(),
        subtotal: entry.subtotal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{PlanVendor, PlannedItem, SyntheticVendor, VendorPlanEntry};
    use crate::test_support::MemoryOrderStore;
    use rstest::{fixture, rstest};

    fn entry_with_items(vendor_id: &str, lines: &[(&str, u32, f64)]) -> VendorPlanEntry {
        let mut entry = VendorPlanEntry::new(PlanVendor::Synthetic(SyntheticVendor {
            id: vendor_id.into(),
            name: format!("Vendor {vendor_id}"),
            category: "grocery".into(),
            detour_km: 0.2,
        }));
        for (item_id, quantity, price) in lines {
            entry.push(PlannedItem {
                item_id: (*item_id).to_owned(),
                name: (*item_id).to_owned(),
                quantity: *quantity,
                unit_price: *price,
            });
        }
        entry
    }

    fn two_vendor_plan() -> AssignmentPlan {
        AssignmentPlan {
            entries: vec![
                entry_with_items("v1", &[("rice", 2, 80.0)]),
                entry_with_items("v2", &[("bandage", 1, 90.0)]),
            ],
            dropped: Vec::new(),
        }
    }

    #[fixture]
    fn aggregator() -> OrderAggregator<MemoryOrderStore> {
        OrderAggregator::new(
            MemoryOrderStore::default(),
            FeeSchedule {
                platform_fee: 10.0,
                gateway_fee: 5.0,
            },
        )
    }

    #[rstest]
    fn aggregate_totals_subtotals_and_fees(aggregator: OrderAggregator<MemoryOrderStore>) {
        let order = aggregator
            .aggregate(&two_vendor_plan(), "ORD-1", SystemTime::UNIX_EPOCH)
            .expect("plan with items aggregates");
        assert_eq!(order.portions.len(), 2);
        assert!((order.grand_total - 265.0).abs() < 1e-9);
        assert_eq!(order.status, OrderStatus::New);
        assert!(
            order
                .portions
                .iter()
                .all(|p| p.status == PortionStatus::New)
        );
    }

    #[rstest]
    fn empty_plan_is_rejected_without_a_write(aggregator: OrderAggregator<MemoryOrderStore>) {
        let plan = AssignmentPlan::default();
        let error = aggregator
            .aggregate(&plan, "ORD-1", SystemTime::UNIX_EPOCH)
            .expect_err("empty plan must fail");
        assert!(matches!(error, AggregateError::EmptyPlan));
    }

    #[rstest]
    fn plan_with_only_empty_entries_is_rejected(aggregator: OrderAggregator<MemoryOrderStore>) {
        let plan = AssignmentPlan {
            entries: vec![entry_with_items("v1", &[])],
            dropped: Vec::new(),
        };
        let error = aggregator
            .aggregate(&plan, "ORD-1", SystemTime::UNIX_EPOCH)
            .expect_err("item-less plan must fail");
        assert!(matches!(error, AggregateError::EmptyPlan));
    }

    #[rstest]
    fn duplicate_order_id_surfaces_without_partial_write(
        aggregator: OrderAggregator<MemoryOrderStore>,
    ) {
        let plan = two_vendor_plan();
        aggregator
            .aggregate(&plan, "ORD-1", SystemTime::UNIX_EPOCH)
            .expect("first write succeeds");
        let error = aggregator
            .aggregate(&plan, "ORD-1", SystemTime::UNIX_EPOCH)
            .expect_err("second write with same id must fail");
        assert!(matches!(
            error,
            AggregateError::Store(OrderStoreError::Duplicate { .. })
        ));
    }

    #[rstest]
    #[case(PortionStatus::New, PortionStatus::Preparing, true)]
    #[case(PortionStatus::Preparing, PortionStatus::ReadyForPickup, true)]
    #[case(PortionStatus::ReadyForPickup, PortionStatus::PickedUp, true)]
    #[case(PortionStatus::New, PortionStatus::Cancelled, true)]
    #[case(PortionStatus::Preparing, PortionStatus::Cancelled, true)]
    #[case(PortionStatus::New, PortionStatus::ReadyForPickup, false)]
    #[case(PortionStatus::ReadyForPickup, PortionStatus::Cancelled, false)]
    #[case(PortionStatus::PickedUp, PortionStatus::Preparing, false)]
    #[case(PortionStatus::Cancelled, PortionStatus::New, false)]
    fn portion_transitions_follow_the_machine(
        #[case] from: PortionStatus,
        #[case] to: PortionStatus,
        #[case] legal: bool,
    ) {
        assert_eq!(from.can_transition_to(to), legal);
    }

    fn placed_order(aggregator: &OrderAggregator<MemoryOrderStore>) -> FinalOrder {
        aggregator
            .aggregate(&two_vendor_plan(), "ORD-1", SystemTime::UNIX_EPOCH)
            .expect("aggregate sample plan")
    }

    #[rstest]
    fn vendor_responses_drive_the_order_status(aggregator: OrderAggregator<MemoryOrderStore>) {
        let mut order = placed_order(&aggregator);

        order
            .apply_portion_status("v1", PortionStatus::Preparing)
            .expect("legal transition");
        assert_eq!(order.status, OrderStatus::InProgress);

        order
            .apply_portion_status("v1", PortionStatus::ReadyForPickup)
            .expect("legal transition");
        assert_eq!(order.status, OrderStatus::ReadyForPickup);

        order
            .apply_portion_status("v2", PortionStatus::Cancelled)
            .expect("legal transition");
        order
            .apply_portion_status("v1", PortionStatus::PickedUp)
            .expect("legal transition");
        assert_eq!(order.status, OrderStatus::Completed);
    }

    #[rstest]
    fn all_cancelled_portions_cancel_the_order(aggregator: OrderAggregator<MemoryOrderStore>) {
        let mut order = placed_order(&aggregator);
        order
            .apply_portion_status("v1", PortionStatus::Cancelled)
            .expect("legal transition");
        order
            .apply_portion_status("v2", PortionStatus::Cancelled)
            .expect("legal transition");
        assert_eq!(order.status, OrderStatus::Cancelled);

        let error = order
            .apply_portion_status("v1", PortionStatus::Preparing)
            .expect_err("closed order rejects updates");
        assert_eq!(error, OrderUpdateError::OrderClosed);
    }

    #[rstest]
    fn unknown_vendor_is_rejected(aggregator: OrderAggregator<MemoryOrderStore>) {
        let mut order = placed_order(&aggregator);
        let error = order
            .apply_portion_status("ghost", PortionStatus::Preparing)
            .expect_err("unknown vendor");
        assert!(matches!(error, OrderUpdateError::UnknownVendor { .. }));
    }

    #[rstest]
    fn unresponsive_orders_expire_after_the_deadline(
        aggregator: OrderAggregator<MemoryOrderStore>,
    ) {
        let mut order = placed_order(&aggregator);
        let just_before = SystemTime::UNIX_EPOCH + VENDOR_RESPONSE_DEADLINE;
        assert!(!order.cancel_if_unresponsive(just_before));

        let after = SystemTime::UNIX_EPOCH + VENDOR_RESPONSE_DEADLINE + Duration::from_secs(1);
        assert!(order.cancel_if_unresponsive(after));
        assert_eq!(order.status, OrderStatus::CancelledNoResponse);
        assert!(
            order
                .portions
                .iter()
                .all(|p| p.status == PortionStatus::Cancelled)
        );
    }

    #[rstest]
    fn a_single_response_stops_the_expiry(aggregator: OrderAggregator<MemoryOrderStore>) {
        let mut order = placed_order(&aggregator);
        order
            .apply_portion_status("v1", PortionStatus::Preparing)
            .expect("legal transition");

        let after = SystemTime::UNIX_EPOCH + VENDOR_RESPONSE_DEADLINE + Duration::from_secs(1);
        assert!(!order.cancel_if_unresponsive(after));
        assert_eq!(order.status, OrderStatus::InProgress);
    }
}
