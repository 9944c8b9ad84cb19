//! Shopping-list assignment inputs and the resulting plan.
//!
//! The planner consumes two kinds of selections. Pinned selections were made
//! while browsing one vendor's own inventory and stay with that vendor or
//! are dropped. Global selections are vendor-agnostic and get matched to a
//! suitable vendor by item category. The [`Planner`] seam keeps the greedy
//! policy replaceable; the [`SyntheticIds`] seam keeps fabricated vendor ids
//! deterministic under test.

use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::discovery::CandidateVendor;

/// Detour assigned to fabricated vendors, always within any sane budget.
pub const SYNTHETIC_DETOUR_KM: f64 = 0.2;

/// An orderable item as known to the item catalogue.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CatalogItem {
    /// Opaque item identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Category used to match vendor-agnostic selections to vendors.
    pub category: String,
    /// Unit price.
    pub price: f64,
}

/// Item lookup for a planning run.
///
/// # Examples
/// ```
/// use thru_core::{CatalogItem, ItemCatalog};
///
/// let catalog = ItemCatalog::from_items([CatalogItem {
///     id: "onion".into(),
///     name: "Onion".into(),
///     category: "grocery".into(),
///     price: 30.0,
/// }]);
/// assert!(catalog.get("onion").is_some());
/// assert!(catalog.get("beetroot").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ItemCatalog {
    items: HashMap<String, CatalogItem>,
}

impl ItemCatalog {
    /// Build a catalogue from item records.
    pub fn from_items<I>(items: I) -> Self
    where
        I: IntoIterator<Item = CatalogItem>,
    {
        Self {
            items: items
                .into_iter()
                .map(|item| (item.id.clone(), item))
                .collect(),
        }
    }

    /// Look up an item by id.
    #[must_use]
    pub fn get(&self, item_id: &str) -> Option<&CatalogItem> {
        self.items.get(item_id)
    }

    /// Number of known items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the catalogue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// One item and quantity inside a pinned group.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ItemSelection {
    /// Item to order.
    pub item_id: String,
    /// Requested units; zero or negative requests are filtered upstream and
    /// skipped defensively here.
    pub quantity: u32,
}

/// Items selected from one specific vendor's inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PinnedGroup {
    /// The vendor the items were picked from.
    pub vendor_id: String,
    /// Selections within that vendor.
    pub items: Vec<ItemSelection>,
}

/// A vendor-agnostic selection, matched to a vendor by category.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GlobalSelection {
    /// Item to order.
    pub item_id: String,
    /// Requested units.
    pub quantity: u32,
    /// Category the serving vendor must declare.
    pub category: String,
}

/// Inputs to one planning run.
///
/// Iteration order of both selection lists is caller-defined and
/// significant: it decides consolidation order.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlanRequest {
    /// Vendor-pinned selections, processed first.
    pub pinned: Vec<PinnedGroup>,
    /// Vendor-agnostic selections, processed in caller order.
    pub global: Vec<GlobalSelection>,
    /// Detour budget pinned vendors must also respect.
    pub max_detour_km: f64,
}

/// A fabricated placeholder vendor.
///
/// Created when no real candidate serves a category, so that every
/// requested item still lands somewhere.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SyntheticVendor {
    /// Generated identifier, unique within the plan.
    pub id: String,
    /// Display name, e.g. "On-Route Grocery Supplier".
    pub name: String,
    /// The single category the placeholder serves.
    pub category: String,
    /// Fixed nominal detour.
    pub detour_km: f64,
}

/// The vendor behind a plan entry: a real candidate or a placeholder.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PlanVendor {
    /// A shop that passed discovery for this trip.
    Candidate(CandidateVendor),
    /// A fabricated on-route supplier.
    Synthetic(SyntheticVendor),
}

impl PlanVendor {
    /// Vendor identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Candidate(candidate) => &candidate.shop.id,
            Self::Synthetic(synthetic) => &synthetic.id,
        }
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Candidate(candidate) => &candidate.shop.name,
            Self::Synthetic(synthetic) => &synthetic.name,
        }
    }

    /// Detour cost of visiting this vendor.
    #[must_use]
    pub fn detour_km(&self) -> f64 {
        match self {
            Self::Candidate(candidate) => candidate.detour_km,
            Self::Synthetic(synthetic) => synthetic.detour_km,
        }
    }

    /// Whether the vendor serves `category`.
    #[must_use]
    pub fn serves(&self, category: &str) -> bool {
        match self {
            Self::Candidate(candidate) => candidate.serves(category),
            Self::Synthetic(synthetic) => synthetic.category == category,
        }
    }

    /// Whether this is a fabricated placeholder.
    #[must_use]
    pub const fn is_synthetic(&self) -> bool {
        matches!(self, Self::Synthetic(_))
    }
}

/// An item placed with a vendor.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlannedItem {
    /// Item identifier.
    pub item_id: String,
    /// Display name at planning time.
    pub name: String,
    /// Units assigned to this vendor.
    pub quantity: u32,
    /// Unit price at planning time.
    pub unit_price: f64,
}

impl PlannedItem {
    /// Price × quantity for this line.
    #[must_use]
    pub fn line_total(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }
}

/// All items assigned to one vendor, with a running subtotal.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VendorPlanEntry {
    /// The serving vendor.
    pub vendor: PlanVendor,
    /// Items assigned to the vendor.
    pub items: Vec<PlannedItem>,
    /// Sum of line totals.
    pub subtotal: f64,
}

impl VendorPlanEntry {
    /// Create an empty entry for `vendor`.
    #[must_use]
    pub const fn new(vendor: PlanVendor) -> Self {
        Self {
            vendor,
            items: Vec::new(),
            subtotal: 0.0,
        }
    }

    /// Append an item line and grow the subtotal.
    pub fn push(&mut self, item: PlannedItem) {
        self.subtotal += item.line_total();
        self.items.push(item);
    }

    /// Total units across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

/// Why a pinned group was dropped from the plan.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DropReason {
    /// The pinned vendor's detour exceeds the budget.
    OutOfDetour {
        /// The vendor's actual detour.
        detour_km: f64,
        /// The budget it exceeded.
        max_detour_km: f64,
    },
    /// The pinned vendor is not among the discovered candidates.
    UnknownVendor,
}

/// The explicit loss record for a dropped pinned group.
///
/// Dropping is deliberate policy, not an error: a pinned selection names
/// one vendor's inventory, so there is no substitute vendor to retry.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DroppedPinnedGroup {
    /// The vendor whose whole group was dropped.
    pub vendor_id: String,
    /// Why it was dropped.
    pub reason: DropReason,
}

/// The outcome of a planning run: one entry per chosen vendor, in creation
/// order, plus the pinned groups that had to be dropped.
///
/// Invariant: for every requested item, assigned quantities across entries
/// sum to the requested quantity — except items of a dropped pinned group.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AssignmentPlan {
    /// Vendor entries in creation order.
    pub entries: Vec<VendorPlanEntry>,
    /// Pinned groups excluded from the plan, with reasons.
    pub dropped: Vec<DroppedPinnedGroup>,
}

impl AssignmentPlan {
    /// The entry for `vendor_id`, if one was created this run.
    #[must_use]
    pub fn entry(&self, vendor_id: &str) -> Option<&VendorPlanEntry> {
        self.entries.iter().find(|e| e.vendor.id() == vendor_id)
    }

    /// Mutable access to the entry for `vendor_id`.
    pub fn entry_mut(&mut self, vendor_id: &str) -> Option<&mut VendorPlanEntry> {
        self.entries.iter_mut().find(|e| e.vendor.id() == vendor_id)
    }

    /// Units of `item_id` assigned across all entries.
    #[must_use]
    pub fn assigned_quantity(&self, item_id: &str) -> u32 {
        self.entries
            .iter()
            .flat_map(|entry| entry.items.iter())
            .filter(|item| item.item_id == item_id)
            .map(|item| item.quantity)
            .sum()
    }

    /// Sum of entry subtotals.
    #[must_use]
    pub fn overall_subtotal(&self) -> f64 {
        self.entries.iter().map(|entry| entry.subtotal).sum()
    }

    /// Whether any entry actually holds items.
    #[must_use]
    pub fn has_assignments(&self) -> bool {
        self.entries.iter().any(|entry| !entry.items.is_empty())
    }
}

/// Assign every requested item to exactly one vendor.
///
/// Implementations must be deterministic: identical inputs (including the
/// synthetic-id source) produce structurally identical plans.
pub trait Planner: Send + Sync {
    /// Run the assignment over one immutable input snapshot.
    ///
    /// `candidates` is expected ascending by detour; implementations may
    /// re-sort defensively.
    fn plan(
        &self,
        request: &PlanRequest,
        candidates: &[CandidateVendor],
        catalog: &ItemCatalog,
    ) -> AssignmentPlan;
}

/// Source of identifiers for fabricated vendors.
///
/// Injected so production gets unique ids while tests get predictable
/// ones. `sequence` is the zero-based count of synthetic vendors already
/// created in the current planning run.
pub trait SyntheticIds {
    /// Produce an id for a placeholder vendor serving `category`.
    fn vendor_id(&self, category: &str, sequence: u32) -> String;
}
