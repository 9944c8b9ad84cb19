//! The greedy fewest-stops assignment policy.

use std::cmp::Ordering;
use std::collections::HashMap;

use thru_core::{
    AssignmentPlan, CandidateVendor, CatalogItem, DropReason, DroppedPinnedGroup, ItemCatalog,
    PlanRequest, PlanVendor, PlannedItem, Planner, SYNTHETIC_DETOUR_KM, SyntheticIds,
    SyntheticVendor, VendorPlanEntry,
};

/// Tunables for [`GreedyPlanner`].
#[derive(Debug, Clone, Copy)]
pub struct GreedyPlannerConfig {
    /// Nominal detour attributed to fabricated vendors.
    pub synthetic_detour_km: f64,
}

impl Default for GreedyPlannerConfig {
    fn default() -> Self {
        Self {
            synthetic_detour_km: SYNTHETIC_DETOUR_KM,
        }
    }
}

/// Greedy assignment: consolidate first, open the nearest new stop second,
/// fabricate a supplier last.
///
/// Consolidation is sticky on purpose: once a vendor is in the plan it
/// absorbs every later compatible item, even when an unused candidate with
/// a smaller detour exists. Fewer stops beat shorter detours here.
///
/// Complexity is O(selections × entries in plan) from the consolidation
/// scan — the ceiling is tens of items across tens of vendors, where this
/// is not worth an index.
pub struct GreedyPlanner<I> {
    ids: I,
    config: GreedyPlannerConfig,
}

impl<I> GreedyPlanner<I>
where
    I: SyntheticIds,
{
    /// Build a planner with default configuration.
    pub fn new(ids: I) -> Self {
        Self::with_config(ids, GreedyPlannerConfig::default())
    }

    /// Build a planner with explicit configuration.
    pub const fn with_config(ids: I, config: GreedyPlannerConfig) -> Self {
        Self { ids, config }
    }
}

impl<I> Planner for GreedyPlanner<I>
where
    I: SyntheticIds + Send + Sync,
{
    fn plan(
        &self,
        request: &PlanRequest,
        candidates: &[CandidateVendor],
        catalog: &ItemCatalog,
    ) -> AssignmentPlan {
        // Callers pass candidates ascending by detour; re-sort defensively
        // so a misordered input cannot change which vendor wins a tie-less
        // scan.
        let mut ordered: Vec<&CandidateVendor> = candidates.iter().collect();
        ordered.sort_by(|a, b| {
            a.detour_km
                .partial_cmp(&b.detour_km)
                .unwrap_or(Ordering::Equal)
        });

        let mut plan = AssignmentPlan::default();
        let mut ledger: HashMap<String, u32> = HashMap::new();
        let mut synthetic_count: u32 = 0;

        self.assign_pinned_groups(request, &ordered, catalog, &mut plan, &mut ledger);
        self.assign_global_selections(
            request,
            &ordered,
            catalog,
            &mut plan,
            &mut ledger,
            &mut synthetic_count,
        );

        plan
    }
}

impl<I> GreedyPlanner<I>
where
    I: SyntheticIds,
{
    /// Pass 1: pinned groups keep their vendor or are dropped whole.
    fn assign_pinned_groups(
        &self,
        request: &PlanRequest,
        ordered: &[&CandidateVendor],
        catalog: &ItemCatalog,
        plan: &mut AssignmentPlan,
        ledger: &mut HashMap<String, u32>,
    ) {
        for group in &request.pinned {
            let Some(candidate) = ordered
                .iter()
                .find(|candidate| candidate.shop.id == group.vendor_id)
            else {
                log::warn!(
                    "pinned vendor {} is not a candidate for this trip; dropping {} selections",
                    group.vendor_id,
                    group.items.len()
                );
                plan.dropped.push(DroppedPinnedGroup {
                    vendor_id: group.vendor_id.clone(),
                    reason: DropReason::UnknownVendor,
                });
                continue;
            };

            if candidate.detour_km > request.max_detour_km {
                log::warn!(
                    "pinned vendor {} needs a {:.1} km detour, over the {:.1} km budget; \
                     dropping {} selections",
                    group.vendor_id,
                    candidate.detour_km,
                    request.max_detour_km,
                    group.items.len()
                );
                plan.dropped.push(DroppedPinnedGroup {
                    vendor_id: group.vendor_id.clone(),
                    reason: DropReason::OutOfDetour {
                        detour_km: candidate.detour_km,
                        max_detour_km: request.max_detour_km,
                    },
                });
                continue;
            }

            for selection in &group.items {
                if selection.quantity == 0 {
                    continue;
                }
                let Some(item) = catalog.get(&selection.item_id) else {
                    log::warn!(
                        "pinned item {} is missing from the item catalogue; skipping",
                        selection.item_id
                    );
                    continue;
                };
                append_to_candidate(plan, candidate, line_for(item, selection.quantity));
                *ledger.entry(selection.item_id.clone()).or_insert(0) += selection.quantity;
            }
        }
    }

    /// Pass 2: vendor-agnostic selections, consolidated greedily.
    fn assign_global_selections(
        &self,
        request: &PlanRequest,
        ordered: &[&CandidateVendor],
        catalog: &ItemCatalog,
        plan: &mut AssignmentPlan,
        ledger: &mut HashMap<String, u32>,
        synthetic_count: &mut u32,
    ) {
        for selection in &request.global {
            if selection.quantity == 0 {
                continue;
            }
            let assigned = ledger.get(&selection.item_id).copied().unwrap_or(0);
            let remaining = selection.quantity.saturating_sub(assigned);
            if remaining == 0 {
                continue;
            }

            let Some(item) = catalog.get(&selection.item_id) else {
                log::warn!(
                    "global item {} is missing from the item catalogue; skipping",
                    selection.item_id
                );
                continue;
            };
            let line = line_for(item, remaining);
            *ledger.entry(selection.item_id.clone()).or_insert(0) += remaining;

            // (a) A vendor already in the plan absorbs the item, in entry
            // creation order.
            if let Some(entry) = plan
                .entries
                .iter_mut()
                .find(|entry| entry.vendor.serves(&selection.category))
            {
                entry.push(line);
                continue;
            }

            // (b) The nearest compatible candidate not yet in the plan,
            // (c) else any compatible candidate as a second, defensive scan.
            let chosen = ordered
                .iter()
                .find(|candidate| {
                    candidate.serves(&selection.category) && plan.entry(&candidate.shop.id).is_none()
                })
                .or_else(|| {
                    ordered
                        .iter()
                        .find(|candidate| candidate.serves(&selection.category))
                });
            if let Some(candidate) = chosen {
                append_to_candidate(plan, candidate, line);
                continue;
            }

            // (d) Nothing serves the category: fabricate an on-route
            // supplier so the item still lands somewhere.
            let vendor = self.synthetic_vendor(&selection.category, *synthetic_count);
            *synthetic_count += 1;
            log::debug!(
                "no candidate serves {}; created synthetic vendor {}",
                selection.category,
                vendor.id
            );
            let mut entry = VendorPlanEntry::new(PlanVendor::Synthetic(vendor));
            entry.push(line);
            plan.entries.push(entry);
        }
    }

    fn synthetic_vendor(&self, category: &str, sequence: u32) -> SyntheticVendor {
        SyntheticVendor {
            id: self.ids.vendor_id(category, sequence),
            name: format!("On-Route {} Supplier", title_case(category)),
            category: category.to_owned(),
            detour_km: self.config.synthetic_detour_km,
        }
    }
}

fn line_for(item: &CatalogItem, quantity: u32) -> PlannedItem {
    PlannedItem {
        item_id: item.id.clone(),
        name: item.name.clone(),
        quantity,
        unit_price: item.price,
    }
}

/// Append to the vendor's existing entry, or open one.
fn append_to_candidate(plan: &mut AssignmentPlan, candidate: &CandidateVendor, line: PlannedItem) {
    if let Some(entry) = plan.entry_mut(&candidate.shop.id) {
        entry.push(line);
        return;
    }
    let mut entry = VendorPlanEntry::new(PlanVendor::Candidate(candidate.clone()));
    entry.push(line);
    plan.entries.push(entry);
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
