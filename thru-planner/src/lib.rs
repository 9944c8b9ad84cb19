//! Greedy item-to-vendor assignment for the Thru engine.
//!
//! [`GreedyPlanner`] implements [`thru_core::Planner`] with the
//! fewest-stops policy: pinned selections stay with their vendor or are
//! dropped, vendor-agnostic selections consolidate into vendors already in
//! the plan before opening new stops, and a synthetic on-route supplier
//! guarantees every item lands somewhere. [`SeededIds`] makes the synthetic
//! vendor ids reproducible from a seed.

#![forbid(unsafe_code)]

mod ids;
mod planner;

pub use ids::SeededIds;
pub use planner::{GreedyPlanner, GreedyPlannerConfig};
