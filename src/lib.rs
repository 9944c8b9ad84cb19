//! Facade crate for the Thru trip-shopping engine.
//!
//! This crate re-exports the core domain types and exposes the greedy
//! planner and SQLite store implementations behind feature flags.

#![forbid(unsafe_code)]

pub use thru_core::{
    AggregateError, AssignmentPlan, CandidateVendor, CatalogItem, DEFAULT_ROUTE_TIMEOUT,
    DetourArea, Discovery, DiscoveryError, DiscoveryRequest, DropReason, DroppedPinnedGroup,
    FeeSchedule, FinalOrder, GeometrySource, GlobalSelection, ItemCatalog, ItemSelection,
    OrderAggregator, OrderStatus, OrderStore, OrderStoreError, OrderUpdateError,
    OrderingCapabilities, PinnedGroup, PlanRequest, PlanVendor, PlannedItem, Planner, PortionItem,
    PortionStatus, RouteError, RouteLeg, RoutePoint, RouteProvider, RouteResult, ShopIndex,
    ShopRecord, ShopStore, ShopType, SyntheticIds, SyntheticVendor, TimedRouteProvider,
    TravelMode, VENDOR_RESPONSE_DEADLINE, VendorPlanEntry, VendorPortion, capabilities_of,
    discover, discover_from_store, filter_shops,
};

#[cfg(feature = "store-sqlite")]
pub use thru_core::{SqliteStore, SqliteStoreError};

#[cfg(feature = "planner-greedy")]
pub use thru_planner::{GreedyPlanner, GreedyPlannerConfig, SeededIds};
