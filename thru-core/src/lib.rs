//! Core domain types and trait seams for the Thru trip-shopping engine.
//!
//! The engine answers one question: given a point-to-point trip, a detour
//! budget, and a shopping list mixing vendor-pinned and vendor-agnostic
//! items, which shops should the trip stop at and which shop serves each
//! item? This crate holds the domain model and the boundaries — routing
//! provider, shop catalogue, order store — while the planning policy lives
//! in the planner crate.
//!
//! The main flow: a shop catalogue and a [`DiscoveryRequest`] go through
//! [`discover`] (provider-backed or straight-line fallback geometry) to
//! produce [`CandidateVendor`]s; a [`Planner`] assigns every requested item
//! to a vendor, fabricating a synthetic vendor when nothing matches; the
//! [`OrderAggregator`] rolls the plan into a persisted [`FinalOrder`].

#![forbid(unsafe_code)]

pub mod catalog;
pub mod discovery;
pub mod geometry;
pub mod order;
pub mod plan;
pub mod routing;
pub mod shop;
pub mod store;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use catalog::{OrderingCapabilities, capabilities_of, filter_shops};
pub use discovery::{
    CandidateVendor, DetourArea, Discovery, DiscoveryError, DiscoveryRequest, GeometrySource,
    ON_ROUTE_FALLBACK_KM, ON_ROUTE_PROVIDER_KM, ROUTE_POSITION_MARGIN, discover,
    discover_from_store,
};
pub use order::{
    AggregateError, FeeSchedule, FinalOrder, OrderAggregator, OrderStatus, OrderUpdateError,
    PortionItem, PortionStatus, VENDOR_RESPONSE_DEADLINE, VendorPortion,
};
pub use plan::{
    AssignmentPlan, CatalogItem, DropReason, DroppedPinnedGroup, GlobalSelection, ItemCatalog,
    ItemSelection, PinnedGroup, PlanRequest, PlanVendor, PlannedItem, Planner, SYNTHETIC_DETOUR_KM,
    SyntheticIds, SyntheticVendor, VendorPlanEntry,
};
pub use routing::{
    DEFAULT_ROUTE_TIMEOUT, RouteError, RouteLeg, RoutePoint, RouteProvider, RouteResult,
    TimedRouteProvider, TravelMode,
};
pub use shop::{ShopRecord, ShopType};
pub use store::{OrderStore, OrderStoreError, ShopIndex, ShopStore};

#[cfg(feature = "store-sqlite")]
pub use store::sqlite::{SqliteStore, SqliteStoreError};
