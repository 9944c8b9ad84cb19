//! Offline planning pipeline behind the `thru` binary.
//!
//! The CLI runs the whole engine against JSON inputs: a shop catalogue and
//! a trip request go through discovery (straight-line fallback geometry —
//! the CLI carries no routing provider credentials), greedy assignment,
//! and aggregation, and the resulting plan plus order come back out as
//! JSON. Orders persist into a SQLite database when one is supplied and
//! into an in-process dry-run store otherwise.

#![forbid(unsafe_code)]

mod error;

pub use error::CliError;

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use geo::Coord;
use serde::{Deserialize, Serialize};

use thru_core::{
    AssignmentPlan, CatalogItem, DiscoveryRequest, FeeSchedule, FinalOrder, GeometrySource,
    GlobalSelection, ItemCatalog, OrderAggregator, OrderStore, OrderStoreError, PinnedGroup,
    PlanRequest, Planner, RouteError, RoutePoint, RouteProvider, RouteResult, ShopRecord,
    ShopType, TravelMode, discover,
};
use thru_planner::{GreedyPlanner, SeededIds};

#[cfg(feature = "store-sqlite")]
use thru_core::SqliteStore;

/// Plan a trip's shopping stops from JSON inputs.
#[derive(Debug, Parser)]
#[command(
    name = "thru",
    about = "Route-constrained shop discovery and multi-vendor order planning"
)]
pub struct Cli {
    /// Shop catalogue JSON: an array of shop records.
    #[arg(long)]
    pub shops: PathBuf,
    /// Trip request JSON: endpoints, budget, selections, item catalogue.
    #[arg(long)]
    pub request: PathBuf,
    /// Write the plan JSON here instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// Persist the order into this SQLite database.
    #[arg(long)]
    pub orders_db: Option<PathBuf>,
}

/// A trip request as read from disk.
#[derive(Debug, Clone, Deserialize)]
pub struct TripDocument {
    /// Trip start.
    pub origin: RoutePoint,
    /// Trip end.
    pub destination: RoutePoint,
    /// Detour budget in kilometres.
    pub max_detour_km: f64,
    /// Shop types to consider; every type when omitted.
    #[serde(default)]
    pub allowed_types: Option<Vec<ShopType>>,
    /// Travel mode; driving when omitted.
    #[serde(default)]
    pub travel_mode: Option<TravelMode>,
    /// Vendor-pinned selections.
    #[serde(default)]
    pub pinned: Vec<PinnedGroup>,
    /// Vendor-agnostic selections, in assignment order.
    #[serde(default)]
    pub global: Vec<GlobalSelection>,
    /// Item catalogue entries referenced by the selections.
    #[serde(default)]
    pub items: Vec<CatalogItem>,
    /// Platform fees to apply at aggregation.
    #[serde(default)]
    pub fees: FeeSchedule,
    /// Seed for synthetic vendor ids.
    #[serde(default)]
    pub seed: u64,
    /// Explicit order id; derived from the clock when omitted.
    #[serde(default)]
    pub order_id: Option<String>,
}

/// Everything the pipeline produces for one trip.
#[derive(Debug, Serialize)]
pub struct PlanOutput {
    /// Which geometry path discovery took.
    pub geometry: GeometrySource,
    /// Trip distance in kilometres.
    pub route_distance_km: f64,
    /// How many shops passed the detour filter.
    pub candidate_count: usize,
    /// The assignment plan, dropped groups included.
    pub plan: AssignmentPlan,
    /// The persisted order.
    pub order: FinalOrder,
}

/// Route provider stand-in for a CLI with no provider credentials.
///
/// Always reports [`RouteError::ProviderUnavailable`], so discovery takes
/// its documented straight-line fallback.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineRouteProvider;

impl RouteProvider for OfflineRouteProvider {
    fn compute_route(
        &self,
        _origin: Coord<f64>,
        _destination: Coord<f64>,
        _waypoints: &[Coord<f64>],
        _mode: TravelMode,
    ) -> Result<RouteResult, RouteError> {
        Err(RouteError::ProviderUnavailable)
    }
}

/// Dry-run order store used when no database is supplied.
///
/// Keeps the idempotent-write discipline so duplicate order ids fail the
/// same way they would against the real store.
#[derive(Debug, Default)]
pub struct EphemeralOrderStore {
    orders: Mutex<HashMap<String, FinalOrder>>,
}

impl OrderStore for EphemeralOrderStore {
    fn insert_order(&self, order: &FinalOrder) -> Result<(), OrderStoreError> {
        let mut orders = self.orders.lock().map_err(|_| OrderStoreError::Backend {
            message: "order map mutex poisoned".to_owned(),
        })?;
        if orders.contains_key(&order.order_id) {
            return Err(OrderStoreError::Duplicate {
                order_id: order.order_id.clone(),
            });
        }
        orders.insert(order.order_id.clone(), order.clone());
        Ok(())
    }

    fn fetch_order(&self, order_id: &str) -> Result<Option<FinalOrder>, OrderStoreError> {
        let orders = self.orders.lock().map_err(|_| OrderStoreError::Backend {
            message: "order map mutex poisoned".to_owned(),
        })?;
        Ok(orders.get(order_id).cloned())
    }
}

/// Parse arguments from the environment and run the pipeline.
pub fn run() -> eyre::Result<()> {
    let cli = Cli::parse();
    let rendered = execute(&cli)?;

    match &cli.output {
        Some(path) => fs::write(path, rendered).map_err(CliError::WriteOutput)?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(rendered.as_bytes())
                .and_then(|()| stdout.write_all(b"\n"))
                .map_err(CliError::WriteOutput)?;
        }
    }
    Ok(())
}

/// Run the pipeline for parsed arguments and render the output JSON.
pub fn execute(cli: &Cli) -> Result<String, CliError> {
    let shops = load_shops(&cli.shops)?;
    let trip = load_trip(&cli.request)?;

    let output = match &cli.orders_db {
        #[cfg(feature = "store-sqlite")]
        Some(path) => {
            let store = SqliteStore::open(path)?;
            plan_trip(&shops, &trip, store)?
        }
        #[cfg(not(feature = "store-sqlite"))]
        Some(_) => {
            return Err(CliError::MissingFeature {
                feature: "store-sqlite",
                action: "persisting orders to a database",
            });
        }
        None => plan_trip(&shops, &trip, EphemeralOrderStore::default())?,
    };

    serde_json::to_string_pretty(&output).map_err(CliError::SerializeOutput)
}

/// Discover, plan, and aggregate one trip against `store`.
pub fn plan_trip<S>(
    shops: &[ShopRecord],
    trip: &TripDocument,
    store: S,
) -> Result<PlanOutput, CliError>
where
    S: OrderStore,
{
    let mut request = DiscoveryRequest::new(
        trip.origin.clone(),
        trip.destination.clone(),
        trip.max_detour_km,
    );
    if let Some(types) = &trip.allowed_types {
        request.allowed_types = types.clone();
    }
    if let Some(mode) = trip.travel_mode {
        request.travel_mode = mode;
    }

    let discovery = discover(&OfflineRouteProvider, shops, &request)?;

    let catalog = ItemCatalog::from_items(trip.items.iter().cloned());
    let plan_request = PlanRequest {
        pinned: trip.pinned.clone(),
        global: trip.global.clone(),
        max_detour_km: trip.max_detour_km,
    };
    let planner = GreedyPlanner::new(SeededIds::new(trip.seed));
    let plan = planner.plan(&plan_request, &discovery.candidates, &catalog);

    let created_at = SystemTime::now();
    let order_id = trip
        .order_id
        .clone()
        .unwrap_or_else(|| default_order_id(created_at));
    let aggregator = OrderAggregator::new(store, trip.fees);
    let order = aggregator.aggregate(&plan, order_id, created_at)?;

    Ok(PlanOutput {
        geometry: discovery.geometry,
        route_distance_km: discovery.route_distance_km,
        candidate_count: discovery.candidates.len(),
        plan,
        order,
    })
}

fn default_order_id(created_at: SystemTime) -> String {
    let millis = created_at
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or(0);
    format!("ORD-{millis}")
}

fn load_shops(path: &Path) -> Result<Vec<ShopRecord>, CliError> {
    let raw = fs::read_to_string(path).map_err(|source| CliError::OpenShops {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| CliError::ParseShops {
        path: path.to_path_buf(),
        source,
    })
}

fn load_trip(path: &Path) -> Result<TripDocument, CliError> {
    let raw = fs::read_to_string(path).map_err(|source| CliError::OpenRequest {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| CliError::ParseRequest {
        path: path.to_path_buf(),
        source,
    })
}
