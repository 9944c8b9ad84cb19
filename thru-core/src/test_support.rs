//! Test-only doubles: in-memory stores, canned route providers, and a
//! predictable synthetic-id source.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use geo::{Coord, Intersects, Rect};

use crate::geometry::haversine_km;
use crate::order::FinalOrder;
use crate::plan::SyntheticIds;
use crate::routing::{RouteError, RouteLeg, RouteProvider, RouteResult, TravelMode};
use crate::shop::{ShopRecord, ShopType};
use crate::store::{OrderStore, OrderStoreError, ShopStore};

/// Build an active shop whose declared categories match its type's
/// defaults.
#[must_use]
pub fn shop_at(id: &str, shop_type: ShopType, location: Coord<f64>) -> ShopRecord {
    let mut record = ShopRecord::new(id, id, shop_type, location);
    record.categories = crate::catalog::capabilities_of(shop_type)
        .default_categories
        .iter()
        .map(|c| (*c).to_owned())
        .collect();
    record
}

/// In-memory `ShopStore` backed by a linear scan.
///
/// Intended only for the small catalogues tests work with.
#[derive(Debug, Default)]
pub struct MemoryShopStore {
    shops: Vec<ShopRecord>,
}

impl MemoryShopStore {
    /// Create a store from catalogue records.
    pub fn with_shops<I>(shops: I) -> Self
    where
        I: IntoIterator<Item = ShopRecord>,
    {
        Self {
            shops: shops.into_iter().collect(),
        }
    }
}

impl ShopStore for MemoryShopStore {
    fn shops_by_ids(&self, ids: &[String]) -> Vec<ShopRecord> {
        self.shops
            .iter()
            .filter(|shop| ids.iter().any(|id| *id == shop.id))
            .cloned()
            .collect()
    }

    fn active_shops(&self) -> Vec<ShopRecord> {
        self.shops
            .iter()
            .filter(|shop| shop.active)
            .cloned()
            .collect()
    }

    fn active_shops_in_category(&self, category: &str) -> Vec<ShopRecord> {
        self.shops
            .iter()
            .filter(|shop| shop.active && shop.serves_category(category))
            .cloned()
            .collect()
    }

    fn shops_in_bbox(&self, bbox: &Rect<f64>) -> Vec<ShopRecord> {
        let bbox = *bbox;
        self.shops
            .iter()
            // `Intersects` treats boundary points as inside the rectangle.
            .filter(|shop| bbox.intersects(&shop.location))
            .cloned()
            .collect()
    }
}

/// In-memory `OrderStore` with the same duplicate discipline as the real
/// one.
#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    orders: Mutex<HashMap<String, FinalOrder>>,
}

impl OrderStore for MemoryOrderStore {
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

/// Route provider that always answers with the same canned route.
#[derive(Debug, Clone)]
pub struct StaticRouteProvider {
    route: RouteResult,
}

impl StaticRouteProvider {
    /// Answer with an explicit canned route.
    #[must_use]
    pub const fn with_route(route: RouteResult) -> Self {
        Self { route }
    }

    /// Answer with a straight line from `origin` to `destination`, sampled
    /// into eleven overview vertices, at 3 minutes per kilometre.
    #[must_use]
    pub fn straight_line(origin: Coord<f64>, destination: Coord<f64>) -> Self {
        let overview_path: Vec<Coord<f64>> = (0..=10)
            .map(|step| {
                let t = f64::from(step) / 10.0;
                Coord {
                    x: origin.x + t * (destination.x - origin.x),
                    y: origin.y + t * (destination.y - origin.y),
                }
            })
            .collect();
        let distance_km = haversine_km(origin, destination);
        let duration_secs = distance_km * 180.0;
        Self::with_route(RouteResult {
            legs: vec![RouteLeg {
                distance_km,
                duration: Duration::from_secs_f64(duration_secs.max(0.0)),
            }],
            overview_path,
            waypoint_order: Vec::new(),
        })
    }
}

impl RouteProvider for StaticRouteProvider {
    fn compute_route(
        &self,
        _origin: Coord<f64>,
        _destination: Coord<f64>,
        waypoints: &[Coord<f64>],
        _mode: TravelMode,
    ) -> Result<RouteResult, RouteError> {
        let mut route = self.route.clone();
        if route.waypoint_order.is_empty() {
            route.waypoint_order = (0..waypoints.len()).collect();
        }
        Ok(route)
    }
}

/// Route provider that always fails with a fixed error.
#[derive(Debug, Clone)]
pub struct FailingRouteProvider {
    error: RouteError,
}

impl FailingRouteProvider {
    /// Fail every call with `error`.
    #[must_use]
    pub const fn new(error: RouteError) -> Self {
        Self { error }
    }
}

impl RouteProvider for FailingRouteProvider {
    fn compute_route(
        &self,
        _origin: Coord<f64>,
        _destination: Coord<f64>,
        _waypoints: &[Coord<f64>],
        _mode: TravelMode,
    ) -> Result<RouteResult, RouteError> {
        Err(self.error.clone())
    }
}

/// Synthetic-id source producing `synthetic-{category}-{sequence}`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialIds;

impl SyntheticIds for SequentialIds {
    fn vendor_id(&self, category: &str, sequence: u32) -> String {
        format!("synthetic-{category}-{sequence}")
    }
}
