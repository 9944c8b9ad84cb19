//! Route provider trait and the result types it returns.

use std::time::Duration;

use geo::Coord;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::error::RouteError;

/// A trip endpoint: a coordinate plus the address the user entered.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RoutePoint {
    /// Geospatial position, `x = longitude`, `y = latitude`.
    pub location: Coord<f64>,
    /// Human-readable address.
    pub address: String,
}

impl RoutePoint {
    /// Construct an endpoint from a coordinate and address.
    pub fn new(location: Coord<f64>, address: impl Into<String>) -> Self {
        Self {
            location,
            address: address.into(),
        }
    }
}

/// Travel mode requested from the provider.
///
/// Every provider must support at least [`TravelMode::Driving`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TravelMode {
    /// Private vehicle.
    #[default]
    Driving,
    /// On foot.
    Walking,
    /// Public transport.
    Transit,
}

/// One leg of a computed route, between consecutive stops.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RouteLeg {
    /// Driving distance of the leg in kilometres.
    pub distance_km: f64,
    /// Expected travel time for the leg.
    pub duration: Duration,
}

/// A computed route.
///
/// `waypoint_order[n]` is the index (into the waypoints supplied to
/// [`RouteProvider::compute_route`]) of the waypoint visited as stop `n`.
/// Providers are free to reorder waypoints for a shorter total path, so
/// callers must map stops back through [`RouteResult::waypoint_for_stop`]
/// rather than assuming positional order.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RouteResult {
    /// Ordered legs from origin to destination.
    pub legs: Vec<RouteLeg>,
    /// Polyline of the whole route, start to end.
    pub overview_path: Vec<Coord<f64>>,
    /// Visiting order of the supplied waypoints.
    pub waypoint_order: Vec<usize>,
}

impl RouteResult {
    /// Total driving distance across all legs in kilometres.
    #[must_use]
    pub fn total_distance_km(&self) -> f64 {
        self.legs.iter().map(|leg| leg.distance_km).sum()
    }

    /// Total expected travel time across all legs.
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.legs.iter().map(|leg| leg.duration).sum()
    }

    /// Index of the originally supplied waypoint visited as stop `stop`.
    ///
    /// Returns `None` when the provider reported fewer stops.
    #[must_use]
    pub fn waypoint_for_stop(&self, stop: usize) -> Option<usize> {
        self.waypoint_order.get(stop).copied()
    }
}

/// Compute routes through an external routing service.
///
/// Implementations perform exactly one outbound call per invocation and
/// have no other side effects. They must be shareable across threads so a
/// single client can serve concurrent planning requests.
///
/// # Examples
///
/// ```rust
/// use geo::Coord;
/// use thru_core::{RouteError, RouteLeg, RouteProvider, RouteResult, TravelMode};
/// use std::time::Duration;
///
/// struct StraightLine;
///
/// impl RouteProvider for StraightLine {
///     fn compute_route(
///         &self,
///         origin: Coord<f64>,
///         destination: Coord<f64>,
///         waypoints: &[Coord<f64>],
///         _mode: TravelMode,
///     ) -> Result<RouteResult, RouteError> {
///         Ok(RouteResult {
///             legs: vec![RouteLeg {
///                 distance_km: thru_core::geometry::haversine_km(origin, destination),
///                 duration: Duration::from_secs(600),
///             }],
///             overview_path: vec![origin, destination],
///             waypoint_order: (0..waypoints.len()).collect(),
///         })
///     }
/// }
///
/// let route = StraightLine.compute_route(
///     Coord { x: 77.60, y: 12.90 },
///     Coord { x: 77.65, y: 12.95 },
///     &[],
///     TravelMode::Driving,
/// )?;
/// assert_eq!(route.overview_path.len(), 2);
/// # Ok::<(), RouteError>(())
/// ```
pub trait RouteProvider: Send + Sync {
    /// Compute a route from `origin` to `destination` through `waypoints`.
    fn compute_route(
        &self,
        origin: Coord<f64>,
        destination: Coord<f64>,
        waypoints: &[Coord<f64>],
        mode: TravelMode,
    ) -> Result<RouteResult, RouteError>;
}
