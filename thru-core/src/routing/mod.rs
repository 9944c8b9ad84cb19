//! Route computation between trip endpoints.
//!
//! The [`RouteProvider`] trait abstracts the external routing service.
//! Callers supply the trip endpoints plus optional intermediate waypoints
//! and receive ordered legs, an overview path, and the waypoint visiting
//! order. [`TimedRouteProvider`] imposes the hard timeout every planning
//! request must run under.

mod error;
mod provider;
mod timeout;

pub use error::RouteError;
pub use provider::{RouteLeg, RoutePoint, RouteProvider, RouteResult, TravelMode};
pub use timeout::{DEFAULT_ROUTE_TIMEOUT, TimedRouteProvider};
