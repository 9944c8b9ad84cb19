//! Route-constrained candidate discovery.
//!
//! Discovery turns a shop catalogue plus a trip into the list of
//! [`CandidateVendor`]s reachable within the detour budget. The provider
//! and fallback geometry paths produce structurally identical candidates,
//! so downstream planning never cares which one ran; [`Discovery::geometry`]
//! records it for diagnostics.

use std::cmp::Ordering;
use std::time::Duration;

use geo::Coord;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::catalog;
use crate::geometry::{corridor_bbox, haversine_km, midpoint, project_onto_segment};
use crate::routing::{RouteError, RoutePoint, RouteProvider, RouteResult, TravelMode};
use crate::shop::{ShopRecord, ShopType};
use crate::store::ShopStore;

/// Fallback geometry counts a shop as on-route within this distance.
pub const ON_ROUTE_FALLBACK_KM: f64 = 1.0;

/// Provider geometry counts a shop as on-route within this distance.
pub const ON_ROUTE_PROVIDER_KM: f64 = 0.5;

/// Margin beyond the trip endpoints within which shops still qualify.
///
/// Expressed as a fraction of the trip length, so shops slightly before the
/// start or past the destination are not rejected on a technicality.
pub const ROUTE_POSITION_MARGIN: f64 = 0.2;

/// Which geometry path produced a discovery result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum GeometrySource {
    /// The external routing provider answered in time.
    Provider,
    /// Straight-line fallback geometry ran locally.
    Fallback,
}

/// A shop that passed the detour filter for one specific trip.
///
/// Candidates are recomputed for every discovery run and never persisted.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CandidateVendor {
    /// The underlying catalogue record.
    pub shop: ShopRecord,
    /// Distance from the route line in kilometres.
    pub distance_from_route_km: f64,
    /// Extra distance incurred by visiting the shop, in kilometres.
    pub detour_km: f64,
    /// Position along the route; `0` at the origin, `1` at the destination.
    /// Unclamped: shops before the start or past the end sit outside `[0, 1]`.
    pub route_position: f64,
    /// Rough minutes to reach the shop. A coarse heuristic, not an ETA.
    pub estimated_time_minutes: u32,
    /// Whether the shop is close enough to count as on the route itself.
    pub on_route: bool,
}

impl CandidateVendor {
    /// Whether the underlying shop declares it serves `category`.
    #[must_use]
    pub fn serves(&self, category: &str) -> bool {
        self.shop.serves_category(category)
    }
}

/// Parameters for one discovery run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiscoveryRequest {
    /// Trip start.
    pub origin: RoutePoint,
    /// Trip end.
    pub destination: RoutePoint,
    /// Maximum acceptable detour in kilometres.
    pub max_detour_km: f64,
    /// Shop types the caller is interested in.
    pub allowed_types: Vec<ShopType>,
    /// Travel mode forwarded to the provider.
    pub travel_mode: TravelMode,
}

impl DiscoveryRequest {
    /// Build a request covering every shop type in driving mode.
    pub fn new(origin: RoutePoint, destination: RoutePoint, max_detour_km: f64) -> Self {
        Self {
            origin,
            destination,
            max_detour_km,
            allowed_types: ShopType::ALL.to_vec(),
            travel_mode: TravelMode::default(),
        }
    }
}

/// Circular search area summarising where candidates were looked for.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DetourArea {
    /// Midpoint of the trip.
    pub center: Coord<f64>,
    /// Radius in kilometres, equal to the detour budget.
    pub radius_km: f64,
}

/// Result of a discovery run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Discovery {
    /// Shops within the detour budget, ordered for presentation.
    pub candidates: Vec<CandidateVendor>,
    /// Trip distance in kilometres (straight-line in fallback mode).
    pub route_distance_km: f64,
    /// Trip duration; zero in fallback mode, which has no timing data.
    pub route_duration: Duration,
    /// Which geometry path ran.
    pub geometry: GeometrySource,
    /// Search area summary for map display.
    pub detour_area: DetourArea,
}

/// Errors surfaced from [`discover`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    /// No route exists between the endpoints.
    ///
    /// Provider outages are recovered internally; this is the one routing
    /// condition the user has to hear about. Callers may retry with a
    /// simplified two-point request.
    #[error("could not calculate a route between the trip endpoints")]
    RouteNotFound,
}

/// Find the shops along a trip that fit within the detour budget.
///
/// Filters the catalogue by type and active flag, then measures every
/// remaining shop against the route. Provider outages and timeouts fall
/// back to straight-line geometry; only a genuine "no route" is surfaced.
///
/// # Errors
///
/// Returns [`DiscoveryError::RouteNotFound`] when the provider reports no
/// route (or an empty overview path) between the endpoints.
pub fn discover<P>(
    provider: &P,
    shops: &[ShopRecord],
    request: &DiscoveryRequest,
) -> Result<Discovery, DiscoveryError>
where
    P: RouteProvider + ?Sized,
{
    let eligible = catalog::filter_shops(shops.iter().cloned(), &request.allowed_types);
    log::debug!(
        "discovery over {} eligible shops (of {} in catalogue)",
        eligible.len(),
        shops.len()
    );

    match provider.compute_route(
        request.origin.location,
        request.destination.location,
        &[],
        request.travel_mode,
    ) {
        Ok(route) if route.overview_path.is_empty() => Err(DiscoveryError::RouteNotFound),
        Ok(route) => Ok(provider_discovery(&route, eligible, request)),
        Err(RouteError::NoRouteFound) => Err(DiscoveryError::RouteNotFound),
        Err(error @ (RouteError::ProviderUnavailable | RouteError::Timeout)) => {
            log::warn!("route provider failed ({error}); using straight-line fallback geometry");
            Ok(fallback_discovery(eligible, request))
        }
    }
}

/// [`discover`] against a shop store, prefiltered to the trip corridor.
///
/// Fetches only the shops inside the corridor bounding box before the
/// per-shop measurements run. The padding is conservative: the detour
/// budget plus the endpoint margin, so nothing the precise filter would
/// accept is lost to the prefilter.
///
/// # Errors
///
/// Returns [`DiscoveryError::RouteNotFound`] under the same conditions as
/// [`discover`].
pub fn discover_from_store<P, S>(
    provider: &P,
    store: &S,
    request: &DiscoveryRequest,
) -> Result<Discovery, DiscoveryError>
where
    P: RouteProvider + ?Sized,
    S: ShopStore + ?Sized,
{
    let origin = request.origin.location;
    let destination = request.destination.location;
    let trip_km = haversine_km(origin, destination);
    let padding_km = request.max_detour_km + ROUTE_POSITION_MARGIN * trip_km;
    let bbox = corridor_bbox(origin, destination, padding_km);

    let shops = store.shops_in_bbox(&bbox);
    discover(provider, &shops, request)
}

fn detour_area(request: &DiscoveryRequest) -> DetourArea {
    DetourArea {
        center: midpoint(request.origin.location, request.destination.location),
        radius_km: request.max_detour_km,
    }
}

/// Measure shops against the provider's overview polyline.
fn provider_discovery(
    route: &RouteResult,
    shops: Vec<ShopRecord>,
    request: &DiscoveryRequest,
) -> Discovery {
    let mut candidates: Vec<CandidateVendor> = shops
        .into_iter()
        .filter_map(|shop| candidate_on_path(shop, &route.overview_path, request.max_detour_km))
        .collect();
    candidates.sort_by(|a, b| {
        a.distance_from_route_km
            .partial_cmp(&b.distance_from_route_km)
            .unwrap_or(Ordering::Equal)
    });

    Discovery {
        candidates,
        route_distance_km: route.total_distance_km(),
        route_duration: route.total_duration(),
        geometry: GeometrySource::Provider,
        detour_area: detour_area(request),
    }
}

/// Measure a shop against the polyline vertices.
///
/// The closest vertex stands in for the closest point on the route; with
/// provider polylines at city scale the error is far below the detour
/// budget resolution.
fn candidate_on_path(
    shop: ShopRecord,
    path: &[Coord<f64>],
    max_detour_km: f64,
) -> Option<CandidateVendor> {
    let last_index = path.len().checked_sub(1)?;
    let (closest_index, distance_km) = path
        .iter()
        .enumerate()
        .map(|(index, vertex)| (index, haversine_km(shop.location, *vertex)))
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))?;

    if distance_km > max_detour_km {
        return None;
    }

    let route_position = if last_index == 0 {
        0.0
    } else {
        index_fraction(closest_index, last_index)
    };

    Some(CandidateVendor {
        distance_from_route_km: distance_km,
        // Out to the shop and back to the route.
        detour_km: distance_km * 2.0,
        route_position,
        estimated_time_minutes: round_minutes(distance_km * 2.0),
        on_route: distance_km < ON_ROUTE_PROVIDER_KM,
        shop,
    })
}

/// Measure shops against the straight origin→destination segment.
fn fallback_discovery(shops: Vec<ShopRecord>, request: &DiscoveryRequest) -> Discovery {
    let origin = request.origin.location;
    let destination = request.destination.location;

    let mut candidates: Vec<CandidateVendor> = shops
        .into_iter()
        .filter_map(|shop| fallback_candidate(shop, origin, destination, request.max_detour_km))
        .collect();
    // Present stops start→end along the trip.
    candidates.sort_by(|a, b| {
        a.route_position
            .partial_cmp(&b.route_position)
            .unwrap_or(Ordering::Equal)
    });

    Discovery {
        candidates,
        route_distance_km: haversine_km(origin, destination),
        route_duration: Duration::ZERO,
        geometry: GeometrySource::Fallback,
        detour_area: detour_area(request),
    }
}

fn fallback_candidate(
    shop: ShopRecord,
    origin: Coord<f64>,
    destination: Coord<f64>,
    max_detour_km: f64,
) -> Option<CandidateVendor> {
    let projection = project_onto_segment(shop.location, origin, destination);
    let distance_km = haversine_km(shop.location, projection.foot);

    let within_detour = distance_km <= max_detour_km;
    let along_route = projection.position >= -ROUTE_POSITION_MARGIN
        && projection.position <= 1.0 + ROUTE_POSITION_MARGIN;
    if !(within_detour && along_route) {
        return None;
    }

    let from_start_km = haversine_km(origin, shop.location);
    Some(CandidateVendor {
        distance_from_route_km: distance_km,
        detour_km: distance_km,
        route_position: projection.position,
        // Roughly three minutes per kilometre from the start; approximate.
        estimated_time_minutes: round_minutes(from_start_km * 3.0),
        on_route: distance_km <= ON_ROUTE_FALLBACK_KM,
        shop,
    })
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "minutes heuristics are small non-negative values"
)]
fn round_minutes(value: f64) -> u32 {
    value.max(0.0).round() as u32
}

#[expect(
    clippy::cast_precision_loss,
    reason = "polyline vertex counts are far below f64 precision limits"
)]
fn index_fraction(index: usize, last_index: usize) -> f64 {
    index as f64 / last_index as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FailingRouteProvider, StaticRouteProvider, shop_at};
    use rstest::{fixture, rstest};

    const ORIGIN: Coord<f64> = Coord { x: 77.60, y: 12.90 };
    const DESTINATION: Coord<f64> = Coord { x: 77.65, y: 12.95 };

    #[fixture]
    fn request() -> DiscoveryRequest {
        DiscoveryRequest::new(
            RoutePoint::new(ORIGIN, "start"),
            RoutePoint::new(DESTINATION, "end"),
            2.0,
        )
    }

    fn offline() -> FailingRouteProvider {
        FailingRouteProvider::new(RouteError::ProviderUnavailable)
    }

    #[rstest]
    fn midpoint_shop_qualifies_in_fallback_mode(request: DiscoveryRequest) {
        let shop = shop_at("mid", ShopType::Grocery, midpoint(ORIGIN, DESTINATION));
        let discovery = discover(&offline(), &[shop], &request).expect("fallback never errors");

        assert_eq!(discovery.geometry, GeometrySource::Fallback);
        assert_eq!(discovery.candidates.len(), 1);
        let candidate = discovery.candidates.first().expect("one candidate");
        assert!((candidate.route_position - 0.5).abs() < 1e-6);
        assert!(candidate.distance_from_route_km < 1e-6);
        assert!(candidate.on_route);
    }

    #[rstest]
    fn shop_offset_beyond_budget_is_excluded(request: DiscoveryRequest) {
        // Offset the midpoint perpendicular by roughly 3 km (~0.027 deg lat).
        let mut location = midpoint(ORIGIN, DESTINATION);
        location.y += 0.027;
        let shop = shop_at("far", ShopType::Grocery, location);

        let discovery = discover(&offline(), &[shop], &request).expect("fallback never errors");
        assert!(discovery.candidates.is_empty());
    }

    #[rstest]
    fn fallback_respects_the_position_margin(request: DiscoveryRequest) {
        // Both sit on the extended segment line behind the start, under 2 km
        // away: one just inside the 20% margin, one just beyond it.
        let just_inside = shop_at(
            "just-inside",
            ShopType::Grocery,
            Coord { x: 77.5925, y: 12.8925 },
        );
        let beyond_margin = shop_at(
            "beyond-margin",
            ShopType::Grocery,
            Coord { x: 77.5875, y: 12.8875 },
        );

        let discovery = discover(&offline(), &[just_inside, beyond_margin], &request)
            .expect("fallback never errors");
        let ids: Vec<&str> = discovery
            .candidates
            .iter()
            .map(|c| c.shop.id.as_str())
            .collect();
        assert_eq!(ids, vec!["just-inside"]);
    }

    #[rstest]
    fn fallback_orders_candidates_start_to_end(request: DiscoveryRequest) {
        let near_end = shop_at(
            "near-end",
            ShopType::Grocery,
            Coord { x: 77.645, y: 12.945 },
        );
        let near_start = shop_at(
            "near-start",
            ShopType::Grocery,
            Coord { x: 77.605, y: 12.905 },
        );

        let discovery =
            discover(&offline(), &[near_end, near_start], &request).expect("fallback never errors");
        let ids: Vec<&str> = discovery
            .candidates
            .iter()
            .map(|c| c.shop.id.as_str())
            .collect();
        assert_eq!(ids, vec!["near-start", "near-end"]);
    }

    #[rstest]
    fn inactive_and_foreign_types_never_become_candidates(mut request: DiscoveryRequest) {
        request.allowed_types = vec![ShopType::Grocery];
        let mut inactive = shop_at("inactive", ShopType::Grocery, midpoint(ORIGIN, DESTINATION));
        inactive.active = false;
        let bar = shop_at("bar", ShopType::Bar, midpoint(ORIGIN, DESTINATION));

        let discovery =
            discover(&offline(), &[inactive, bar], &request).expect("fallback never errors");
        assert!(discovery.candidates.is_empty());
    }

    #[rstest]
    fn provider_path_orders_by_distance_from_route(request: DiscoveryRequest) {
        let provider = StaticRouteProvider::straight_line(ORIGIN, DESTINATION);
        let close = shop_at("close", ShopType::Grocery, Coord { x: 77.626, y: 12.925 });
        let closer = shop_at("closer", ShopType::Grocery, Coord { x: 77.625, y: 12.925 });

        let discovery =
            discover(&provider, &[close, closer], &request).expect("provider path succeeds");
        assert_eq!(discovery.geometry, GeometrySource::Provider);
        let ids: Vec<&str> = discovery
            .candidates
            .iter()
            .map(|c| c.shop.id.as_str())
            .collect();
        assert_eq!(ids, vec!["closer", "close"]);
        assert!(discovery.route_distance_km > 0.0);
    }

    #[rstest]
    fn provider_detour_is_out_and_back(request: DiscoveryRequest) {
        let provider = StaticRouteProvider::straight_line(ORIGIN, DESTINATION);
        let shop = shop_at("near", ShopType::Grocery, Coord { x: 77.626, y: 12.925 });

        let discovery = discover(&provider, &[shop], &request).expect("provider path succeeds");
        let candidate = discovery.candidates.first().expect("one candidate");
        assert!(
            (candidate.detour_km - candidate.distance_from_route_km * 2.0).abs() < 1e-9
        );
    }

    #[rstest]
    fn no_route_found_is_surfaced(request: DiscoveryRequest) {
        let provider = FailingRouteProvider::new(RouteError::NoRouteFound);
        let shop = shop_at("mid", ShopType::Grocery, midpoint(ORIGIN, DESTINATION));

        let error = discover(&provider, &[shop], &request).expect_err("no route should surface");
        assert_eq!(error, DiscoveryError::RouteNotFound);
    }

    #[rstest]
    fn empty_overview_path_counts_as_no_route(request: DiscoveryRequest) {
        let provider = StaticRouteProvider::with_route(RouteResult::default());
        let shop = shop_at("mid", ShopType::Grocery, midpoint(ORIGIN, DESTINATION));

        let error = discover(&provider, &[shop], &request).expect_err("empty path is no route");
        assert_eq!(error, DiscoveryError::RouteNotFound);
    }

    #[rstest]
    fn timeout_falls_back_instead_of_failing(request: DiscoveryRequest) {
        let provider = FailingRouteProvider::new(RouteError::Timeout);
        let shop = shop_at("mid", ShopType::Grocery, midpoint(ORIGIN, DESTINATION));

        let discovery = discover(&provider, &[shop], &request).expect("timeout must not surface");
        assert_eq!(discovery.geometry, GeometrySource::Fallback);
        assert_eq!(discovery.candidates.len(), 1);
    }

    #[rstest]
    fn detour_area_is_centred_on_the_trip(request: DiscoveryRequest) {
        let discovery = discover(&offline(), &[], &request).expect("fallback never errors");
        assert_eq!(discovery.detour_area.center, midpoint(ORIGIN, DESTINATION));
        assert!((discovery.detour_area.radius_km - 2.0).abs() < f64::EPSILON);
    }

    #[rstest]
    fn store_backed_discovery_matches_the_direct_path(request: DiscoveryRequest) {
        use crate::test_support::MemoryShopStore;

        let shops = vec![
            shop_at("mid", ShopType::Grocery, midpoint(ORIGIN, DESTINATION)),
            shop_at("distant", ShopType::Grocery, Coord { x: 78.40, y: 13.60 }),
        ];
        let store = MemoryShopStore::with_shops(shops.clone());

        let direct = discover(&offline(), &shops, &request).expect("fallback never errors");
        let via_store =
            discover_from_store(&offline(), &store, &request).expect("fallback never errors");

        // The distant shop never survives the precise filter, so the
        // corridor prefilter must not change the outcome.
        assert_eq!(via_store.candidates, direct.candidates);
        assert_eq!(via_store.candidates.len(), 1);
    }
}
