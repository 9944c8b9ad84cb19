//! Pure straight-line route geometry.
//!
//! These helpers back the offline discovery path: when no routing provider
//! is reachable the trip is modelled as the line segment between its two
//! endpoints, and shops are measured against that segment. Projections work
//! on raw lon/lat degrees — adequate for the city-scale distances the
//! detour budget allows — while reported distances use the great-circle
//! formula.

use geo::Coord;

/// Mean Earth radius in kilometres, as used by the great-circle formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Degrees of latitude per kilometre, used to pad bounding boxes.
const DEGREES_PER_KM: f64 = 1.0 / 111.0;

/// Result of projecting a point onto a trip segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentProjection {
    /// Unclamped projection parameter: `0` at the segment start, `1` at the
    /// end, outside that range for points beyond the endpoints.
    pub position: f64,
    /// Closest point on the segment itself (parameter clamped to `[0, 1]`).
    pub foot: Coord<f64>,
}

/// Great-circle distance between two WGS84 coordinates in kilometres.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use thru_core::geometry::haversine_km;
///
/// let bengaluru = Coord { x: 77.59, y: 12.97 };
/// let chennai = Coord { x: 80.27, y: 13.08 };
/// let d = haversine_km(bengaluru, chennai);
/// assert!((d - 290.0).abs() < 10.0);
/// ```
#[must_use]
pub fn haversine_km(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let d_lat = (b.y - a.y).to_radians();
    let d_lng = (b.x - a.x).to_radians();
    let half_chord = (d_lat / 2.0).sin().powi(2)
        + a.y.to_radians().cos() * b.y.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let angle = 2.0 * half_chord.sqrt().atan2((1.0 - half_chord).sqrt());
    EARTH_RADIUS_KM * angle
}

/// Project `point` onto the segment from `start` to `end`.
///
/// The projection parameter is left unclamped so callers can tell where a
/// point sits relative to the trip, including before the start or past the
/// end; the foot point is clamped so distance measurements stay on the
/// segment. A degenerate segment (`start == end`) projects to the start
/// with position `0`.
#[must_use]
pub fn project_onto_segment(
    point: Coord<f64>,
    start: Coord<f64>,
    end: Coord<f64>,
) -> SegmentProjection {
    let to_point = Coord {
        x: point.x - start.x,
        y: point.y - start.y,
    };
    let along = Coord {
        x: end.x - start.x,
        y: end.y - start.y,
    };
    let length_sq = along.x * along.x + along.y * along.y;
    if length_sq == 0.0 {
        return SegmentProjection {
            position: 0.0,
            foot: start,
        };
    }

    let position = (to_point.x * along.x + to_point.y * along.y) / length_sq;
    let clamped = position.clamp(0.0, 1.0);
    SegmentProjection {
        position,
        foot: Coord {
            x: start.x + clamped * along.x,
            y: start.y + clamped * along.y,
        },
    }
}

/// Great-circle distance from `point` to the segment `[start, end]`,
/// in kilometres.
#[must_use]
pub fn distance_to_segment_km(point: Coord<f64>, start: Coord<f64>, end: Coord<f64>) -> f64 {
    let projection = project_onto_segment(point, start, end);
    haversine_km(point, projection.foot)
}

/// Midpoint of the segment in lon/lat space.
#[must_use]
pub fn midpoint(start: Coord<f64>, end: Coord<f64>) -> Coord<f64> {
    Coord {
        x: (start.x + end.x) / 2.0,
        y: (start.y + end.y) / 2.0,
    }
}

/// Axis-aligned corridor around the segment, padded by `margin_km`.
///
/// The padding uses the flat 111 km-per-degree approximation; it is a
/// prefilter, so overshooting slightly near the poles is acceptable.
#[must_use]
pub fn corridor_bbox(start: Coord<f64>, end: Coord<f64>, margin_km: f64) -> geo::Rect<f64> {
    let margin_deg = margin_km * DEGREES_PER_KM;
    geo::Rect::new(
        Coord {
            x: start.x.min(end.x) - margin_deg,
            y: start.y.min(end.y) - margin_deg,
        },
        Coord {
            x: start.x.max(end.x) + margin_deg,
            y: start.y.max(end.y) + margin_deg,
        },
    )
}
