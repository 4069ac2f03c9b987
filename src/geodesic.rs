//! Geodesic distances on the WGS84 ellipsoid.
//!
//! Every edge cost in the planner goes through [`geodesic_km`], so all costs
//! share one unit and one formula.

use geo::line_measures::Distance;
use geo::{Geodesic, Point};

/// A (latitude, longitude) pair in degrees.
pub type Coordinate = (f64, f64);

/// Ellipsoidal great-circle distance between two points in kilometers.
pub fn geodesic_km(from: Coordinate, to: Coordinate) -> f64 {
    let (lat1, lng1) = from;
    let (lat2, lng2) = to;
    Geodesic.distance(Point::new(lng1, lat1), Point::new(lng2, lat2)) / 1000.0
}

/// Evenly spaced points from `from` to `to`, both ends included.
///
/// Plain linear interpolation in lat/lng, not along the geodesic.
pub fn linspace(from: Coordinate, to: Coordinate, samples: usize) -> Vec<Coordinate> {
    match samples {
        0 => Vec::new(),
        1 => vec![from],
        _ => {
            let steps = (samples - 1) as f64;
            (0..samples)
                .map(|i| {
                    let t = i as f64 / steps;
                    (from.0 + (to.0 - from.0) * t, from.1 + (to.1 - from.1) * t)
                })
                .collect()
        }
    }
}

/// Arithmetic mean of polygon vertices.
pub fn centroid(points: &[Coordinate]) -> Option<Coordinate> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (lat_sum, lng_sum) = points
        .iter()
        .fold((0.0, 0.0), |(lat, lng), point| (lat + point.0, lng + point.1));
    Some((lat_sum / n, lng_sum / n))
}

pub fn is_valid_coordinate(point: Coordinate) -> bool {
    let (lat, lng) = point;
    lat.is_finite() && lng.is_finite() && (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng)
}
