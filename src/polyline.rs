//! Polyline representation for planned route geometries.
//!
//! Routes are kept as decoded (lat, lng) sequences. Persisting an approved
//! route stores one row per point, keyed by `"{path_id}-{sequence}"`.

use serde::{Deserialize, Serialize};

use crate::geodesic::{geodesic_km, Coordinate};

/// A polyline representing a route geometry as decoded coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Coordinate>,
}

/// One stored point of an approved route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub path_id: u64,
    pub idx: String,
    pub lat: f64,
    pub lon: f64,
}

impl Polyline {
    /// Each point is a (latitude, longitude) tuple.
    pub fn new(points: Vec<Coordinate>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn into_points(self) -> Vec<Coordinate> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Starts and ends at the same point.
    pub fn is_closed(&self) -> bool {
        self.points.len() > 1 && self.points.first() == self.points.last()
    }

    /// Geodesic length in kilometers.
    pub fn length_km(&self) -> f64 {
        self.points
            .windows(2)
            .map(|pair| geodesic_km(pair[0], pair[1]))
            .sum()
    }

    /// Per-point identifiers `"{route}-{sequence}"`.
    pub fn point_ids(&self, route: impl std::fmt::Display) -> Vec<String> {
        (0..self.points.len())
            .map(|sequence| format!("{}-{}", route, sequence))
            .collect()
    }

    /// Storage rows for this polyline under `path_id`.
    pub fn path_points(&self, path_id: u64) -> Vec<PathPoint> {
        self.points
            .iter()
            .zip(self.point_ids(path_id))
            .map(|(&(lat, lon), idx)| PathPoint { path_id, idx, lat, lon })
            .collect()
    }

    /// `[[lat, lng], ...]`, the wire shape used by the service.
    pub fn to_pairs(&self) -> Vec<[f64; 2]> {
        self.points.iter().map(|&(lat, lng)| [lat, lng]).collect()
    }
}

impl From<Vec<[f64; 2]>> for Polyline {
    fn from(pairs: Vec<[f64; 2]>) -> Self {
        Self::new(pairs.into_iter().map(|[lat, lng]| (lat, lng)).collect())
    }
}
