//! Test fixtures for aoi-route-planner.
//!
//! Provides realistic test data including:
//! - AOI polygons on the Maschsee (Hanover), inside the built-in skeleton
//! - Builders for planning requests and synthetic AOIs

#![allow(dead_code)]

pub mod maschsee_aois;

pub use maschsee_aois::*;

use std::collections::BTreeMap;

use aoi_route_planner::api::{AoiInput, PlanRequest};
use aoi_route_planner::planner::Aoi;
use aoi_route_planner::skeleton::ShorelineSkeleton;

/// Unit square lake; ring point 0 at (0, 0) is the depot.
pub fn square_skeleton() -> ShorelineSkeleton {
    ShorelineSkeleton::new(vec![(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]).unwrap()
}

pub fn aoi(key: &str, lat: f64, lng: f64, demand: u32) -> Aoi {
    Aoi {
        key: key.to_string(),
        centroid: (lat, lng),
        demand,
    }
}

/// Axis-aligned square polygon of half-width `half` around a center.
pub fn square_polygon(center: (f64, f64), half: f64) -> Vec<[f64; 2]> {
    let (lat, lng) = center;
    vec![
        [lat - half, lng - half],
        [lat - half, lng + half],
        [lat + half, lng + half],
        [lat + half, lng - half],
    ]
}

/// Builder for planning requests with sensible defaults.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    request: PlanRequest,
}

impl RequestBuilder {
    pub fn new(vehicle_capacity: u32) -> Self {
        Self {
            request: PlanRequest {
                vehicle_capacity,
                duration_minutes: None,
                aoi: BTreeMap::new(),
            },
        }
    }

    pub fn duration(mut self, minutes: u32) -> Self {
        self.request.duration_minutes = Some(minutes);
        self
    }

    pub fn aoi(mut self, key: &str, amount: u32, cords: Vec<[f64; 2]>) -> Self {
        self.request.aoi.insert(key.to_string(), AoiInput { amount, cords });
        self
    }

    pub fn maschsee(mut self) -> Self {
        for area in MASCHSEE_AOIS {
            self = self.aoi(area.name, area.amount, area.polygon());
        }
        self
    }

    pub fn build(self) -> PlanRequest {
        self.request
    }
}
