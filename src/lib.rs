//! aoi-route-planner core
//!
//! Capacitated route planning for a lake-cleaning vessel: AOIs are attached
//! to a fixed shoreline skeleton, reduced to a CVRP instance, solved under a
//! time budget and expanded back into render-ready polylines.

pub mod traits;
pub mod error;
pub mod config;
pub mod geodesic;
pub mod skeleton;
pub mod graph;
pub mod paths;
pub mod demand;
pub mod solver;
pub mod exact;
pub mod expand;
pub mod polyline;
pub mod planner;
pub mod api;
pub mod client;
