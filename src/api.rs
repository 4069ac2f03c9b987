//! HTTP embedding of the planner.
//!
//! Endpoints:
//! - `POST /routePos` and `POST /route`: plan routes for a set of AOIs
//! - `GET /health`: liveness check
//!
//! Planning is CPU bound, so each request runs on tokio's blocking pool.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::demand::{RouteConstraints, SolveStatus};
use crate::error::PlanError;
use crate::geodesic::{centroid, is_valid_coordinate};
use crate::planner::{Aoi, PlannedRoutes, RoutePlanner};

/// One AOI as sent by the dashboard: cleaning amount plus polygon ring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AoiInput {
    pub amount: u32,
    /// `[[lat, lon], ...]`
    pub cords: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub vehicle_capacity: u32,
    /// Per-route duration cap; absent means unrestricted.
    #[serde(default, alias = "duration", skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    pub aoi: BTreeMap<String, AoiInput>,
}

impl PlanRequest {
    pub fn constraints(&self) -> RouteConstraints {
        RouteConstraints {
            vehicle_capacity: self.vehicle_capacity,
            max_duration_minutes: self.duration_minutes.map(f64::from),
        }
    }

    /// AOIs in key order, each reduced to its polygon centroid.
    pub fn to_aois(&self) -> Result<Vec<Aoi>, PlanError> {
        self.aoi
            .iter()
            .map(|(key, input)| {
                let points: Vec<(f64, f64)> = input.cords.iter().map(|&[lat, lon]| (lat, lon)).collect();
                if let Some(bad) = points.iter().find(|&&point| !is_valid_coordinate(point)) {
                    return Err(PlanError::Input(format!("AOI '{}' has an invalid coordinate {:?}", key, bad)));
                }
                let center = centroid(&points)
                    .ok_or_else(|| PlanError::Input(format!("AOI '{}' has no cords", key)))?;
                Ok(Aoi {
                    key: key.clone(),
                    centroid: center,
                    demand: input.amount,
                })
            })
            .collect()
    }
}

/// Summary of one planned route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStats {
    /// AOI keys in visit order.
    pub aois: Vec<String>,
    pub load: u64,
    pub distance_km: f64,
    pub duration_minutes: f64,
}

/// `{"routes": {"1": [[lat, lon], ...]}}` plus optional extras.
///
/// With no AOIs only `routes` is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResponse {
    pub routes: BTreeMap<usize, Vec<[f64; 2]>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_aois: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SolveStatus>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub route_stats: BTreeMap<usize, RouteStats>,
}

impl From<PlannedRoutes<String>> for PlanResponse {
    fn from(planned: PlannedRoutes<String>) -> Self {
        let status = match planned.status {
            SolveStatus::NoAois => None,
            status => Some(status),
        };
        let mut routes = BTreeMap::new();
        let mut route_stats = BTreeMap::new();
        for (number, route) in planned.routes {
            routes.insert(number, route.polyline.to_pairs());
            route_stats.insert(
                number,
                RouteStats {
                    aois: route.aoi_keys,
                    load: route.load,
                    distance_km: route.distance_km,
                    duration_minutes: route.duration_minutes,
                },
            );
        }
        Self {
            routes,
            excluded_aois: planned.excluded.into_iter().map(|aoi| aoi.key).collect(),
            status,
            route_stats,
        }
    }
}

/// Error body returned with every non-2xx response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError(pub PlanError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            PlanError::Input(_) => StatusCode::BAD_REQUEST,
            PlanError::NoFeasibleSolution { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PlanError> for ApiError {
    fn from(err: PlanError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(error = %self.0, "Planning failed");
        } else {
            info!(error = %self.0, "Planning request rejected");
        }
        let body = ErrorBody {
            error: self.0.kind().to_string(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Runs one request through the planner, outside of any HTTP context.
pub fn plan_request(planner: &RoutePlanner, request: &PlanRequest) -> Result<PlanResponse, PlanError> {
    let aois = request.to_aois()?;
    let planned = planner.plan(&aois, request.constraints())?;
    Ok(PlanResponse::from(planned))
}

/// Application state shared across handlers.
pub struct AppState {
    pub planner: Arc<RoutePlanner>,
}

pub fn create_router(planner: Arc<RoutePlanner>) -> Router {
    let state = Arc::new(AppState { planner });

    Router::new()
        .route("/health", get(health))
        .route("/routePos", post(plan_route))
        .route("/route", post(plan_route))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "UP" })
}

async fn plan_route(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PlanRequest>, JsonRejection>,
) -> Result<Json<PlanResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| PlanError::Input(rejection.body_text()))?;
    info!(
        aois = request.aoi.len(),
        capacity = request.vehicle_capacity,
        duration = ?request.duration_minutes,
        "Planning request"
    );

    let planner = Arc::clone(&state.planner);
    let response = tokio::task::spawn_blocking(move || plan_request(&planner, &request))
        .await
        .map_err(|err| PlanError::Solver(format!("planning task failed: {}", err)))??;
    Ok(Json(response))
}
