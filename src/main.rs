//! Route planning service - Axum server

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use aoi_route_planner::api::create_router;
use aoi_route_planner::config::{PlannerConfig, ServerConfig};
use aoi_route_planner::planner::RoutePlanner;
use aoi_route_planner::skeleton::ShorelineSkeleton;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("aoi_route_planner=info".parse()?))
        .init();

    let server = ServerConfig::from_env()?;
    let skeleton = match &server.skeleton_path {
        Some(path) => ShorelineSkeleton::from_json_file(path)?,
        None => ShorelineSkeleton::maschsee(),
    };
    let config = match &server.planner_config_path {
        Some(path) => PlannerConfig::load(path)?,
        None => PlannerConfig::default(),
    };
    info!(
        ring_points = skeleton.len(),
        perimeter_km = skeleton.perimeter_km(),
        solver = ?config.solver,
        time_budget_secs = config.time_budget_secs,
        "Planner ready"
    );

    let planner = Arc::new(RoutePlanner::new(skeleton, config)?);
    let app = create_router(planner);

    let listener = tokio::net::TcpListener::bind(server.bind_addr).await?;
    info!("Server listening on http://{}", server.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
