//! End-to-end planning scenarios
//!
//! Square toy lakes for exact expectations, the Maschsee for realistic input.

mod fixtures;

use std::collections::BTreeSet;

use aoi_route_planner::api::plan_request;
use aoi_route_planner::config::{PlannerConfig, SolverKind};
use aoi_route_planner::demand::{RouteConstraints, SolveStatus};
use aoi_route_planner::error::PlanError;
use aoi_route_planner::graph::build_graph;
use aoi_route_planner::planner::{Aoi, RoutePlanner};
use aoi_route_planner::skeleton::{PlanarContainment, ShorelineSkeleton};

use fixtures::*;

fn planner(skeleton: ShorelineSkeleton) -> RoutePlanner {
    let config = PlannerConfig {
        time_budget_secs: 10.0,
        ..PlannerConfig::default()
    };
    RoutePlanner::new(skeleton, config).unwrap()
}

// ============================================================================
// Toy lake
// ============================================================================

#[test]
fn test_single_aoi_single_route() {
    let planned = planner(square_skeleton())
        .plan(&[aoi("a", 0.5, 0.5, 5)], RouteConstraints::capacity_only(10))
        .unwrap();

    assert_eq!(planned.routes.len(), 1);
    let points = planned.routes[&1].polyline.points();
    assert_eq!(points.first(), Some(&(0.0, 0.0)));
    assert_eq!(points.last(), Some(&(0.0, 0.0)));
    assert!(points.contains(&(0.5, 0.5)));
    assert_eq!(planned.status, SolveStatus::Completed);
}

#[test]
fn test_capacity_splits_routes() {
    let aois = [aoi("a", 0.3, 0.3, 8), aoi("b", 0.7, 0.7, 8)];
    let planned = planner(square_skeleton())
        .plan(&aois, RouteConstraints::capacity_only(10))
        .unwrap();

    assert_eq!(planned.routes.len(), 2);
    assert_eq!(planned.routes.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
    for route in planned.routes.values() {
        assert_eq!(route.aoi_keys.len(), 1);
        assert_eq!(route.load, 8);
        assert!(route.polyline.is_closed());
    }
}

#[test]
fn test_shared_route_when_capacity_allows() {
    // Both sit near the far edge, so one tour beats two out-and-backs.
    let aois = [aoi("a", 0.1, 0.9, 4), aoi("b", 0.9, 0.9, 4)];
    let planned = planner(square_skeleton())
        .plan(&aois, RouteConstraints::capacity_only(10))
        .unwrap();

    assert_eq!(planned.routes.len(), 1);
    assert_eq!(planned.routes[&1].load, 8);
}

#[test]
fn test_no_aois_yields_empty_routes() {
    let request = RequestBuilder::new(10).duration(60).build();
    let response = plan_request(&planner(square_skeleton()), &request).unwrap();
    assert_eq!(serde_json::to_string(&response).unwrap(), r#"{"routes":{}}"#);
}

#[test]
fn test_outside_aoi_is_excluded() {
    let planned = planner(square_skeleton())
        .plan(&[aoi("far", 5.0, 5.0, 1)], RouteConstraints::capacity_only(10))
        .unwrap();

    assert!(planned.routes.is_empty());
    assert_eq!(planned.excluded.len(), 1);
    assert_eq!(planned.excluded[0].key, "far");
}

#[test]
fn test_excluded_aoi_reported_next_to_routes() {
    let request = RequestBuilder::new(10)
        .aoi("a-outside", 1, square_polygon((5.0, 5.0), 0.05))
        .aoi("b-inside", 3, square_polygon((0.5, 0.5), 0.05))
        .build();
    let response = plan_request(&planner(square_skeleton()), &request).unwrap();

    assert_eq!(response.excluded_aois, vec!["a-outside".to_string()]);
    assert_eq!(response.routes.len(), 1);
    assert_eq!(response.route_stats[&1].aois, vec!["b-inside".to_string()]);
}

#[test]
fn test_excluded_aoi_does_not_consume_node_id() {
    let skeleton = square_skeleton();
    let containment = PlanarContainment::new(&skeleton, 10);
    let aois = [aoi("a", 5.0, 5.0, 1), aoi("b", 0.5, 0.5, 1)];
    let plan = build_graph(&skeleton, &containment, &aois);

    assert_eq!(plan.accepted.len(), 1);
    assert_eq!(plan.accepted[0].node, skeleton.len());
    assert_eq!(plan.graph.node_count(), skeleton.len() + 1);
}

#[test]
fn test_cost_is_idempotent() {
    let aois = [
        aoi("a", 0.2, 0.3, 3),
        aoi("b", 0.8, 0.4, 5),
        aoi("c", 0.5, 0.9, 2),
        aoi("d", 0.4, 0.6, 4),
    ];
    let planner = planner(square_skeleton());
    let first = planner.plan(&aois, RouteConstraints::capacity_only(8)).unwrap();
    let second = planner.plan(&aois, RouteConstraints::capacity_only(8)).unwrap();

    assert_eq!(first.total_distance_km, second.total_distance_km);
    assert_eq!(first.polylines(), second.polylines());
}

#[test]
fn test_demand_over_capacity_is_infeasible() {
    let err = planner(square_skeleton())
        .plan(&[aoi("heavy", 0.5, 0.5, 11)], RouteConstraints::capacity_only(10))
        .unwrap_err();
    assert!(matches!(err, PlanError::NoFeasibleSolution { node: 4, .. }), "got {:?}", err);
}

#[test]
fn test_duration_cap_below_service_time_is_infeasible() {
    let constraints = RouteConstraints {
        vehicle_capacity: 10,
        max_duration_minutes: Some(10.0),
    };
    let err = planner(square_skeleton())
        .plan(&[aoi("a", 0.5, 0.5, 1)], constraints)
        .unwrap_err();
    assert!(matches!(err, PlanError::NoFeasibleSolution { .. }));
}

#[test]
fn test_polylines_only_use_graph_points() {
    let skeleton = square_skeleton();
    let aois = [aoi("a", 0.25, 0.75, 2), aoi("b", 0.75, 0.25, 2)];
    let planned = planner(skeleton.clone())
        .plan(&aois, RouteConstraints::capacity_only(2))
        .unwrap();

    let mut known: Vec<(f64, f64)> = skeleton.points().to_vec();
    known.extend(aois.iter().map(|area| area.centroid));
    for route in planned.routes.values() {
        for point in route.polyline.points() {
            assert!(known.contains(point), "{:?} is not a graph point", point);
        }
    }
}

#[test]
fn test_budget_past_instant_range_still_plans() {
    let config = PlannerConfig {
        time_budget_secs: 1e19,
        ..PlannerConfig::default()
    };
    let planner = RoutePlanner::new(square_skeleton(), config).unwrap();
    let planned = planner
        .plan(&[aoi("a", 0.5, 0.5, 5)], RouteConstraints::capacity_only(10))
        .unwrap();
    assert_eq!(planned.routes.len(), 1);
    assert_eq!(planned.status, SolveStatus::Completed);
}

// ============================================================================
// Maschsee
// ============================================================================

#[test]
fn test_maschsee_all_patches_routed() {
    let request = RequestBuilder::new(10).maschsee().build();
    let planner = planner(ShorelineSkeleton::maschsee());
    let response = plan_request(&planner, &request).unwrap();

    assert!(response.excluded_aois.is_empty());
    let served: BTreeSet<String> = response
        .route_stats
        .values()
        .flat_map(|stats| stats.aois.iter().cloned())
        .collect();
    let expected: BTreeSet<String> = MASCHSEE_AOIS.iter().map(|patch| patch.name.to_string()).collect();
    assert_eq!(served, expected);

    let depot = ShorelineSkeleton::maschsee().points()[0];
    let depot = [depot.0, depot.1];
    let total_load: u64 = response.route_stats.values().map(|stats| stats.load).sum();
    assert_eq!(total_load, total_amount() as u64);
    for (number, points) in &response.routes {
        assert_eq!(points.first(), Some(&depot), "route {} does not start at the depot", number);
        assert_eq!(points.last(), Some(&depot), "route {} does not end at the depot", number);
        assert!(response.route_stats[number].load <= 10);
    }
}

#[test]
fn test_maschsee_polyline_length_matches_route_distance() {
    let aois: Vec<Aoi> = MASCHSEE_AOIS
        .iter()
        .map(|patch| aoi(patch.name, patch.lat, patch.lng, patch.amount))
        .collect();
    let planned = planner(ShorelineSkeleton::maschsee())
        .plan(&aois, RouteConstraints::capacity_only(10))
        .unwrap();

    for (number, route) in &planned.routes {
        let walked = route.polyline.length_km();
        assert!(walked > 0.0);
        assert!(
            (walked - route.distance_km).abs() < 1e-6,
            "route {}: polyline {} km, route {} km",
            number,
            walked,
            route.distance_km
        );
    }
}

#[test]
fn test_maschsee_duration_cap_respected() {
    // Every patch alone fits in 140 minutes; together they do not.
    let request = RequestBuilder::new(100).duration(140).maschsee().build();
    let response = plan_request(&planner(ShorelineSkeleton::maschsee()), &request).unwrap();

    assert!(response.routes.len() >= 2);
    for stats in response.route_stats.values() {
        assert!(stats.duration_minutes <= 140.0 + 1e-6, "{:?}", stats);
    }
}

#[test]
fn test_maschsee_outside_patch_excluded() {
    let request = RequestBuilder::new(10)
        .maschsee()
        .aoi(OUTSIDE_LAKE.name, OUTSIDE_LAKE.amount, OUTSIDE_LAKE.polygon())
        .build();
    let response = plan_request(&planner(ShorelineSkeleton::maschsee()), &request).unwrap();
    assert_eq!(response.excluded_aois, vec![OUTSIDE_LAKE.name.to_string()]);
}

#[test]
fn test_maschsee_solvers_agree_on_feasibility() {
    let aois: Vec<Aoi> = MASCHSEE_AOIS
        .iter()
        .map(|patch| aoi(patch.name, patch.lat, patch.lng, patch.amount))
        .collect();
    let mut costs = Vec::new();
    for solver in [SolverKind::Exact, SolverKind::LocalSearch] {
        let config = PlannerConfig {
            solver,
            time_budget_secs: 10.0,
            ..PlannerConfig::default()
        };
        let planner = RoutePlanner::new(ShorelineSkeleton::maschsee(), config).unwrap();
        let planned = planner.plan(&aois, RouteConstraints::capacity_only(9)).unwrap();
        assert!(planned.routes.values().all(|route| route.load <= 9));
        costs.push(planned.total_distance_km);
    }
    assert!(costs[0] <= costs[1] + 1e-9, "exact {} > heuristic {}", costs[0], costs[1]);
}
