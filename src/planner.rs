//! End-to-end route planning.
//!
//! A [`RoutePlanner`] is built once at startup from the shoreline skeleton
//! and configuration, then shared read-only by every planning request.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use tracing::info;

use crate::config::{PlannerConfig, SolverKind};
use crate::demand::{self, CvrpSolution, DemandGraph, RouteConstraints, SolveStatus, TimingModel};
use crate::error::PlanError;
use crate::exact::{ExactSolver, EXACT_MAX_AOIS};
use crate::expand::expand;
use crate::geodesic::{is_valid_coordinate, Coordinate};
use crate::graph::{build_graph, ExcludedAoi, NodeId};
use crate::paths::all_pairs_shortest;
use crate::polyline::Polyline;
use crate::skeleton::{PlanarContainment, ShorelineSkeleton};
use crate::solver::{LocalSearchSolver, SolveOptions};
use crate::traits::{AreaOfInterest, CvrpSolver};

/// Plain AOI record, as decoded from a planning request.
#[derive(Debug, Clone, PartialEq)]
pub struct Aoi {
    pub key: String,
    pub centroid: Coordinate,
    pub demand: u32,
}

impl AreaOfInterest for Aoi {
    type Key = String;

    fn key(&self) -> &String {
        &self.key
    }

    fn centroid(&self) -> Coordinate {
        self.centroid
    }

    fn demand(&self) -> u32 {
        self.demand
    }
}

/// Exact for small instances, local search otherwise.
#[derive(Debug, Clone)]
pub struct AutoSolver {
    pub exact_limit: usize,
    pub local: LocalSearchSolver,
}

impl CvrpSolver for AutoSolver {
    fn solve(&self, problem: &DemandGraph, time_budget: Duration) -> Result<CvrpSolution, PlanError> {
        let n = problem.aoi_count();
        if n <= self.exact_limit.min(EXACT_MAX_AOIS) {
            ExactSolver.solve(problem, time_budget)
        } else {
            self.local.solve(problem, time_budget)
        }
    }
}

/// Builds the solver selected by the configuration.
pub fn solver_for(config: &PlannerConfig) -> Box<dyn CvrpSolver + Send + Sync> {
    let local = LocalSearchSolver::new(SolveOptions {
        local_search_iterations: config.local_search_iterations,
    });
    match config.solver {
        SolverKind::Auto => Box::new(AutoSolver {
            exact_limit: config.exact_solver_limit,
            local,
        }),
        SolverKind::Exact => Box::new(ExactSolver),
        SolverKind::LocalSearch => Box::new(local),
    }
}

/// One planned route, numbered from 1.
#[derive(Debug, Clone)]
pub struct PlannedRoute<K> {
    /// AOI keys in visit order.
    pub aoi_keys: Vec<K>,
    /// Depot, AOI nodes, depot.
    pub nodes: Vec<NodeId>,
    pub polyline: Polyline,
    pub load: u64,
    pub distance_km: f64,
    pub duration_minutes: f64,
}

#[derive(Debug, Clone)]
pub struct PlannedRoutes<K> {
    pub routes: BTreeMap<usize, PlannedRoute<K>>,
    /// AOIs that could not be attached to the skeleton.
    pub excluded: Vec<ExcludedAoi<K>>,
    pub total_distance_km: f64,
    pub status: SolveStatus,
}

impl<K> PlannedRoutes<K> {
    fn empty(excluded: Vec<ExcludedAoi<K>>) -> Self {
        Self {
            routes: BTreeMap::new(),
            excluded,
            total_distance_km: 0.0,
            status: SolveStatus::NoAois,
        }
    }

    pub fn polylines(&self) -> BTreeMap<usize, &Polyline> {
        self.routes
            .iter()
            .map(|(number, route)| (*number, &route.polyline))
            .collect()
    }
}

pub struct RoutePlanner<S = Box<dyn CvrpSolver + Send + Sync>> {
    skeleton: ShorelineSkeleton,
    containment: PlanarContainment,
    config: PlannerConfig,
    solver: S,
}

impl RoutePlanner {
    /// Planner using the solver named in `config`.
    pub fn new(skeleton: ShorelineSkeleton, config: PlannerConfig) -> Result<Self, PlanError> {
        let solver = solver_for(&config);
        Self::with_solver(skeleton, config, solver)
    }
}

impl<S: CvrpSolver> RoutePlanner<S> {
    pub fn with_solver(skeleton: ShorelineSkeleton, config: PlannerConfig, solver: S) -> Result<Self, PlanError> {
        config.validate()?;
        let containment = PlanarContainment::new(&skeleton, config.containment_samples);
        Ok(Self {
            skeleton,
            containment,
            config,
            solver,
        })
    }

    pub fn skeleton(&self) -> &ShorelineSkeleton {
        &self.skeleton
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    fn timing(&self) -> TimingModel {
        TimingModel {
            minutes_per_km: self.config.minutes_per_km,
            service_time_minutes: self.config.service_time_minutes,
        }
    }

    /// Plans routes visiting every reachable AOI.
    pub fn plan<A>(&self, aois: &[A], constraints: RouteConstraints) -> Result<PlannedRoutes<A::Key>, PlanError>
    where
        A: AreaOfInterest,
    {
        validate(aois, &constraints)?;
        if aois.is_empty() {
            info!("No AOIs to plan");
            return Ok(PlannedRoutes::empty(Vec::new()));
        }

        let started = Instant::now();
        let routable = build_graph(&self.skeleton, &self.containment, aois);
        let demand_nodes = routable.demand_nodes();
        if demand_nodes.is_empty() {
            info!(excluded = routable.excluded.len(), "No AOI could be attached to the skeleton");
            return Ok(PlannedRoutes::empty(routable.excluded));
        }

        let nodes: Vec<NodeId> = demand_nodes.iter().map(|(node, _)| *node).collect();
        let paths = all_pairs_shortest(&routable.graph, &nodes)?;
        let solved = demand::solve(
            &self.solver,
            &demand_nodes,
            &paths,
            constraints,
            self.timing(),
            self.config.time_budget(),
        )?;
        let node_routes = solved.node_routes();
        let mut polylines = expand(&node_routes, &paths, &routable.graph)?;

        let mut routes = BTreeMap::new();
        for (number, solved_route) in solved.routes {
            let aoi_keys = solved_route
                .nodes
                .iter()
                .filter_map(|&node| routable.aoi_at(node).map(|aoi| aoi.key.clone()))
                .collect();
            let polyline = polylines
                .remove(&number)
                .ok_or_else(|| PlanError::Solver(format!("route {} was not expanded", number)))?;
            routes.insert(
                number,
                PlannedRoute {
                    aoi_keys,
                    nodes: solved_route.nodes,
                    polyline,
                    load: solved_route.load,
                    distance_km: solved_route.distance_km,
                    duration_minutes: solved_route.duration_minutes,
                },
            );
        }

        info!(
            aois = aois.len(),
            excluded = routable.excluded.len(),
            routes = routes.len(),
            total_km = solved.total_cost,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Route plan ready"
        );

        Ok(PlannedRoutes {
            routes,
            excluded: routable.excluded,
            total_distance_km: solved.total_cost,
            status: solved.status,
        })
    }
}

fn validate<A: AreaOfInterest>(aois: &[A], constraints: &RouteConstraints) -> Result<(), PlanError> {
    if let Some(limit) = constraints.max_duration_minutes {
        if !(limit.is_finite() && limit >= 0.0) {
            return Err(PlanError::Input(format!(
                "duration limit must be a non-negative number of minutes, got {}",
                limit
            )));
        }
    }
    for aoi in aois {
        if !is_valid_coordinate(aoi.centroid()) {
            return Err(PlanError::Input(format!(
                "AOI {:?} has an invalid centroid {:?}",
                aoi.key(),
                aoi.centroid()
            )));
        }
    }
    Ok(())
}
