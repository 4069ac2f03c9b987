//! CVRP reduction: the directed demand graph with a virtual Source and Sink.
//!
//! Local vertex 0 is the depot. As an origin it plays Source, as a
//! destination it plays Sink; AOIs occupy vertices `1..=n` in input order.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::PlanError;
use crate::graph::{NodeId, DEPOT_NODE};
use crate::paths::ShortestPaths;
use crate::traits::CvrpSolver;

/// Vertex index of Source/Sink inside a [`DemandGraph`].
pub const DEPOT_VERTEX: usize = 0;

/// Per-route limits for one planning call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteConstraints {
    pub vehicle_capacity: u32,
    /// Travel plus service time cap per route, `None` for unrestricted.
    pub max_duration_minutes: Option<f64>,
}

impl RouteConstraints {
    pub fn capacity_only(vehicle_capacity: u32) -> Self {
        Self {
            vehicle_capacity,
            max_duration_minutes: None,
        }
    }
}

/// How distances turn into time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingModel {
    pub minutes_per_km: f64,
    /// Flat time spent at every AOI.
    pub service_time_minutes: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemandVertex {
    pub node: NodeId,
    pub demand: u32,
    pub service_time: f64,
}

/// Complete directed graph over {Source, Sink} and the routable AOIs.
#[derive(Debug, Clone)]
pub struct DemandGraph {
    vertices: Vec<DemandVertex>,
    cost: Vec<Vec<f64>>,
    time: Vec<Vec<f64>>,
    constraints: RouteConstraints,
}

impl DemandGraph {
    /// Builds the demand graph from shortest-path costs.
    ///
    /// Edge cost is the shortest-path distance (km), edge time is cost times
    /// `minutes_per_km`. Every AOI carries its demand and the flat service time.
    pub fn reduce(
        aoi_nodes: &[(NodeId, u32)],
        paths: &ShortestPaths,
        constraints: RouteConstraints,
        timing: TimingModel,
    ) -> Result<Self, PlanError> {
        let mut vertices = Vec::with_capacity(aoi_nodes.len() + 1);
        vertices.push(DemandVertex {
            node: DEPOT_NODE,
            demand: 0,
            service_time: 0.0,
        });
        for &(node, demand) in aoi_nodes {
            if node == DEPOT_NODE || vertices.iter().any(|vertex| vertex.node == node) {
                return Err(PlanError::Input(format!("AOI node {} appears more than once", node)));
            }
            vertices.push(DemandVertex {
                node,
                demand,
                service_time: timing.service_time_minutes,
            });
        }

        let n = vertices.len();
        let mut cost = vec![vec![0.0; n]; n];
        let mut time = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let (from, to) = (vertices[i].node, vertices[j].node);
                let km = paths
                    .cost(from, to)
                    .ok_or(PlanError::GraphConnectivity { from, to })?;
                cost[i][j] = km;
                time[i][j] = km * timing.minutes_per_km;
            }
        }

        debug!(aois = n - 1, "Demand graph reduced");

        Ok(Self {
            vertices,
            cost,
            time,
            constraints,
        })
    }

    /// Builds a demand graph from explicit matrices, vertex 0 being the depot.
    pub fn from_matrices(
        vertices: Vec<DemandVertex>,
        cost: Vec<Vec<f64>>,
        minutes_per_km: f64,
        constraints: RouteConstraints,
    ) -> Result<Self, PlanError> {
        let n = vertices.len();
        if n == 0 || cost.len() != n || cost.iter().any(|row| row.len() != n) {
            return Err(PlanError::Input(format!(
                "cost matrix must be {}x{} including the depot",
                n, n
            )));
        }
        let time = cost
            .iter()
            .map(|row| row.iter().map(|km| km * minutes_per_km).collect())
            .collect();
        Ok(Self {
            vertices,
            cost,
            time,
            constraints,
        })
    }

    /// Number of AOI vertices (excluding the depot).
    pub fn aoi_count(&self) -> usize {
        self.vertices.len() - 1
    }

    pub fn vertex(&self, index: usize) -> &DemandVertex {
        &self.vertices[index]
    }

    pub fn constraints(&self) -> RouteConstraints {
        self.constraints
    }

    pub fn cost(&self, from: usize, to: usize) -> f64 {
        self.cost[from][to]
    }

    pub fn time(&self, from: usize, to: usize) -> f64 {
        self.time[from][to]
    }

    /// Total demand of the AOI vertices on a route.
    pub fn route_load(&self, route: &[usize]) -> u64 {
        route.iter().map(|&v| self.vertices[v].demand as u64).sum()
    }

    /// Source -> route -> Sink distance.
    pub fn route_cost(&self, route: &[usize]) -> f64 {
        self.walk(route, |from, to| self.cost[from][to])
    }

    /// Source -> route -> Sink travel time plus service times.
    pub fn route_duration(&self, route: &[usize]) -> f64 {
        let service: f64 = route.iter().map(|&v| self.vertices[v].service_time).sum();
        self.walk(route, |from, to| self.time[from][to]) + service
    }

    pub fn is_feasible(&self, route: &[usize]) -> bool {
        if self.route_load(route) > self.constraints.vehicle_capacity as u64 {
            return false;
        }
        match self.constraints.max_duration_minutes {
            Some(limit) => self.route_duration(route) <= limit + DURATION_TOLERANCE,
            None => true,
        }
    }

    /// Checks every AOI can be served by a dedicated route.
    ///
    /// With an unbounded fleet this is the only way the instance can be
    /// infeasible.
    pub fn check_serviceable(&self) -> Result<(), PlanError> {
        let capacity = self.constraints.vehicle_capacity;
        for index in 1..self.vertices.len() {
            let vertex = &self.vertices[index];
            if vertex.demand > capacity {
                return Err(PlanError::NoFeasibleSolution {
                    node: vertex.node,
                    reason: format!("demand {} exceeds vehicle capacity {}", vertex.demand, capacity),
                });
            }
            if let Some(limit) = self.constraints.max_duration_minutes {
                let duration = self.route_duration(&[index]);
                if duration > limit + DURATION_TOLERANCE {
                    return Err(PlanError::NoFeasibleSolution {
                        node: vertex.node,
                        reason: format!(
                            "needs {:.1} minutes on its own, more than the {:.1} minute limit",
                            duration, limit
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    /// Maps a vertex route to a closed GeoGraph node route starting and
    /// ending at the depot anchor.
    pub fn to_node_route(&self, route: &[usize]) -> Vec<NodeId> {
        let mut nodes = Vec::with_capacity(route.len() + 2);
        nodes.push(DEPOT_NODE);
        nodes.extend(route.iter().map(|&v| self.vertices[v].node));
        nodes.push(DEPOT_NODE);
        nodes
    }

    fn walk(&self, route: &[usize], edge: impl Fn(usize, usize) -> f64) -> f64 {
        if route.is_empty() {
            return 0.0;
        }
        let mut total = edge(DEPOT_VERTEX, route[0]);
        for pair in route.windows(2) {
            total += edge(pair[0], pair[1]);
        }
        total + edge(route[route.len() - 1], DEPOT_VERTEX)
    }
}

/// Float slack when comparing route durations against the cap.
const DURATION_TOLERANCE: f64 = 1e-9;

/// How a solve ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// Nothing to route; the solver was not invoked.
    NoAois,
    /// Search ran to completion.
    Completed,
    /// The time budget ran out; routes are the best found so far.
    TimeLimitReached,
}

/// Solver output: routes as demand-graph vertex sequences (depot excluded).
#[derive(Debug, Clone)]
pub struct CvrpSolution {
    pub routes: Vec<Vec<usize>>,
    pub total_cost: f64,
    pub status: SolveStatus,
}

impl CvrpSolution {
    pub fn empty() -> Self {
        Self {
            routes: Vec::new(),
            total_cost: 0.0,
            status: SolveStatus::NoAois,
        }
    }
}

/// One solved route in GeoGraph terms.
#[derive(Debug, Clone, PartialEq)]
pub struct SolvedRoute {
    /// Depot, AOI nodes in visit order, depot.
    pub nodes: Vec<NodeId>,
    pub load: u64,
    pub distance_km: f64,
    pub duration_minutes: f64,
}

/// Routes keyed by sequential route number (from 1).
#[derive(Debug, Clone)]
pub struct SolvedRoutes {
    pub routes: BTreeMap<usize, SolvedRoute>,
    pub total_cost: f64,
    pub status: SolveStatus,
}

impl SolvedRoutes {
    /// `{route_number: [NodeId]}` view.
    pub fn node_routes(&self) -> BTreeMap<usize, Vec<NodeId>> {
        self.routes
            .iter()
            .map(|(number, route)| (*number, route.nodes.clone()))
            .collect()
    }
}

/// Reduces, solves and normalizes one CVRP instance.
///
/// An empty AOI set returns no routes without touching the solver.
pub fn solve<S: CvrpSolver>(
    solver: &S,
    aoi_nodes: &[(NodeId, u32)],
    paths: &ShortestPaths,
    constraints: RouteConstraints,
    timing: TimingModel,
    time_budget: Duration,
) -> Result<SolvedRoutes, PlanError> {
    if aoi_nodes.is_empty() {
        return Ok(SolvedRoutes {
            routes: BTreeMap::new(),
            total_cost: 0.0,
            status: SolveStatus::NoAois,
        });
    }

    let problem = DemandGraph::reduce(aoi_nodes, paths, constraints, timing)?;
    problem.check_serviceable()?;

    let solution = solver.solve(&problem, time_budget)?;
    verify_solution(&problem, &solution)?;

    let routes: BTreeMap<usize, SolvedRoute> = solution
        .routes
        .iter()
        .filter(|route| !route.is_empty())
        .enumerate()
        .map(|(i, route)| {
            let solved = SolvedRoute {
                nodes: problem.to_node_route(route),
                load: problem.route_load(route),
                distance_km: problem.route_cost(route),
                duration_minutes: problem.route_duration(route),
            };
            (i + 1, solved)
        })
        .collect();
    let total_cost = routes.values().map(|route| route.distance_km).sum();

    info!(
        aois = problem.aoi_count(),
        routes = routes.len(),
        total_km = total_cost,
        status = ?solution.status,
        "CVRP solved"
    );

    Ok(SolvedRoutes {
        routes,
        total_cost,
        status: solution.status,
    })
}

/// Every AOI exactly once, every route feasible.
fn verify_solution(problem: &DemandGraph, solution: &CvrpSolution) -> Result<(), PlanError> {
    let mut seen = vec![false; problem.aoi_count() + 1];
    for route in &solution.routes {
        for &vertex in route {
            if vertex == DEPOT_VERTEX || vertex > problem.aoi_count() || seen[vertex] {
                return Err(PlanError::Solver(format!(
                    "invalid vertex sequence {:?}",
                    route
                )));
            }
            seen[vertex] = true;
        }
        if !problem.is_feasible(route) {
            return Err(PlanError::Solver(format!(
                "route {:?} violates capacity or duration",
                route
            )));
        }
    }
    if let Some(missing) = (1..seen.len()).find(|&v| !seen[v]) {
        return Err(PlanError::Solver(format!(
            "AOI node {} was left unrouted",
            problem.vertex(missing).node
        )));
    }
    Ok(())
}
