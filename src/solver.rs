//! Bounded-time CVRP solver (cheapest insertion + local search).
//!
//! Fleet size is unbounded: an AOI that fits no open route starts a new one.
//! The search is deterministic, so identical input gives identical routes.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::demand::{CvrpSolution, DemandGraph, SolveStatus, DEPOT_VERTEX};
use crate::error::PlanError;
use crate::traits::CvrpSolver;

/// Minimum cost decrease (km) counted as an improvement.
const IMPROVEMENT_EPSILON: f64 = 1e-9;

/// Wall-clock cutoff for a solve. `None` when the budget overflows `Instant`,
/// which means the search only stops on convergence.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline(Option<Instant>);

impl Deadline {
    pub(crate) fn after(budget: Duration) -> Self {
        Self(Instant::now().checked_add(budget))
    }

    pub(crate) fn passed(&self) -> bool {
        self.0.is_some_and(|at| Instant::now() >= at)
    }
}

#[derive(Debug, Clone)]
pub struct SolveOptions {
    /// Maximum rounds of local search improvement.
    pub local_search_iterations: usize,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            local_search_iterations: 1000,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LocalSearchSolver {
    pub options: SolveOptions,
}

impl LocalSearchSolver {
    pub fn new(options: SolveOptions) -> Self {
        Self { options }
    }
}

#[derive(Debug, Clone)]
struct RouteState {
    visits: Vec<usize>,
    cost: f64,
}

impl RouteState {
    fn new(problem: &DemandGraph, visits: Vec<usize>) -> Self {
        let cost = problem.route_cost(&visits);
        Self { visits, cost }
    }
}

/// Outcome of one operator pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Improved,
    Stuck,
    OutOfTime,
}

impl CvrpSolver for LocalSearchSolver {
    fn solve(&self, problem: &DemandGraph, time_budget: Duration) -> Result<CvrpSolution, PlanError> {
        if problem.aoi_count() == 0 {
            return Ok(CvrpSolution::empty());
        }
        problem.check_serviceable()?;

        let started = Instant::now();
        let deadline = Deadline::after(time_budget);

        let mut routes = construct(problem);
        let initial: f64 = routes.iter().map(|route| route.cost).sum();
        debug!(routes = routes.len(), cost = initial, "Insertion construction done");

        let timed_out = local_search(&mut routes, problem, &self.options, deadline);

        routes.retain(|route| !route.visits.is_empty());
        let total_cost: f64 = routes.iter().map(|route| route.cost).sum();
        let status = if timed_out {
            SolveStatus::TimeLimitReached
        } else {
            SolveStatus::Completed
        };

        info!(
            routes = routes.len(),
            initial_cost = initial,
            final_cost = total_cost,
            elapsed_ms = started.elapsed().as_millis() as u64,
            ?status,
            "Local search finished"
        );

        Ok(CvrpSolution {
            routes: routes.into_iter().map(|route| route.visits).collect(),
            total_cost,
            status,
        })
    }
}

/// Cheapest feasible insertion, farthest AOIs first.
fn construct(problem: &DemandGraph) -> Vec<RouteState> {
    let mut order: Vec<usize> = (1..=problem.aoi_count()).collect();
    order.sort_by(|&a, &b| {
        let da = problem.cost(DEPOT_VERTEX, a) + problem.cost(a, DEPOT_VERTEX);
        let db = problem.cost(DEPOT_VERTEX, b) + problem.cost(b, DEPOT_VERTEX);
        db.total_cmp(&da).then(a.cmp(&b))
    });

    let mut routes: Vec<RouteState> = Vec::new();
    for visit in order {
        let mut best: Option<(usize, usize, f64)> = None;

        for (route_index, route) in routes.iter().enumerate() {
            for position in 0..=route.visits.len() {
                let mut candidate = route.visits.clone();
                candidate.insert(position, visit);
                if !problem.is_feasible(&candidate) {
                    continue;
                }
                let delta = problem.route_cost(&candidate) - route.cost;
                if best.is_none_or(|(_, _, best_delta)| delta < best_delta) {
                    best = Some((route_index, position, delta));
                }
            }
        }

        let solo = problem.route_cost(&[visit]);
        match best {
            Some((route_index, position, delta)) if delta <= solo => {
                let route = &mut routes[route_index];
                route.visits.insert(position, visit);
                route.cost += delta;
            }
            _ => routes.push(RouteState::new(problem, vec![visit])),
        }
    }
    routes
}

/// 2-opt: reverse a segment within a route.
fn two_opt_improve(route: &mut RouteState, problem: &DemandGraph, deadline: Deadline) -> Step {
    let n = route.visits.len();
    if n < 2 {
        return Step::Stuck;
    }

    for i in 0..n - 1 {
        if deadline.passed() {
            return Step::OutOfTime;
        }
        for j in i + 1..n {
            let mut candidate = route.visits.clone();
            candidate[i..=j].reverse();
            if !problem.is_feasible(&candidate) {
                continue;
            }
            let cost = problem.route_cost(&candidate);
            if cost < route.cost - IMPROVEMENT_EPSILON {
                route.visits = candidate;
                route.cost = cost;
                return Step::Improved;
            }
        }
    }

    Step::Stuck
}

/// Relocate: move one visit to another position, in the same or another route.
fn relocate_improve(routes: &mut [RouteState], problem: &DemandGraph, deadline: Deadline) -> Step {
    for from in 0..routes.len() {
        for visit_index in 0..routes[from].visits.len() {
            if deadline.passed() {
                return Step::OutOfTime;
            }
            let visit = routes[from].visits[visit_index];
            let mut reduced = routes[from].visits.clone();
            reduced.remove(visit_index);

            for to in 0..routes.len() {
                if from == to {
                    for position in 0..=reduced.len() {
                        if position == visit_index {
                            continue;
                        }
                        let mut candidate = reduced.clone();
                        candidate.insert(position, visit);
                        if !problem.is_feasible(&candidate) {
                            continue;
                        }
                        let cost = problem.route_cost(&candidate);
                        if cost < routes[from].cost - IMPROVEMENT_EPSILON {
                            routes[from] = RouteState { visits: candidate, cost };
                            return Step::Improved;
                        }
                    }
                    continue;
                }

                if routes[to].visits.is_empty() {
                    continue;
                }
                let reduced_cost = problem.route_cost(&reduced);
                let before = routes[from].cost + routes[to].cost;
                for position in 0..=routes[to].visits.len() {
                    let mut candidate = routes[to].visits.clone();
                    candidate.insert(position, visit);
                    if !problem.is_feasible(&candidate) {
                        continue;
                    }
                    let cost = problem.route_cost(&candidate);
                    if reduced_cost + cost < before - IMPROVEMENT_EPSILON {
                        routes[from] = RouteState {
                            visits: reduced,
                            cost: reduced_cost,
                        };
                        routes[to] = RouteState { visits: candidate, cost };
                        return Step::Improved;
                    }
                }
            }
        }
    }

    Step::Stuck
}

/// Exchange: swap two visits between different routes.
fn exchange_improve(routes: &mut [RouteState], problem: &DemandGraph, deadline: Deadline) -> Step {
    for a in 0..routes.len() {
        for b in a + 1..routes.len() {
            if deadline.passed() {
                return Step::OutOfTime;
            }
            let before = routes[a].cost + routes[b].cost;
            for i in 0..routes[a].visits.len() {
                for j in 0..routes[b].visits.len() {
                    let mut first = routes[a].visits.clone();
                    let mut second = routes[b].visits.clone();
                    std::mem::swap(&mut first[i], &mut second[j]);
                    if !problem.is_feasible(&first) || !problem.is_feasible(&second) {
                        continue;
                    }
                    let first_cost = problem.route_cost(&first);
                    let second_cost = problem.route_cost(&second);
                    if first_cost + second_cost < before - IMPROVEMENT_EPSILON {
                        routes[a] = RouteState { visits: first, cost: first_cost };
                        routes[b] = RouteState { visits: second, cost: second_cost };
                        return Step::Improved;
                    }
                }
            }
        }
    }

    Step::Stuck
}

/// Runs operators until a full round finds nothing, the round limit is hit
/// or the deadline passes. Returns true when stopped by the deadline.
fn local_search(routes: &mut Vec<RouteState>, problem: &DemandGraph, options: &SolveOptions, deadline: Deadline) -> bool {
    for round in 0..options.local_search_iterations {
        let mut improved = false;

        for route in routes.iter_mut() {
            match two_opt_improve(route, problem, deadline) {
                Step::Improved => improved = true,
                Step::OutOfTime => return true,
                Step::Stuck => {}
            }
        }

        match relocate_improve(routes, problem, deadline) {
            Step::Improved => improved = true,
            Step::OutOfTime => return true,
            Step::Stuck => {}
        }
        routes.retain(|route| !route.visits.is_empty());

        match exchange_improve(routes, problem, deadline) {
            Step::Improved => improved = true,
            Step::OutOfTime => return true,
            Step::Stuck => {}
        }

        if !improved {
            debug!(rounds = round + 1, "Local search converged");
            break;
        }
    }
    false
}
