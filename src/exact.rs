//! Exact CVRP solver for small instances.
//!
//! Held–Karp gives the cheapest Source -> subset -> Sink tour for every AOI
//! subset; a set-partition DP then picks the cheapest cover by feasible
//! subsets. Tours are ordered by cost, which also minimizes duration as long
//! as edge time is proportional to edge cost (as `DemandGraph::reduce`
//! builds it).

use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::demand::{CvrpSolution, DemandGraph, SolveStatus, DEPOT_VERTEX};
use crate::error::PlanError;
use crate::solver::{Deadline, LocalSearchSolver};
use crate::traits::CvrpSolver;

/// Hard upper bound on AOIs; memory grows with `2^n * n`.
pub const EXACT_MAX_AOIS: usize = 16;

/// Masks processed between deadline checks.
const DEADLINE_CHECK_INTERVAL: usize = 1024;

const NO_PARENT: usize = usize::MAX;

#[derive(Debug, Clone, Default)]
pub struct ExactSolver;

struct OutOfTime;

impl CvrpSolver for ExactSolver {
    fn solve(&self, problem: &DemandGraph, time_budget: Duration) -> Result<CvrpSolution, PlanError> {
        let n = problem.aoi_count();
        if n == 0 {
            return Ok(CvrpSolution::empty());
        }
        if n > EXACT_MAX_AOIS {
            return Err(PlanError::Solver(format!(
                "exact solver handles at most {} AOIs, got {}",
                EXACT_MAX_AOIS, n
            )));
        }
        problem.check_serviceable()?;

        let started = Instant::now();
        let deadline = Deadline::after(time_budget);

        match solve_exact(problem, deadline) {
            Ok(routes) => {
                let total_cost = routes.iter().map(|route| problem.route_cost(route)).sum();
                info!(
                    aois = n,
                    routes = routes.len(),
                    cost = total_cost,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Exact solve finished"
                );
                Ok(CvrpSolution {
                    routes,
                    total_cost,
                    status: SolveStatus::Completed,
                })
            }
            Err(OutOfTime) => {
                warn!(aois = n, "Exact solve ran out of time, falling back to insertion heuristic");
                let mut fallback = LocalSearchSolver::default().solve(problem, Duration::ZERO)?;
                fallback.status = SolveStatus::TimeLimitReached;
                Ok(fallback)
            }
        }
    }
}

fn solve_exact(problem: &DemandGraph, deadline: Deadline) -> Result<Vec<Vec<usize>>, OutOfTime> {
    let n = problem.aoi_count();
    let full = 1usize << n;
    let capacity = problem.constraints().vehicle_capacity as u64;
    // Bit b stands for vertex b + 1.
    let vertex = |bit: usize| bit + 1;

    let mut load = vec![0u64; full];
    for mask in 1..full {
        let low = mask.trailing_zeros() as usize;
        load[mask] = load[mask & (mask - 1)] + problem.vertex(vertex(low)).demand as u64;
    }

    // Held–Karp over open paths starting at Source.
    let mut best = vec![f64::INFINITY; full * n];
    let mut parent = vec![NO_PARENT; full * n];
    for bit in 0..n {
        best[(1 << bit) * n + bit] = problem.cost(DEPOT_VERTEX, vertex(bit));
    }
    for mask in 1..full {
        if mask % DEADLINE_CHECK_INTERVAL == 0 && deadline.passed() {
            return Err(OutOfTime);
        }
        if load[mask] > capacity {
            continue;
        }
        for last in 0..n {
            let current = best[mask * n + last];
            if mask & (1 << last) == 0 || !current.is_finite() {
                continue;
            }
            for next in 0..n {
                let extended = mask | (1 << next);
                if mask & (1 << next) != 0 || load[extended] > capacity {
                    continue;
                }
                let candidate = current + problem.cost(vertex(last), vertex(next));
                if candidate < best[extended * n + next] {
                    best[extended * n + next] = candidate;
                    parent[extended * n + next] = last;
                }
            }
        }
    }

    // Cheapest closed tour per subset, if feasible.
    let mut tour_cost = vec![f64::INFINITY; full];
    let mut tour_last = vec![NO_PARENT; full];
    for mask in 1..full {
        if load[mask] > capacity {
            continue;
        }
        for last in 0..n {
            let open = best[mask * n + last];
            if !open.is_finite() {
                continue;
            }
            let closed = open + problem.cost(vertex(last), DEPOT_VERTEX);
            if closed < tour_cost[mask] {
                tour_cost[mask] = closed;
                tour_last[mask] = last;
            }
        }
        if tour_cost[mask].is_finite() {
            let route = reconstruct(&parent, n, mask, tour_last[mask]);
            if !problem.is_feasible(&route) {
                tour_cost[mask] = f64::INFINITY;
            }
        }
    }

    // Set partition: the subset holding the lowest uncovered bit is chosen first.
    let mut cover = vec![f64::INFINITY; full];
    let mut choice = vec![0usize; full];
    cover[0] = 0.0;
    for mask in 1..full {
        if mask % DEADLINE_CHECK_INTERVAL == 0 && deadline.passed() {
            return Err(OutOfTime);
        }
        let low = mask & mask.wrapping_neg();
        let rest = mask ^ low;
        let mut sub = rest;
        loop {
            let subset = sub | low;
            if tour_cost[subset].is_finite() {
                let candidate = tour_cost[subset] + cover[mask ^ subset];
                if candidate < cover[mask] {
                    cover[mask] = candidate;
                    choice[mask] = subset;
                }
            }
            if sub == 0 {
                break;
            }
            sub = (sub - 1) & rest;
        }
    }

    let mut routes = Vec::new();
    let mut remaining = full - 1;
    while remaining != 0 {
        let subset = choice[remaining];
        routes.push(reconstruct(&parent, n, subset, tour_last[subset]));
        remaining ^= subset;
    }
    routes.sort_by_key(|route| route.first().copied());
    Ok(routes)
}

/// Walks parent links back from `last` and returns vertices in visit order.
fn reconstruct(parent: &[usize], n: usize, mask: usize, last: usize) -> Vec<usize> {
    let mut route = Vec::new();
    let mut mask = mask;
    let mut current = last;
    loop {
        route.push(current + 1);
        let previous = parent[mask * n + current];
        mask ^= 1 << current;
        if previous == NO_PARENT {
            break;
        }
        current = previous;
    }
    route.reverse();
    route
}
