//! Core traits for the route planner.
//!
//! Callers bring their own AOI representation; the solver is a seam so the
//! rest of the pipeline does not care how routes are found.

use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;

use crate::demand::{CvrpSolution, DemandGraph};
use crate::error::PlanError;

/// Unique identifier for planner entities.
pub trait Id: Clone + Eq + Hash + Debug {}

impl<T> Id for T where T: Clone + Eq + Hash + Debug {}

/// An area that needs one vessel visit per plan.
pub trait AreaOfInterest {
    type Key: Id;

    /// Caller-side key, reused to label results.
    fn key(&self) -> &Self::Key;

    /// Centroid (lat, lng) of the area polygon.
    fn centroid(&self) -> (f64, f64);

    /// Cleaning amount carried by the vessel after the visit.
    fn demand(&self) -> u32;
}

/// Finds capacity (and optionally duration) feasible routes over a demand graph.
///
/// Implementations must honour `time_budget` themselves and return the best
/// solution found when it runs out.
pub trait CvrpSolver {
    fn solve(&self, problem: &DemandGraph, time_budget: Duration) -> Result<CvrpSolution, PlanError>;
}

impl<S: CvrpSolver + ?Sized> CvrpSolver for &S {
    fn solve(&self, problem: &DemandGraph, time_budget: Duration) -> Result<CvrpSolution, PlanError> {
        (**self).solve(problem, time_budget)
    }
}

impl<S: CvrpSolver + ?Sized> CvrpSolver for Box<S> {
    fn solve(&self, problem: &DemandGraph, time_budget: Duration) -> Result<CvrpSolution, PlanError> {
        (**self).solve(problem, time_budget)
    }
}
