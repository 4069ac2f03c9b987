//! Planner error taxonomy.

use std::fmt;
use std::io;

use crate::graph::NodeId;

#[derive(Debug)]
pub enum PlanError {
    /// Malformed or missing request data, rejected before graph construction.
    Input(String),
    /// The shoreline ring cannot serve as a skeleton.
    InvalidSkeleton(String),
    /// No route respecting capacity/duration can serve this AOI node.
    NoFeasibleSolution { node: NodeId, reason: String },
    /// Shortest path requested between disconnected nodes.
    GraphConnectivity { from: NodeId, to: NodeId },
    /// A solver broke its contract (unknown, repeated or missing AOIs).
    Solver(String),
    Config(String),
    Io(io::Error),
}

impl PlanError {
    /// Short machine-readable kind, used in service error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            PlanError::Input(_) => "input_error",
            PlanError::InvalidSkeleton(_) => "invalid_skeleton",
            PlanError::NoFeasibleSolution { .. } => "no_feasible_solution",
            PlanError::GraphConnectivity { .. } => "graph_connectivity_error",
            PlanError::Solver(_) => "solver_error",
            PlanError::Config(_) => "config_error",
            PlanError::Io(_) => "io_error",
        }
    }
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanError::Input(msg) => write!(f, "Invalid input: {}", msg),
            PlanError::InvalidSkeleton(msg) => write!(f, "Invalid shoreline skeleton: {}", msg),
            PlanError::NoFeasibleSolution { node, reason } => {
                write!(f, "No feasible solution: AOI node {} {}", node, reason)
            }
            PlanError::GraphConnectivity { from, to } => {
                write!(f, "No path between node {} and node {}", from, to)
            }
            PlanError::Solver(msg) => write!(f, "Solver error: {}", msg),
            PlanError::Config(msg) => write!(f, "Configuration error: {}", msg),
            PlanError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for PlanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlanError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for PlanError {
    fn from(err: io::Error) -> Self {
        PlanError::Io(err)
    }
}

impl From<serde_json::Error> for PlanError {
    fn from(err: serde_json::Error) -> Self {
        PlanError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_mentions_node() {
        let err = PlanError::NoFeasibleSolution {
            node: 41,
            reason: "demand 12 exceeds vehicle capacity 10".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("41"));
        assert!(text.contains("capacity"));
        assert_eq!(err.kind(), "no_feasible_solution");
    }

    #[test]
    fn test_io_error_converts() {
        let err: PlanError = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        assert!(matches!(err, PlanError::Io(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
