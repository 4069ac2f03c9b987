//! Planner and server configuration.

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// Vessel speed assumption: minutes needed per kilometre of travel.
pub const DEFAULT_MINUTES_PER_KM: f64 = 20.0;

/// Minutes spent servicing one AOI, independent of its demand.
pub const DEFAULT_SERVICE_TIME_MINUTES: f64 = 20.0;

/// Interpolated samples per attachment segment.
pub const DEFAULT_CONTAINMENT_SAMPLES: usize = 10;

pub const DEFAULT_TIME_BUDGET_SECS: f64 = 60.0;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:10002";

/// Which solver the planner runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverKind {
    /// Exact for small instances, local search otherwise.
    Auto,
    Exact,
    LocalSearch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub minutes_per_km: f64,
    pub service_time_minutes: f64,
    pub containment_samples: usize,
    /// Wall-clock budget for one solver invocation.
    pub time_budget_secs: f64,
    pub solver: SolverKind,
    /// Largest AOI count `SolverKind::Auto` hands to the exact solver.
    pub exact_solver_limit: usize,
    /// Upper bound on local search rounds (the time budget still applies).
    pub local_search_iterations: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            minutes_per_km: DEFAULT_MINUTES_PER_KM,
            service_time_minutes: DEFAULT_SERVICE_TIME_MINUTES,
            containment_samples: DEFAULT_CONTAINMENT_SAMPLES,
            time_budget_secs: DEFAULT_TIME_BUDGET_SECS,
            solver: SolverKind::Auto,
            exact_solver_limit: 10,
            local_search_iterations: 1000,
        }
    }
}

impl PlannerConfig {
    /// Reads a JSON config file; missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PlanError> {
        if !(self.minutes_per_km.is_finite() && self.minutes_per_km >= 0.0) {
            return Err(PlanError::Config(format!(
                "minutes_per_km must be a non-negative number, got {}",
                self.minutes_per_km
            )));
        }
        if !(self.service_time_minutes.is_finite() && self.service_time_minutes >= 0.0) {
            return Err(PlanError::Config(format!(
                "service_time_minutes must be a non-negative number, got {}",
                self.service_time_minutes
            )));
        }
        if self.containment_samples < 2 {
            return Err(PlanError::Config(
                "containment_samples must be at least 2".to_string(),
            ));
        }
        if !(self.time_budget_secs.is_finite() && self.time_budget_secs > 0.0) {
            return Err(PlanError::Config(format!(
                "time_budget_secs must be positive, got {}",
                self.time_budget_secs
            )));
        }
        if Duration::try_from_secs_f64(self.time_budget_secs).is_err() {
            return Err(PlanError::Config(format!(
                "time_budget_secs is too large, got {}",
                self.time_budget_secs
            )));
        }
        Ok(())
    }

    /// Saturates at `Duration::MAX`; solvers treat an unreachable deadline as none.
    pub fn time_budget(&self) -> Duration {
        Duration::try_from_secs_f64(self.time_budget_secs).unwrap_or(Duration::MAX)
    }
}

/// Settings for the HTTP service binary.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// JSON ring file replacing the built-in skeleton.
    pub skeleton_path: Option<PathBuf>,
    pub planner_config_path: Option<PathBuf>,
}

impl ServerConfig {
    /// Reads `ROUTE_PLANNER_ADDR`, `ROUTE_PLANNER_SKELETON` and `ROUTE_PLANNER_CONFIG`.
    pub fn from_env() -> Result<Self, PlanError> {
        let addr = env::var("ROUTE_PLANNER_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = addr
            .parse()
            .map_err(|err| PlanError::Config(format!("invalid ROUTE_PLANNER_ADDR '{}': {}", addr, err)))?;

        Ok(Self {
            bind_addr,
            skeleton_path: env::var_os("ROUTE_PLANNER_SKELETON").map(PathBuf::from),
            planner_config_path: env::var_os("ROUTE_PLANNER_CONFIG").map(PathBuf::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_vessel_assumptions() {
        let config = PlannerConfig::default();
        assert_eq!(config.minutes_per_km, 20.0);
        assert_eq!(config.service_time_minutes, 20.0);
        assert_eq!(config.containment_samples, 10);
        assert_eq!(config.time_budget(), Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: PlannerConfig =
            serde_json::from_str(r#"{"minutes_per_km": 12.5, "solver": "local_search"}"#).unwrap();
        assert_eq!(config.minutes_per_km, 12.5);
        assert_eq!(config.solver, SolverKind::LocalSearch);
        assert_eq!(config.service_time_minutes, DEFAULT_SERVICE_TIME_MINUTES);
    }

    #[test]
    fn test_rejects_single_sample() {
        let config = PlannerConfig {
            containment_samples: 1,
            ..PlannerConfig::default()
        };
        assert!(matches!(config.validate(), Err(PlanError::Config(_))));
    }

    #[test]
    fn test_rejects_zero_budget() {
        let config = PlannerConfig {
            time_budget_secs: 0.0,
            ..PlannerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_budget_beyond_duration_range() {
        let config = PlannerConfig {
            time_budget_secs: 1e20,
            ..PlannerConfig::default()
        };
        assert!(matches!(config.validate(), Err(PlanError::Config(_))));
        assert_eq!(config.time_budget(), Duration::MAX);
    }

    #[test]
    fn test_huge_budget_is_accepted() {
        let config = PlannerConfig {
            time_budget_secs: 1e19,
            ..PlannerConfig::default()
        };
        assert!(config.validate().is_ok());
        assert!(config.time_budget() > Duration::from_secs(1 << 60));
    }
}
