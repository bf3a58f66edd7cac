//! Run configuration: cost weights, hard constraints, policy and solver choice.
//!
//! Every field has a documented default, so a partial (or empty) JSON object is
//! a valid configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const DEFAULT_WD: f64 = 0.6;
pub const DEFAULT_WO: f64 = 0.3;
pub const DEFAULT_WF: f64 = 0.1;
pub const DEFAULT_RADIUS_KM: f64 = 50.0;
pub const DEFAULT_MAX_LOAD: f64 = 1.0;
pub const DEFAULT_TARGET_OCCUPANCY: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    /// Weight on normalized travel distance.
    pub wd: f64,
    /// Weight on occupancy above target.
    pub wo: f64,
    /// Fairness weight. Parsed and carried, but not part of the cost formula.
    pub wf: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            wd: DEFAULT_WD,
            wo: DEFAULT_WO,
            wf: DEFAULT_WF,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constraints {
    /// Maximum patient-to-facility distance (inclusive).
    pub radius_km: f64,
    /// A facility at or above this occupancy ratio admits nobody.
    pub max_load: f64,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            radius_km: DEFAULT_RADIUS_KM,
            max_load: DEFAULT_MAX_LOAD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    /// Occupancy ratio above which the cost model starts penalizing.
    pub target_occupancy: f64,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            target_occupancy: DEFAULT_TARGET_OCCUPANCY,
        }
    }
}

/// Which matcher a run uses.
///
/// Parsed once from the `solver` string; `hungarian` and `mcmf` both select
/// the optimal solver, anything else falls back to greedy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum SolverKind {
    #[default]
    Greedy,
    Optimal,
}

impl SolverKind {
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "hungarian" | "mcmf" => SolverKind::Optimal,
            _ => SolverKind::Greedy,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SolverKind::Greedy => "greedy",
            SolverKind::Optimal => "hungarian",
        }
    }
}

impl From<Option<String>> for SolverKind {
    fn from(value: Option<String>) -> Self {
        value.as_deref().map(SolverKind::parse).unwrap_or_default()
    }
}

impl From<SolverKind> for String {
    fn from(value: SolverKind) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    #[serde(deserialize_with = "null_as_default")]
    pub weights: Weights,
    #[serde(deserialize_with = "null_as_default")]
    pub constraints: Constraints,
    #[serde(deserialize_with = "null_as_default")]
    pub policy: Policy,
    pub solver: SolverKind,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl MatchConfig {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_solver(mut self, solver: SolverKind) -> Self {
        self.solver = solver;
        self
    }

    pub fn with_radius_km(mut self, radius_km: f64) -> Self {
        self.constraints.radius_km = radius_km;
        self
    }

    pub fn with_max_load(mut self, max_load: f64) -> Self {
        self.constraints.max_load = max_load;
        self
    }

    pub fn with_target_occupancy(mut self, target_occupancy: f64) -> Self {
        self.policy.target_occupancy = target_occupancy;
        self
    }

    pub fn with_weights(mut self, wd: f64, wo: f64, wf: f64) -> Self {
        self.weights = Weights { wd, wo, wf };
        self
    }

    /// Reject values the cost model and feasibility filter cannot work with.
    pub fn validate(&self) -> Result<(), ValidationError> {
        non_negative("weights.wd", self.weights.wd)?;
        non_negative("weights.wo", self.weights.wo)?;
        non_negative("weights.wf", self.weights.wf)?;
        non_negative("constraints.radius_km", self.constraints.radius_km)?;
        non_negative("policy.target_occupancy", self.policy.target_occupancy)?;

        let max_load = self.constraints.max_load;
        if !(max_load.is_finite() && max_load > 0.0 && max_load <= 1.0) {
            return Err(ValidationError::InvalidConfig {
                field: "constraints.max_load",
                reason: format!("must be in (0, 1], got {max_load}"),
            });
        }
        Ok(())
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidConfig {
            field,
            reason: format!("must be a finite non-negative number, got {value}"),
        })
    }
}
