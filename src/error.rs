//! Error taxonomy for the allocation core.
//!
//! Only malformed input and malformed scenario requests are errors. A patient
//! with no feasible facility, or a solve with no patients or no free beds, is a
//! valid outcome and is reported through the result summary instead.

use std::path::PathBuf;

use thiserror::Error;

/// Input rejected before any solver runs.
///
/// Every variant names the entity and field that violated its constraint.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{entity} row {row}: missing required field `{field}`")]
    MissingField {
        entity: &'static str,
        row: usize,
        field: &'static str,
    },

    #[error("{entity} `{id}`: field `{field}` must be finite")]
    NonFinite {
        entity: &'static str,
        id: String,
        field: &'static str,
    },

    #[error("{entity} `{id}`: field `{field}` = {value} is outside [{min}, {max}]")]
    OutOfRange {
        entity: &'static str,
        id: String,
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("facility `{id}`: field `{field}` = {value} must be >= 0")]
    Negative {
        id: String,
        field: &'static str,
        value: f64,
    },

    #[error("facility `{id}`: occupied {occupied} exceeds capacity {capacity}")]
    OccupiedExceedsCapacity {
        id: String,
        occupied: f64,
        capacity: f64,
    },

    #[error("duplicate {entity} identifier `{id}`")]
    DuplicateId { entity: &'static str, id: String },

    #[error("configuration field `{field}` {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

/// Failure of a what-if simulation request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("unknown scenario kind `{0}`; expected capacity_drop, policy_change or demand_spike")]
    UnknownScenarioKind(String),

    #[error("invalid parameters for scenario `{kind}`: {reason}")]
    InvalidParameters { kind: &'static str, reason: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Failure reading run inputs from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in `{}`: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("malformed JSON in `{}`: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}
