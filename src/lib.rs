//! bed-alloc core
//!
//! Allocates waiting patients to hospital beds under capacity, distance and
//! service constraints, with a greedy matcher, a capacity-expanded optimal
//! solver and what-if scenario simulation on top.

pub mod error;
pub mod model;
pub mod traits;
pub mod haversine;
pub mod config;
pub mod cost;
pub mod feasibility;
pub mod occupancy;
pub mod greedy;
pub mod hungarian;
pub mod capacity;
pub mod input;
pub mod orchestrator;
pub mod metrics;
pub mod scenario;
pub mod explain;
pub mod loader;
pub mod cache;
pub mod logging;

pub use orchestrator::{solve, solve_records, solve_with};
pub use metrics::metrics;
pub use scenario::simulate;
pub use explain::feasible_candidates;
