//! Hard constraints deciding whether a patient may go to a facility.
//!
//! Three independent checks, all of which must pass: bed headroom below the
//! configured max load, a service the patient needs, and a distance within
//! the search radius. A facility without beds is never feasible.

use serde::Serialize;

use crate::config::MatchConfig;
use crate::model::{Facility, Patient};

/// The first constraint a pairing failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Infeasibility {
    /// Capacity is zero or negative.
    ZeroCapacity,
    /// Occupancy ratio already at or above max load.
    NoCapacity,
    /// The facility does not offer the requested service.
    ServiceMismatch,
    /// Farther than the search radius.
    OutOfRadius,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeasibilityFilter {
    pub radius_km: f64,
    pub max_load: f64,
}

impl FeasibilityFilter {
    pub fn from_config(config: &MatchConfig) -> Self {
        Self {
            radius_km: config.constraints.radius_km,
            max_load: config.constraints.max_load,
        }
    }

    /// Strict: a facility exactly at max load admits no more.
    pub fn has_headroom(&self, capacity: f64, occupied: f64) -> bool {
        capacity > 0.0 && occupied / capacity < self.max_load
    }

    /// Inclusive boundary.
    pub fn within_radius(&self, distance_km: f64) -> bool {
        distance_km <= self.radius_km
    }

    /// Evaluate a pairing against the facility's *current* occupancy.
    ///
    /// `occupied` is passed separately so sequential solvers can check against
    /// their working counter instead of the loaded record.
    pub fn check(
        &self,
        patient: &Patient,
        facility: &Facility,
        occupied: f64,
        distance_km: f64,
    ) -> Result<(), Infeasibility> {
        if facility.capacity <= 0.0 {
            return Err(Infeasibility::ZeroCapacity);
        }
        if !self.has_headroom(facility.capacity, occupied) {
            return Err(Infeasibility::NoCapacity);
        }
        if !serves(&patient.case, &facility.services) {
            return Err(Infeasibility::ServiceMismatch);
        }
        if !self.within_radius(distance_km) {
            return Err(Infeasibility::OutOfRadius);
        }
        Ok(())
    }

    pub fn is_feasible(
        &self,
        patient: &Patient,
        facility: &Facility,
        occupied: f64,
        distance_km: f64,
    ) -> bool {
        self.check(patient, facility, occupied, distance_km).is_ok()
    }
}

/// Case-insensitive service match.
///
/// An empty case matches anything; otherwise the case must equal, or be a
/// substring of, one of the offered services.
pub fn serves(case: &str, services: &[String]) -> bool {
    let case = case.trim().to_lowercase();
    if case.is_empty() {
        return true;
    }
    services
        .iter()
        .any(|service| service.to_lowercase().contains(&case))
}
