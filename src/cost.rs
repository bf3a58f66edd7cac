//! Pairing cost between a patient and a facility.
//!
//! `cost = wd * d_norm + wo * max(0, occ_ratio - target)`, with
//! `d_norm = min(distance, radius) / radius` (1.0 when the radius is zero).
//! The fairness weight is carried but contributes nothing.

use crate::config::MatchConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    pub wd: f64,
    pub wo: f64,
    /// Reserved; never read by [`CostModel::cost`].
    pub wf: f64,
    pub radius_km: f64,
    pub target_occupancy: f64,
}

impl CostModel {
    pub fn from_config(config: &MatchConfig) -> Self {
        Self {
            wd: config.weights.wd,
            wo: config.weights.wo,
            wf: config.weights.wf,
            radius_km: config.constraints.radius_km,
            target_occupancy: config.policy.target_occupancy,
        }
    }

    /// Distance scaled into `[0, 1]` against the search radius.
    pub fn normalized_distance(&self, distance_km: f64) -> f64 {
        if self.radius_km > 0.0 {
            distance_km.min(self.radius_km) / self.radius_km
        } else {
            1.0
        }
    }

    /// Overload above target. Under-target occupancy is zero, not a bonus.
    pub fn occupancy_penalty(&self, occ_ratio: f64) -> f64 {
        (occ_ratio - self.target_occupancy).max(0.0)
    }

    pub fn cost(&self, distance_km: f64, occ_ratio: f64) -> f64 {
        self.wd * self.normalized_distance(distance_km) + self.wo * self.occupancy_penalty(occ_ratio)
    }
}
