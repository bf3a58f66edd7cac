//! Data behind "why this hospital" answers.
//!
//! Everything here reuses [`CostModel`] and [`FeasibilityFilter`] unchanged,
//! so the numbers quoted to a user are the numbers the solvers compared.

use serde::Serialize;

use crate::config::MatchConfig;
use crate::cost::CostModel;
use crate::feasibility::{FeasibilityFilter, Infeasibility};
use crate::haversine::Haversine;
use crate::model::{Assignment, Facility, FacilitySnapshot, Patient};
use crate::traits::DistanceProvider;

/// A facility the patient could legally be sent to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    #[serde(rename = "hospital_id")]
    pub facility_id: String,
    pub distance_km: f64,
    pub occ_ratio: f64,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub patient_id: String,
    #[serde(rename = "hospital_id")]
    pub facility_id: String,
    pub distance_km: f64,
    pub occ_before: f64,
    pub occ_after: f64,
    pub cost: f64,
    /// Cheapest feasible facility other than the assigned one.
    pub alternative: Option<Candidate>,
}

/// Why one facility could not take an unassigned patient.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Blocker {
    #[serde(rename = "hospital_id")]
    pub facility_id: String,
    pub reason: Infeasibility,
}

pub fn feasible_candidates(patient: &Patient, facilities: &[Facility], config: &MatchConfig) -> Vec<Candidate> {
    feasible_candidates_with(patient, facilities, config, &Haversine)
}

/// Feasible facilities at their loaded occupancy, cheapest first.
///
/// Equal costs keep facility input order.
pub fn feasible_candidates_with<D>(
    patient: &Patient,
    facilities: &[Facility],
    config: &MatchConfig,
    distance: &D,
) -> Vec<Candidate>
where
    D: DistanceProvider + ?Sized,
{
    let cost_model = CostModel::from_config(config);
    let filter = FeasibilityFilter::from_config(config);

    let mut candidates: Vec<Candidate> = facilities
        .iter()
        .filter_map(|facility| {
            let distance_km = distance.distance_km(patient.location, facility.location);
            filter
                .is_feasible(patient, facility, facility.occupied, distance_km)
                .then(|| {
                    let occ_ratio = facility.occupancy_ratio();
                    Candidate {
                        facility_id: facility.id.clone(),
                        distance_km,
                        occ_ratio,
                        cost: cost_model.cost(distance_km, occ_ratio),
                    }
                })
        })
        .collect();
    candidates.sort_by(|a, b| a.cost.total_cmp(&b.cost));
    candidates
}

pub fn explain_assignment(
    patient: &Patient,
    assignment: &Assignment,
    facilities: &[Facility],
    config: &MatchConfig,
) -> Explanation {
    explain_assignment_with(patient, assignment, facilities, config, &Haversine)
}

pub fn explain_assignment_with<D>(
    patient: &Patient,
    assignment: &Assignment,
    facilities: &[Facility],
    config: &MatchConfig,
    distance: &D,
) -> Explanation
where
    D: DistanceProvider + ?Sized,
{
    let alternative = feasible_candidates_with(patient, facilities, config, distance)
        .into_iter()
        .find(|c| c.facility_id != assignment.facility_id);

    Explanation {
        patient_id: assignment.patient_id.clone(),
        facility_id: assignment.facility_id.clone(),
        distance_km: assignment.distance_km,
        occ_before: assignment.occ_before,
        occ_after: assignment.occ_after,
        cost: assignment.cost,
        alternative,
    }
}

/// First failed constraint per facility for a patient left unassigned.
///
/// Occupancy comes from the post-solve `snapshot` where the facility appears
/// in it, so beds taken by other patients in the same run count as full.
pub fn diagnose_unassigned<D>(
    patient: &Patient,
    facilities: &[Facility],
    snapshot: &[FacilitySnapshot],
    config: &MatchConfig,
    distance: &D,
) -> Vec<Blocker>
where
    D: DistanceProvider + ?Sized,
{
    let filter = FeasibilityFilter::from_config(config);
    facilities
        .iter()
        .filter_map(|facility| {
            let occupied = snapshot
                .iter()
                .find(|s| s.facility_id == facility.id)
                .map_or(facility.occupied, |s| s.occupied);
            let distance_km = distance.distance_km(patient.location, facility.location);
            filter
                .check(patient, facility, occupied, distance_km)
                .err()
                .map(|reason| Blocker {
                    facility_id: facility.id.clone(),
                    reason,
                })
        })
        .collect()
}
