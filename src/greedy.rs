//! Greedy matcher (heuristic fallback).
//!
//! Patients are served most-severe first. Each one takes the cheapest facility
//! that is feasible *right now*, and the booking is visible to every patient
//! processed after it. No global optimality is claimed.

use std::cmp::Ordering;

use tracing::{debug, trace};

use crate::config::MatchConfig;
use crate::cost::CostModel;
use crate::feasibility::FeasibilityFilter;
use crate::model::{Assignment, Facility, Patient};
use crate::occupancy::{Allocation, OccupancyLedger};
use crate::traits::{distance_matrix, DistanceProvider};

pub fn solve<'a, D>(
    patients: &[Patient],
    facilities: &'a [Facility],
    config: &MatchConfig,
    distance: &D,
) -> Allocation<'a>
where
    D: DistanceProvider,
{
    if patients.is_empty() || facilities.is_empty() {
        return Allocation::empty(facilities);
    }

    let cost_model = CostModel::from_config(config);
    let filter = FeasibilityFilter::from_config(config);
    let distances = distance_matrix(patients, facilities, distance);

    let mut ledger = OccupancyLedger::new(facilities);
    let mut assignments = Vec::with_capacity(patients.len());

    for patient_index in priority_order(patients) {
        let patient = &patients[patient_index];
        let row = &distances[patient_index];

        // Ties keep the first facility in input order.
        let mut best: Option<(usize, f64)> = None;
        for (facility_index, facility) in facilities.iter().enumerate() {
            let distance_km = row[facility_index];
            if !filter.is_feasible(patient, facility, ledger.occupied(facility_index), distance_km) {
                continue;
            }
            let cost = cost_model.cost(distance_km, ledger.ratio(facility_index));
            if best.is_none_or(|(_, best_cost)| cost < best_cost) {
                best = Some((facility_index, cost));
            }
        }

        let Some((facility_index, cost)) = best else {
            trace!(patient = %patient.id, "no feasible facility");
            continue;
        };

        let (occ_before, occ_after) = ledger.admit(facility_index);
        trace!(
            patient = %patient.id,
            facility = %facilities[facility_index].id,
            cost,
            "assigned"
        );

        assignments.push(Assignment {
            patient_id: patient.id.clone(),
            facility_id: facilities[facility_index].id.clone(),
            distance_km: row[facility_index],
            occ_before,
            occ_after,
            cost,
            service_ok: None,
        });
    }

    debug!(
        patients = patients.len(),
        facilities = facilities.len(),
        assigned = assignments.len(),
        "greedy pass complete"
    );

    Allocation { assignments, ledger }
}

/// Processing order: severity descending, patients without severity last.
///
/// The sort is stable, so ties keep their input order.
pub fn priority_order(patients: &[Patient]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..patients.len()).collect();
    order.sort_by(|&a, &b| match (patients[a].severity, patients[b].severity) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GeoPoint;

    fn patient(id: &str, severity: Option<f64>) -> Patient {
        let mut p = Patient::new(id, GeoPoint::new(0.0, 0.0));
        p.severity = severity;
        p
    }

    #[test]
    fn severity_descending_with_missing_last() {
        let patients = vec![
            patient("a", None),
            patient("b", Some(2.0)),
            patient("c", Some(5.0)),
            patient("d", None),
            patient("e", Some(2.0)),
        ];
        let order: Vec<&str> = priority_order(&patients)
            .into_iter()
            .map(|i| patients[i].id.as_str())
            .collect();
        assert_eq!(order, vec!["c", "b", "e", "a", "d"]);
    }
}
