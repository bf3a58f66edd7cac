//! Capacity-expanded optimal solver.
//!
//! Every legally fillable bed becomes a [`Slot`]; patients and slots form a
//! bipartite cost matrix solved with [`linear_sum_assignment`]. Slot `k` of a
//! facility is priced at the occupancy ratio the facility would have after
//! `k` earlier admissions, so filling cheaper slots first is never worse.

use tracing::{debug, instrument};

use crate::config::MatchConfig;
use crate::cost::CostModel;
use crate::feasibility::{serves, FeasibilityFilter};
use crate::hungarian::{linear_sum_assignment, CostMatrix, INFEASIBLE};
use crate::model::{ratio, Assignment, Facility, Patient};
use crate::occupancy::{Allocation, OccupancyLedger};
use crate::traits::{distance_matrix, DistanceProvider};

/// One assignable bed unit. Built per solve and discarded after decoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    /// Index into the facility slice the slots were expanded from.
    pub facility: usize,
    /// Position of this bed among the facility's free beds.
    pub slot_index: usize,
    /// Occupancy ratio before this bed is filled.
    pub occ_ratio_before: f64,
}

/// Beds that can still be filled without reaching `max_load`:
/// `floor(max_load * capacity) - floor(occupied)`, never negative.
pub fn available_slots(capacity: f64, occupied: f64, max_load: f64) -> usize {
    if capacity <= 0.0 {
        return 0;
    }
    let allowed = (max_load * capacity).floor();
    (allowed - occupied.floor()).max(0.0) as usize
}

pub fn expand_slots(facilities: &[Facility], max_load: f64) -> Vec<Slot> {
    facilities
        .iter()
        .enumerate()
        .flat_map(|(facility, f)| {
            (0..available_slots(f.capacity, f.occupied, max_load)).map(move |slot_index| Slot {
                facility,
                slot_index,
                occ_ratio_before: ratio(f.occupied + slot_index as f64, f.capacity),
            })
        })
        .collect()
}

/// Patients x slots. Entries failing the service or radius check hold
/// [`INFEASIBLE`].
pub fn build_cost_matrix(
    patients: &[Patient],
    facilities: &[Facility],
    slots: &[Slot],
    distances: &[Vec<f64>],
    config: &MatchConfig,
) -> CostMatrix {
    let cost_model = CostModel::from_config(config);
    let filter = FeasibilityFilter::from_config(config);

    let mut matrix = CostMatrix::filled(patients.len(), slots.len(), INFEASIBLE);
    matrix.par_fill_rows(|row, cells| {
        let patient = &patients[row];
        // Service and radius depend only on the facility, not the slot.
        let reachable: Vec<Option<f64>> = facilities
            .iter()
            .zip(&distances[row])
            .map(|(facility, &distance_km)| {
                (serves(&patient.case, &facility.services) && filter.within_radius(distance_km))
                    .then_some(distance_km)
            })
            .collect();

        for (cell, slot) in cells.iter_mut().zip(slots) {
            if let Some(distance_km) = reachable[slot.facility] {
                *cell = cost_model.cost(distance_km, slot.occ_ratio_before);
            }
        }
    });
    matrix
}

#[instrument(skip_all, fields(patients = patients.len(), facilities = facilities.len()))]
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

    let slots = expand_slots(facilities, config.constraints.max_load);
    if slots.is_empty() {
        debug!("no free slots, skipping assignment");
        return Allocation::empty(facilities);
    }

    let distances = distance_matrix(patients, facilities, distance);
    let matrix = build_cost_matrix(patients, facilities, &slots, &distances, config);
    let pairs = linear_sum_assignment(&matrix);

    // Admit each facility's beds in slot order, so the ledger ratio of every
    // admission is the one its slot was priced at.
    let mut chosen: Vec<(usize, usize)> = pairs
        .into_iter()
        .filter(|&(row, col)| matrix.get(row, col) < INFEASIBLE)
        .collect();
    chosen.sort_by_key(|&(_, col)| (slots[col].facility, slots[col].slot_index));

    let mut ledger = OccupancyLedger::new(facilities);
    let mut admitted: Vec<(usize, usize, f64, f64)> = chosen
        .into_iter()
        .map(|(row, col)| {
            let (occ_before, occ_after) = ledger.admit(slots[col].facility);
            (row, col, occ_before, occ_after)
        })
        .collect();
    admitted.sort_unstable_by_key(|&(row, ..)| row);

    let assignments: Vec<Assignment> = admitted
        .into_iter()
        .map(|(row, col, occ_before, occ_after)| {
            let slot = slots[col];
            Assignment {
                patient_id: patients[row].id.clone(),
                facility_id: facilities[slot.facility].id.clone(),
                distance_km: distances[row][slot.facility],
                occ_before,
                occ_after,
                cost: matrix.get(row, col),
                service_ok: None,
            }
        })
        .collect();

    debug!(
        slots = slots.len(),
        assigned = assignments.len(),
        "capacity-expanded assignment complete"
    );

    Allocation { assignments, ledger }
}
