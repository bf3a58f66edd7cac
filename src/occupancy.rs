//! Solver-owned working copy of facility occupancy.
//!
//! Each solve builds a fresh ledger from the loaded records and drops it when
//! the result envelope is assembled. The source [`Facility`] values are never
//! touched, so concurrent solves over the same data cannot interfere.

use crate::model::{ratio, Assignment, Facility, FacilitySnapshot, ResultEnvelope, Summary};

#[derive(Debug, Clone)]
pub struct OccupancyLedger<'a> {
    facilities: &'a [Facility],
    occupied: Vec<f64>,
    admitted: Vec<usize>,
}

impl<'a> OccupancyLedger<'a> {
    pub fn new(facilities: &'a [Facility]) -> Self {
        Self {
            facilities,
            occupied: facilities.iter().map(|f| f.occupied).collect(),
            admitted: vec![0; facilities.len()],
        }
    }

    /// Current occupied beds at facility `index`.
    pub fn occupied(&self, index: usize) -> f64 {
        self.occupied[index]
    }

    pub fn ratio(&self, index: usize) -> f64 {
        ratio(self.occupied[index], self.facilities[index].capacity)
    }

    /// Patients admitted to facility `index` during this solve.
    pub fn admitted(&self, index: usize) -> usize {
        self.admitted[index]
    }

    /// Book one bed at facility `index`.
    ///
    /// Returns the occupancy ratio before and after the booking.
    pub fn admit(&mut self, index: usize) -> (f64, f64) {
        let before = self.ratio(index);
        self.occupied[index] += 1.0;
        self.admitted[index] += 1;
        (before, self.ratio(index))
    }

    pub fn total_admitted(&self) -> usize {
        self.admitted.iter().sum()
    }

    /// Final per-facility state, in input order.
    pub fn snapshot(&self) -> Vec<FacilitySnapshot> {
        self.facilities
            .iter()
            .zip(&self.occupied)
            .map(|(facility, &occupied)| FacilitySnapshot {
                facility_id: facility.id.clone(),
                capacity: facility.capacity,
                occupied,
                occ_ratio: ratio(occupied, facility.capacity),
                region: facility.region.clone(),
                class: facility.class.clone(),
            })
            .collect()
    }
}

/// What a solver hands back: its placements and the ledger they were booked in.
#[derive(Debug, Clone)]
pub struct Allocation<'a> {
    pub assignments: Vec<Assignment>,
    pub ledger: OccupancyLedger<'a>,
}

impl<'a> Allocation<'a> {
    /// An allocation that placed nobody.
    pub fn empty(facilities: &'a [Facility]) -> Self {
        Self {
            assignments: Vec::new(),
            ledger: OccupancyLedger::new(facilities),
        }
    }

    pub fn into_envelope(self, total_patients: usize) -> ResultEnvelope {
        ResultEnvelope {
            summary: Summary::new(total_patients, self.assignments.len()),
            facility_snapshot: self.ledger.snapshot(),
            assignments: self.assignments,
        }
    }
}
