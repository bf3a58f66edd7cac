//! Canonical domain types shared by every solver.
//!
//! Serialized field names follow the JSON contract callers already depend on
//! (`hospital_id`, `capacity_tt`, `wilayah`, ...), while the Rust names describe
//! what the field holds.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A point on the globe in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A patient waiting for a bed. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    #[serde(rename = "patient_id")]
    pub id: String,
    pub location: GeoPoint,
    /// Requested service. Empty means any facility will do.
    #[serde(default)]
    pub case: String,
    /// Higher is more urgent. Patients without one are served last.
    #[serde(default)]
    pub severity: Option<f64>,
    #[serde(default)]
    pub visit_date: Option<NaiveDate>,
    #[serde(default, rename = "wilayah")]
    pub region: Option<String>,
}

impl Patient {
    pub fn new(id: impl Into<String>, location: GeoPoint) -> Self {
        Self {
            id: id.into(),
            location,
            case: String::new(),
            severity: None,
            visit_date: None,
            region: None,
        }
    }
}

/// A hospital and its bed state as loaded for a run.
///
/// Solvers never mutate this record; they track occupancy in their own
/// [`OccupancyLedger`](crate::occupancy::OccupancyLedger).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    #[serde(rename = "hospital_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub location: GeoPoint,
    #[serde(rename = "capacity_tt")]
    pub capacity: f64,
    #[serde(rename = "occupied_tt")]
    pub occupied: f64,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default, rename = "wilayah")]
    pub region: Option<String>,
    #[serde(default, rename = "kelas")]
    pub class: Option<String>,
}

impl Facility {
    pub fn new(id: impl Into<String>, location: GeoPoint, capacity: f64, occupied: f64) -> Self {
        Self {
            id: id.into(),
            name: None,
            location,
            capacity,
            occupied,
            services: Vec::new(),
            region: None,
            class: None,
        }
    }

    /// Occupancy ratio of the loaded record, 0 for a facility without beds.
    pub fn occupancy_ratio(&self) -> f64 {
        ratio(self.occupied, self.capacity)
    }
}

pub(crate) fn ratio(occupied: f64, capacity: f64) -> f64 {
    if capacity > 0.0 { occupied / capacity } else { 0.0 }
}

/// One patient placed in one facility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub patient_id: String,
    #[serde(rename = "hospital_id")]
    pub facility_id: String,
    pub distance_km: f64,
    pub occ_before: f64,
    pub occ_after: f64,
    pub cost: f64,
    /// Whether the placement honoured the requested service, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_ok: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Summary {
    pub total_patients: usize,
    pub total_assigned: usize,
    pub total_unassigned: usize,
}

impl Summary {
    pub fn new(total_patients: usize, total_assigned: usize) -> Self {
        Self {
            total_patients,
            total_assigned,
            total_unassigned: total_patients.saturating_sub(total_assigned),
        }
    }
}

/// Final bed state of one facility after a solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilitySnapshot {
    #[serde(rename = "hospital_id")]
    pub facility_id: String,
    #[serde(rename = "capacity_tt")]
    pub capacity: f64,
    #[serde(rename = "occupied_tt")]
    pub occupied: f64,
    pub occ_ratio: f64,
    #[serde(default, rename = "wilayah")]
    pub region: Option<String>,
    #[serde(default, rename = "kelas")]
    pub class: Option<String>,
}

/// Everything a single solve produces. Read-only once built.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub summary: Summary,
    pub assignments: Vec<Assignment>,
    #[serde(rename = "facilities")]
    pub facility_snapshot: Vec<FacilitySnapshot>,
}

impl ResultEnvelope {
    pub fn assignment_for(&self, patient_id: &str) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.patient_id == patient_id)
    }

    pub fn snapshot_for(&self, facility_id: &str) -> Option<&FacilitySnapshot> {
        self.facility_snapshot
            .iter()
            .find(|f| f.facility_id == facility_id)
    }

    /// Sum of assignment costs.
    pub fn total_cost(&self) -> f64 {
        self.assignments.iter().map(|a| a.cost).sum()
    }
}
