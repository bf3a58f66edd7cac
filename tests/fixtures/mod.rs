//! Test fixtures for bed-alloc.
//!
//! Provides:
//! - Approximate hospital locations in Makassar, South Sulawesi
//! - Builders for patients and facilities
//! - A planar distance stub with exact kilometre distances

#![allow(dead_code)]

pub mod makassar_hospitals;

pub use makassar_hospitals::*;

use bed_alloc::model::{Facility, GeoPoint, Patient};
use bed_alloc::traits::DistanceProvider;

// ============================================================================
// Distance stub
// ============================================================================

/// Treats `lat`/`lon` as kilometres on a flat plane.
///
/// Keeps expected distances exact: a patient at `(0, 0)` and a facility at
/// `(0, 20)` are 20 km apart.
pub struct PlanarDistance;

impl DistanceProvider for PlanarDistance {
    fn distance_km(&self, from: GeoPoint, to: GeoPoint) -> f64 {
        (from.lat - to.lat).hypot(from.lon - to.lon)
    }
}

// ============================================================================
// Builders
// ============================================================================

/// Builder for test patients with sensible defaults.
#[derive(Clone, Debug)]
pub struct TestPatient {
    inner: Patient,
}

impl TestPatient {
    pub fn new(id: &str) -> Self {
        Self {
            inner: Patient::new(id, GeoPoint::new(0.0, 0.0)),
        }
    }

    pub fn at(mut self, lat: f64, lon: f64) -> Self {
        self.inner.location = GeoPoint::new(lat, lon);
        self
    }

    pub fn case(mut self, case: &str) -> Self {
        self.inner.case = case.to_string();
        self
    }

    pub fn severity(mut self, severity: f64) -> Self {
        self.inner.severity = Some(severity);
        self
    }

    pub fn region(mut self, region: &str) -> Self {
        self.inner.region = Some(region.to_string());
        self
    }

    pub fn build(self) -> Patient {
        self.inner
    }
}

/// Builder for test facilities. Defaults to 10 empty beds at the origin.
#[derive(Clone, Debug)]
pub struct TestFacility {
    inner: Facility,
}

impl TestFacility {
    pub fn new(id: &str) -> Self {
        Self {
            inner: Facility::new(id, GeoPoint::new(0.0, 0.0), 10.0, 0.0),
        }
    }

    pub fn at(mut self, lat: f64, lon: f64) -> Self {
        self.inner.location = GeoPoint::new(lat, lon);
        self
    }

    pub fn beds(mut self, capacity: f64, occupied: f64) -> Self {
        self.inner.capacity = capacity;
        self.inner.occupied = occupied;
        self
    }

    pub fn services(mut self, services: &[&str]) -> Self {
        self.inner.services = services.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn region(mut self, region: &str) -> Self {
        self.inner.region = Some(region.to_string());
        self
    }

    pub fn class(mut self, class: &str) -> Self {
        self.inner.class = Some(class.to_string());
        self
    }

    pub fn build(self) -> Facility {
        self.inner
    }
}
