//! Approximate hospital and neighbourhood locations in and around Makassar.
//!
//! Bed counts and services are illustrative, not official figures.

use bed_alloc::model::{Facility, GeoPoint, Patient};

/// A named point with coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lon: f64) -> Self {
        Self { name, lat, lon }
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HospitalSite {
    pub id: &'static str,
    pub location: Location,
    pub capacity: f64,
    pub occupied: f64,
    pub services: &'static [&'static str],
    pub region: &'static str,
    pub class: &'static str,
}

impl HospitalSite {
    pub fn facility(&self) -> Facility {
        let mut facility = Facility::new(self.id, self.location.point(), self.capacity, self.occupied);
        facility.name = Some(self.location.name.to_string());
        facility.services = self.services.iter().map(|s| s.to_string()).collect();
        facility.region = Some(self.region.to_string());
        facility.class = Some(self.class.to_string());
        facility
    }
}

// ============================================================================
// Hospitals
// ============================================================================

pub const HOSPITALS: &[HospitalSite] = &[
    HospitalSite {
        id: "RS01",
        location: Location::new("RSUP Dr. Wahidin Sudirohusodo", -5.1336, 119.4883),
        capacity: 12.0,
        occupied: 9.0,
        services: &["ICU", "IGD", "Bedah", "Jantung"],
        region: "Makassar",
        class: "A",
    },
    HospitalSite {
        id: "RS02",
        location: Location::new("RSUD Labuang Baji", -5.1518, 119.4199),
        capacity: 8.0,
        occupied: 5.0,
        services: &["IGD", "Bedah", "Anak"],
        region: "Makassar",
        class: "B",
    },
    HospitalSite {
        id: "RS03",
        location: Location::new("RS Stella Maris", -5.1404, 119.4087),
        capacity: 6.0,
        occupied: 2.0,
        services: &["ICU", "IGD"],
        region: "Makassar",
        class: "B",
    },
    HospitalSite {
        id: "RS04",
        location: Location::new("RS Bhayangkara", -5.1510, 119.4390),
        capacity: 5.0,
        occupied: 4.0,
        services: &["IGD", "Bedah"],
        region: "Makassar",
        class: "B",
    },
    HospitalSite {
        id: "RS05",
        location: Location::new("RSUD Daya", -5.0983, 119.5113),
        capacity: 7.0,
        occupied: 1.0,
        services: &["IGD", "Anak", "ICU"],
        region: "Makassar",
        class: "C",
    },
    HospitalSite {
        id: "RS06",
        location: Location::new("RSUD Syekh Yusuf", -5.2055, 119.4617),
        capacity: 6.0,
        occupied: 3.0,
        services: &["IGD", "Bedah", "Anak"],
        region: "Gowa",
        class: "B",
    },
    HospitalSite {
        id: "RS07",
        location: Location::new("RSUD Salewangang", -5.0064, 119.5741),
        capacity: 4.0,
        occupied: 4.0,
        services: &["IGD"],
        region: "Maros",
        class: "C",
    },
];

pub fn facilities() -> Vec<Facility> {
    HOSPITALS.iter().map(HospitalSite::facility).collect()
}

// ============================================================================
// Patient origins
// ============================================================================

pub const NEIGHBOURHOODS: &[Location] = &[
    Location::new("Panakkukang", -5.1510, 119.4470),
    Location::new("Tamalanrea", -5.1340, 119.4950),
    Location::new("Biringkanaya", -5.0800, 119.5200),
    Location::new("Mariso", -5.1560, 119.4080),
    Location::new("Tallo", -5.1140, 119.4400),
    Location::new("Rappocini", -5.1700, 119.4350),
    Location::new("Sungguminasa", -5.2000, 119.4500),
    Location::new("Turikale", -5.0050, 119.5740),
];

const CASES: &[&str] = &["ICU", "IGD", "Bedah", "Anak", "", "Jantung"];

/// A deterministic batch cycling through neighbourhoods and cases.
pub fn patient_batch(count: usize) -> Vec<Patient> {
    (0..count)
        .map(|i| {
            let origin = NEIGHBOURHOODS[i % NEIGHBOURHOODS.len()];
            let mut patient = Patient::new(format!("P{:03}", i + 1), origin.point());
            patient.case = CASES[i % CASES.len()].to_string();
            patient.severity = (i % 4 != 3).then(|| (i % 5 + 1) as f64);
            patient.region = Some(if origin.lat < -5.19 { "Gowa" } else { "Makassar" }.to_string());
            patient
        })
        .collect()
}
