//! Source-row normalization and input validation.
//!
//! Upstream tables name the same columns differently (`id_pasien` vs
//! `patient_id`, `kasus` vs `service_type`, `capacity_tt` vs `capacity`).
//! [`PatientRecord`] and [`FacilityRecord`] accept all known spellings with
//! every field optional, so a missing column is reported as a named
//! [`ValidationError`] instead of an opaque parse failure.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;
use crate::model::{Facility, GeoPoint, Patient};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    #[serde(
        default,
        alias = "id_pasien",
        alias = "patient_id",
        alias = "patient_code",
        deserialize_with = "lenient_string"
    )]
    pub id: Option<String>,
    #[serde(default, alias = "latitude")]
    pub lat: Option<f64>,
    #[serde(default, alias = "lng", alias = "longitude")]
    pub lon: Option<f64>,
    #[serde(default, alias = "kasus", alias = "service_type")]
    pub case: Option<String>,
    #[serde(default)]
    pub severity: Option<f64>,
    #[serde(default)]
    pub visit_date: Option<NaiveDate>,
    #[serde(default, alias = "wilayah")]
    pub region: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacilityRecord {
    #[serde(
        default,
        alias = "id_rs",
        alias = "hospital_id",
        alias = "facility_id",
        deserialize_with = "lenient_string"
    )]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "latitude")]
    pub lat: Option<f64>,
    #[serde(default, alias = "lng", alias = "longitude")]
    pub lon: Option<f64>,
    #[serde(default, alias = "capacity_tt")]
    pub capacity: Option<f64>,
    #[serde(default, alias = "occupied_tt")]
    pub occupied: Option<f64>,
    #[serde(default)]
    pub services: Option<ServiceList>,
    #[serde(default, alias = "wilayah")]
    pub region: Option<String>,
    #[serde(default, alias = "kelas")]
    pub class: Option<String>,
}

/// Offered services, either as a list or as one delimited string such as
/// `"ICU;IGD"` or `"{ICU,IGD}"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServiceList {
    List(Vec<String>),
    Text(String),
}

impl ServiceList {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            ServiceList::List(items) => items
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            ServiceList::Text(text) => text
                .trim()
                .trim_matches(|c| matches!(c, '{' | '}' | '[' | ']'))
                .split([';', ',', '|'])
                .map(|s| s.trim().trim_matches(|c| c == '"' || c == '\'').trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}

/// A source row with an identifier column.
///
/// Delimited readers infer numbers from field text, which turns `007` into
/// `7`. They overwrite the parsed id with the column's raw text instead.
pub trait SourceRecord {
    /// Header spellings of the id column, in lookup order.
    const ID_COLUMNS: &'static [&'static str];

    fn set_raw_id(&mut self, id: &str);
}

impl SourceRecord for PatientRecord {
    const ID_COLUMNS: &'static [&'static str] = &["id", "id_pasien", "patient_id", "patient_code"];

    fn set_raw_id(&mut self, id: &str) {
        self.id = Some(id.to_string());
    }
}

impl SourceRecord for FacilityRecord {
    const ID_COLUMNS: &'static [&'static str] = &["id", "id_rs", "hospital_id", "facility_id"];

    fn set_raw_id(&mut self, id: &str) {
        self.id = Some(id.to_string());
    }
}

/// Accept identifiers written as strings or bare numbers.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|scalar| match scalar {
        Scalar::Text(s) => s,
        Scalar::Int(i) => i.to_string(),
        Scalar::Float(f) => f.to_string(),
    }))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl PatientRecord {
    /// Canonical patient for source row `row` (0-based).
    pub fn into_patient(self, row: usize) -> Result<Patient, ValidationError> {
        let missing = |field| ValidationError::MissingField {
            entity: "patient",
            row,
            field,
        };
        let id = non_blank(self.id).ok_or_else(|| missing("id"))?;
        let lat = self.lat.ok_or_else(|| missing("lat"))?;
        let lon = self.lon.ok_or_else(|| missing("lon"))?;

        let patient = Patient {
            id,
            location: GeoPoint::new(lat, lon),
            case: self.case.map(|c| c.trim().to_string()).unwrap_or_default(),
            severity: self.severity,
            visit_date: self.visit_date,
            region: non_blank(self.region),
        };
        validate_patient(&patient)?;
        Ok(patient)
    }
}

impl FacilityRecord {
    /// Canonical facility for source row `row` (0-based).
    pub fn into_facility(self, row: usize) -> Result<Facility, ValidationError> {
        let missing = |field| ValidationError::MissingField {
            entity: "facility",
            row,
            field,
        };
        let id = non_blank(self.id).ok_or_else(|| missing("id"))?;
        let lat = self.lat.ok_or_else(|| missing("lat"))?;
        let lon = self.lon.ok_or_else(|| missing("lon"))?;
        let capacity = self.capacity.ok_or_else(|| missing("capacity"))?;
        let occupied = self.occupied.ok_or_else(|| missing("occupied"))?;

        let facility = Facility {
            id,
            name: non_blank(self.name),
            location: GeoPoint::new(lat, lon),
            capacity,
            occupied,
            services: self.services.map(ServiceList::into_vec).unwrap_or_default(),
            region: non_blank(self.region),
            class: non_blank(self.class),
        };
        validate_facility(&facility)?;
        Ok(facility)
    }
}

pub fn normalize_patients(rows: Vec<PatientRecord>) -> Result<Vec<Patient>, ValidationError> {
    let patients = rows
        .into_iter()
        .enumerate()
        .map(|(row, record)| record.into_patient(row))
        .collect::<Result<Vec<_>, _>>()?;
    ensure_unique("patient", patients.iter().map(|p| p.id.as_str()))?;
    Ok(patients)
}

pub fn normalize_facilities(rows: Vec<FacilityRecord>) -> Result<Vec<Facility>, ValidationError> {
    let facilities = rows
        .into_iter()
        .enumerate()
        .map(|(row, record)| record.into_facility(row))
        .collect::<Result<Vec<_>, _>>()?;
    ensure_unique("facility", facilities.iter().map(|f| f.id.as_str()))?;
    Ok(facilities)
}

/// Validate canonical inputs handed straight to a solve.
pub fn validate_inputs(patients: &[Patient], facilities: &[Facility]) -> Result<(), ValidationError> {
    patients.iter().try_for_each(validate_patient)?;
    facilities.iter().try_for_each(validate_facility)?;
    ensure_unique("patient", patients.iter().map(|p| p.id.as_str()))?;
    ensure_unique("facility", facilities.iter().map(|f| f.id.as_str()))
}

pub fn validate_patient(patient: &Patient) -> Result<(), ValidationError> {
    validate_location("patient", &patient.id, patient.location)?;
    if let Some(severity) = patient.severity {
        finite("patient", &patient.id, "severity", severity)?;
    }
    Ok(())
}

pub fn validate_facility(facility: &Facility) -> Result<(), ValidationError> {
    let id = &facility.id;
    validate_location("facility", id, facility.location)?;
    finite("facility", id, "capacity", facility.capacity)?;
    finite("facility", id, "occupied", facility.occupied)?;

    if facility.capacity < 0.0 {
        return Err(ValidationError::Negative {
            id: id.clone(),
            field: "capacity",
            value: facility.capacity,
        });
    }
    if facility.occupied < 0.0 {
        return Err(ValidationError::Negative {
            id: id.clone(),
            field: "occupied",
            value: facility.occupied,
        });
    }
    if facility.occupied > facility.capacity {
        return Err(ValidationError::OccupiedExceedsCapacity {
            id: id.clone(),
            occupied: facility.occupied,
            capacity: facility.capacity,
        });
    }
    Ok(())
}

fn validate_location(entity: &'static str, id: &str, location: GeoPoint) -> Result<(), ValidationError> {
    finite(entity, id, "lat", location.lat)?;
    finite(entity, id, "lon", location.lon)?;
    in_range(entity, id, "lat", location.lat, -90.0, 90.0)?;
    in_range(entity, id, "lon", location.lon, -180.0, 180.0)
}

fn finite(entity: &'static str, id: &str, field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonFinite {
            entity,
            id: id.to_string(),
            field,
        })
    }
}

fn in_range(
    entity: &'static str,
    id: &str,
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), ValidationError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            entity,
            id: id.to_string(),
            field,
            value,
            min,
            max,
        })
    }
}

fn ensure_unique<'a>(entity: &'static str, ids: impl Iterator<Item = &'a str>) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ValidationError::DuplicateId {
                entity,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}
