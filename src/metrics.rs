//! KPIs derived from a result envelope.

use serde::{Deserialize, Serialize};

use crate::model::ResultEnvelope;

/// Guards the load-balance index against an all-empty snapshot.
pub const LOAD_BALANCE_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub total_patients: usize,
    pub total_assigned: usize,
    pub total_unassigned: usize,
    pub avg_distance_km: f64,
    pub unmet_ratio: f64,
    /// Population stddev of occupancy ratios over their mean.
    pub load_balance_index: f64,
    pub occ_mean: f64,
    pub occ_min: f64,
    pub occ_max: f64,
    pub service_compliance: f64,
}

impl MetricsRecord {
    pub fn from_envelope(result: &ResultEnvelope) -> Self {
        let summary = result.summary;

        let avg_distance_km = mean(result.assignments.iter().map(|a| a.distance_km));
        let unmet_ratio = if summary.total_patients > 0 {
            summary.total_unassigned as f64 / summary.total_patients as f64
        } else {
            0.0
        };

        let ratios: Vec<f64> = result.facility_snapshot.iter().map(|f| f.occ_ratio).collect();
        let occ_mean = mean(ratios.iter().copied());
        let (occ_min, occ_max) = if ratios.is_empty() {
            (0.0, 0.0)
        } else {
            ratios
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| (lo.min(r), hi.max(r)))
        };
        let variance = mean(ratios.iter().map(|r| (r - occ_mean).powi(2)));
        let load_balance_index = variance.sqrt() / (occ_mean + LOAD_BALANCE_EPSILON);

        Self {
            total_patients: summary.total_patients,
            total_assigned: summary.total_assigned,
            total_unassigned: summary.total_unassigned,
            avg_distance_km,
            unmet_ratio,
            load_balance_index,
            occ_mean,
            occ_min,
            occ_max,
            service_compliance: service_compliance(result),
        }
    }
}

/// Share of flagged assignments that honoured the requested service.
///
/// Without any flag the value is 1.0 when something was assigned, else 0.0.
fn service_compliance(result: &ResultEnvelope) -> f64 {
    let flags: Vec<bool> = result.assignments.iter().filter_map(|a| a.service_ok).collect();
    if !flags.is_empty() {
        flags.iter().filter(|&&ok| ok).count() as f64 / flags.len() as f64
    } else if result.assignments.is_empty() {
        0.0
    } else {
        1.0
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

pub fn metrics(result: &ResultEnvelope) -> MetricsRecord {
    MetricsRecord::from_envelope(result)
}

/// Per-KPI `after - before`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricsDelta {
    pub total_patients: f64,
    pub total_assigned: f64,
    pub total_unassigned: f64,
    pub avg_distance_km: f64,
    pub unmet_ratio: f64,
    pub load_balance_index: f64,
    pub occ_mean: f64,
    pub occ_min: f64,
    pub occ_max: f64,
    pub service_compliance: f64,
}

impl MetricsDelta {
    pub fn between(before: &MetricsRecord, after: &MetricsRecord) -> Self {
        let count = |b: usize, a: usize| a as f64 - b as f64;
        Self {
            total_patients: count(before.total_patients, after.total_patients),
            total_assigned: count(before.total_assigned, after.total_assigned),
            total_unassigned: count(before.total_unassigned, after.total_unassigned),
            avg_distance_km: after.avg_distance_km - before.avg_distance_km,
            unmet_ratio: after.unmet_ratio - before.unmet_ratio,
            load_balance_index: after.load_balance_index - before.load_balance_index,
            occ_mean: after.occ_mean - before.occ_mean,
            occ_min: after.occ_min - before.occ_min,
            occ_max: after.occ_max - before.occ_max,
            service_compliance: after.service_compliance - before.service_compliance,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}
