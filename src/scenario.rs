//! What-if simulation.
//!
//! A scenario perturbs a copy of exactly one input (facilities, configuration
//! or patients). The simulator solves the untouched inputs and the perturbed
//! ones with the same solver and reports how the KPIs moved.

use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::config::MatchConfig;
use crate::error::SimulationError;
use crate::haversine::Haversine;
use crate::metrics::{MetricsDelta, MetricsRecord};
use crate::model::{Facility, FacilitySnapshot, Patient};
use crate::orchestrator;
use crate::traits::DistanceProvider;

pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_SPIKE_SEED: u64 = 42;

/// Scenario request as callers send it: `{"type": "...", "params": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSpec {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub params: Value,
}

impl ScenarioSpec {
    pub fn new(kind: impl Into<String>, params: Value) -> Self {
        Self {
            kind: kind.into(),
            params,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacityDrop {
    /// Fraction of capacity removed, in [0, 1].
    pub drop_pct: f64,
    #[serde(alias = "wilayah")]
    pub region: Option<String>,
    #[serde(alias = "kelas")]
    pub class: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyChange {
    pub radius_km: Option<f64>,
    pub max_load: Option<f64>,
    pub target_occupancy: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemandSpike {
    /// Share of the filtered patients to duplicate, in [0, 1].
    pub spike_pct: f64,
    #[serde(alias = "wilayah")]
    pub region: Option<String>,
    #[serde(alias = "kasus")]
    pub case: Option<String>,
    pub severity_shift: f64,
    pub seed: u64,
}

impl Default for DemandSpike {
    fn default() -> Self {
        Self {
            spike_pct: 0.0,
            region: None,
            case: None,
            severity_shift: 0.0,
            seed: DEFAULT_SPIKE_SEED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "params", rename_all = "snake_case")]
pub enum Scenario {
    CapacityDrop(CapacityDrop),
    PolicyChange(PolicyChange),
    DemandSpike(DemandSpike),
}

impl Scenario {
    pub fn from_spec(spec: &ScenarioSpec) -> Result<Self, SimulationError> {
        let kind = spec.kind.trim().to_ascii_lowercase();
        let scenario = match kind.as_str() {
            "capacity_drop" => Scenario::CapacityDrop(parse_params("capacity_drop", &spec.params)?),
            "policy_change" => Scenario::PolicyChange(parse_params("policy_change", &spec.params)?),
            "demand_spike" => Scenario::DemandSpike(parse_params("demand_spike", &spec.params)?),
            _ => return Err(SimulationError::UnknownScenarioKind(spec.kind.clone())),
        };
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Scenario::CapacityDrop(_) => "capacity_drop",
            Scenario::PolicyChange(_) => "policy_change",
            Scenario::DemandSpike(_) => "demand_spike",
        }
    }

    fn validate(&self) -> Result<(), SimulationError> {
        let kind = self.kind();
        match self {
            Scenario::CapacityDrop(p) => fraction(kind, "drop_pct", p.drop_pct),
            Scenario::PolicyChange(p) => {
                if let Some(radius) = p.radius_km {
                    if !(radius.is_finite() && radius > 0.0) {
                        return Err(invalid(kind, format!("radius_km must be positive, got {radius}")));
                    }
                }
                if let Some(max_load) = p.max_load {
                    if !(max_load.is_finite() && max_load > 0.0 && max_load <= 1.0) {
                        return Err(invalid(kind, format!("max_load must be in (0, 1], got {max_load}")));
                    }
                }
                if let Some(target) = p.target_occupancy {
                    if !(target.is_finite() && target >= 0.0) {
                        return Err(invalid(
                            kind,
                            format!("target_occupancy must be non-negative, got {target}"),
                        ));
                    }
                }
                Ok(())
            }
            Scenario::DemandSpike(p) => {
                fraction(kind, "spike_pct", p.spike_pct)?;
                if !p.severity_shift.is_finite() {
                    return Err(invalid(kind, "severity_shift must be finite".to_string()));
                }
                Ok(())
            }
        }
    }
}

fn parse_params<T: DeserializeOwned>(kind: &'static str, params: &Value) -> Result<T, SimulationError> {
    let params = match params {
        Value::Null => Value::Object(Default::default()),
        other => other.clone(),
    };
    serde_json::from_value(params).map_err(|err| invalid(kind, err.to_string()))
}

fn fraction(kind: &'static str, field: &str, value: f64) -> Result<(), SimulationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(kind, format!("{field} must be in [0, 1], got {value}")))
    }
}

fn invalid(kind: &'static str, reason: String) -> SimulationError {
    SimulationError::InvalidParameters { kind, reason }
}

/// Case-insensitive tag filter. An unset filter matches everything; a set
/// filter never matches an untagged record.
fn tag_matches(filter: Option<&str>, tag: Option<&str>) -> bool {
    match filter {
        None => true,
        Some(wanted) => tag.is_some_and(|t| t.trim().to_lowercase() == wanted.trim().to_lowercase()),
    }
}

/// Reduce matching facilities' capacity by `drop_pct`.
///
/// New capacity is rounded half-to-even with a floor of one bed, then lifted
/// back to `occupied` wherever it fell below it.
pub fn apply_capacity_drop(facilities: &[Facility], drop: &CapacityDrop) -> Vec<Facility> {
    let mut out = facilities.to_vec();
    if drop.drop_pct <= 0.0 {
        return out;
    }
    for facility in out.iter_mut().filter(|f| {
        tag_matches(drop.region.as_deref(), f.region.as_deref())
            && tag_matches(drop.class.as_deref(), f.class.as_deref())
    }) {
        let reduced = (facility.capacity * (1.0 - drop.drop_pct)).round_ties_even().max(1.0);
        facility.capacity = reduced.max(facility.occupied);
    }
    out
}

/// Override only the supplied policy fields.
pub fn apply_policy_change(config: &MatchConfig, change: &PolicyChange) -> MatchConfig {
    let mut out = config.clone();
    if let Some(radius_km) = change.radius_km {
        out.constraints.radius_km = radius_km;
    }
    if let Some(max_load) = change.max_load {
        out.constraints.max_load = max_load;
    }
    if let Some(target) = change.target_occupancy {
        out.policy.target_occupancy = target;
    }
    out
}

/// Append resampled copies of the filtered patients.
///
/// Draws `max(1, floor(n * spike_pct))` patients with replacement from a
/// seeded generator. Copy `k` (1-based) of patient `id` becomes `id_SPKk`;
/// when that id is already taken the suffix counts up until it is free.
pub fn apply_demand_spike(patients: &[Patient], spike: &DemandSpike) -> Vec<Patient> {
    let mut out = patients.to_vec();
    let subset: Vec<&Patient> = patients
        .iter()
        .filter(|p| tag_matches(spike.region.as_deref(), p.region.as_deref()))
        .filter(|p| match spike.case.as_deref() {
            Some(case) => p.case.to_lowercase().contains(&case.trim().to_lowercase()),
            None => true,
        })
        .collect();

    if subset.is_empty() || spike.spike_pct <= 0.0 {
        return out;
    }

    let extra = ((subset.len() as f64 * spike.spike_pct).floor() as usize).max(1);
    let mut taken: HashSet<String> = patients.iter().map(|p| p.id.clone()).collect();
    let mut rng = StdRng::seed_from_u64(spike.seed);
    for draw in 1..=extra {
        let mut patient = subset[rng.random_range(0..subset.len())].clone();
        let mut suffix = draw;
        let id = loop {
            let candidate = format!("{}_SPK{suffix}", patient.id);
            if !taken.contains(&candidate) {
                break candidate;
            }
            suffix += 1;
        };
        taken.insert(id.clone());
        patient.id = id;
        if let Some(severity) = patient.severity.as_mut() {
            *severity += spike.severity_shift;
        }
        out.push(patient);
    }
    debug!(filtered = subset.len(), extra, "demand spike applied");
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationOptions {
    /// How many facilities to list in `top_facility_changes`.
    pub top_k: usize,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self { top_k: DEFAULT_TOP_K }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacilityChange {
    #[serde(rename = "hospital_id")]
    pub facility_id: String,
    pub occ_before: f64,
    pub occ_after: f64,
    pub delta_occ: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationReport {
    pub scenario: Scenario,
    pub before: MetricsRecord,
    pub after: MetricsRecord,
    pub delta: MetricsDelta,
    pub top_facility_changes: Vec<FacilityChange>,
}

pub fn simulate(
    spec: &ScenarioSpec,
    patients: &[Patient],
    facilities: &[Facility],
    config: &MatchConfig,
) -> Result<SimulationReport, SimulationError> {
    simulate_with(spec, patients, facilities, config, SimulationOptions::default(), &Haversine)
}

pub fn simulate_with_options(
    spec: &ScenarioSpec,
    patients: &[Patient],
    facilities: &[Facility],
    config: &MatchConfig,
    options: SimulationOptions,
) -> Result<SimulationReport, SimulationError> {
    simulate_with(spec, patients, facilities, config, options, &Haversine)
}

/// Run baseline and perturbed solves with an injected distance provider.
#[instrument(skip_all, fields(scenario = %spec.kind, patients = patients.len(), facilities = facilities.len()))]
pub fn simulate_with<D>(
    spec: &ScenarioSpec,
    patients: &[Patient],
    facilities: &[Facility],
    config: &MatchConfig,
    options: SimulationOptions,
    distance: &D,
) -> Result<SimulationReport, SimulationError>
where
    D: DistanceProvider + ?Sized,
{
    let scenario = Scenario::from_spec(spec)?;

    let baseline = orchestrator::solve_with(patients, facilities, config, distance)?;

    let perturbed = match &scenario {
        Scenario::CapacityDrop(drop) => {
            let facilities = apply_capacity_drop(facilities, drop);
            orchestrator::solve_with(patients, &facilities, config, distance)?
        }
        Scenario::PolicyChange(change) => {
            let config = apply_policy_change(config, change);
            orchestrator::solve_with(patients, facilities, &config, distance)?
        }
        Scenario::DemandSpike(spike) => {
            let patients = apply_demand_spike(patients, spike);
            orchestrator::solve_with(&patients, facilities, config, distance)?
        }
    };

    let before = MetricsRecord::from_envelope(&baseline);
    let after = MetricsRecord::from_envelope(&perturbed);
    let delta = MetricsDelta::between(&before, &after);
    let top_facility_changes = top_facility_changes(
        &baseline.facility_snapshot,
        &perturbed.facility_snapshot,
        options.top_k,
    );

    info!(
        kind = scenario.kind(),
        assigned_delta = delta.total_assigned,
        unmet_delta = delta.unmet_ratio,
        "scenario simulated"
    );

    Ok(SimulationReport {
        scenario,
        before,
        after,
        delta,
        top_facility_changes,
    })
}

/// Facilities ranked by absolute occupancy-ratio change, largest first.
///
/// A facility missing from the baseline counts as empty before.
pub fn top_facility_changes(
    before: &[FacilitySnapshot],
    after: &[FacilitySnapshot],
    top_k: usize,
) -> Vec<FacilityChange> {
    let baseline: HashMap<&str, f64> = before
        .iter()
        .map(|f| (f.facility_id.as_str(), f.occ_ratio))
        .collect();

    let mut changes: Vec<FacilityChange> = after
        .iter()
        .map(|f| {
            let occ_before = baseline.get(f.facility_id.as_str()).copied().unwrap_or(0.0);
            FacilityChange {
                facility_id: f.facility_id.clone(),
                occ_before,
                occ_after: f.occ_ratio,
                delta_occ: f.occ_ratio - occ_before,
            }
        })
        .collect();
    changes.sort_by(|a, b| b.delta_occ.abs().total_cmp(&a.delta_occ.abs()));
    changes.truncate(top_k);
    changes
}
