//! Match orchestration: validate, pick a solver, assemble the result envelope.

use tracing::{info, instrument, warn};

use crate::capacity;
use crate::config::{MatchConfig, SolverKind};
use crate::error::ValidationError;
use crate::greedy;
use crate::haversine::Haversine;
use crate::input::{normalize_facilities, normalize_patients, validate_inputs, FacilityRecord, PatientRecord};
use crate::model::{Facility, Patient, ResultEnvelope};
use crate::traits::DistanceProvider;

/// Solve with great-circle distances.
pub fn solve(
    patients: &[Patient],
    facilities: &[Facility],
    config: &MatchConfig,
) -> Result<ResultEnvelope, ValidationError> {
    solve_with(patients, facilities, config, &Haversine)
}

/// Solve with an injected distance provider.
///
/// Configuration and inputs are validated before any solver runs. Patients
/// without a feasible facility are not an error; they are counted in
/// `summary.total_unassigned`.
#[instrument(
    skip_all,
    fields(
        patients = patients.len(),
        facilities = facilities.len(),
        solver = %config.solver
    )
)]
pub fn solve_with<D>(
    patients: &[Patient],
    facilities: &[Facility],
    config: &MatchConfig,
    distance: &D,
) -> Result<ResultEnvelope, ValidationError>
where
    D: DistanceProvider + ?Sized,
{
    if let Err(err) = config.validate().and_then(|()| validate_inputs(patients, facilities)) {
        warn!(error = %err, "rejecting solve request");
        return Err(err);
    }

    let allocation = match config.solver {
        SolverKind::Greedy => greedy::solve(patients, facilities, config, &distance),
        SolverKind::Optimal => capacity::solve(patients, facilities, config, &distance),
    };
    let envelope = allocation.into_envelope(patients.len());

    info!(
        assigned = envelope.summary.total_assigned,
        unassigned = envelope.summary.total_unassigned,
        total_cost = envelope.total_cost(),
        "solve complete"
    );
    Ok(envelope)
}

/// Normalize heterogeneous source rows, then solve.
pub fn solve_records(
    patient_rows: Vec<PatientRecord>,
    facility_rows: Vec<FacilityRecord>,
    config: &MatchConfig,
) -> Result<ResultEnvelope, ValidationError> {
    let patients = normalize_patients(patient_rows).inspect_err(|err| warn!(error = %err, "bad patient rows"))?;
    let facilities =
        normalize_facilities(facility_rows).inspect_err(|err| warn!(error = %err, "bad facility rows"))?;
    solve(&patients, &facilities, config)
}
