//! Solver behaviour tests
//!
//! Capacity, radius, service matching, determinism and the optimality
//! relationship between the greedy and capacity-expanded solvers.

mod fixtures;

use std::collections::HashMap;

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use bed_alloc::config::{MatchConfig, SolverKind};
use bed_alloc::explain::{explain_assignment_with, feasible_candidates, feasible_candidates_with};
use bed_alloc::haversine::Haversine;
use bed_alloc::model::{Facility, Patient, ResultEnvelope};
use bed_alloc::orchestrator::{solve, solve_with};

use fixtures::{facilities, patient_batch, PlanarDistance, TestFacility, TestPatient};

const BOTH: [SolverKind; 2] = [SolverKind::Greedy, SolverKind::Optimal];

fn run(patients: &[Patient], facilities: &[Facility], config: &MatchConfig) -> ResultEnvelope {
    solve_with(patients, facilities, config, &PlanarDistance).expect("valid input")
}

// ============================================================================
// Capacity
// ============================================================================

#[test]
fn last_bed_goes_to_first_patient_only() {
    let facilities = vec![TestFacility::new("H1").beds(10.0, 9.0).services(&["ICU"]).build()];
    let patients = vec![
        TestPatient::new("P1").case("ICU").severity(5.0).build(),
        TestPatient::new("P2").case("ICU").severity(5.0).build(),
    ];

    for kind in BOTH {
        let config = MatchConfig::default().with_solver(kind);
        let result = solve(&patients, &facilities, &config).unwrap();

        assert_eq!(result.summary.total_assigned, 1, "{kind}");
        assert_eq!(result.summary.total_unassigned, 1, "{kind}");
        let a = &result.assignments[0];
        assert_eq!(a.facility_id, "H1");
        assert_eq!(a.distance_km, 0.0);
        assert_relative_eq!(a.occ_before, 0.9);
        assert_relative_eq!(a.occ_after, 1.0);
    }

    let greedy = solve(&patients, &facilities, &MatchConfig::default()).unwrap();
    assert_eq!(greedy.assignments[0].patient_id, "P1", "ties keep input order");
}

#[test]
fn overfull_input_is_preserved_not_corrected() {
    let facilities = vec![
        TestFacility::new("full").beds(10.0, 10.0).build(),
        TestFacility::new("open").at(0.0, 30.0).beds(10.0, 2.0).build(),
    ];
    let patients = vec![TestPatient::new("P1").build()];
    let config = MatchConfig::default().with_max_load(0.9);

    for kind in BOTH {
        let result = run(&patients, &facilities, &config.clone().with_solver(kind));
        assert_eq!(result.assignments[0].facility_id, "open", "{kind}");
        let full = result.snapshot_for("full").unwrap();
        assert_eq!(full.occupied, 10.0);
        assert_relative_eq!(full.occ_ratio, 1.0);
    }
}

#[test]
fn higher_severity_claims_scarce_bed_first() {
    let facilities = vec![TestFacility::new("H1").beds(4.0, 3.0).build()];
    let patients = vec![
        TestPatient::new("routine").severity(1.0).build(),
        TestPatient::new("unknown").build(),
        TestPatient::new("critical").severity(9.0).build(),
    ];

    let result = run(&patients, &facilities, &MatchConfig::default());
    assert_eq!(result.summary.total_assigned, 1);
    assert_eq!(result.assignments[0].patient_id, "critical");
}

#[test]
fn zero_capacity_facility_is_never_used() {
    let facilities = vec![TestFacility::new("closed").beds(0.0, 0.0).build()];
    let patients = vec![TestPatient::new("P1").build()];

    for kind in BOTH {
        let result = run(&patients, &facilities, &MatchConfig::default().with_solver(kind));
        assert!(result.assignments.is_empty(), "{kind}");
        assert_eq!(result.snapshot_for("closed").unwrap().occ_ratio, 0.0);
    }
}

// ============================================================================
// Radius and service
// ============================================================================

#[test]
fn patient_beyond_radius_is_unassigned_in_both_modes() {
    let facilities = vec![TestFacility::new("H1").at(0.0, 20.0).build()];
    let patients = vec![TestPatient::new("P1").build()];

    for kind in BOTH {
        let config = MatchConfig::default().with_radius_km(10.0).with_solver(kind);
        let result = run(&patients, &facilities, &config);
        assert_eq!(result.summary.total_unassigned, 1, "{kind}");
        assert!(result.assignments.is_empty(), "{kind}");
    }
}

#[test]
fn radius_boundary_is_inclusive() {
    let facilities = vec![TestFacility::new("H1").at(0.0, 10.0).build()];
    let patients = vec![TestPatient::new("P1").build()];

    for kind in BOTH {
        let config = MatchConfig::default().with_radius_km(10.0).with_solver(kind);
        assert_eq!(run(&patients, &facilities, &config).summary.total_assigned, 1, "{kind}");
    }
}

#[test]
fn service_match_is_case_insensitive_substring() {
    let facilities = vec![
        TestFacility::new("general").services(&["IGD"]).build(),
        TestFacility::new("cardiac").at(0.0, 5.0).services(&["Bedah Jantung"]).build(),
    ];
    let patients = vec![
        TestPatient::new("P1").case("jantung").build(),
        TestPatient::new("P2").case("igd").build(),
        TestPatient::new("P3").case("Onkologi").build(),
        TestPatient::new("P4").build(),
    ];

    for kind in BOTH {
        let result = run(&patients, &facilities, &MatchConfig::default().with_solver(kind));
        let placed: HashMap<&str, &str> = result
            .assignments
            .iter()
            .map(|a| (a.patient_id.as_str(), a.facility_id.as_str()))
            .collect();
        assert_eq!(placed.get("P1"), Some(&"cardiac"), "{kind}");
        assert_eq!(placed.get("P2"), Some(&"general"), "{kind}");
        assert_eq!(placed.get("P3"), None, "{kind}");
        assert_eq!(placed.get("P4"), Some(&"general"), "{kind}");
    }
}

// ============================================================================
// Cost and explanation
// ============================================================================

#[test]
fn greedy_picks_cheaper_facility_and_explains_runner_up() {
    // wd = 1, wo = 0: cost is distance / 50 km.
    let facilities = vec![
        TestFacility::new("far").at(0.0, 25.0).build(),
        TestFacility::new("near").at(0.0, 10.0).build(),
    ];
    let patient = TestPatient::new("P1").build();
    let config = MatchConfig::default().with_weights(1.0, 0.0, 0.1);

    let result = run(std::slice::from_ref(&patient), &facilities, &config);
    let assignment = &result.assignments[0];
    assert_eq!(assignment.facility_id, "near");
    assert_relative_eq!(assignment.cost, 0.2);

    let explanation = explain_assignment_with(&patient, assignment, &facilities, &config, &PlanarDistance);
    let alternative = explanation.alternative.expect("runner-up exists");
    assert_eq!(alternative.facility_id, "far");
    assert_relative_eq!(alternative.cost, 0.5);
}

#[test]
fn fairness_weight_does_not_change_outcome() {
    let facilities = facilities();
    let patients = patient_batch(24);

    for kind in BOTH {
        let base = MatchConfig::default().with_solver(kind);
        let heavy = base.clone().with_weights(0.6, 0.3, 25.0);
        assert_eq!(
            solve(&patients, &facilities, &base).unwrap(),
            solve(&patients, &facilities, &heavy).unwrap(),
            "{kind}"
        );
    }
}

#[test]
fn candidates_sorted_without_duplicates() {
    let facilities = facilities();
    let config = MatchConfig::default();

    for patient in patient_batch(16) {
        let candidates = feasible_candidates(&patient, &facilities, &config);
        assert!(candidates.windows(2).all(|w| w[0].cost <= w[1].cost), "{}", patient.id);

        let mut ids: Vec<&str> = candidates.iter().map(|c| c.facility_id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), candidates.len(), "{}", patient.id);
        assert!(candidates.iter().all(|c| c.facility_id != "RS07"), "RS07 is full");
    }
}

#[test]
fn greedy_choice_is_first_candidate() {
    let facilities = facilities();
    let patient = TestPatient::new("solo")
        .at(-5.1400, 119.4300)
        .case("IGD")
        .severity(3.0)
        .build();
    let config = MatchConfig::default();

    let result = solve(std::slice::from_ref(&patient), &facilities, &config).unwrap();
    let candidates = feasible_candidates_with(&patient, &facilities, &config, &Haversine);
    assert_eq!(result.assignments[0].facility_id, candidates[0].facility_id);
    assert_relative_eq!(result.assignments[0].cost, candidates[0].cost);
}

// ============================================================================
// Invariants
// ============================================================================

#[test]
fn greedy_is_deterministic() {
    let facilities = facilities();
    let patients = patient_batch(40);
    let config = MatchConfig::default();

    let first = solve(&patients, &facilities, &config).unwrap();
    for _ in 0..5 {
        assert_eq!(solve(&patients, &facilities, &config).unwrap(), first);
    }
}

#[test]
fn summary_counts_always_balance() {
    let facilities = facilities();
    for count in [0, 1, 7, 40] {
        let patients = patient_batch(count);
        for kind in BOTH {
            let result = solve(&patients, &facilities, &MatchConfig::default().with_solver(kind)).unwrap();
            let s = result.summary;
            assert_eq!(s.total_patients, count);
            assert_eq!(s.total_assigned + s.total_unassigned, s.total_patients);
            assert_eq!(s.total_assigned, result.assignments.len());
            assert_eq!(result.facility_snapshot.len(), facilities.len());
        }
    }
}

#[test]
fn snapshot_reconciles_with_assignments() {
    let facilities = facilities();
    let patients = patient_batch(30);

    for kind in BOTH {
        let result = solve(&patients, &facilities, &MatchConfig::default().with_solver(kind)).unwrap();
        for facility in &facilities {
            let admitted = result
                .assignments
                .iter()
                .filter(|a| a.facility_id == facility.id)
                .count();
            let snapshot = result.snapshot_for(&facility.id).unwrap();
            assert_eq!(snapshot.occupied, facility.occupied + admitted as f64, "{kind} {}", facility.id);
        }
    }
}

/// Random instances with integer beds and `max_load = 1`, where every greedy
/// placement is also a placement the slot model can express.
fn random_instance(rng: &mut StdRng) -> (Vec<Patient>, Vec<Facility>) {
    const SERVICES: [&str; 3] = ["ICU", "IGD", "Bedah"];

    let facilities = (0..rng.random_range(1..6))
        .map(|i| {
            let capacity = f64::from(rng.random_range(1..9u32));
            let occupied = f64::from(rng.random_range(0..=capacity as u32));
            let services: Vec<&str> = SERVICES.iter().copied().filter(|_| rng.random_bool(0.6)).collect();
            TestFacility::new(&format!("H{i}"))
                .at(rng.random_range(0.0..40.0), rng.random_range(0.0..40.0))
                .beds(capacity, occupied)
                .services(&services)
                .build()
        })
        .collect();

    let patients = (0..rng.random_range(1..8))
        .map(|i| {
            let case = if rng.random_bool(0.3) {
                ""
            } else {
                SERVICES[rng.random_range(0..SERVICES.len())]
            };
            let mut patient = TestPatient::new(&format!("P{i}"))
                .at(rng.random_range(0.0..40.0), rng.random_range(0.0..40.0))
                .case(case);
            if rng.random_bool(0.8) {
                patient = patient.severity(f64::from(rng.random_range(1..6u32)));
            }
            patient.build()
        })
        .collect();

    (patients, facilities)
}

#[test]
fn optimal_never_worse_than_greedy() {
    let mut rng = StdRng::seed_from_u64(0xBED5);
    let radius_km = 45.0;
    let config = MatchConfig::default().with_radius_km(radius_km);
    let mut compared = 0;

    for _ in 0..300 {
        let (patients, facilities) = random_instance(&mut rng);
        let greedy = run(&patients, &facilities, &config);
        let optimal = run(&patients, &facilities, &config.clone().with_solver(SolverKind::Optimal));

        assert!(optimal.summary.total_assigned >= greedy.summary.total_assigned);
        for result in [&greedy, &optimal] {
            assert!(result.assignments.iter().all(|a| a.occ_before < 1.0));
            assert!(result.assignments.iter().all(|a| a.distance_km <= radius_km));
        }

        if greedy.summary.total_unassigned == 0 && optimal.summary.total_unassigned == 0 {
            compared += 1;
            assert!(
                optimal.total_cost() <= greedy.total_cost() + 1e-6,
                "optimal {} > greedy {}",
                optimal.total_cost(),
                greedy.total_cost()
            );
        }
    }

    assert!(compared >= 10, "too few fully-assigned instances ({compared})");
}

#[test]
fn fractional_max_load_is_never_crossed_by_admission() {
    let facilities = vec![
        TestFacility::new("H1").beds(10.0, 6.0).build(),
        TestFacility::new("H2").at(0.0, 5.0).beds(7.0, 2.5).build(),
    ];
    let patients: Vec<Patient> = (0..12)
        .map(|i| TestPatient::new(&format!("P{i}")).build())
        .collect();
    let config = MatchConfig::default().with_max_load(0.85);

    for kind in BOTH {
        let result = run(&patients, &facilities, &config.clone().with_solver(kind));
        assert!(result.summary.total_assigned > 0, "{kind}");
        for a in &result.assignments {
            assert!(a.occ_before < 0.85, "{kind}: {a:?}");
        }
    }
}
