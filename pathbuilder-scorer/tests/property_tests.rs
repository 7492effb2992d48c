//! Property-based tests for normalisation, job risk and weight tapering.
//!
//! # Invariants tested
//!
//! - **Bounds:** every normalised risk and PCS share lies in `0.0..=1.0`.
//! - **Extremes:** a non-degenerate dimension maps its minimum to 0 and its
//!   maximum to 1.
//! - **Degenerate cohorts:** equal exposures all map to 0.5.
//! - **Cohort extremes:** differing raw job risks normalise to a cohort that
//!   contains both 0 and 1.
//! - **PCS monotonicity:** adding PCS mass never raises a job's raw risk.
//! - **Weight sum:** tapered weights always sum to one.

use proptest::prelude::*;
use pathbuilder_core::{
    ExposureRecord, JobFeatureVector, RawJobFeatures, Rubric, RubricRow,
};
use pathbuilder_scorer::{
    BaseWeights, DEGENERATE_RISK, JobRiskEngine, normalise_dimension, tapered_weights,
};

const ROUTINE_FEATURES: [&str; 3] = ["Monitoring", "Numeracy", "Information Ordering"];
const PCS_FEATURES: [&str; 3] = ["Repairing", "Product Design", "Persuading"];

fn rubric() -> Rubric {
    let substitution = [5.0, 4.0, 3.0, 2.0, 1.0, 0.5];
    let rows: Vec<RubricRow> = ROUTINE_FEATURES
        .iter()
        .chain(PCS_FEATURES.iter())
        .zip(substitution)
        .map(|(name, index)| RubricRow::new(*name, index, 1.0))
        .collect();
    Rubric::from_rows(&rows)
}

fn exposures(values: &[f64]) -> Vec<ExposureRecord> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| ExposureRecord::new(format!("K{index:03}"), *value))
        .collect()
}

fn cohort(jobs: &[([f64; 3], [f64; 3])]) -> Vec<(String, JobFeatureVector)> {
    jobs.iter()
        .enumerate()
        .map(|(index, (routine, pcs))| {
            let mut vector = JobFeatureVector::default();
            for (name, level) in ROUTINE_FEATURES.iter().zip(routine) {
                vector = vector.with_feature(*name, *level);
            }
            for (name, level) in PCS_FEATURES.iter().zip(pcs) {
                vector = vector.with_feature(*name, *level);
            }
            (format!("{index:04}"), vector)
        })
        .collect()
}

fn payloads(vectors: &[(String, JobFeatureVector)]) -> Vec<RawJobFeatures> {
    vectors
        .iter()
        .map(|(job_id, vector)| {
            let payload: serde_json::Map<String, serde_json::Value> = vector
                .iter()
                .map(|(name, level)| (name.to_owned(), level.clone()))
                .collect();
            RawJobFeatures::new(job_id.clone(), serde_json::Value::Object(payload).to_string())
        })
        .collect()
}

fn levels() -> impl Strategy<Value = [f64; 3]> {
    [0.0_f64..=5.0, 0.0_f64..=5.0, 0.0_f64..=5.0]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: normalised risks are bounded and hit both ends.
    #[test]
    fn normalised_dimension_spans_unit_interval(
        values in prop::collection::vec(-1.0e6_f64..1.0e6, 2..40),
    ) {
        let rows = normalise_dimension(&exposures(&values));
        prop_assert_eq!(rows.len(), values.len());
        prop_assert!(rows.iter().all(|row| (0.0..=1.0).contains(&row.risk)));

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if max > min {
            prop_assert!(rows.iter().any(|row| row.risk == 0.0));
            prop_assert!(rows.iter().any(|row| row.risk == 1.0));
        }
    }

    /// Property: a cohort of equal exposures maps to the midpoint.
    #[test]
    fn equal_exposures_are_degenerate(value in -1.0e6_f64..1.0e6, count in 1_usize..20) {
        let rows = normalise_dimension(&exposures(&vec![value; count]));
        prop_assert!(rows.iter().all(|row| row.risk == DEGENERATE_RISK));
    }

    /// Property: job risks and PCS shares from a cohort are bounded.
    #[test]
    fn cohort_outputs_are_bounded(
        jobs in prop::collection::vec((levels(), levels()), 1..12),
    ) {
        let vectors = cohort(&jobs);
        let output = JobRiskEngine::default().compute(&payloads(&vectors), &rubric());
        prop_assert_eq!(output.len(), jobs.len());
        prop_assert!(output.risks.iter().all(|row| (0.0..=1.0).contains(&row.risk)));
        prop_assert!(output.profiles.iter().all(|row| (0.0..=1.0).contains(&row.pcs_share)));
    }

    /// Property: a cohort with differing raw risks spans both ends of the
    /// unit interval, and a cohort of equal raw risks sits at the midpoint.
    #[test]
    fn cohort_job_risk_spans_unit_interval(
        jobs in prop::collection::vec((levels(), levels()), 2..12),
    ) {
        let payloads = payloads(&cohort(&jobs));
        let rubric = rubric();
        let engine = JobRiskEngine::default();
        let raw_risks: Vec<f64> = payloads
            .iter()
            .map(|raw| {
                let vector = JobFeatureVector::parse(raw).expect("valid payload");
                engine.score_job(&vector, &rubric).expect("scored").raw_risk
            })
            .collect();
        let output = engine.compute(&payloads, &rubric);
        prop_assert_eq!(output.risks.len(), payloads.len());

        let first = raw_risks.first().copied().unwrap_or_default();
        if raw_risks.iter().any(|risk| *risk != first) {
            prop_assert!(output.risks.iter().any(|row| row.risk == 0.0));
            prop_assert!(output.risks.iter().any(|row| row.risk == 1.0));
        } else {
            prop_assert!(output.risks.iter().all(|row| row.risk == DEGENERATE_RISK));
        }
    }

    /// Property: raising a PCS feature's level never raises raw risk when its
    /// rubric contribution is unchanged.
    #[test]
    fn pcs_mass_never_raises_raw_risk(
        routine in 0.5_f64..=5.0,
        pcs in 0.0_f64..=4.0,
        bump in 0.0_f64..=1.0,
    ) {
        let mut rubric = Rubric::new();
        rubric.insert("Monitoring", Some(5.0), Some(1.0));
        let engine = JobRiskEngine::default();
        let score = |pcs_level: f64| {
            let vector = JobFeatureVector::default()
                .with_feature("Monitoring", routine)
                .with_feature("Night Vision", pcs_level);
            engine.score_job(&vector, &rubric).map(|scored| scored.raw_risk)
        };
        let lower = score(pcs).expect("scored");
        let higher = score(pcs + bump).expect("scored");
        prop_assert!(higher <= lower + 1e-12, "{higher} > {lower}");
    }

    /// Property: tapered weights sum to one for any share and base weights.
    #[test]
    fn tapered_weights_sum_to_one(
        pcs_share in -1.0_f64..2.0,
        province in 0.0_f64..10.0,
        ethnicity in 0.0_f64..10.0,
        job in 0.001_f64..10.0,
    ) {
        let base = BaseWeights::new(province, ethnicity, job).expect("valid base weights");
        let weights = tapered_weights(pcs_share, &base);
        prop_assert!((weights.total() - 1.0).abs() < 1e-9);
        prop_assert!(weights.province >= 0.0 && weights.ethnicity >= 0.0 && weights.job >= 0.0);
        prop_assert!(weights.province <= base.province() + 1e-12);
    }
}
