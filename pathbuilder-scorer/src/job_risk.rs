//! Per-occupation substitution risk discounted by PCS composition.
//!
//! Each feature contributes its scaled level times the rubric's scaled
//! substitution and complementarity indices. The ratio of the two sums is the
//! job's base risk, which is then discounted by the share of measured activity
//! that is physical, creative or social. Finally the raw risks are min–max
//! normalised across the cohort, so a stored job risk is only meaningful
//! relative to the jobs scored in the same run.
#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use log::{debug, warn};
use pathbuilder_core::{
    CategoryClassifier, JobFeatureVector, JobProfile, JobRisk, RawJobFeatures, Rubric,
    RubricEntry, RuleClassifier, clamp_unit, coerce_level, scale_level,
};

use crate::normalise::min_max_scale;

/// Added to the base risk denominator so an all-zero job divides safely.
pub const RATIO_EPSILON: f64 = 1e-9;

/// Intermediate scores for a single job before cohort normalisation.
#[derive(Debug, Clone, PartialEq)]
pub struct JobScore {
    /// Occupation identifier.
    pub job_id: String,
    /// `sub / (sub + cmp + ε)` in `0.0..=1.0`.
    pub base_risk: f64,
    /// Share of measured activity in PCS categories.
    pub pcs_share: f64,
    /// `base_risk × (1 − pcs_share)`, clamped.
    pub raw_risk: f64,
    /// Features whose level could not be coerced to a number.
    pub skipped_features: usize,
}

/// Derived rows for one batch, ordered by job identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobRiskOutput {
    /// One PCS share per scored job.
    pub profiles: Vec<JobProfile>,
    /// One cohort-relative risk per scored job.
    pub risks: Vec<JobRisk>,
    /// Jobs left out because their payload was unparsable or had no usable
    /// feature.
    pub excluded_jobs: usize,
}

impl JobRiskOutput {
    /// Number of jobs with derived rows.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.risks.len()
    }

    /// Report whether no job was scored.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.risks.is_empty()
    }
}

#[derive(Debug, Default)]
struct Accumulator {
    substitution: f64,
    complementarity: f64,
    pcs_mass: f64,
    pcs_den: f64,
    used: usize,
    skipped: usize,
}

/// Scores job feature vectors against a rubric using a category classifier.
///
/// # Examples
/// ```
/// use pathbuilder_core::{JobFeatureVector, Rubric};
/// use pathbuilder_scorer::JobRiskEngine;
///
/// let mut rubric = Rubric::new();
/// rubric.insert("Monitoring", Some(5.0), Some(1.0));
/// let job = JobFeatureVector::default().with_feature("Monitoring", 5);
///
/// let score = JobRiskEngine::default()
///     .score_job(&job, &rubric)
///     .expect("job has a usable feature");
/// assert_eq!(score.pcs_share, 0.0);
/// assert!((score.raw_risk - 0.8333).abs() < 1e-4);
/// ```
#[derive(Debug, Clone)]
pub struct JobRiskEngine<C = RuleClassifier> {
    classifier: C,
}

impl Default for JobRiskEngine<RuleClassifier> {
    fn default() -> Self {
        Self::new(RuleClassifier::default())
    }
}

impl<C: CategoryClassifier> JobRiskEngine<C> {
    /// Create an engine using `classifier` to assign feature categories.
    pub const fn new(classifier: C) -> Self {
        Self { classifier }
    }

    /// Borrow the classifier.
    pub const fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Score one job before cohort normalisation.
    ///
    /// Returns `None` when no feature level can be coerced to a number.
    #[must_use]
    pub fn score_job(&self, job: &JobFeatureVector, rubric: &Rubric) -> Option<JobScore> {
        let totals = self.accumulate(job, rubric);
        if totals.used == 0 {
            return None;
        }
        Some(finish(job.job_id.clone(), &totals))
    }

    #[expect(
        clippy::float_arithmetic,
        reason = "feature contributions are weighted sums of scaled levels"
    )]
    fn accumulate(&self, job: &JobFeatureVector, rubric: &Rubric) -> Accumulator {
        let mut totals = Accumulator::default();
        for (name, raw_level) in job.iter() {
            let Some(level) = coerce_level(raw_level) else {
                totals.skipped += 1;
                continue;
            };
            totals.used += 1;
            let scaled = scale_level(level);
            let entry = rubric.get(name).unwrap_or_else(|| {
                debug!("job {}: no rubric entry for feature '{name}'", job.job_id);
                RubricEntry::default()
            });
            totals.substitution += scaled * entry.substitution;
            totals.complementarity += scaled * entry.complementarity;

            let category = self.classifier.category_for(name);
            if category.is_measured() {
                totals.pcs_den += scaled;
            }
            if category.is_pcs() {
                totals.pcs_mass += scaled;
            }
        }
        totals
    }

    /// Score every job in `jobs` and normalise the raw risks across the batch.
    ///
    /// An empty batch or empty rubric yields an empty output, which clears
    /// both job tables when written back. Unparsable payloads and payloads
    /// without a usable level are excluded with a warning. When the same job
    /// identifier appears twice the later row wins.
    #[must_use]
    pub fn compute(&self, jobs: &[RawJobFeatures], rubric: &Rubric) -> JobRiskOutput {
        if jobs.is_empty() || rubric.is_empty() {
            return JobRiskOutput::default();
        }

        let mut scored: BTreeMap<String, JobScore> = BTreeMap::new();
        let mut excluded_jobs = 0_usize;
        for raw in jobs {
            let vector = match JobFeatureVector::parse(raw) {
                Ok(vector) => vector,
                Err(err) => {
                    warn!("excluding job {}: {err}", raw.job_id);
                    excluded_jobs += 1;
                    continue;
                }
            };
            match self.score_job(&vector, rubric) {
                Some(score) => {
                    if score.skipped_features > 0 {
                        debug!(
                            "job {}: skipped {} malformed feature levels",
                            score.job_id, score.skipped_features
                        );
                    }
                    scored.insert(score.job_id.clone(), score);
                }
                None => {
                    warn!("excluding job {}: no usable feature levels", raw.job_id);
                    excluded_jobs += 1;
                }
            }
        }

        let raw_risks: Vec<f64> = scored.values().map(|score| score.raw_risk).collect();
        let normalised = min_max_scale(&raw_risks);
        let (profiles, risks) = scored
            .into_values()
            .zip(normalised)
            .map(|(score, risk)| {
                (
                    JobProfile::new(score.job_id.clone(), score.pcs_share),
                    JobRisk::new(score.job_id, risk),
                )
            })
            .unzip();
        JobRiskOutput {
            profiles,
            risks,
            excluded_jobs,
        }
    }
}

#[expect(
    clippy::float_arithmetic,
    reason = "base risk and PCS share are ratios of accumulated sums"
)]
fn finish(job_id: String, totals: &Accumulator) -> JobScore {
    let base_risk = clamp_unit(
        totals.substitution / (totals.substitution + totals.complementarity + RATIO_EPSILON),
    );
    let pcs_share = if totals.pcs_den > 0.0 {
        clamp_unit(totals.pcs_mass / totals.pcs_den)
    } else {
        0.0
    };
    JobScore {
        job_id,
        base_risk,
        pcs_share,
        raw_risk: clamp_unit(base_risk * (1.0 - pcs_share)),
        skipped_features: totals.skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathbuilder_core::{Category, CategoryRule, RubricRow};
    use rstest::{fixture, rstest};

    #[fixture]
    fn rubric() -> Rubric {
        Rubric::from_rows(&[
            RubricRow::new("Repairing", 5.0, 1.0),
            RubricRow::new("Monitoring", 5.0, 1.0),
            RubricRow::new("Persuading", 1.0, 5.0),
        ])
    }

    fn job(job_id: &str, payload: &str) -> RawJobFeatures {
        RawJobFeatures::new(job_id, payload)
    }

    fn close(actual: f64, expected: f64) -> bool {
        (actual - expected).abs() < 1e-4
    }

    #[rstest]
    fn physical_feature_is_fully_discounted(rubric: Rubric) {
        let vector = JobFeatureVector::default().with_feature("Repairing", 5);
        let score = JobRiskEngine::default()
            .score_job(&vector, &rubric)
            .expect("scored");
        assert!(close(score.base_risk, 0.8333));
        assert_eq!(score.pcs_share, 1.0);
        assert_eq!(score.raw_risk, 0.0);
    }

    #[rstest]
    fn routine_feature_is_undiscounted(rubric: Rubric) {
        let vector = JobFeatureVector::default().with_feature("Monitoring", 5);
        let score = JobRiskEngine::default()
            .score_job(&vector, &rubric)
            .expect("scored");
        assert_eq!(score.pcs_share, 0.0);
        assert!(close(score.raw_risk, 0.8333));
    }

    #[rstest]
    fn other_features_do_not_affect_pcs(rubric: Rubric) {
        let vector = JobFeatureVector::default()
            .with_feature("Monitoring", 5)
            .with_feature("Repairing", 5)
            .with_feature("Programming", 5);
        let score = JobRiskEngine::default()
            .score_job(&vector, &rubric)
            .expect("scored");
        assert_eq!(score.pcs_share, 0.5);
    }

    #[rstest]
    fn malformed_levels_are_skipped(rubric: Rubric) {
        let vector = JobFeatureVector::default()
            .with_feature("Monitoring", "high")
            .with_feature("Repairing", 5);
        let score = JobRiskEngine::default()
            .score_job(&vector, &rubric)
            .expect("scored");
        assert_eq!(score.skipped_features, 1);
        assert_eq!(score.pcs_share, 1.0);
    }

    #[rstest]
    fn all_malformed_levels_exclude_the_job(rubric: Rubric) {
        let vector = JobFeatureVector::default().with_feature("Monitoring", "n/a");
        assert!(JobRiskEngine::default().score_job(&vector, &rubric).is_none());
    }

    #[rstest]
    fn unmatched_features_contribute_nothing(rubric: Rubric) {
        let vector = JobFeatureVector::default().with_feature("Night Vision", 4);
        let score = JobRiskEngine::default()
            .score_job(&vector, &rubric)
            .expect("scored");
        assert_eq!(score.base_risk, 0.0);
        assert_eq!(score.pcs_share, 1.0);
    }

    #[rstest]
    fn cohort_is_normalised_and_ordered(rubric: Rubric) {
        let output = JobRiskEngine::default().compute(
            &[
                job("0013", r#"{"Monitoring": 5, "Repairing": 5}"#),
                job("0011", r#"{"Repairing": 5}"#),
                job("0012", r#"{"Monitoring": 5}"#),
            ],
            &rubric,
        );
        let ids: Vec<_> = output.risks.iter().map(|row| row.job_id.as_str()).collect();
        assert_eq!(ids, ["0011", "0012", "0013"]);
        let risks: Vec<_> = output.risks.iter().map(|row| row.risk).collect();
        assert_eq!(risks[0], 0.0);
        assert_eq!(risks[1], 1.0);
        assert!(close(risks[2], 0.5));
        assert_eq!(output.profiles.len(), 3);
    }

    #[rstest]
    fn single_job_cohort_is_degenerate(rubric: Rubric) {
        let output =
            JobRiskEngine::default().compute(&[job("0011", r#"{"Repairing": 3}"#)], &rubric);
        assert_eq!(output.risks, vec![JobRisk::new("0011", 0.5)]);
    }

    #[rstest]
    #[case("not json")]
    #[case("[]")]
    #[case("{}")]
    fn unusable_payloads_are_excluded(rubric: Rubric, #[case] payload: &str) {
        let output = JobRiskEngine::default().compute(
            &[job("0011", payload), job("0012", r#"{"Monitoring": 2}"#)],
            &rubric,
        );
        assert_eq!(output.len(), 1);
        assert_eq!(output.excluded_jobs, 1);
    }

    #[rstest]
    fn overflowing_levels_clamp_to_the_scale_top(rubric: Rubric) {
        let output = JobRiskEngine::default().compute(
            &[
                job("0011", r#"{"Monitoring": 5, "Repairing": 1e400}"#),
                job("0012", r#"{"Monitoring": 5, "Repairing": 5}"#),
            ],
            &rubric,
        );
        assert_eq!(output.len(), 2);
        assert_eq!(output.excluded_jobs, 0);
        let profiles: Vec<f64> = output.profiles.iter().map(|row| row.pcs_share).collect();
        assert_eq!(profiles.first(), profiles.last());
        assert!(output.risks.iter().all(|row| row.risk == crate::DEGENERATE_RISK));
    }

    #[rstest]
    fn empty_sources_produce_no_rows(rubric: Rubric) {
        let engine = JobRiskEngine::default();
        assert!(engine.compute(&[], &rubric).is_empty());
        assert!(
            engine
                .compute(&[job("0011", r#"{"Monitoring": 5}"#)], &Rubric::new())
                .is_empty()
        );
    }

    #[rstest]
    fn output_size_is_available_at_compile_time() {
        const EMPTY: &JobRiskOutput = &JobRiskOutput {
            profiles: Vec::new(),
            risks: Vec::new(),
            excluded_jobs: 0,
        };
        const EMPTY_LEN: usize = EMPTY.len();
        const EMPTY_FLAG: bool = EMPTY.is_empty();
        assert_eq!(EMPTY_LEN, 0);
        assert!(EMPTY_FLAG);
    }

    #[rstest]
    fn custom_classifier_changes_pcs(rubric: Rubric) {
        let classifier = RuleClassifier::new(vec![
            CategoryRule::new(Category::Routine, ["Repairing"]).expect("rule"),
        ]);
        let vector = JobFeatureVector::default().with_feature("Repairing", 5);
        let score = JobRiskEngine::new(classifier)
            .score_job(&vector, &rubric)
            .expect("scored");
        assert_eq!(score.pcs_share, 0.0);
    }
}
