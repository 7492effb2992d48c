//! The single recompute entry point shared by initialisation and on-demand
//! refreshes.
#![forbid(unsafe_code)]

use log::info;
use pathbuilder_core::{CategoryClassifier, Dimension, RiskStore, Rubric};
use serde::Serialize;

use crate::{JobRiskEngine, error::PipelineError, normalise::normalise_dimension};

/// Row counts written by one recompute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecomputeSummary {
    /// Rows written to `province_risk`.
    pub provinces: usize,
    /// Rows written to `ethnicity_risk`.
    pub ethnicities: usize,
    /// Rows written to each of `job_profile` and `job_risk`.
    pub jobs: usize,
    /// Jobs left out because of unusable feature payloads.
    pub excluded_jobs: usize,
}

impl RecomputeSummary {
    fn record_dimension(&mut self, dimension: Dimension, rows: usize) {
        match dimension {
            Dimension::Province => self.provinces = rows,
            Dimension::Ethnicity => self.ethnicities = rows,
        }
    }
}

/// Rebuild every derived table from the raw tables currently in `store`.
///
/// Province and ethnicity exposures are min–max normalised, then the job
/// risk engine scores the job feature documents against the rubric. Each
/// derived table set is written through a single replace call, so running
/// this twice on unchanged raw data writes identical rows.
///
/// # Errors
/// Returns [`PipelineError`] when the store fails to read a raw table or to
/// replace a derived table. Malformed rows never fail the pipeline.
///
/// # Examples
/// ```
/// use pathbuilder_core::{Dimension, ExposureRecord, RiskStore, test_support::MemoryRiskStore};
/// use pathbuilder_scorer::{JobRiskEngine, recompute};
///
/// let mut store = MemoryRiskStore::new().with_exposures(
///     Dimension::Province,
///     [ExposureRecord::new("ON", 10.0), ExposureRecord::new("QC", 20.0)],
/// );
/// let summary = recompute(&mut store, &JobRiskEngine::default()).expect("recompute");
/// assert_eq!(summary.provinces, 2);
/// assert_eq!(store.dimension_risk(Dimension::Province, "QC").expect("lookup"), Some(1.0));
/// ```
pub fn recompute<S, C>(
    store: &mut S,
    engine: &JobRiskEngine<C>,
) -> Result<RecomputeSummary, PipelineError<S::Error>>
where
    S: RiskStore,
    C: CategoryClassifier,
{
    let mut summary = RecomputeSummary::default();

    for dimension in Dimension::ALL {
        let raw = store
            .exposures(dimension)
            .map_err(|source| PipelineError::Read {
                table: dimension.raw_table(),
                source,
            })?;
        let rows = normalise_dimension(&raw);
        store
            .replace_dimension_risk(dimension, &rows)
            .map_err(|source| PipelineError::WriteDimension { dimension, source })?;
        summary.record_dimension(dimension, rows.len());
    }

    let jobs = store.job_features().map_err(|source| PipelineError::Read {
        table: "job_features_raw",
        source,
    })?;
    let rubric_rows = store.rubric_rows().map_err(|source| PipelineError::Read {
        table: "ability_skill_rubric_raw",
        source,
    })?;
    let output = engine.compute(&jobs, &Rubric::from_rows(&rubric_rows));
    store
        .replace_job_outputs(&output.profiles, &output.risks)
        .map_err(|source| PipelineError::WriteJobs { source })?;
    summary.jobs = output.len();
    summary.excluded_jobs = output.excluded_jobs;

    info!(
        "recomputed risk: {} provinces, {} ethnicities, {} jobs ({} excluded)",
        summary.provinces, summary.ethnicities, summary.jobs, summary.excluded_jobs
    );
    Ok(summary)
}
