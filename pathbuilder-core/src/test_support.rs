//! In-memory `RiskStore` implementation used by unit and behaviour tests.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::{
    Dimension, ExposureRecord, JobProfile, JobRisk, NormalizedRisk, RawJobFeatures, RiskStore,
    RubricRow,
};

/// Error raised by [`MemoryRiskStore`] when writes are configured to fail.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("memory store rejected write: {operation}")]
pub struct MemoryStoreError {
    /// Description of the rejected operation.
    pub operation: &'static str,
}

/// In-memory `RiskStore` implementation used in tests.
///
/// Raw tables are plain vectors; derived tables are ordered maps so lookups
/// and snapshots are deterministic.
#[derive(Debug, Default, Clone)]
pub struct MemoryRiskStore {
    province_raw: Vec<ExposureRecord>,
    ethnicity_raw: Vec<ExposureRecord>,
    job_features: Vec<RawJobFeatures>,
    rubric: Vec<RubricRow>,
    province_risk: BTreeMap<String, f64>,
    ethnicity_risk: BTreeMap<String, f64>,
    job_profile: BTreeMap<String, f64>,
    job_risk: BTreeMap<String, f64>,
    province_names: BTreeMap<String, String>,
    ethnicity_names: BTreeMap<String, String>,
    job_titles: BTreeMap<String, String>,
    fail_writes: bool,
}

impl MemoryRiskStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed raw exposures for `dimension`, replacing any already present.
    #[must_use]
    pub fn with_exposures<I>(mut self, dimension: Dimension, records: I) -> Self
    where
        I: IntoIterator<Item = ExposureRecord>,
    {
        *self.raw_mut(dimension) = records.into_iter().collect();
        self
    }

    /// Seed raw job feature documents.
    #[must_use]
    pub fn with_job_features<I>(mut self, rows: I) -> Self
    where
        I: IntoIterator<Item = RawJobFeatures>,
    {
        self.job_features = rows.into_iter().collect();
        self
    }

    /// Seed rubric rows in source order.
    #[must_use]
    pub fn with_rubric<I>(mut self, rows: I) -> Self
    where
        I: IntoIterator<Item = RubricRow>,
    {
        self.rubric = rows.into_iter().collect();
        self
    }

    /// Record the display name of a province or ethnicity code.
    #[must_use]
    pub fn with_name(
        mut self,
        dimension: Dimension,
        code: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        self.names_mut(dimension).insert(code.into(), name.into());
        self
    }

    /// Record the title reported for a job, replacing any earlier one.
    #[must_use]
    pub fn with_job_title(mut self, job_id: impl Into<String>, title: impl Into<String>) -> Self {
        self.job_titles.insert(job_id.into(), title.into());
        self
    }

    /// Make every subsequent replace fail with [`MemoryStoreError`].
    #[must_use]
    pub const fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Snapshot the normalised output of `dimension` in key order.
    pub fn dimension_snapshot(&self, dimension: Dimension) -> Vec<NormalizedRisk> {
        self.derived(dimension)
            .iter()
            .map(|(key, risk)| NormalizedRisk::new(key.clone(), *risk))
            .collect()
    }

    /// Snapshot `job_profile` in job order.
    pub fn profile_snapshot(&self) -> Vec<JobProfile> {
        self.job_profile
            .iter()
            .map(|(job_id, share)| JobProfile::new(job_id.clone(), *share))
            .collect()
    }

    /// Snapshot `job_risk` in job order.
    pub fn job_risk_snapshot(&self) -> Vec<JobRisk> {
        self.job_risk
            .iter()
            .map(|(job_id, risk)| JobRisk::new(job_id.clone(), *risk))
            .collect()
    }

    fn raw(&self, dimension: Dimension) -> &[ExposureRecord] {
        match dimension {
            Dimension::Province => &self.province_raw,
            Dimension::Ethnicity => &self.ethnicity_raw,
        }
    }

    fn raw_mut(&mut self, dimension: Dimension) -> &mut Vec<ExposureRecord> {
        match dimension {
            Dimension::Province => &mut self.province_raw,
            Dimension::Ethnicity => &mut self.ethnicity_raw,
        }
    }

    fn derived(&self, dimension: Dimension) -> &BTreeMap<String, f64> {
        match dimension {
            Dimension::Province => &self.province_risk,
            Dimension::Ethnicity => &self.ethnicity_risk,
        }
    }

    fn derived_mut(&mut self, dimension: Dimension) -> &mut BTreeMap<String, f64> {
        match dimension {
            Dimension::Province => &mut self.province_risk,
            Dimension::Ethnicity => &mut self.ethnicity_risk,
        }
    }

    fn names(&self, dimension: Dimension) -> &BTreeMap<String, String> {
        match dimension {
            Dimension::Province => &self.province_names,
            Dimension::Ethnicity => &self.ethnicity_names,
        }
    }

    fn names_mut(&mut self, dimension: Dimension) -> &mut BTreeMap<String, String> {
        match dimension {
            Dimension::Province => &mut self.province_names,
            Dimension::Ethnicity => &mut self.ethnicity_names,
        }
    }

    fn check_writable(&self, operation: &'static str) -> Result<(), MemoryStoreError> {
        if self.fail_writes {
            Err(MemoryStoreError { operation })
        } else {
            Ok(())
        }
    }
}

impl RiskStore for MemoryRiskStore {
    type Error = MemoryStoreError;

    fn exposures(&self, dimension: Dimension) -> Result<Vec<ExposureRecord>, Self::Error> {
        Ok(self.raw(dimension).to_vec())
    }

    fn job_features(&self) -> Result<Vec<RawJobFeatures>, Self::Error> {
        Ok(self.job_features.clone())
    }

    fn rubric_rows(&self) -> Result<Vec<RubricRow>, Self::Error> {
        Ok(self.rubric.clone())
    }

    fn replace_dimension_risk(
        &mut self,
        dimension: Dimension,
        rows: &[NormalizedRisk],
    ) -> Result<(), Self::Error> {
        self.check_writable("replace dimension risk")?;
        let table = self.derived_mut(dimension);
        table.clear();
        table.extend(rows.iter().map(|row| (row.key.clone(), row.risk)));
        Ok(())
    }

    fn replace_job_outputs(
        &mut self,
        profiles: &[JobProfile],
        risks: &[JobRisk],
    ) -> Result<(), Self::Error> {
        self.check_writable("replace job outputs")?;
        self.job_profile = profiles
            .iter()
            .map(|profile| (profile.job_id.clone(), profile.pcs_share))
            .collect();
        self.job_risk = risks
            .iter()
            .map(|risk| (risk.job_id.clone(), risk.risk))
            .collect();
        Ok(())
    }

    fn dimension_risk(&self, dimension: Dimension, key: &str) -> Result<Option<f64>, Self::Error> {
        Ok(self.derived(dimension).get(key).copied())
    }

    fn job_risk(&self, job_id: &str) -> Result<Option<f64>, Self::Error> {
        Ok(self.job_risk.get(job_id).copied())
    }

    fn pcs_share(&self, job_id: &str) -> Result<Option<f64>, Self::Error> {
        Ok(self.job_profile.get(job_id).copied())
    }

    fn dimension_name(
        &self,
        dimension: Dimension,
        code: &str,
    ) -> Result<Option<String>, Self::Error> {
        Ok(self.names(dimension).get(code).cloned())
    }

    fn job_title(&self, job_id: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.job_titles.get(job_id).cloned())
    }
}
