//! Data access traits for raw inputs and derived risk tables.
//!
//! The `RiskStore` trait is the boundary between the risk computation and the
//! record keeper behind it. Raw tables are read as complete snapshots, and
//! derived tables are replaced wholesale: an implementation must make each
//! `replace_*` call atomic from a reader's point of view.

use crate::{Dimension, ExposureRecord, JobProfile, JobRisk, NormalizedRisk, RawJobFeatures, RubricRow};

#[cfg(feature = "store-sqlite")]
mod sqlite;

#[cfg(feature = "store-sqlite")]
pub use sqlite::{SCHEMA_SQL, SqliteRiskStore, SqliteRiskStoreError, initialise_schema};

/// Snapshot reads of raw tables plus transactional replacement and point
/// lookups of derived tables.
///
/// # Examples
///
/// ```rust
/// use pathbuilder_core::{Dimension, RiskStore};
/// use pathbuilder_core::test_support::MemoryRiskStore;
/// use pathbuilder_core::NormalizedRisk;
///
/// let mut store = MemoryRiskStore::new();
/// store
///     .replace_dimension_risk(Dimension::Province, &[NormalizedRisk::new("ON", 0.25)])
///     .expect("in-memory writes succeed");
/// assert_eq!(
///     store.dimension_risk(Dimension::Province, "ON").expect("lookup"),
///     Some(0.25)
/// );
/// ```
pub trait RiskStore {
    /// Structural failure raised by the backing store.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read every raw exposure row for `dimension`.
    fn exposures(&self, dimension: Dimension) -> Result<Vec<ExposureRecord>, Self::Error>;

    /// Read every raw job feature document.
    fn job_features(&self) -> Result<Vec<RawJobFeatures>, Self::Error>;

    /// Read every rubric row in source order.
    fn rubric_rows(&self) -> Result<Vec<RubricRow>, Self::Error>;

    /// Clear the output table of `dimension` and write `rows`.
    fn replace_dimension_risk(
        &mut self,
        dimension: Dimension,
        rows: &[NormalizedRisk],
    ) -> Result<(), Self::Error>;

    /// Clear `job_profile` and `job_risk` and write the new rows.
    fn replace_job_outputs(
        &mut self,
        profiles: &[JobProfile],
        risks: &[JobRisk],
    ) -> Result<(), Self::Error>;

    /// Look up the normalised risk stored for `key`.
    fn dimension_risk(&self, dimension: Dimension, key: &str) -> Result<Option<f64>, Self::Error>;

    /// Look up the cohort-relative risk stored for `job_id`.
    fn job_risk(&self, job_id: &str) -> Result<Option<f64>, Self::Error>;

    /// Look up the PCS share stored for `job_id`.
    fn pcs_share(&self, job_id: &str) -> Result<Option<f64>, Self::Error>;

    /// Look up the display name recorded for a province or ethnicity `code`.
    fn dimension_name(
        &self,
        dimension: Dimension,
        code: &str,
    ) -> Result<Option<String>, Self::Error>;

    /// Look up the alphabetically first title recorded for `job_id`.
    fn job_title(&self, job_id: &str) -> Result<Option<String>, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::RiskStore;
    use crate::test_support::MemoryRiskStore;
    use crate::{Dimension, JobProfile, JobRisk, NormalizedRisk};

    #[test]
    fn replacing_clears_previous_rows() {
        let mut store = MemoryRiskStore::new();
        store
            .replace_dimension_risk(
                Dimension::Ethnicity,
                &[NormalizedRisk::new("A", 0.1), NormalizedRisk::new("B", 0.9)],
            )
            .expect("first write");
        store
            .replace_dimension_risk(Dimension::Ethnicity, &[NormalizedRisk::new("C", 0.5)])
            .expect("second write");

        assert_eq!(store.dimension_risk(Dimension::Ethnicity, "A").expect("lookup"), None);
        assert_eq!(
            store.dimension_risk(Dimension::Ethnicity, "C").expect("lookup"),
            Some(0.5)
        );
    }

    #[test]
    fn job_outputs_are_replaced_together() {
        let mut store = MemoryRiskStore::new();
        store
            .replace_job_outputs(&[JobProfile::new("0011", 0.4)], &[JobRisk::new("0011", 1.0)])
            .expect("write");
        assert_eq!(store.pcs_share("0011").expect("lookup"), Some(0.4));
        assert_eq!(store.job_risk("0011").expect("lookup"), Some(1.0));

        store.replace_job_outputs(&[], &[]).expect("clear");
        assert_eq!(store.pcs_share("0011").expect("lookup"), None);
        assert_eq!(store.job_risk("0011").expect("lookup"), None);
    }

    #[test]
    fn names_are_looked_up_per_dimension() {
        let store = MemoryRiskStore::new()
            .with_name(Dimension::Province, "QC", "Quebec")
            .with_job_title("0012", "Clerks");
        assert_eq!(
            store.dimension_name(Dimension::Province, "QC").expect("lookup"),
            Some("Quebec".to_owned())
        );
        assert_eq!(store.dimension_name(Dimension::Ethnicity, "QC").expect("lookup"), None);
        assert_eq!(store.job_title("0012").expect("lookup"), Some("Clerks".to_owned()));
        assert_eq!(store.job_title("7315").expect("lookup"), None);
    }
}
