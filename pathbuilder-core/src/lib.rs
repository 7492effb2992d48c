//! Core domain types for the PathBuilder risk engine.
//!
//! This crate owns the vocabulary shared by every stage of the pipeline:
//! canonical matching keys, the activity category taxonomy, exposure and job
//! records, and the [`RiskStore`] boundary to the tables that hold them.
//! Risk and share values carried by the derived record types are clamped into
//! `0.0..=1.0` at construction.

pub mod category;
pub mod exposure;
pub mod job;
pub mod key;
pub mod store;
pub mod test_support;

pub use category::{Category, CategoryClassifier, CategoryRule, ClassifierError, RuleClassifier};
pub use exposure::{Dimension, ExposureRecord, NormalizedRisk};
pub use job::{
    FeaturePayloadError, JobFeatureVector, JobProfile, JobRisk, LEVEL_SCALE_MAX, RawJobFeatures,
    Rubric, RubricEntry, RubricRow, coerce_level, scale_level,
};
pub use key::normalize_key;
pub use store::RiskStore;
#[cfg(feature = "store-sqlite")]
pub use store::{SCHEMA_SQL, SqliteRiskStore, SqliteRiskStoreError, initialise_schema};

/// Clamp `value` into `0.0..=1.0`, mapping non-finite input to `0.0`.
///
/// # Examples
/// ```
/// use pathbuilder_core::clamp_unit;
///
/// assert_eq!(clamp_unit(1.4), 1.0);
/// assert_eq!(clamp_unit(f64::NAN), 0.0);
/// ```
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
