//! Facade crate for the PathBuilder risk engine.
//!
//! This crate re-exports the core domain types and the scorer, and exposes the
//! SQLite store behind the `store-sqlite` feature.

#![forbid(unsafe_code)]

pub use pathbuilder_core::{
    Category, CategoryClassifier, Dimension, ExposureRecord, JobProfile, JobRisk, NormalizedRisk,
    RawJobFeatures, RiskStore, RubricRow, RuleClassifier, normalize_key,
};

#[cfg(feature = "store-sqlite")]
pub use pathbuilder_core::{SqliteRiskStore, SqliteRiskStoreError};

pub use pathbuilder_scorer::{
    AssessError, AssessedInputs, BandThresholds, ExperienceInput, ExperienceLevel, JobRiskEngine,
    PipelineError, RecomputeSummary, RiskAssessment, RiskAssessor, RiskBand, ScoreRequest,
    StrategyKind, WeightStrategy, recompute,
};
