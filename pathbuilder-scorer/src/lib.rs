//! Risk computation for the PathBuilder engine.
//!
//! The crate provides two complementary capabilities:
//! - **Offline recomputation** reads the raw exposure, job feature and rubric
//!   tables through a [`RiskStore`](pathbuilder_core::RiskStore), min–max
//!   normalises each exposure dimension, scores every job with the
//!   [`JobRiskEngine`], and replaces the derived tables in one pass via
//!   [`recompute`].
//! - **Request-time assessment** looks up the derived rows for a person and
//!   blends them with a pluggable [`WeightStrategy`] into a banded score via
//!   [`RiskAssessor`].
//!
//! # Examples
//!
//! ```no_run
//! use pathbuilder_core::SqliteRiskStore;
//! use pathbuilder_scorer::{JobRiskEngine, RiskAssessor, ScoreRequest, recompute};
//!
//! let mut store = SqliteRiskStore::open("artifacts/pathbuilder.db").expect("open database");
//! recompute(&mut store, &JobRiskEngine::default()).expect("recompute derived tables");
//! let assessment = RiskAssessor::default()
//!     .assess(&store, &ScoreRequest::new("ON", "SA", "21232"))
//!     .expect("assess");
//! println!("{} ({})", assessment.score, assessment.band);
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod assess;
mod compose;
mod error;
mod job_risk;
mod normalise;
mod pipeline;

pub use assess::{
    AssessedComponents, AssessedInputs, Component, RiskAssessment, RiskAssessor, ScoreRequest,
    round_for_display,
};
pub use compose::{
    BandThresholds, BaseWeights, ComponentRisks, ComponentWeights, Composition, ExperienceInput,
    ExperienceLevel, FixedWeights, RiskBand, StrategyKind, TaperedWeights, WeightStrategy,
    tapered_weights,
};
pub use error::{AssessError, PipelineError, WeightsError};
pub use job_risk::{JobRiskEngine, JobRiskOutput, JobScore, RATIO_EPSILON};
pub use normalise::{DEGENERATE_RISK, min_max_scale, normalise_dimension};
pub use pipeline::{RecomputeSummary, recompute};
