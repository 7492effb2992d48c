//! Raw source ingestion for the PathBuilder risk engine.
//!
//! Responsibilities:
//! - Parse the occupation, job feature, rubric and exposure CSV sources.
//! - Replace the raw SQLite tables those sources feed.
//! - Build a fresh database ready for the recompute pipeline.
//!
//! Boundaries:
//! - Do not compute risk (lives in `pathbuilder-scorer`).
//! - The schema is owned by `pathbuilder-core`.
//!
//! Invariants:
//! - A loader parses its whole source before it writes anything.
//! - Each loader commits in one transaction, so a failed load leaves the
//!   previous rows in place.
#![forbid(unsafe_code)]

mod error;
mod ids;
mod init;
mod load;
mod sources;

pub use error::{LoadError, SourceError};
pub use ids::normalize_job_id;
pub use init::{DataSources, InitSummary, initialise_database};
pub use load::{JobCounts, load_exposures, load_job_features, load_jobs, load_rubric};
pub use sources::{
    ExposureSourceRow, JOB_ID_COLUMN, JobCatalogue, JobTitle, TITLE_COLUMN, read_exposures,
    read_job_features, read_jobs, read_rubric,
};
