//! Build a fresh risk database from the CSV sources.

use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use pathbuilder_core::{Dimension, initialise_schema};
use pathbuilder_fs::{ensure_parent_dir, remove_file_if_exists};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    error::LoadError,
    load::{load_exposures, load_job_features, load_jobs, load_rubric},
};

/// Locations of every CSV source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSources {
    /// Occupation codes and titles.
    pub jobs: Utf8PathBuf,
    /// Wide skill and ability levels per occupation.
    pub features: Utf8PathBuf,
    /// Substitution and complementarity indices per feature.
    pub rubric: Utf8PathBuf,
    /// Province exposures.
    pub provinces: Utf8PathBuf,
    /// Ethnicity exposures.
    pub ethnicities: Utf8PathBuf,
}

/// Row counts written by [`initialise_database`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InitSummary {
    /// Rows in `provinces` and `province_risk_raw`.
    pub provinces: usize,
    /// Rows in `ethnicities` and `ethnicity_risk_raw`.
    pub ethnicities: usize,
    /// Rows in `jobs`.
    pub jobs: usize,
    /// Rows in `job_titles`.
    pub job_titles: usize,
    /// Rows in `job_features_raw`.
    pub job_features: usize,
    /// Rows in `ability_skill_rubric_raw`.
    pub rubric_rows: usize,
}

/// Recreate the database at `path` and load every raw table from `sources`.
///
/// Any existing file at `path` is removed first and missing parent
/// directories are created. Derived tables are created empty; run the
/// recompute pipeline afterwards to fill them.
///
/// # Errors
/// Returns [`LoadError`] when the file system, SQLite or a source fails.
///
/// # Examples
/// ```no_run
/// use camino::Utf8Path;
/// use pathbuilder_data::{DataSources, initialise_database};
///
/// let sources = DataSources {
///     jobs: "data/NOC_Code.csv".into(),
///     features: "data/SkillsAbilitiesMerged.csv".into(),
///     rubric: "data/rubric.csv".into(),
///     provinces: "data/provinces.csv".into(),
///     ethnicities: "data/ethnicities.csv".into(),
/// };
/// let summary = initialise_database(Utf8Path::new("artifacts/pathbuilder.db"), &sources)
///     .expect("initialise database");
/// println!("{} jobs loaded", summary.jobs);
/// ```
pub fn initialise_database(
    path: &Utf8Path,
    sources: &DataSources,
) -> Result<InitSummary, LoadError> {
    if remove_file_if_exists(path).map_err(|source| LoadError::RemoveExisting {
        path: path.to_path_buf(),
        source,
    })? {
        info!("removed existing database {path}");
    }
    ensure_parent_dir(path).map_err(|source| LoadError::CreateDirectory {
        path: path.to_path_buf(),
        source,
    })?;

    let mut connection =
        Connection::open(path.as_std_path()).map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    initialise_schema(&connection).map_err(|source| LoadError::Schema { source })?;

    let provinces = load_exposures(&mut connection, Dimension::Province, &sources.provinces)?;
    let ethnicities = load_exposures(&mut connection, Dimension::Ethnicity, &sources.ethnicities)?;
    let job_counts = load_jobs(&mut connection, &sources.jobs)?;
    let job_features = load_job_features(&mut connection, &sources.features)?;
    let rubric_rows = load_rubric(&mut connection, &sources.rubric)?;

    let summary = InitSummary {
        provinces,
        ethnicities,
        jobs: job_counts.jobs,
        job_titles: job_counts.job_titles,
        job_features,
        rubric_rows,
    };
    info!(
        "initialised {path}: {} jobs, {} feature rows, {} rubric rows",
        summary.jobs, summary.job_features, summary.rubric_rows
    );
    Ok(summary)
}
