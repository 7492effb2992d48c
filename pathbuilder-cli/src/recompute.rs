//! `recompute` command: rebuild the derived tables of an existing database.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use pathbuilder_core::SqliteRiskStore;
use pathbuilder_scorer::{JobRiskEngine, RecomputeSummary, recompute};
use serde::{Deserialize, Serialize};

use crate::{ARG_DATABASE, CliError, database_or_default, require_existing, write_json};

/// CLI arguments for the `recompute` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "recompute",
    long_about = "Normalise both exposure tables and rerun the job risk \
                 engine against the raw tables of an existing database. \
                 Running it twice on unchanged data writes identical rows.",
    about = "Rebuild derived risk tables"
)]
#[ortho_config(prefix = "PATHBUILDER")]
pub(crate) struct RecomputeArgs {
    /// Path of an existing SQLite database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

impl RecomputeArgs {
    fn into_config(self) -> Result<RecomputeConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        Ok(RecomputeConfig::from(merged))
    }
}

/// Resolved `recompute` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecomputeConfig {
    pub(crate) database: Utf8PathBuf,
}

impl From<RecomputeArgs> for RecomputeConfig {
    fn from(args: RecomputeArgs) -> Self {
        Self {
            database: database_or_default(args.database),
        }
    }
}

pub(crate) fn run_recompute(
    args: RecomputeArgs,
    writer: &mut dyn Write,
) -> Result<RecomputeSummary, CliError> {
    let config = args.into_config()?;
    execute_recompute(&config, writer)
}

pub(crate) fn execute_recompute(
    config: &RecomputeConfig,
    writer: &mut dyn Write,
) -> Result<RecomputeSummary, CliError> {
    require_existing(&config.database, ARG_DATABASE)?;
    info!("recomputing derived risk in {}", config.database);
    let mut store = SqliteRiskStore::open(config.database.as_std_path())?;
    let summary =
        recompute(&mut store, &JobRiskEngine::default()).map_err(|source| CliError::Recompute {
            path: config.database.clone(),
            source,
        })?;
    write_json(writer, &summary)?;
    Ok(summary)
}
