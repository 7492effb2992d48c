//! `init` command: seed a fresh database and compute derived risk.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use pathbuilder_core::SqliteRiskStore;
use pathbuilder_data::{DataSources, InitSummary, initialise_database};
use pathbuilder_scorer::{JobRiskEngine, RecomputeSummary, recompute};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_DATABASE, ARG_ETHNICITIES, ARG_FEATURES, ARG_JOBS, ARG_PROVINCES, ARG_RUBRIC, CliError,
    ENV_INIT_ETHNICITIES, ENV_INIT_FEATURES, ENV_INIT_JOBS, ENV_INIT_PROVINCES, ENV_INIT_RUBRIC,
    database_or_default, require_existing, write_json,
};

/// CLI arguments for the `init` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "init",
    long_about = "Remove any database at the target path, create the schema, \
                 load occupations, job features, the rubric and both \
                 exposure tables from CSV, then compute every derived risk \
                 table. Paths can come from CLI flags, configuration files, \
                 or environment variables.",
    about = "Build a risk database from CSV sources"
)]
#[ortho_config(prefix = "PATHBUILDER")]
pub(crate) struct InitArgs {
    /// Path of the SQLite database to create.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Occupation codes and titles (`NOC_CODE`, `OASIS_LABEL`).
    #[arg(long = ARG_JOBS, value_name = "csv")]
    #[serde(default)]
    pub(crate) jobs: Option<Utf8PathBuf>,
    /// Wide skill and ability levels keyed by `NOC_CODE`.
    #[arg(long = ARG_FEATURES, value_name = "csv")]
    #[serde(default)]
    pub(crate) features: Option<Utf8PathBuf>,
    /// Substitution and complementarity indices per feature.
    #[arg(long = ARG_RUBRIC, value_name = "csv")]
    #[serde(default)]
    pub(crate) rubric: Option<Utf8PathBuf>,
    /// Province exposures (`code`, `name`, `exposure_value`).
    #[arg(long = ARG_PROVINCES, value_name = "csv")]
    #[serde(default)]
    pub(crate) provinces: Option<Utf8PathBuf>,
    /// Ethnicity exposures (`code`, `name`, `exposure_value`).
    #[arg(long = ARG_ETHNICITIES, value_name = "csv")]
    #[serde(default)]
    pub(crate) ethnicities: Option<Utf8PathBuf>,
}

impl InitArgs {
    fn into_config(self) -> Result<InitConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        InitConfig::try_from(merged)
    }
}

/// Resolved `init` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InitConfig {
    pub(crate) database: Utf8PathBuf,
    pub(crate) sources: DataSources,
}

impl InitConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.sources.jobs, ARG_JOBS)?;
        require_existing(&self.sources.features, ARG_FEATURES)?;
        require_existing(&self.sources.rubric, ARG_RUBRIC)?;
        require_existing(&self.sources.provinces, ARG_PROVINCES)?;
        require_existing(&self.sources.ethnicities, ARG_ETHNICITIES)?;
        Ok(())
    }
}

impl TryFrom<InitArgs> for InitConfig {
    type Error = CliError;

    fn try_from(args: InitArgs) -> Result<Self, Self::Error> {
        let jobs = args.jobs.ok_or(CliError::MissingArgument {
            field: ARG_JOBS,
            env: ENV_INIT_JOBS,
        })?;
        let features = args.features.ok_or(CliError::MissingArgument {
            field: ARG_FEATURES,
            env: ENV_INIT_FEATURES,
        })?;
        let rubric = args.rubric.ok_or(CliError::MissingArgument {
            field: ARG_RUBRIC,
            env: ENV_INIT_RUBRIC,
        })?;
        let provinces = args.provinces.ok_or(CliError::MissingArgument {
            field: ARG_PROVINCES,
            env: ENV_INIT_PROVINCES,
        })?;
        let ethnicities = args.ethnicities.ok_or(CliError::MissingArgument {
            field: ARG_ETHNICITIES,
            env: ENV_INIT_ETHNICITIES,
        })?;
        Ok(Self {
            database: database_or_default(args.database),
            sources: DataSources {
                jobs,
                features,
                rubric,
                provinces,
                ethnicities,
            },
        })
    }
}

/// JSON printed by `init`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct InitReport {
    pub(crate) database: Utf8PathBuf,
    pub(crate) loaded: InitSummary,
    pub(crate) recomputed: RecomputeSummary,
}

pub(crate) fn run_init(args: InitArgs, writer: &mut dyn Write) -> Result<InitReport, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    execute_init(&config, writer)
}

pub(crate) fn execute_init(
    config: &InitConfig,
    writer: &mut dyn Write,
) -> Result<InitReport, CliError> {
    info!("initialising {}", config.database);
    let loaded = initialise_database(&config.database, &config.sources).map_err(|source| {
        CliError::Initialise {
            path: config.database.clone(),
            source,
        }
    })?;
    let mut store = SqliteRiskStore::open(config.database.as_std_path())?;
    let recomputed =
        recompute(&mut store, &JobRiskEngine::default()).map_err(|source| CliError::Recompute {
            path: config.database.clone(),
            source,
        })?;
    let report = InitReport {
        database: config.database.clone(),
        loaded,
        recomputed,
    };
    write_json(writer, &report)?;
    Ok(report)
}
