//! `score` command: assess one person against an existing database.

use std::{io::Write, str::FromStr};

use camino::Utf8PathBuf;
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use pathbuilder_core::SqliteRiskStore;
use pathbuilder_data::normalize_job_id;
use pathbuilder_scorer::{
    BandThresholds, ExperienceInput, ExperienceLevel, RiskAssessment, RiskAssessor, ScoreRequest,
    StrategyKind,
};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_BANDS, ARG_DATABASE, ARG_ETHNICITY, ARG_EXPERIENCE, ARG_JOB, ARG_PROVINCE,
    ARG_REPLACEABILITY, ARG_STRATEGY, CliError, ENV_SCORE_ETHNICITY, ENV_SCORE_JOB,
    ENV_SCORE_PROVINCE, database_or_default, require_existing, write_json,
};

/// CLI arguments for the `score` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "score",
    long_about = "Look up province, ethnicity and job risk for one person, \
                 blend them with the selected weight strategy and print the \
                 banded score. The fixed strategy can include an experience \
                 component built from a level and a replaceability figure.",
    about = "Score one person"
)]
#[ortho_config(prefix = "PATHBUILDER")]
pub(crate) struct ScoreArgs {
    /// Path of a recomputed SQLite database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Province or territory code.
    #[arg(long = ARG_PROVINCE, value_name = "code")]
    #[serde(default)]
    pub(crate) province: Option<String>,
    /// Ethnicity code.
    #[arg(long = ARG_ETHNICITY, value_name = "code")]
    #[serde(default)]
    pub(crate) ethnicity: Option<String>,
    /// Occupation code; short numeric codes are zero-padded.
    #[arg(long = ARG_JOB, value_name = "id")]
    #[serde(default)]
    pub(crate) job: Option<String>,
    /// Career stage: entry, intermediate, senior or expert.
    #[arg(long = ARG_EXPERIENCE, value_name = "level")]
    #[serde(default)]
    pub(crate) experience: Option<String>,
    /// Replaceability of the job between 0 and 1.
    #[arg(long = ARG_REPLACEABILITY, value_name = "x")]
    #[serde(default)]
    pub(crate) replaceability: Option<f64>,
    /// Weight strategy: tapered or fixed.
    #[arg(long = ARG_STRATEGY, value_name = "name")]
    #[serde(default)]
    pub(crate) strategy: Option<String>,
    /// Band thresholds: standard or narrow.
    #[arg(long = ARG_BANDS, value_name = "name")]
    #[serde(default)]
    pub(crate) bands: Option<String>,
}

impl ScoreArgs {
    fn into_config(self) -> Result<ScoreConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ScoreConfig::try_from(merged)
    }
}

/// Resolved `score` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ScoreConfig {
    pub(crate) database: Utf8PathBuf,
    pub(crate) request: ScoreRequest,
    pub(crate) strategy: StrategyKind,
    pub(crate) bands: BandThresholds,
}

fn parse_named<T>(field: &'static str, value: Option<String>) -> Result<Option<T>, CliError>
where
    T: FromStr<Err = String>,
{
    value
        .map(|raw| {
            raw.parse::<T>().map_err(|reason| CliError::InvalidArgument {
                field,
                value: raw.clone(),
                reason,
            })
        })
        .transpose()
}

fn validate_replaceability(value: f64) -> Result<f64, CliError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(CliError::InvalidArgument {
            field: ARG_REPLACEABILITY,
            value: value.to_string(),
            reason: "must lie between 0 and 1".to_owned(),
        })
    }
}

impl TryFrom<ScoreArgs> for ScoreConfig {
    type Error = CliError;

    fn try_from(args: ScoreArgs) -> Result<Self, Self::Error> {
        let province = args.province.ok_or(CliError::MissingArgument {
            field: ARG_PROVINCE,
            env: ENV_SCORE_PROVINCE,
        })?;
        let ethnicity = args.ethnicity.ok_or(CliError::MissingArgument {
            field: ARG_ETHNICITY,
            env: ENV_SCORE_ETHNICITY,
        })?;
        let job = args.job.ok_or(CliError::MissingArgument {
            field: ARG_JOB,
            env: ENV_SCORE_JOB,
        })?;
        let level = parse_named::<ExperienceLevel>(ARG_EXPERIENCE, args.experience)?;
        let experience = match (level, args.replaceability) {
            (Some(stage), Some(replaceability)) => Some(ExperienceInput::new(
                stage,
                validate_replaceability(replaceability)?,
            )),
            (None, None) => None,
            _ => return Err(CliError::IncompleteExperience),
        };
        let strategy = parse_named::<StrategyKind>(ARG_STRATEGY, args.strategy)?.unwrap_or_default();
        let bands = parse_named::<BandThresholds>(ARG_BANDS, args.bands)?.unwrap_or_default();

        let request = ScoreRequest::new(province.trim(), ethnicity.trim(), normalize_job_id(&job));
        Ok(Self {
            database: database_or_default(args.database),
            request: match experience {
                Some(input) => request.with_experience(input),
                None => request,
            },
            strategy,
            bands,
        })
    }
}

pub(crate) fn run_score(args: ScoreArgs, writer: &mut dyn Write) -> Result<RiskAssessment, CliError> {
    let config = args.into_config()?;
    execute_score(&config, writer)
}

/// Assess the configured request and print the rounded assessment.
///
/// Returns the unrounded assessment.
pub(crate) fn execute_score(
    config: &ScoreConfig,
    writer: &mut dyn Write,
) -> Result<RiskAssessment, CliError> {
    require_existing(&config.database, ARG_DATABASE)?;
    info!(
        "scoring job {} in {} with the {:?} strategy",
        config.request.job_id, config.database, config.strategy
    );
    let store = SqliteRiskStore::open_read_only(config.database.as_std_path())?;
    let assessor = RiskAssessor::new(config.strategy.build(), config.bands);
    let assessment = assessor.assess(&store, &config.request)?;
    write_json(writer, &assessment.rounded())?;
    Ok(assessment)
}
