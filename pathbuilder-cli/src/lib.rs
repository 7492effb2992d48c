//! Command-line interface for the PathBuilder risk engine.
//!
//! `init` seeds a fresh database from CSV sources and recomputes it,
//! `recompute` rebuilds the derived tables in place, and `score` assesses
//! one person against an existing database. Each command prints JSON.
#![forbid(unsafe_code)]

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use serde::Serialize;

mod error;
mod init;
mod recompute;
mod score;
pub mod telemetry;

pub use error::CliError;

use init::InitArgs;
use recompute::RecomputeArgs;
use score::ScoreArgs;

const ARG_DATABASE: &str = "database";
const ARG_JOBS: &str = "jobs";
const ARG_FEATURES: &str = "features";
const ARG_RUBRIC: &str = "rubric";
const ARG_PROVINCES: &str = "provinces";
const ARG_ETHNICITIES: &str = "ethnicities";
const ARG_PROVINCE: &str = "province";
const ARG_ETHNICITY: &str = "ethnicity";
const ARG_JOB: &str = "job";
const ARG_EXPERIENCE: &str = "experience";
const ARG_REPLACEABILITY: &str = "replaceability";
const ARG_STRATEGY: &str = "strategy";
const ARG_BANDS: &str = "bands";

const ENV_INIT_JOBS: &str = "PATHBUILDER_CMDS_INIT_JOBS";
const ENV_INIT_FEATURES: &str = "PATHBUILDER_CMDS_INIT_FEATURES";
const ENV_INIT_RUBRIC: &str = "PATHBUILDER_CMDS_INIT_RUBRIC";
const ENV_INIT_PROVINCES: &str = "PATHBUILDER_CMDS_INIT_PROVINCES";
const ENV_INIT_ETHNICITIES: &str = "PATHBUILDER_CMDS_INIT_ETHNICITIES";
const ENV_SCORE_PROVINCE: &str = "PATHBUILDER_CMDS_SCORE_PROVINCE";
const ENV_SCORE_ETHNICITY: &str = "PATHBUILDER_CMDS_SCORE_ETHNICITY";
const ENV_SCORE_JOB: &str = "PATHBUILDER_CMDS_SCORE_JOB";

/// Database used when `--database` is not configured.
const DEFAULT_DATABASE: &str = "pathbuilder.db";

/// Run the PathBuilder CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    telemetry::init()?;
    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Command::Init(args) => init::run_init(args, &mut stdout).map(|_| ()),
        Command::Recompute(args) => recompute::run_recompute(args, &mut stdout).map(|_| ()),
        Command::Score(args) => score::run_score(args, &mut stdout).map(|_| ()),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "pathbuilder",
    about = "Prepare and query AI-disruption risk tables",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build a fresh database from CSV sources and compute derived risk.
    Init(InitArgs),
    /// Rebuild every derived risk table from the raw tables.
    Recompute(RecomputeArgs),
    /// Score one person against the derived risk tables.
    Score(ScoreArgs),
}

fn database_or_default(database: Option<Utf8PathBuf>) -> Utf8PathBuf {
    database.unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE))
}

fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match pathbuilder_fs::file_is_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn write_json<T: Serialize>(writer: &mut dyn Write, value: &T) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerialiseOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
mod tests;
