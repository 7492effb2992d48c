//! Error types emitted by the PathBuilder CLI.

use std::sync::Arc;

use camino::Utf8PathBuf;
use pathbuilder_core::SqliteRiskStoreError;
use pathbuilder_data::LoadError;
use pathbuilder_scorer::{AssessError, PipelineError};
use thiserror::Error;

use crate::telemetry::TelemetryError;

/// Errors emitted by the PathBuilder CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// An option was present but its value is unusable.
    #[error("invalid {field} {value:?}: {reason}")]
    InvalidArgument {
        field: &'static str,
        value: String,
        reason: String,
    },
    /// Only one of the two experience options was supplied.
    #[error("--experience and --replaceability must be given together")]
    IncompleteExperience,
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Installing the log subscriber failed.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    /// Loading the CSV sources failed.
    #[error("failed to initialise {path:?}: {source}")]
    Initialise {
        path: Utf8PathBuf,
        #[source]
        source: LoadError,
    },
    /// Opening the risk database failed.
    #[error(transparent)]
    OpenStore(#[from] SqliteRiskStoreError),
    /// Rebuilding the derived tables failed.
    #[error("failed to recompute {path:?}: {source}")]
    Recompute {
        path: Utf8PathBuf,
        #[source]
        source: PipelineError<SqliteRiskStoreError>,
    },
    /// Scoring the request failed.
    #[error(transparent)]
    Assess(#[from] AssessError<SqliteRiskStoreError>),
    /// Serialising command output failed.
    #[error("failed to serialise output: {0}")]
    SerialiseOutput(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
