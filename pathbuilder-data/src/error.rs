//! Errors raised while reading CSV sources and seeding the raw tables.

use camino::Utf8PathBuf;
use pathbuilder_core::SqliteRiskStoreError;
use rusqlite::Error as SqliteError;
use thiserror::Error;

/// Errors raised while parsing one CSV source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The CSV reader rejected the input.
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    /// A column the loader needs is absent from the header row.
    #[error("missing required column {column}")]
    MissingColumn {
        /// Header that was expected.
        column: &'static str,
    },
    /// Encoding a job's averaged features as JSON failed.
    #[error("failed to encode features for job {job_id}")]
    EncodeFeatures {
        /// Job whose document failed to encode.
        job_id: String,
        /// Source error produced by `serde_json`.
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised when loading sources into the SQLite database.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Removing a previous database file failed.
    #[error("failed to remove existing database {path:?}")]
    RemoveExisting {
        /// Database file that could not be removed.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Failed to create the parent directory for the database.
    #[error("failed to create parent directory for {path:?}")]
    CreateDirectory {
        /// Database path whose parents could not be created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path:?}")]
    Open {
        /// Destination database path.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Applying the risk schema failed.
    #[error("failed to apply risk schema")]
    Schema {
        /// Source error returned by the store.
        #[source]
        source: SqliteRiskStoreError,
    },
    /// Opening a CSV source failed.
    #[error("failed to open source {path:?}")]
    OpenSource {
        /// Source file path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A CSV source could not be parsed.
    #[error("failed to parse source {path:?}")]
    ParseSource {
        /// Source file path.
        path: Utf8PathBuf,
        /// Parse failure.
        #[source]
        source: SourceError,
    },
    /// Reading the known job ids failed.
    #[error("failed to read job ids")]
    ReadJobIds {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Beginning the load transaction failed.
    #[error("failed to begin transaction for {table}")]
    BeginTransaction {
        /// First table written by the transaction.
        table: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Clearing a table before loading failed.
    #[error("failed to clear {table}")]
    ClearTable {
        /// Table being cleared.
        table: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Preparing an insert statement failed.
    #[error("failed to prepare insert into {table}")]
    PrepareInsert {
        /// Table being written.
        table: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Writing one row failed.
    #[error("failed to write row {row} of {table}")]
    PersistRow {
        /// Table being written.
        table: &'static str,
        /// Zero-based position of the row in the load.
        row: usize,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Committing the load transaction failed.
    #[error("failed to commit {table}")]
    Commit {
        /// First table written by the transaction.
        table: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
}
