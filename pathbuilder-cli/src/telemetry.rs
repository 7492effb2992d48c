//! Log subscriber set-up for the CLI.
//!
//! Library crates log through the `log` facade; the fmt subscriber installed
//! here also forwards those records. Output goes to stderr so command results
//! on stdout stay machine-readable.

use thiserror::Error;
use tracing_subscriber::{EnvFilter, filter::ParseError};

/// Filter used when `RUST_LOG` is unset or unusable.
pub const DEFAULT_FILTER: &str = "info";

/// Errors raised while installing the log subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The fallback filter directive did not parse.
    #[error("invalid log filter '{value}'")]
    EnvFilter {
        value: String,
        #[source]
        source: ParseError,
    },
    /// A global subscriber was already installed.
    #[error("failed to install log subscriber: {0}")]
    Subscriber(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Build the filter from `RUST_LOG`, falling back to `fallback`.
pub fn env_filter(fallback: &str) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(fallback).map_err(|source| TelemetryError::EnvFilter {
            value: fallback.to_owned(),
            source,
        }),
    }
}

/// Install the global fmt subscriber.
pub fn init() -> Result<(), TelemetryError> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(DEFAULT_FILTER)?)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(TelemetryError::Subscriber)
}
