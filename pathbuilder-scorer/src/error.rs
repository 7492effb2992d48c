//! Error types raised while recomputing and assessing risk.
#![forbid(unsafe_code)]

use std::error::Error as StdError;

use pathbuilder_core::Dimension;
use thiserror::Error;

use crate::assess::Component;

/// Errors raised when building weight or band configuration.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum WeightsError {
    /// A weight was NaN or infinite.
    #[error("weights must be finite")]
    NonFinite,
    /// A weight was below zero.
    #[error("weights must not be negative")]
    Negative,
    /// Every weight was zero.
    #[error("weights must have a non-zero total")]
    ZeroTotal,
    /// Band thresholds were out of range or out of order.
    #[error("band thresholds {low_below} and {medium_below} must satisfy 0 <= low <= medium <= 1")]
    InvalidBands {
        /// Requested upper bound of the Low band.
        low_below: f64,
        /// Requested upper bound of the Medium band.
        medium_below: f64,
    },
}

/// Errors raised by [`recompute`](crate::recompute).
#[derive(Debug, Error)]
pub enum PipelineError<E>
where
    E: StdError + 'static,
{
    /// Reading a raw table failed.
    #[error("failed to read {table}")]
    Read {
        /// Raw table being read.
        table: &'static str,
        /// Source error from the store.
        #[source]
        source: E,
    },
    /// Replacing a dimension's normalised risk failed.
    #[error("failed to replace {dimension} risk")]
    WriteDimension {
        /// Dimension being written.
        dimension: Dimension,
        /// Source error from the store.
        #[source]
        source: E,
    },
    /// Replacing the job profile and job risk tables failed.
    #[error("failed to replace job outputs")]
    WriteJobs {
        /// Source error from the store.
        #[source]
        source: E,
    },
}

/// Errors raised by [`RiskAssessor::assess`](crate::RiskAssessor::assess).
#[derive(Debug, Error)]
pub enum AssessError<E>
where
    E: StdError + 'static,
{
    /// One or more derived rows needed for the score are absent.
    #[error("missing risk components: {}", format_components(.missing))]
    MissingComponents {
        /// Every absent component, in lookup order.
        missing: Vec<Component>,
    },
    /// Looking up a derived row failed.
    #[error("failed to look up {component}")]
    Store {
        /// Component being looked up.
        component: Component,
        /// Source error from the store.
        #[source]
        source: E,
    },
    /// Looking up a display name failed.
    #[error("failed to look up a name in {table}")]
    Name {
        /// Lookup table being read.
        table: &'static str,
        /// Source error from the store.
        #[source]
        source: E,
    },
}

fn format_components(missing: &[Component]) -> String {
    missing
        .iter()
        .map(|component| component.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
