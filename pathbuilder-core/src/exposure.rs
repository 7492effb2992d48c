//! Exposure dimensions and their raw and normalised records.
//!
//! A dimension is one demographic or geographic axis of exposure. Each
//! dimension reads from its own raw table and writes to its own output table;
//! the normalisation routine itself is shared.

use serde::{Deserialize, Serialize};

/// Demographic or geographic axis scored by min–max normalisation.
///
/// # Examples
/// ```
/// use pathbuilder_core::Dimension;
///
/// assert_eq!(Dimension::Province.raw_table(), "province_risk_raw");
/// assert_eq!(Dimension::Ethnicity.to_string(), "ethnicity");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    /// Province or territory of residence.
    Province,
    /// Ethnicity, using Statistics Canada categories.
    Ethnicity,
}

impl Dimension {
    /// Every dimension, in recompute order.
    pub const ALL: [Self; 2] = [Self::Province, Self::Ethnicity];

    /// Return the dimension as a lowercase `&str`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Province => "province",
            Self::Ethnicity => "ethnicity",
        }
    }

    /// Table holding raw exposure values.
    pub const fn raw_table(self) -> &'static str {
        match self {
            Self::Province => "province_risk_raw",
            Self::Ethnicity => "ethnicity_risk_raw",
        }
    }

    /// Key column shared by the raw and normalised tables.
    pub const fn key_column(self) -> &'static str {
        match self {
            Self::Province => "province_code",
            Self::Ethnicity => "ethnicity_code",
        }
    }

    /// Table holding normalised risk.
    pub const fn output_table(self) -> &'static str {
        match self {
            Self::Province => "province_risk",
            Self::Ethnicity => "ethnicity_risk",
        }
    }

    /// Table mapping codes to display names.
    pub const fn lookup_table(self) -> &'static str {
        match self {
            Self::Province => "provinces",
            Self::Ethnicity => "ethnicities",
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "province" => Ok(Self::Province),
            "ethnicity" => Ok(Self::Ethnicity),
            _ => Err(format!("unknown dimension '{s}'")),
        }
    }
}

/// Raw exposure for one key of a dimension; higher means riskier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureRecord {
    /// Province or ethnicity code.
    pub key: String,
    /// Unbounded exposure value.
    pub exposure_value: f64,
}

impl ExposureRecord {
    /// Construct a record.
    pub fn new(key: impl Into<String>, exposure_value: f64) -> Self {
        Self {
            key: key.into(),
            exposure_value,
        }
    }
}

/// Normalised risk in `0.0..=1.0` for one key of a dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRisk {
    /// Province or ethnicity code.
    pub key: String,
    /// Risk in `0.0..=1.0`.
    pub risk: f64,
}

impl NormalizedRisk {
    /// Construct a record, clamping `risk` into `0.0..=1.0`.
    pub fn new(key: impl Into<String>, risk: f64) -> Self {
        Self {
            key: key.into(),
            risk: crate::clamp_unit(risk),
        }
    }
}
