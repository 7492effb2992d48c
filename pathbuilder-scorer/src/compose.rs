//! Blending normalised components into one bounded score.
//!
//! Two weight strategies are provided. [`TaperedWeights`] shifts province and
//! ethnicity weight onto the job component as a job's PCS share grows, on the
//! premise that demographic exposure matters less for work that is hard to
//! automate. [`FixedWeights`] keeps a constant split and adds an experience
//! component derived from an externally supplied replaceability figure.
#![forbid(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use pathbuilder_core::clamp_unit;
use serde::{Deserialize, Serialize};

use crate::error::WeightsError;

/// Normalised province, ethnicity and job risk for one person.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentRisks {
    /// Province risk in `0.0..=1.0`.
    pub province: f64,
    /// Ethnicity risk in `0.0..=1.0`.
    pub ethnicity: f64,
    /// Cohort-relative job risk in `0.0..=1.0`.
    pub job: f64,
}

/// Base weights for the tapering strategy.
///
/// Construction validates the values and rescales them to sum to one, so a
/// `BaseWeights` value is always a proper convex combination.
///
/// # Examples
/// ```
/// use pathbuilder_scorer::BaseWeights;
///
/// let weights = BaseWeights::new(1.0, 1.0, 2.0).expect("valid weights");
/// assert_eq!(weights.job(), 0.5);
/// assert!(BaseWeights::new(-1.0, 0.0, 1.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BaseWeights {
    province: f64,
    ethnicity: f64,
    job: f64,
}

impl BaseWeights {
    /// Validate and renormalise the three weights.
    ///
    /// # Errors
    /// Returns [`WeightsError`] when a weight is not finite, is negative, or
    /// when all three are zero.
    #[expect(
        clippy::float_arithmetic,
        reason = "renormalisation divides each weight by the total"
    )]
    pub fn new(province: f64, ethnicity: f64, job: f64) -> Result<Self, WeightsError> {
        let total = validated_total(&[province, ethnicity, job])?;
        Ok(Self {
            province: province / total,
            ethnicity: ethnicity / total,
            job: job / total,
        })
    }

    /// Normalised province weight.
    #[must_use]
    pub const fn province(&self) -> f64 {
        self.province
    }

    /// Normalised ethnicity weight.
    #[must_use]
    pub const fn ethnicity(&self) -> f64 {
        self.ethnicity
    }

    /// Normalised job weight.
    #[must_use]
    pub const fn job(&self) -> f64 {
        self.job
    }
}

impl Default for BaseWeights {
    fn default() -> Self {
        Self {
            province: 0.10,
            ethnicity: 0.15,
            job: 0.75,
        }
    }
}

fn validated_total(weights: &[f64]) -> Result<f64, WeightsError> {
    if weights.iter().any(|weight| !weight.is_finite()) {
        return Err(WeightsError::NonFinite);
    }
    if weights.iter().any(|weight| *weight < 0.0) {
        return Err(WeightsError::Negative);
    }
    let total: f64 = weights.iter().sum();
    if total > 0.0 {
        Ok(total)
    } else {
        Err(WeightsError::ZeroTotal)
    }
}

/// Weights actually applied to each component; they sum to one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentWeights {
    /// Province weight.
    pub province: f64,
    /// Ethnicity weight.
    pub ethnicity: f64,
    /// Job weight.
    pub job: f64,
    /// Experience weight; zero for strategies without an experience term.
    pub experience: f64,
}

impl ComponentWeights {
    /// Weight set that puts everything on the job component.
    pub const JOB_ONLY: Self = Self {
        province: 0.0,
        ethnicity: 0.0,
        job: 1.0,
        experience: 0.0,
    };

    /// Sum of all four weights.
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "sums the weight set")]
    pub const fn total(&self) -> f64 {
        self.province + self.ethnicity + self.job + self.experience
    }

    #[expect(
        clippy::float_arithmetic,
        reason = "divides each weight by the total"
    )]
    fn renormalised(self) -> Self {
        let total = self.total();
        if !total.is_finite() || total <= 0.0 {
            return Self::JOB_ONLY;
        }
        Self {
            province: self.province / total,
            ethnicity: self.ethnicity / total,
            job: self.job / total,
            experience: self.experience / total,
        }
    }
}

/// Taper the base weights by a job's PCS share.
///
/// Province and ethnicity weights shrink by `1 − pcs_share` and the job
/// component takes the remainder. The share is clamped into `0.0..=1.0`
/// first.
///
/// # Examples
/// ```
/// use pathbuilder_scorer::{BaseWeights, tapered_weights};
///
/// let weights = tapered_weights(0.4, &BaseWeights::default());
/// assert!((weights.province - 0.06).abs() < 1e-9);
/// assert!((weights.ethnicity - 0.09).abs() < 1e-9);
/// assert!((weights.job - 0.85).abs() < 1e-9);
/// ```
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "tapering scales weights by the complement of the PCS share"
)]
pub fn tapered_weights(pcs_share: f64, base: &BaseWeights) -> ComponentWeights {
    let retained = 1.0 - clamp_unit(pcs_share);
    let province = base.province() * retained;
    let ethnicity = base.ethnicity() * retained;
    ComponentWeights {
        province,
        ethnicity,
        job: 1.0 - (province + ethnicity),
        experience: 0.0,
    }
    .renormalised()
}

/// Discrete career stage used by the experience component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    /// Early career.
    Entry,
    /// A few years in role.
    Intermediate,
    /// Established practitioner.
    Senior,
    /// Recognised specialist.
    Expert,
}

impl ExperienceLevel {
    /// Every level, from least to most experienced.
    pub const ALL: [Self; 4] = [Self::Entry, Self::Intermediate, Self::Senior, Self::Expert];

    /// Multiplier applied to replaceability; seniority lowers exposure.
    #[must_use]
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::Entry => 1.2,
            Self::Intermediate => 1.0,
            Self::Senior => 0.8,
            Self::Expert => 0.6,
        }
    }

    /// Return the level as a lowercase `&str`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::Intermediate => "intermediate",
            Self::Senior => "senior",
            Self::Expert => "expert",
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExperienceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown experience level '{s}'"))
    }
}

/// Experience level plus the job's externally supplied replaceability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExperienceInput {
    /// Career stage.
    pub level: ExperienceLevel,
    /// Per-job replaceability in `0.0..=1.0`.
    pub replaceability: f64,
}

impl ExperienceInput {
    /// Construct an input; `replaceability` is clamped into `0.0..=1.0`.
    #[must_use]
    pub fn new(level: ExperienceLevel, replaceability: f64) -> Self {
        Self {
            level,
            replaceability: clamp_unit(replaceability),
        }
    }

    /// `clamp(replaceability × multiplier(level))`.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "experience risk scales replaceability by a fixed multiplier"
    )]
    pub fn risk(&self) -> f64 {
        clamp_unit(self.replaceability * self.level.multiplier())
    }
}

/// Outcome of a composition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Composition {
    /// Weighted score in `0.0..=1.0`.
    pub score: f64,
    /// Weights applied to each component.
    pub weights: ComponentWeights,
    /// Experience component, when the strategy used one.
    pub experience_risk: Option<f64>,
}

/// Chooses component weights and blends the components into a score.
pub trait WeightStrategy: Send + Sync + fmt::Debug {
    /// Short identifier reported alongside assessments.
    fn name(&self) -> &'static str;

    /// Blend `risks` for a job with the given PCS share.
    fn compose(
        &self,
        pcs_share: f64,
        risks: &ComponentRisks,
        experience: Option<&ExperienceInput>,
    ) -> Composition;
}

#[expect(
    clippy::float_arithmetic,
    reason = "the score is a weighted sum of bounded components"
)]
fn weighted_score(weights: &ComponentWeights, risks: &ComponentRisks, experience: f64) -> f64 {
    clamp_unit(
        weights.province * clamp_unit(risks.province)
            + weights.ethnicity * clamp_unit(risks.ethnicity)
            + weights.job * clamp_unit(risks.job)
            + weights.experience * experience,
    )
}

/// Default strategy: taper demographic weights by PCS share.
///
/// Any experience input is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TaperedWeights {
    base: BaseWeights,
}

impl TaperedWeights {
    /// Create a strategy around `base`.
    #[must_use]
    pub const fn new(base: BaseWeights) -> Self {
        Self { base }
    }

    /// Base weights before tapering.
    #[must_use]
    pub const fn base(&self) -> &BaseWeights {
        &self.base
    }
}

impl WeightStrategy for TaperedWeights {
    fn name(&self) -> &'static str {
        "tapered"
    }

    fn compose(
        &self,
        pcs_share: f64,
        risks: &ComponentRisks,
        _experience: Option<&ExperienceInput>,
    ) -> Composition {
        let weights = tapered_weights(pcs_share, &self.base);
        Composition {
            score: weighted_score(&weights, risks, 0.0),
            weights,
            experience_risk: None,
        }
    }
}

/// Alternate strategy: constant weights with an experience component.
///
/// When no experience input is supplied the experience weight moves onto the
/// job component. The PCS share does not influence the weights.
///
/// # Examples
/// ```
/// use pathbuilder_scorer::{
///     ComponentRisks, ExperienceInput, ExperienceLevel, FixedWeights, WeightStrategy,
/// };
///
/// let risks = ComponentRisks { province: 0.0, ethnicity: 0.0, job: 1.0 };
/// let strategy = FixedWeights::default();
/// let without = strategy.compose(0.3, &risks, None);
/// assert!((without.score - 0.75).abs() < 1e-9);
///
/// let input = ExperienceInput::new(ExperienceLevel::Intermediate, 1.0);
/// let with = strategy.compose(0.3, &risks, Some(&input));
/// assert!((with.score - 0.75).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FixedWeights {
    weights: ComponentWeights,
}

impl FixedWeights {
    /// Validate and renormalise the four weights.
    ///
    /// # Errors
    /// Returns [`WeightsError`] when a weight is not finite, is negative, or
    /// when all four are zero.
    #[expect(
        clippy::float_arithmetic,
        reason = "renormalisation divides each weight by the total"
    )]
    pub fn new(
        province: f64,
        ethnicity: f64,
        job: f64,
        experience: f64,
    ) -> Result<Self, WeightsError> {
        let total = validated_total(&[province, ethnicity, job, experience])?;
        Ok(Self {
            weights: ComponentWeights {
                province: province / total,
                ethnicity: ethnicity / total,
                job: job / total,
                experience: experience / total,
            },
        })
    }

    /// Normalised weights used when an experience input is present.
    #[must_use]
    pub const fn weights(&self) -> &ComponentWeights {
        &self.weights
    }

    #[expect(
        clippy::float_arithmetic,
        reason = "folds the experience weight into the job weight"
    )]
    fn without_experience(&self) -> ComponentWeights {
        ComponentWeights {
            job: self.weights.job + self.weights.experience,
            experience: 0.0,
            ..self.weights
        }
    }
}

impl Default for FixedWeights {
    fn default() -> Self {
        Self {
            weights: ComponentWeights {
                province: 0.10,
                ethnicity: 0.15,
                job: 0.55,
                experience: 0.20,
            },
        }
    }
}

impl WeightStrategy for FixedWeights {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn compose(
        &self,
        _pcs_share: f64,
        risks: &ComponentRisks,
        experience: Option<&ExperienceInput>,
    ) -> Composition {
        experience.map_or_else(
            || {
                let weights = self.without_experience();
                Composition {
                    score: weighted_score(&weights, risks, 0.0),
                    weights,
                    experience_risk: None,
                }
            },
            |input| {
                let experience_risk = input.risk();
                Composition {
                    score: weighted_score(&self.weights, risks, experience_risk),
                    weights: self.weights,
                    experience_risk: Some(experience_risk),
                }
            },
        )
    }
}

/// Selectable weight strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// [`TaperedWeights`] with default base weights.
    #[default]
    Tapered,
    /// [`FixedWeights`] with default weights.
    Fixed,
}

impl StrategyKind {
    /// Build the strategy with its default weights.
    #[must_use]
    pub fn build(self) -> Box<dyn WeightStrategy> {
        match self {
            Self::Tapered => Box::new(TaperedWeights::default()),
            Self::Fixed => Box::new(FixedWeights::default()),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tapered" => Ok(Self::Tapered),
            "fixed" => Ok(Self::Fixed),
            _ => Err(format!("unknown weight strategy '{s}'")),
        }
    }
}

/// Ordinal label for a final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskBand {
    /// Below the lower threshold.
    Low,
    /// Between the thresholds.
    Medium,
    /// At or above the upper threshold.
    High,
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        })
    }
}

/// Threshold pair separating Low, Medium and High.
///
/// # Examples
/// ```
/// use pathbuilder_scorer::{BandThresholds, RiskBand};
///
/// let bands = BandThresholds::STANDARD;
/// assert_eq!(bands.band_for(0.32), RiskBand::Low);
/// assert_eq!(bands.band_for(0.33), RiskBand::Medium);
/// assert_eq!(bands.band_for(0.66), RiskBand::High);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandThresholds {
    low_below: f64,
    medium_below: f64,
}

impl BandThresholds {
    /// `< 0.33` Low, `< 0.66` Medium, otherwise High.
    pub const STANDARD: Self = Self {
        low_below: 0.33,
        medium_below: 0.66,
    };

    /// `< 0.35` Low, `< 0.65` Medium, otherwise High.
    pub const NARROW: Self = Self {
        low_below: 0.35,
        medium_below: 0.65,
    };

    /// Build a custom pair.
    ///
    /// # Errors
    /// Returns [`WeightsError::InvalidBands`] unless
    /// `0 <= low_below <= medium_below <= 1`.
    pub fn new(low_below: f64, medium_below: f64) -> Result<Self, WeightsError> {
        let ordered = (0.0..=1.0).contains(&low_below)
            && (0.0..=1.0).contains(&medium_below)
            && low_below <= medium_below;
        if ordered {
            Ok(Self {
                low_below,
                medium_below,
            })
        } else {
            Err(WeightsError::InvalidBands {
                low_below,
                medium_below,
            })
        }
    }

    /// Upper bound (exclusive) of the Low band.
    #[must_use]
    pub const fn low_below(&self) -> f64 {
        self.low_below
    }

    /// Upper bound (exclusive) of the Medium band.
    #[must_use]
    pub const fn medium_below(&self) -> f64 {
        self.medium_below
    }

    /// Label `score`.
    #[must_use]
    pub const fn band_for(&self, score: f64) -> RiskBand {
        if score < self.low_below {
            RiskBand::Low
        } else if score < self.medium_below {
            RiskBand::Medium
        } else {
            RiskBand::High
        }
    }
}

impl Default for BandThresholds {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl FromStr for BandThresholds {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::STANDARD),
            "narrow" => Ok(Self::NARROW),
            _ => Err(format!("unknown band scheme '{s}'")),
        }
    }
}
