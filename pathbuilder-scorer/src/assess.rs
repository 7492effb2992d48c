//! Request-time assessment: look up the derived rows for one person and
//! blend them into a banded score.
#![forbid(unsafe_code)]

use std::fmt;

use pathbuilder_core::{Dimension, RiskStore};
use serde::{Deserialize, Serialize};

use crate::{
    BandThresholds, ComponentRisks, ComponentWeights, ExperienceInput, RiskBand, TaperedWeights,
    WeightStrategy, error::AssessError,
};

/// Derived row consulted by an assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    /// Normalised province risk.
    ProvinceRisk,
    /// Normalised ethnicity risk.
    EthnicityRisk,
    /// Cohort-relative job risk.
    JobRisk,
    /// PCS share from the job profile.
    JobProfile,
}

impl Component {
    /// Return the component's table-style name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProvinceRisk => "province_risk",
            Self::EthnicityRisk => "ethnicity_risk",
            Self::JobRisk => "job_risk",
            Self::JobProfile => "job_profile",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies the person being assessed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRequest {
    /// Province or territory code.
    pub province_code: String,
    /// Ethnicity code.
    pub ethnicity_code: String,
    /// Occupation identifier.
    pub job_id: String,
    /// Optional experience input for strategies that use it.
    pub experience: Option<ExperienceInput>,
}

impl ScoreRequest {
    /// Construct a request without an experience input.
    pub fn new(
        province_code: impl Into<String>,
        ethnicity_code: impl Into<String>,
        job_id: impl Into<String>,
    ) -> Self {
        Self {
            province_code: province_code.into(),
            ethnicity_code: ethnicity_code.into(),
            job_id: job_id.into(),
            experience: None,
        }
    }

    /// Attach an experience input.
    #[must_use]
    pub const fn with_experience(mut self, experience: ExperienceInput) -> Self {
        self.experience = Some(experience);
        self
    }
}

/// Display names of the assessed inputs. A code with no recorded name is
/// shown as the code itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssessedInputs {
    /// Province or territory name.
    pub province: String,
    /// Ethnicity name.
    pub ethnicity: String,
    /// Occupation title.
    pub job: String,
}

impl AssessedInputs {
    /// Resolve the names behind `request` from `store`.
    ///
    /// # Errors
    /// Returns [`AssessError::Name`] when a lookup fails.
    pub fn resolve<S: RiskStore>(
        store: &S,
        request: &ScoreRequest,
    ) -> Result<Self, AssessError<S::Error>> {
        let named = |table: &'static str, code: &str, result: Result<Option<String>, S::Error>| {
            result
                .map(|name| name.unwrap_or_else(|| code.to_owned()))
                .map_err(|source| AssessError::Name { table, source })
        };
        Ok(Self {
            province: named(
                Dimension::Province.lookup_table(),
                &request.province_code,
                store.dimension_name(Dimension::Province, &request.province_code),
            )?,
            ethnicity: named(
                Dimension::Ethnicity.lookup_table(),
                &request.ethnicity_code,
                store.dimension_name(Dimension::Ethnicity, &request.ethnicity_code),
            )?,
            job: named("job_titles", &request.job_id, store.job_title(&request.job_id))?,
        })
    }
}

/// Component values as looked up for one assessment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AssessedComponents {
    /// Normalised province risk.
    pub province: f64,
    /// Normalised ethnicity risk.
    pub ethnicity: f64,
    /// Cohort-relative job risk.
    pub job: f64,
    /// Job PCS share.
    pub pcs_share: f64,
    /// Experience component, when the strategy used one.
    pub experience: Option<f64>,
}

/// Result of assessing one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    /// Request that was assessed.
    pub request: ScoreRequest,
    /// Names behind the request's codes.
    pub inputs: AssessedInputs,
    /// Name of the weight strategy used.
    pub strategy: &'static str,
    /// Component values.
    pub components: AssessedComponents,
    /// Weights applied to each component.
    pub weights: ComponentWeights,
    /// Final score in `0.0..=1.0`.
    pub score: f64,
    /// Ordinal band for `score`.
    pub band: RiskBand,
}

impl RiskAssessment {
    /// Copy of the assessment with every number rounded to two decimals for
    /// display. The band is kept from the unrounded score.
    #[must_use]
    pub fn rounded(&self) -> Self {
        let components = AssessedComponents {
            province: round_for_display(self.components.province),
            ethnicity: round_for_display(self.components.ethnicity),
            job: round_for_display(self.components.job),
            pcs_share: round_for_display(self.components.pcs_share),
            experience: self.components.experience.map(round_for_display),
        };
        let weights = ComponentWeights {
            province: round_for_display(self.weights.province),
            ethnicity: round_for_display(self.weights.ethnicity),
            job: round_for_display(self.weights.job),
            experience: round_for_display(self.weights.experience),
        };
        Self {
            request: self.request.clone(),
            inputs: self.inputs.clone(),
            strategy: self.strategy,
            components,
            weights,
            score: round_for_display(self.score),
            band: self.band,
        }
    }
}

/// Round `value` to two decimal places.
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "display rounding scales by one hundred"
)]
pub fn round_for_display(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Looks up derived rows and scores requests with a weight strategy.
///
/// # Examples
/// ```
/// use pathbuilder_core::{Dimension, ExposureRecord, RawJobFeatures, RubricRow};
/// use pathbuilder_core::test_support::MemoryRiskStore;
/// use pathbuilder_scorer::{JobRiskEngine, RiskAssessor, RiskBand, ScoreRequest, recompute};
///
/// let mut store = MemoryRiskStore::new()
///     .with_exposures(Dimension::Province, [ExposureRecord::new("ON", 1.0)])
///     .with_exposures(Dimension::Ethnicity, [ExposureRecord::new("X", 1.0)])
///     .with_job_features([RawJobFeatures::new("0011", r#"{"Monitoring": 5}"#)])
///     .with_rubric([RubricRow::new("Monitoring", 5.0, 1.0)]);
/// recompute(&mut store, &JobRiskEngine::default()).expect("recompute");
///
/// let assessment = RiskAssessor::default()
///     .assess(&store, &ScoreRequest::new("ON", "X", "0011"))
///     .expect("all components present");
/// assert!((assessment.score - 0.5).abs() < 1e-9);
/// assert_eq!(assessment.band, RiskBand::Medium);
/// ```
#[derive(Debug)]
pub struct RiskAssessor {
    strategy: Box<dyn WeightStrategy>,
    bands: BandThresholds,
}

impl Default for RiskAssessor {
    fn default() -> Self {
        Self::new(Box::new(TaperedWeights::default()), BandThresholds::default())
    }
}

impl RiskAssessor {
    /// Create an assessor with the given strategy and band thresholds.
    #[must_use]
    pub const fn new(strategy: Box<dyn WeightStrategy>, bands: BandThresholds) -> Self {
        Self { strategy, bands }
    }

    /// Band thresholds applied to final scores.
    #[must_use]
    pub const fn bands(&self) -> &BandThresholds {
        &self.bands
    }

    /// Assess `request` against the derived rows in `store`.
    ///
    /// # Errors
    /// Returns [`AssessError::MissingComponents`] listing every absent row
    /// when any lookup finds nothing, [`AssessError::Store`] when a risk
    /// lookup fails and [`AssessError::Name`] when a name lookup fails.
    pub fn assess<S: RiskStore>(
        &self,
        store: &S,
        request: &ScoreRequest,
    ) -> Result<RiskAssessment, AssessError<S::Error>> {
        let lookup = |component: Component, result: Result<Option<f64>, S::Error>| {
            result.map_err(|source| AssessError::Store { component, source })
        };
        let province_row = lookup(
            Component::ProvinceRisk,
            store.dimension_risk(Dimension::Province, &request.province_code),
        )?;
        let ethnicity_row = lookup(
            Component::EthnicityRisk,
            store.dimension_risk(Dimension::Ethnicity, &request.ethnicity_code),
        )?;
        let job_row = lookup(Component::JobRisk, store.job_risk(&request.job_id))?;
        let profile_row = lookup(Component::JobProfile, store.pcs_share(&request.job_id))?;

        let (Some(province), Some(ethnicity), Some(job), Some(pcs_share)) =
            (province_row, ethnicity_row, job_row, profile_row)
        else {
            let missing = [
                (Component::ProvinceRisk, province_row),
                (Component::EthnicityRisk, ethnicity_row),
                (Component::JobRisk, job_row),
                (Component::JobProfile, profile_row),
            ]
            .into_iter()
            .filter_map(|(component, row)| row.is_none().then_some(component))
            .collect();
            return Err(AssessError::MissingComponents { missing });
        };

        let risks = ComponentRisks {
            province,
            ethnicity,
            job,
        };
        let composition = self
            .strategy
            .compose(pcs_share, &risks, request.experience.as_ref());
        Ok(RiskAssessment {
            request: request.clone(),
            inputs: AssessedInputs::resolve(store, request)?,
            strategy: self.strategy.name(),
            components: AssessedComponents {
                province,
                ethnicity,
                job,
                pcs_share,
                experience: composition.experience_risk,
            },
            weights: composition.weights,
            score: composition.score,
            band: self.bands.band_for(composition.score),
        })
    }
}
