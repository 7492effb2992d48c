//! Occupation feature vectors, the substitution/complementarity rubric, and
//! the derived per-job rows.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, value::RawValue};
use thiserror::Error;

use crate::{clamp_unit, normalize_key};

/// Upper bound of the 0–5 scale shared by feature levels and rubric indices.
pub const LEVEL_SCALE_MAX: f64 = 5.0;

/// A job's feature document exactly as stored in the raw table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawJobFeatures {
    /// Occupation identifier.
    pub job_id: String,
    /// Flat JSON object mapping feature names to levels.
    pub features_json: String,
}

impl RawJobFeatures {
    /// Construct a raw row.
    pub fn new(job_id: impl Into<String>, features_json: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            features_json: features_json.into(),
        }
    }
}

/// Errors raised when a feature document cannot be interpreted.
#[derive(Debug, Error)]
pub enum FeaturePayloadError {
    /// The payload was not valid JSON.
    #[error("feature payload for job {job_id} is not valid JSON")]
    Json {
        /// Occupation identifier.
        job_id: String,
        /// Source error from `serde_json`.
        #[source]
        source: serde_json::Error,
    },
    /// The payload was valid JSON but not an object.
    #[error("feature payload for job {job_id} must be a JSON object")]
    NotAnObject {
        /// Occupation identifier.
        job_id: String,
    },
}

/// Parsed feature vector for one occupation.
///
/// Levels are kept as raw JSON values; numeric coercion happens per feature
/// during scoring so one malformed level never discards the whole job.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobFeatureVector {
    /// Occupation identifier.
    pub job_id: String,
    features: Map<String, Value>,
}

impl JobFeatureVector {
    /// Construct a vector from already-decoded features.
    pub fn new(job_id: impl Into<String>, features: Map<String, Value>) -> Self {
        Self {
            job_id: job_id.into(),
            features,
        }
    }

    /// Parse a raw row's JSON document.
    ///
    /// Each level is decoded on its own. A numeric literal too large for
    /// `f64` (such as `1e400`) saturates to the largest finite value of its
    /// sign instead of rejecting the document, so it clamps to the ends of
    /// the level scale during scoring.
    ///
    /// # Errors
    /// Returns [`FeaturePayloadError`] when the document is not a JSON object.
    ///
    /// # Examples
    /// ```
    /// use pathbuilder_core::{JobFeatureVector, RawJobFeatures, coerce_level};
    ///
    /// let raw = RawJobFeatures::new("0011", r#"{"Repairing": 1e400}"#);
    /// let vector = JobFeatureVector::parse(&raw).expect("overflow saturates");
    /// let (_, level) = vector.iter().next().expect("one feature");
    /// assert_eq!(coerce_level(level), Some(f64::MAX));
    /// ```
    pub fn parse(raw: &RawJobFeatures) -> Result<Self, FeaturePayloadError> {
        let json_error = |source: serde_json::Error| FeaturePayloadError::Json {
            job_id: raw.job_id.clone(),
            source,
        };
        let document: Box<RawValue> =
            serde_json::from_str(&raw.features_json).map_err(json_error)?;
        if !document.get().starts_with('{') {
            return Err(FeaturePayloadError::NotAnObject {
                job_id: raw.job_id.clone(),
            });
        }
        let levels: BTreeMap<String, Box<RawValue>> =
            serde_json::from_str(document.get()).map_err(json_error)?;
        let features = levels
            .into_iter()
            .map(|(name, level)| (name, decode_level(&level)))
            .collect();
        Ok(Self::new(raw.job_id.clone(), features))
    }

    /// Add or replace a feature level, returning `self` for chaining.
    #[must_use]
    pub fn with_feature(mut self, name: impl Into<String>, level: impl Into<Value>) -> Self {
        self.features.insert(name.into(), level.into());
        self
    }

    /// Iterate over `(feature name, raw level)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.features.iter().map(|(name, level)| (name.as_str(), level))
    }

    /// Number of features, including ones whose level is malformed.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Report whether the vector has no features.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

fn decode_level(raw: &RawValue) -> Value {
    serde_json::from_str(raw.get()).unwrap_or_else(|_| {
        raw.get()
            .parse::<f64>()
            .ok()
            .filter(|level| level.is_infinite())
            .map_or(Value::Null, |level| Value::from(f64::MAX.copysign(level)))
    })
}

/// Coerce a raw feature level into a finite real number.
///
/// Numbers, numeric strings (after trimming) and booleans coerce; `null`,
/// arrays, objects, unparsable strings and non-finite values do not.
///
/// # Examples
/// ```
/// use pathbuilder_core::coerce_level;
/// use serde_json::json;
///
/// assert_eq!(coerce_level(&json!(3.5)), Some(3.5));
/// assert_eq!(coerce_level(&json!(" 4 ")), Some(4.0));
/// assert_eq!(coerce_level(&json!("high")), None);
/// ```
pub fn coerce_level(raw: &Value) -> Option<f64> {
    let level = match raw {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        Value::Bool(flag) => {
            if *flag {
                1.0
            } else {
                0.0
            }
        }
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    level.is_finite().then_some(level)
}

/// Clamp a 0–5 level and rescale it into `0.0..=1.0`.
pub fn scale_level(level: f64) -> f64 {
    if !level.is_finite() {
        return 0.0;
    }
    clamp_unit(level.clamp(0.0, LEVEL_SCALE_MAX) / LEVEL_SCALE_MAX)
}

/// One rubric row as stored in the raw table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricRow {
    /// Display name of the skill or ability.
    pub name: String,
    /// Substitution index on the 0–5 scale, if recorded.
    pub substitution_index: Option<f64>,
    /// Complementarity index on the 0–5 scale, if recorded.
    pub complementarity_index: Option<f64>,
}

impl RubricRow {
    /// Construct a fully-populated row.
    pub fn new(name: impl Into<String>, substitution_index: f64, complementarity_index: f64) -> Self {
        Self {
            name: name.into(),
            substitution_index: Some(substitution_index),
            complementarity_index: Some(complementarity_index),
        }
    }
}

/// Substitution and complementarity indices rescaled into `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RubricEntry {
    /// How readily automation performs the feature.
    pub substitution: f64,
    /// How much the feature enhances human–AI collaboration.
    pub complementarity: f64,
}

impl RubricEntry {
    /// Build an entry from 0–5 indices; missing values count as zero.
    pub fn from_indices(substitution_index: Option<f64>, complementarity_index: Option<f64>) -> Self {
        Self {
            substitution: scale_level(substitution_index.unwrap_or(0.0)),
            complementarity: scale_level(complementarity_index.unwrap_or(0.0)),
        }
    }
}

/// Rubric lookup keyed by [`normalize_key`].
///
/// # Examples
/// ```
/// use pathbuilder_core::Rubric;
///
/// let mut rubric = Rubric::new();
/// rubric.insert("Repairing", Some(5.0), Some(1.0));
/// let entry = rubric.get("  repairing. ").expect("normalised lookup");
/// assert_eq!(entry.substitution, 1.0);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Rubric {
    entries: HashMap<String, RubricEntry>,
}

impl Rubric {
    /// Construct an empty rubric.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a rubric from rows in source order; later duplicates win.
    pub fn from_rows<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a RubricRow>,
    {
        let mut rubric = Self::new();
        for row in rows {
            rubric.insert(&row.name, row.substitution_index, row.complementarity_index);
        }
        rubric
    }

    /// Insert or overwrite the entry for `name`.
    pub fn insert(
        &mut self,
        name: &str,
        substitution_index: Option<f64>,
        complementarity_index: Option<f64>,
    ) {
        self.entries.insert(
            normalize_key(name),
            RubricEntry::from_indices(substitution_index, complementarity_index),
        );
    }

    /// Look up a feature by display name.
    pub fn get(&self, feature_name: &str) -> Option<RubricEntry> {
        self.entries.get(&normalize_key(feature_name)).copied()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Report whether the rubric has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Share of a job's measured activity that falls in PCS categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobProfile {
    /// Occupation identifier.
    pub job_id: String,
    /// PCS share in `0.0..=1.0`.
    pub pcs_share: f64,
}

impl JobProfile {
    /// Construct a profile, clamping the share into `0.0..=1.0`.
    pub fn new(job_id: impl Into<String>, pcs_share: f64) -> Self {
        Self {
            job_id: job_id.into(),
            pcs_share: clamp_unit(pcs_share),
        }
    }
}

/// Cohort-relative job risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRisk {
    /// Occupation identifier.
    pub job_id: String,
    /// Risk in `0.0..=1.0`, meaningful only within its computation cohort.
    pub risk: f64,
}

impl JobRisk {
    /// Construct a row, clamping the risk into `0.0..=1.0`.
    pub fn new(job_id: impl Into<String>, risk: f64) -> Self {
        Self {
            job_id: job_id.into(),
            risk: clamp_unit(risk),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!(2), Some(2.0))]
    #[case(json!(2.5), Some(2.5))]
    #[case(json!("3.25"), Some(3.25))]
    #[case(json!(true), Some(1.0))]
    #[case(json!(false), Some(0.0))]
    #[case(json!(null), None)]
    #[case(json!("n/a"), None)]
    #[case(json!("NaN"), None)]
    #[case(json!([1, 2]), None)]
    #[case(json!({"level": 1}), None)]
    fn coerces_levels(#[case] raw: Value, #[case] expected: Option<f64>) {
        assert_eq!(coerce_level(&raw), expected);
    }

    #[rstest]
    #[case(5.0, 1.0)]
    #[case(2.5, 0.5)]
    #[case(7.0, 1.0)]
    #[case(-1.0, 0.0)]
    #[case(f64::INFINITY, 0.0)]
    fn scales_levels_into_unit_interval(#[case] level: f64, #[case] expected: f64) {
        assert_eq!(scale_level(level), expected);
    }

    #[test]
    fn parses_object_payloads() {
        let raw = RawJobFeatures::new("0011", r#"{"Repairing": 4, "Monitoring": "2"}"#);
        let vector = JobFeatureVector::parse(&raw).expect("valid payload");
        assert_eq!(vector.job_id, "0011");
        assert_eq!(vector.len(), 2);
    }

    #[rstest]
    #[case("1e400", f64::MAX)]
    #[case("-1e400", -f64::MAX)]
    fn overflowing_levels_saturate(#[case] literal: &str, #[case] expected: f64) {
        let payload = format!(r#"{{"Monitoring": 5, "Repairing": {literal}}}"#);
        let vector = JobFeatureVector::parse(&RawJobFeatures::new("0011", payload))
            .expect("an overflowing literal keeps the document");
        assert_eq!(vector.len(), 2);
        let levels: Vec<_> = vector.iter().map(|(_, level)| coerce_level(level)).collect();
        assert_eq!(levels, [Some(5.0), Some(expected)]);
    }

    #[test]
    fn malformed_nested_levels_become_null() {
        let raw = RawJobFeatures::new("0011", r#"{"Repairing": [1e400], "Monitoring": 2}"#);
        let vector = JobFeatureVector::parse(&raw).expect("valid payload");
        let levels: Vec<_> = vector.iter().map(|(name, level)| (name, level.clone())).collect();
        assert_eq!(levels, [("Monitoring", Value::from(2)), ("Repairing", Value::Null)]);
    }

    #[rstest]
    #[case("not json")]
    #[case("[1, 2, 3]")]
    #[case("42")]
    #[case(" \"text\" ")]
    fn rejects_non_object_payloads(#[case] payload: &str) {
        let raw = RawJobFeatures::new("0011", payload);
        assert!(JobFeatureVector::parse(&raw).is_err());
    }

    #[test]
    fn rubric_last_write_wins_on_normalised_name() {
        let rows = [
            RubricRow::new("Manual Dexterity", 5.0, 1.0),
            RubricRow::new("manual  dexterity!", 1.0, 5.0),
        ];
        let rubric = Rubric::from_rows(&rows);
        assert_eq!(rubric.len(), 1);
        let entry = rubric.get("Manual Dexterity").expect("entry present");
        assert_eq!(entry.substitution, 0.2);
        assert_eq!(entry.complementarity, 1.0);
    }

    #[test]
    fn rubric_indices_are_clamped_and_defaulted() {
        let mut rubric = Rubric::new();
        rubric.insert("Stamina", Some(9.0), None);
        let entry = rubric.get("stamina").expect("entry present");
        assert_eq!(entry.substitution, 1.0);
        assert_eq!(entry.complementarity, 0.0);
        assert!(rubric.get("Night Vision").is_none());
    }
}
