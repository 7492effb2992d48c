//! CSV parsing for the raw sources. Nothing here touches the database.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Read;

use log::warn;
use pathbuilder_core::{ExposureRecord, RawJobFeatures, RubricRow};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{error::SourceError, ids::normalize_job_id};

/// Occupation code column shared by the jobs and features sources.
pub const JOB_ID_COLUMN: &str = "NOC_CODE";
/// Occupation title column.
pub const TITLE_COLUMN: &str = "OASIS_LABEL";

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
}

/// One occupation code with a title.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobTitle {
    /// Normalised occupation code.
    pub job_id: String,
    /// Title as written in the source.
    pub title: String,
}

/// Occupations read from the jobs source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobCatalogue {
    /// One row per job id carrying its first title.
    pub jobs: Vec<JobTitle>,
    /// Every distinct (job id, title) pair in file order.
    pub titles: Vec<JobTitle>,
}

#[derive(Debug, Deserialize)]
struct JobSourceRow {
    #[serde(rename = "NOC_CODE")]
    code: String,
    #[serde(rename = "OASIS_LABEL")]
    title: String,
}

/// Read the jobs source.
///
/// Ids pass through [`normalize_job_id`] and rows without one are dropped.
///
/// # Errors
/// Returns [`SourceError::Csv`] when the input is not valid CSV or lacks the
/// `NOC_CODE` or `OASIS_LABEL` columns.
pub fn read_jobs<R: Read>(reader: R) -> Result<JobCatalogue, SourceError> {
    let mut catalogue = JobCatalogue::default();
    let mut seen_ids = HashSet::new();
    let mut seen_titles = HashSet::new();

    for record in csv_reader(reader).deserialize::<JobSourceRow>() {
        let row = record?;
        let entry = JobTitle {
            job_id: normalize_job_id(&row.code),
            title: row.title,
        };
        if entry.job_id.is_empty() {
            continue;
        }
        if seen_ids.insert(entry.job_id.clone()) {
            catalogue.jobs.push(entry.clone());
        }
        if seen_titles.insert(entry.clone()) {
            catalogue.titles.push(entry);
        }
    }
    Ok(catalogue)
}

#[derive(Debug)]
struct FeatureTotals {
    sums: Vec<f64>,
    rows: u32,
}

impl FeatureTotals {
    fn new(width: usize) -> Self {
        Self {
            sums: vec![0.0; width],
            rows: 0,
        }
    }

    fn add(&mut self, levels: impl Iterator<Item = f64>) {
        for (sum, level) in self.sums.iter_mut().zip(levels) {
            *sum += level;
        }
        self.rows = self.rows.saturating_add(1);
    }

    fn document(&self, names: &[(usize, String)]) -> Map<String, Value> {
        let rows = f64::from(self.rows.max(1));
        names
            .iter()
            .zip(&self.sums)
            .map(|((_, name), sum)| (name.clone(), Value::from(sum / rows)))
            .collect()
    }
}

fn parse_level(raw: &str) -> f64 {
    raw.parse::<f64>()
        .ok()
        .filter(|level| level.is_finite())
        .unwrap_or(0.0)
}

/// Read the wide job features source into one JSON document per job.
///
/// Every column other than `NOC_CODE` and `OASIS_LABEL` is a feature.
/// Values that do not parse as finite numbers count as `0`. Rows sharing a
/// job id are averaged feature by feature. Output is ordered by job id.
///
/// # Errors
/// Returns [`SourceError::MissingColumn`] when `NOC_CODE` is absent and
/// [`SourceError::Csv`] for malformed input.
///
/// # Examples
/// ```
/// use pathbuilder_data::read_job_features;
///
/// let csv = "NOC_CODE,OASIS_LABEL,Repairing\n1,Fitter,2\n1,Fitter,4\n";
/// let rows = read_job_features(csv.as_bytes()).expect("valid source");
/// assert_eq!(rows[0].job_id, "0001");
/// assert_eq!(rows[0].features_json, r#"{"Repairing":3.0}"#);
/// ```
pub fn read_job_features<R: Read>(reader: R) -> Result<Vec<RawJobFeatures>, SourceError> {
    let mut source = csv_reader(reader);
    let headers = source.headers()?.clone();
    let id_column = headers
        .iter()
        .position(|header| header == JOB_ID_COLUMN)
        .ok_or(SourceError::MissingColumn {
            column: JOB_ID_COLUMN,
        })?;
    let features: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(index, header)| *index != id_column && *header != TITLE_COLUMN)
        .map(|(index, header)| (index, header.to_owned()))
        .collect();

    let mut totals: BTreeMap<String, FeatureTotals> = BTreeMap::new();
    for record in source.records() {
        let row = record?;
        let job_id = normalize_job_id(row.get(id_column).unwrap_or_default());
        if job_id.is_empty() {
            continue;
        }
        let levels = features
            .iter()
            .map(|(index, _)| parse_level(row.get(*index).unwrap_or_default()));
        totals
            .entry(job_id)
            .or_insert_with(|| FeatureTotals::new(features.len()))
            .add(levels);
    }

    totals
        .into_iter()
        .map(|(job_id, total)| {
            match serde_json::to_string(&total.document(&features)) {
                Ok(json) => Ok(RawJobFeatures::new(job_id, json)),
                Err(source) => Err(SourceError::EncodeFeatures { job_id, source }),
            }
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct RubricSourceRow {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Substitution_Index", deserialize_with = "csv::invalid_option")]
    substitution_index: Option<f64>,
    #[serde(
        rename = "Complementarity_Index",
        deserialize_with = "csv::invalid_option"
    )]
    complementarity_index: Option<f64>,
}

/// Read the rubric source in file order.
///
/// Empty or non-numeric indices become `None` and are stored as `NULL`.
///
/// # Errors
/// Returns [`SourceError::Csv`] for malformed input or missing columns.
pub fn read_rubric<R: Read>(reader: R) -> Result<Vec<RubricRow>, SourceError> {
    csv_reader(reader)
        .deserialize::<RubricSourceRow>()
        .map(|record| -> Result<RubricRow, SourceError> {
            let row = record?;
            Ok(RubricRow {
                name: row.name,
                substitution_index: row.substitution_index,
                complementarity_index: row.complementarity_index,
            })
        })
        .collect()
}

/// One row of a province or ethnicity source.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExposureSourceRow {
    /// Lookup code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Raw exposure; higher is riskier.
    pub exposure_value: f64,
}

impl ExposureSourceRow {
    /// The raw exposure record carried by this row.
    #[must_use]
    pub fn exposure(&self) -> ExposureRecord {
        ExposureRecord::new(self.code.clone(), self.exposure_value)
    }
}

/// Read a province or ethnicity source with `code`, `name` and
/// `exposure_value` columns.
///
/// Rows with an empty code or a non-finite exposure (`NaN`, `inf`) are
/// skipped with a warning. A repeated code keeps the position of its first
/// row and the values of its last.
///
/// # Errors
/// Returns [`SourceError::Csv`] for malformed input, missing columns or an
/// exposure that is not a number.
pub fn read_exposures<R: Read>(reader: R) -> Result<Vec<ExposureSourceRow>, SourceError> {
    let mut rows: Vec<ExposureSourceRow> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for record in csv_reader(reader).deserialize::<ExposureSourceRow>() {
        let row = record?;
        if row.code.is_empty() {
            warn!("skipping exposure row without a code ({})", row.name);
            continue;
        }
        if !row.exposure_value.is_finite() {
            warn!(
                "skipping exposure row {} with non-finite value {}",
                row.code, row.exposure_value
            );
            continue;
        }
        match positions.get(&row.code).and_then(|index| rows.get_mut(*index)) {
            Some(existing) => *existing = row,
            None => {
                positions.insert(row.code.clone(), rows.len());
                rows.push(row);
            }
        }
    }
    Ok(rows)
}
