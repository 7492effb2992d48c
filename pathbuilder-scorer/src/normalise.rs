//! Min–max normalisation shared by exposure dimensions and job risk.
#![forbid(unsafe_code)]

use log::warn;
use pathbuilder_core::{ExposureRecord, NormalizedRisk, clamp_unit};

/// Risk assigned to every member of a cohort whose values are all equal.
pub const DEGENERATE_RISK: f64 = 0.5;

/// Rescale `values` into `0.0..=1.0` relative to their own range.
///
/// An empty slice yields an empty vector and a single-valued cohort maps to
/// [`DEGENERATE_RISK`]. Inputs are expected to be finite.
///
/// # Examples
/// ```
/// use pathbuilder_scorer::min_max_scale;
///
/// assert_eq!(min_max_scale(&[10.0, 20.0, 30.0]), vec![0.0, 0.5, 1.0]);
/// assert_eq!(min_max_scale(&[4.0, 4.0]), vec![0.5, 0.5]);
/// ```
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "min-max scaling divides each offset by the cohort range"
)]
pub fn min_max_scale(values: &[f64]) -> Vec<f64> {
    let Some((min, max)) = bounds(values) else {
        return Vec::new();
    };
    let range = max - min;
    if range <= 0.0 {
        return vec![DEGENERATE_RISK; values.len()];
    }
    if range.is_finite() {
        return values
            .iter()
            .map(|value| clamp_unit((value - min) / range))
            .collect();
    }
    // The span of two finite values can overflow; halving keeps it finite.
    let half_range = max / 2.0 - min / 2.0;
    values
        .iter()
        .map(|value| clamp_unit((value / 2.0 - min / 2.0) / half_range))
        .collect()
}

fn bounds(values: &[f64]) -> Option<(f64, f64)> {
    let mut iter = values.iter().copied();
    let first = iter.next()?;
    Some(iter.fold((first, first), |(min, max), value| {
        (min.min(value), max.max(value))
    }))
}

/// Normalise one dimension's raw exposures into risk rows ordered by key.
///
/// Rows with a non-finite exposure cannot be ranked and are dropped with a
/// warning. An empty input yields an empty output, which clears the
/// dimension's stored risk when written back.
///
/// # Examples
/// ```
/// use pathbuilder_core::ExposureRecord;
/// use pathbuilder_scorer::normalise_dimension;
///
/// let rows = normalise_dimension(&[
///     ExposureRecord::new("QC", 20.0),
///     ExposureRecord::new("ON", 10.0),
///     ExposureRecord::new("AB", 30.0),
/// ]);
/// let risks: Vec<_> = rows.iter().map(|row| (row.key.as_str(), row.risk)).collect();
/// assert_eq!(risks, [("AB", 1.0), ("ON", 0.0), ("QC", 0.5)]);
/// ```
#[must_use]
pub fn normalise_dimension(records: &[ExposureRecord]) -> Vec<NormalizedRisk> {
    let mut finite: Vec<&ExposureRecord> = records
        .iter()
        .filter(|record| {
            let keep = record.exposure_value.is_finite();
            if !keep {
                warn!(
                    "dropping exposure for {} with non-finite value {}",
                    record.key, record.exposure_value
                );
            }
            keep
        })
        .collect();
    finite.sort_by(|left, right| left.key.cmp(&right.key));

    let values: Vec<f64> = finite.iter().map(|record| record.exposure_value).collect();
    finite
        .iter()
        .zip(min_max_scale(&values))
        .map(|(record, risk)| NormalizedRisk::new(record.key.clone(), risk))
        .collect()
}
