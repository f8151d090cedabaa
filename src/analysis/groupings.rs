//! Per-(lake, time-bucket) aggregation.
//!
//! Groups observations by the composite (lake, bucket) key and computes one
//! `LakeSummary` per group: count, mean, sample standard deviation, sorted
//! unique observation dates, and the first lake-area attribute seen. The
//! whole input is held in memory — this is a one-pass-per-group
//! aggregation, not a streaming one, and peak memory is proportional to the
//! number of observations.
//!
//! The engine does not deduplicate: duplicate input records would inflate
//! counts and bias the statistics, and keeping them out is the ingest
//! side's contract.

use crate::model::{AnalysisError, LakeObservation, LakeSummary};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

// ---------------------------------------------------------------------------
// Time bucketing
// ---------------------------------------------------------------------------

/// Bucket label for the whole-record span.
pub const ALL_TIME_BUCKET: &str = "all";

/// The study's two standard time-bucketing schemes. `aggregate_with` accepts
/// an arbitrary bucket function for anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucketing {
    /// One bucket spanning the whole record, labeled `"all"`.
    AllTime,
    /// One bucket per water year, labeled by the observation's
    /// already-derived `water_year` field.
    ByWaterYear,
}

impl Bucketing {
    pub fn label_for(&self, observation: &LakeObservation) -> String {
        match self {
            Bucketing::AllTime => ALL_TIME_BUCKET.to_string(),
            Bucketing::ByWaterYear => observation.water_year.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Aggregates with a caller-supplied bucket function.
///
/// Output is sorted by (`lake_id`, `time_bucket`), so the result is
/// deterministic regardless of input order. Empty input yields an empty
/// vector; see `aggregate` for the strict variant.
pub fn aggregate_with<F>(observations: &[LakeObservation], bucket_fn: F) -> Vec<LakeSummary>
where
    F: Fn(&LakeObservation) -> String,
{
    struct Group {
        elevations: Vec<f64>,
        dates: BTreeSet<NaiveDate>,
        area_m2: Option<f64>,
    }

    let mut groups: BTreeMap<(String, String), Group> = BTreeMap::new();

    for obs in observations {
        let key = (obs.lake_id.clone(), bucket_fn(obs));
        let group = groups.entry(key).or_insert_with(|| Group {
            elevations: Vec::new(),
            dates: BTreeSet::new(),
            area_m2: None,
        });
        group.elevations.push(obs.elevation_m);
        group.dates.insert(obs.obs_date);
        // "first" semantics for the carried lake attribute.
        if group.area_m2.is_none() {
            group.area_m2 = obs.area_m2;
        }
    }

    groups
        .into_iter()
        .map(|((lake_id, time_bucket), group)| {
            let count = group.elevations.len();
            let mean = group.elevations.iter().sum::<f64>() / count as f64;
            let std = sample_std(&group.elevations, mean);
            let unique_dates: Vec<NaiveDate> = group.dates.into_iter().collect();
            LakeSummary {
                lake_id,
                time_bucket,
                elevation_mean: mean,
                elevation_std: std,
                observation_count: count,
                unique_date_count: unique_dates.len(),
                unique_dates,
                area_m2: group.area_m2,
                is_robust: None,
            }
        })
        .collect()
}

/// Aggregates under one of the standard bucketing schemes.
///
/// `require_nonempty` selects the strict mode of the empty-input contract:
/// when set, an empty input is `AnalysisError::EmptyInput`; otherwise it is
/// simply an empty summary set.
pub fn aggregate(
    observations: &[LakeObservation],
    bucketing: Bucketing,
    require_nonempty: bool,
) -> Result<Vec<LakeSummary>, AnalysisError> {
    if observations.is_empty() && require_nonempty {
        return Err(AnalysisError::EmptyInput);
    }
    Ok(aggregate_with(observations, |obs| bucketing.label_for(obs)))
}

/// Sample standard deviation (divisor N-1). Undefined (`NaN`) for a single
/// value — the robustness predicates treat NaN as failing, which is the
/// intended fate of one-observation groups.
fn sample_std(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
