//! Robustness classification and join-back.
//!
//! A lake group is "robust" when its summary statistics clear the
//! caller-supplied thresholds: low enough variance, enough observations,
//! enough distinct observation dates. Undersampled or noisy groups are
//! excluded from downstream analysis; the thresholds vary between study
//! passes and are always explicit parameters.
//!
//! Join mismatches are not errors. `join_observations_to_summaries` is an
//! inner join: an observation whose group was filtered out is silently
//! dropped. That is the contract, not a bug — callers wanting every row
//! tagged instead of filtered use `tag_robustness`.

use crate::analysis::groupings::Bucketing;
use crate::model::{JoinedObservation, LakeObservation, LakeSummary, RobustnessThresholds};
use chrono::NaiveDate;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Threshold predicates
// ---------------------------------------------------------------------------

/// All three predicates, strict:
///
///   elevation_std < max_std
///   observation_count > min_observation_count
///   unique_date_count > min_unique_date_count
///
/// A NaN standard deviation (single-observation group) fails the first
/// comparison, so such groups are never robust regardless of thresholds.
pub fn meets_thresholds(summary: &LakeSummary, thresholds: &RobustnessThresholds) -> bool {
    summary.elevation_std < thresholds.max_std
        && summary.observation_count > thresholds.min_observation_count
        && summary.unique_date_count > thresholds.min_unique_date_count
}

/// Returns the robust subset, preserving input order.
pub fn filter_robust(
    summaries: &[LakeSummary],
    thresholds: &RobustnessThresholds,
) -> Vec<LakeSummary> {
    summaries
        .iter()
        .filter(|s| meets_thresholds(s, thresholds))
        .cloned()
        .collect()
}

/// Returns the full input set with `is_robust` populated — non-destructive
/// tagging for callers that keep both populations (before/after plots).
pub fn tag_robustness(
    summaries: &[LakeSummary],
    thresholds: &RobustnessThresholds,
) -> Vec<LakeSummary> {
    summaries
        .iter()
        .map(|s| {
            let mut tagged = s.clone();
            tagged.is_robust = Some(meets_thresholds(s, thresholds));
            tagged
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Join-back
// ---------------------------------------------------------------------------

/// Inner-joins observations to summaries on (`lake_id`, bucket label) and
/// computes each point's deviation from its group mean.
///
/// The key is unique within `summaries` by construction of the aggregation,
/// so every observation matches at most one summary — the join never fans
/// out. Observations with no match (their group was filtered out upstream)
/// are dropped. Output follows the input observation order.
pub fn join_observations_to_summaries(
    observations: &[LakeObservation],
    summaries: &[LakeSummary],
    bucketing: Bucketing,
) -> Vec<JoinedObservation> {
    let by_key: HashMap<(&str, &str), &LakeSummary> = summaries
        .iter()
        .map(|s| ((s.lake_id.as_str(), s.time_bucket.as_str()), s))
        .collect();

    observations
        .iter()
        .filter_map(|obs| {
            let bucket = bucketing.label_for(obs);
            by_key
                .get(&(obs.lake_id.as_str(), bucket.as_str()))
                .map(|summary| JoinedObservation {
                    observation: obs.clone(),
                    summary: (*summary).clone(),
                    elevation_diff_from_mean: obs.elevation_m - summary.elevation_mean,
                })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Plot-preparation windows
// ---------------------------------------------------------------------------

/// Keeps joined points whose deviation from the group mean lies strictly
/// inside (`min_diff`, `max_diff`). Used to clip gross outliers from
/// histogram axes.
pub fn filter_by_diff_window(
    joined: &[JoinedObservation],
    min_diff: f64,
    max_diff: f64,
) -> Vec<JoinedObservation> {
    joined
        .iter()
        .filter(|j| j.elevation_diff_from_mean > min_diff && j.elevation_diff_from_mean < max_diff)
        .cloned()
        .collect()
}

/// Keeps observations dated strictly between `start` and `end` (both
/// exclusive, matching the study's subsetting behavior).
pub fn filter_by_date_window(
    observations: &[LakeObservation],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<LakeObservation> {
    observations
        .iter()
        .filter(|o| o.obs_date > start && o.obs_date < end)
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
