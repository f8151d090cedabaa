//! Core data types for the lake altimetry analysis service.
//!
//! This module defines the shared domain model imported by all other modules.
//! It contains no logic beyond construction-time validation, no I/O, and no
//! external dependencies — only types.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

// ---------------------------------------------------------------------------
// Instrument constants
// ---------------------------------------------------------------------------

/// ICESat-2 data product carrying land-ice surface heights.
pub const PRODUCT_ATL06: &str = "ATL06";

/// Ground-track beam identifiers. Each granule carries six beams; the
/// extraction step tags every point with the beam it came from.
pub const BEAM_IDS: &[&str] = &["gt1l", "gt1r", "gt2l", "gt2r", "gt3l", "gt3r"];

// ---------------------------------------------------------------------------
// Point types
// ---------------------------------------------------------------------------

/// A single altimeter point measurement, as produced by the external
/// extraction and spatial-join steps.
///
/// `lake_id` is assigned upstream by the point-in-polygon join against the
/// lake boundary dataset; points falling outside every lake never reach
/// this crate. `area_m2` is a lake attribute the join carries along so the
/// aggregation can propagate it to summaries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LakePoint {
    pub lake_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation_m: f64,
    /// Seconds since the mission epoch (2018-01-01 for ATL06). The epoch
    /// itself is configuration — see `config::StudyConfig`.
    pub delta_time: f64,
    pub beam_id: String,
    pub area_m2: Option<f64>,
}

/// A `LakePoint` extended with the derived calendar fields.
///
/// Produced append-only by `analysis::derive::derive_observations`: the
/// input point is copied, never mutated. `obs_date` is a pure function of
/// `delta_time` and the epoch; `lake_phase` and `water_year` are pure
/// functions of `obs_date` and the study configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LakeObservation {
    pub lake_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation_m: f64,
    pub delta_time: f64,
    pub beam_id: String,
    pub area_m2: Option<f64>,
    pub obs_date: NaiveDate,
    pub lake_phase: String,
    pub water_year: String,
}

// ---------------------------------------------------------------------------
// Summary types
// ---------------------------------------------------------------------------

/// Per-(lake, time-bucket) summary statistics.
///
/// One row per distinct (`lake_id`, `time_bucket`) pair, where the bucket is
/// `"all"` or a water-year label depending on the `Bucketing` used. Created
/// once per aggregation run; immutable afterwards. Re-running aggregation on
/// updated input replaces the whole set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LakeSummary {
    pub lake_id: String,
    pub time_bucket: String,
    pub elevation_mean: f64,
    /// Sample standard deviation (divisor N-1). A group of size 1 carries
    /// `f64::NAN` here — undefined, not an error. NaN never satisfies a
    /// `< max_std` threshold, so such groups are never robust.
    pub elevation_std: f64,
    pub observation_count: usize,
    pub unique_date_count: usize,
    /// Distinct observation dates, sorted ascending.
    pub unique_dates: Vec<NaiveDate>,
    /// First area value seen for the group, in input order.
    pub area_m2: Option<f64>,
    /// `None` until `analysis::robustness::tag_robustness` runs.
    pub is_robust: Option<bool>,
}

/// An observation inner-joined to its group summary, with the per-point
/// deviation from the group mean computed during the join.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinedObservation {
    pub observation: LakeObservation,
    pub summary: LakeSummary,
    pub elevation_diff_from_mean: f64,
}

// ---------------------------------------------------------------------------
// Robustness thresholds
// ---------------------------------------------------------------------------

/// Caller-supplied thresholds separating robust lake groups from noisy or
/// undersampled ones. All three predicates are strict inequalities:
///
///   elevation_std < max_std
///   observation_count > min_observation_count
///   unique_date_count > min_unique_date_count
///
/// Different study passes use different values (the source analyses ranged
/// from `std < 30, count > 25` to `std < 50, count > 25, unique > 3`), so
/// these are always explicit configuration, never constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, serde::Deserialize)]
pub struct RobustnessThresholds {
    pub max_std: f64,
    pub min_observation_count: usize,
    pub min_unique_date_count: usize,
}

impl RobustnessThresholds {
    /// Validates the thresholds at setup time. `max_std` must be finite and
    /// positive; the counts are unsigned by type.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !self.max_std.is_finite() || self.max_std <= 0.0 {
            return Err(AnalysisError::Configuration(format!(
                "max_std must be finite and positive, got {}",
                self.max_std
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Per-record error policy
// ---------------------------------------------------------------------------

/// How derivation treats a record whose `delta_time` cannot be converted.
///
/// `FailFast` aborts the batch on the first bad record; `Lenient` collects
/// the failures and continues with the rest. Configuration errors are never
/// subject to this policy — they always halt before any data is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strictness {
    FailFast,
    Lenient,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors arising in the core analysis pipeline.
#[derive(Debug, PartialEq)]
pub enum AnalysisError {
    /// A `delta_time` was non-finite (NaN/infinite) or far enough out of
    /// range that no calendar date can represent it. Local to one record.
    InvalidTimeOffset { delta_time: f64 },
    /// The study configuration is malformed: the season map is not a
    /// partition of the twelve months, the thresholds are invalid, or the
    /// fiscal start month is out of range. Raised at setup, never mid-batch.
    Configuration(String),
    /// The input sequence was empty and the caller required at least one
    /// summary.
    EmptyInput,
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::InvalidTimeOffset { delta_time } => {
                write!(f, "invalid time offset: {}", delta_time)
            }
            AnalysisError::Configuration(msg) => write!(f, "configuration error: {}", msg),
            AnalysisError::EmptyInput => write!(f, "empty input: no observations to aggregate"),
        }
    }
}

impl std::error::Error for AnalysisError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
