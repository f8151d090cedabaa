//! Mission epoch time conversion.
//!
//! ATL06 timestamps are `delta_time` values: seconds elapsed since the
//! mission epoch (2018-01-01T00:00:00 UTC per the product dictionary).
//! Analysis only needs calendar dates, so conversion truncates to whole-day
//! granularity and discards time-of-day.
//!
//! # Epoch injection
//! The epoch is a parameter on every function rather than a constant baked
//! in here. This keeps conversion purely deterministic in tests and lets a
//! future product with a different epoch reuse the same converter.

use crate::model::AnalysisError;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

// ---------------------------------------------------------------------------
// Single-value conversion
// ---------------------------------------------------------------------------

/// Converts a `delta_time` offset to the calendar date it falls on.
///
/// Fractional seconds are floored before the offset is applied, which gives
/// the same date as full-resolution arithmetic would: sub-second precision
/// can never move a timestamp across a midnight boundary that whole seconds
/// don't. Negative offsets resolve to dates before the epoch.
///
/// Returns `AnalysisError::InvalidTimeOffset` for non-finite input, or for
/// offsets so large the resulting date is unrepresentable.
pub fn date_from_delta(delta_time: f64, epoch: NaiveDate) -> Result<NaiveDate, AnalysisError> {
    if !delta_time.is_finite() {
        return Err(AnalysisError::InvalidTimeOffset { delta_time });
    }

    // Saturating cast: absurdly large finite values saturate to i64 bounds,
    // which TimeDelta / checked_add_signed then reject below.
    let whole_seconds = delta_time.floor() as i64;
    let epoch_midnight = NaiveDateTime::new(epoch, NaiveTime::MIN);

    TimeDelta::try_seconds(whole_seconds)
        .and_then(|offset| epoch_midnight.checked_add_signed(offset))
        .map(|datetime| datetime.date())
        .ok_or(AnalysisError::InvalidTimeOffset { delta_time })
}

// ---------------------------------------------------------------------------
// Vectorized conversion
// ---------------------------------------------------------------------------

/// Converts a slice of offsets in one pass, failing fast on the first
/// invalid value.
///
/// Granule extractions run to hundreds of thousands of points; callers that
/// want to keep the valid records and account for the bad ones use
/// `analysis::derive::derive_observations` with `Strictness::Lenient`
/// instead.
pub fn dates_from_deltas(
    deltas: &[f64],
    epoch: NaiveDate,
) -> Result<Vec<NaiveDate>, AnalysisError> {
    deltas
        .iter()
        .map(|&delta| date_from_delta(delta, epoch))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
