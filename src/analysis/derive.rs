//! Derived-field attachment.
//!
//! Turns raw `LakePoint`s into `LakeObservation`s by deriving the calendar
//! date from `delta_time` and classifying it into a lake phase and water
//! year. Attachment is append-only: a new record is built per point and the
//! input is never touched.

use crate::model::{AnalysisError, LakeObservation, LakePoint, Strictness};
use crate::season::{self, SeasonMap};
use crate::timebase;
use chrono::NaiveDate;

/// A point dropped during lenient derivation, with enough context to
/// account for it in logs.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedPoint {
    /// Position in the input slice.
    pub index: usize,
    pub lake_id: String,
    pub delta_time: f64,
}

/// Result of a derivation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Derived {
    pub observations: Vec<LakeObservation>,
    /// Empty under `Strictness::FailFast` (a bad record errors instead).
    pub skipped: Vec<SkippedPoint>,
}

/// Attaches `obs_date`, `lake_phase`, and `water_year` to every point.
///
/// A point whose `delta_time` cannot be converted is local damage, not a
/// batch failure: under `Strictness::Lenient` it lands in `skipped` and the
/// rest proceed; under `Strictness::FailFast` the first such point aborts
/// the batch with `AnalysisError::InvalidTimeOffset`.
pub fn derive_observations(
    points: &[LakePoint],
    epoch: NaiveDate,
    seasons: &SeasonMap,
    fiscal_start_month: u32,
    strictness: Strictness,
) -> Result<Derived, AnalysisError> {
    let mut observations = Vec::with_capacity(points.len());
    let mut skipped = Vec::new();

    for (index, point) in points.iter().enumerate() {
        let obs_date = match timebase::date_from_delta(point.delta_time, epoch) {
            Ok(date) => date,
            Err(err) => match strictness {
                Strictness::FailFast => return Err(err),
                Strictness::Lenient => {
                    skipped.push(SkippedPoint {
                        index,
                        lake_id: point.lake_id.clone(),
                        delta_time: point.delta_time,
                    });
                    continue;
                }
            },
        };

        observations.push(LakeObservation {
            lake_id: point.lake_id.clone(),
            latitude: point.latitude,
            longitude: point.longitude,
            elevation_m: point.elevation_m,
            delta_time: point.delta_time,
            beam_id: point.beam_id.clone(),
            area_m2: point.area_m2,
            obs_date,
            lake_phase: seasons.phase_for(obs_date).to_string(),
            water_year: season::water_year(obs_date, fiscal_start_month),
        });
    }

    Ok(Derived {
        observations,
        skipped,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn epoch() -> NaiveDate {
        NaiveDate::from_ymd_opt(2018, 1, 1).unwrap()
    }

    fn point(lake_id: &str, delta_time: f64, elevation_m: f64) -> LakePoint {
        LakePoint {
            lake_id: lake_id.to_string(),
            latitude: 67.0,
            longitude: -50.0,
            elevation_m,
            delta_time,
            beam_id: "gt1l".to_string(),
            area_m2: Some(120_000.0),
        }
    }

    #[test]
    fn test_derivation_attaches_all_three_fields() {
        // 2021-07-15 is 1291 days past the epoch: liquid phase, WY2021.
        let delta = 1291.0 * 86_400.0;
        let derived = derive_observations(
            &[point("ID_230", delta, 312.5)],
            epoch(),
            &SeasonMap::lake_phase_default(),
            10,
            Strictness::FailFast,
        )
        .expect("valid point should derive");

        assert_eq!(derived.observations.len(), 1);
        let obs = &derived.observations[0];
        assert_eq!(obs.obs_date, NaiveDate::from_ymd_opt(2021, 7, 15).unwrap());
        assert_eq!(obs.lake_phase, "liquid");
        assert_eq!(obs.water_year, "WY2021");
        // Raw fields carried through unchanged.
        assert_eq!(obs.lake_id, "ID_230");
        assert_eq!(obs.elevation_m, 312.5);
        assert_eq!(obs.area_m2, Some(120_000.0));
    }

    #[test]
    fn test_input_points_are_not_consumed_or_mutated() {
        let points = vec![point("A", 0.0, 10.0)];
        let before = points.clone();
        let _ = derive_observations(
            &points,
            epoch(),
            &SeasonMap::lake_phase_default(),
            10,
            Strictness::FailFast,
        )
        .expect("should derive");
        assert_eq!(points, before, "derivation must not mutate its input");
    }

    #[test]
    fn test_fail_fast_aborts_on_first_bad_record() {
        let points = vec![point("A", 0.0, 10.0), point("A", f64::NAN, 11.0)];
        let result = derive_observations(
            &points,
            epoch(),
            &SeasonMap::lake_phase_default(),
            10,
            Strictness::FailFast,
        );
        assert!(
            matches!(result, Err(AnalysisError::InvalidTimeOffset { .. })),
            "FailFast should surface the record error, got {:?}",
            result
        );
    }

    #[test]
    fn test_lenient_skips_bad_records_and_keeps_the_rest() {
        let points = vec![
            point("A", 0.0, 10.0),
            point("B", f64::NAN, 11.0),
            point("C", 86_400.0, 12.0),
        ];
        let derived = derive_observations(
            &points,
            epoch(),
            &SeasonMap::lake_phase_default(),
            10,
            Strictness::Lenient,
        )
        .expect("lenient derivation should not error on record damage");

        assert_eq!(derived.observations.len(), 2);
        assert_eq!(derived.skipped.len(), 1);
        assert_eq!(derived.skipped[0].index, 1);
        assert_eq!(derived.skipped[0].lake_id, "B");
        assert!(derived.skipped[0].delta_time.is_nan());
    }

    #[test]
    fn test_empty_input_derives_to_empty_output() {
        let derived = derive_observations(
            &[],
            epoch(),
            &SeasonMap::lake_phase_default(),
            10,
            Strictness::FailFast,
        )
        .expect("empty input is not an error here");
        assert!(derived.observations.is_empty());
        assert!(derived.skipped.is_empty());
    }
}
