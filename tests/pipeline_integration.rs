//! End-to-end pipeline tests.
//!
//! Runs the full chain — point ingest, derived-field attachment,
//! aggregation, robustness classification, join-back, export — the way a
//! study script would, with every parameter supplied explicitly.

use chrono::NaiveDate;
use lakealt_service::analysis::derive::derive_observations;
use lakealt_service::analysis::groupings::{aggregate, Bucketing};
use lakealt_service::analysis::robustness::{
    filter_robust, join_observations_to_summaries, tag_robustness,
};
use lakealt_service::config::parse_config;
use lakealt_service::export::{joined_to_csv, summaries_to_csv};
use lakealt_service::ingest::points::{parse_points_csv, screen_gross_outliers};
use lakealt_service::model::{LakePoint, RobustnessThresholds, Strictness};
use lakealt_service::season::{SeasonMap, SeasonSpec};

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2018, 1, 1).unwrap()
}

/// The three-label map used by the early analysis pass.
fn three_phase_map() -> SeasonMap {
    SeasonMap::new(&[
        SeasonSpec::new("frozen", &[1, 2, 3, 4, 11, 12]),
        SeasonSpec::new("liquid", &[6, 7, 8, 9]),
        SeasonSpec::new("intermediate", &[5, 10]),
    ])
    .expect("three-phase map is a valid partition")
}

fn point(lake_id: &str, delta_time: f64, elevation_m: f64) -> LakePoint {
    LakePoint {
        lake_id: lake_id.to_string(),
        latitude: 67.0,
        longitude: -50.0,
        elevation_m,
        delta_time,
        beam_id: "gt1l".to_string(),
        area_m2: Some(184000.5),
    }
}

#[test]
fn three_point_lake_aggregates_and_classifies_robust() {
    // Three measurements on consecutive days from one lake; thresholds
    // std < 5, count > 2, unique dates > 2.
    let points = vec![
        point("A", 0.0, 10.0),
        point("A", 86_400.0, 12.0),
        point("A", 172_800.0, 11.0),
    ];

    let derived = derive_observations(&points, epoch(), &three_phase_map(), 10, Strictness::FailFast)
        .expect("all offsets are valid");
    assert_eq!(derived.observations.len(), 3);
    assert!(derived.skipped.is_empty());
    // January dates classify as frozen under either map variant.
    assert!(derived.observations.iter().all(|o| o.lake_phase == "frozen"));
    assert!(derived.observations.iter().all(|o| o.water_year == "WY2018"));

    let summaries = aggregate(&derived.observations, Bucketing::AllTime, true)
        .expect("input is non-empty");
    assert_eq!(summaries.len(), 1);

    let s = &summaries[0];
    assert_eq!((s.lake_id.as_str(), s.time_bucket.as_str()), ("A", "all"));
    assert_eq!(s.observation_count, 3);
    assert!((s.elevation_mean - 11.0).abs() < 1e-12);
    assert!((s.elevation_std - 1.0).abs() < 1e-9);
    assert_eq!(s.unique_date_count, 3);

    let thresholds = RobustnessThresholds {
        max_std: 5.0,
        min_observation_count: 2,
        min_unique_date_count: 2,
    };
    let tagged = tag_robustness(&summaries, &thresholds);
    assert_eq!(tagged[0].is_robust, Some(true));

    let robust = filter_robust(&summaries, &thresholds);
    assert_eq!(robust.len(), 1);

    let joined = join_observations_to_summaries(&derived.observations, &robust, Bucketing::AllTime);
    assert_eq!(joined.len(), 3);
    assert!((joined[0].elevation_diff_from_mean - (-1.0)).abs() < 1e-9);
}

#[test]
fn undersampled_lake_is_excluded_and_join_returns_nothing() {
    // Same three points, but the count threshold now demands more than 5
    // observations: the group is excluded, and joining against the
    // robust-only summaries drops every row.
    let points = vec![
        point("A", 0.0, 10.0),
        point("A", 86_400.0, 12.0),
        point("A", 172_800.0, 11.0),
    ];
    let derived = derive_observations(&points, epoch(), &three_phase_map(), 10, Strictness::FailFast)
        .expect("all offsets are valid");
    let summaries = aggregate(&derived.observations, Bucketing::AllTime, false).unwrap();

    let strict_thresholds = RobustnessThresholds {
        max_std: 5.0,
        min_observation_count: 5,
        min_unique_date_count: 2,
    };
    let robust = filter_robust(&summaries, &strict_thresholds);
    assert!(robust.is_empty(), "the group must not clear count > 5");

    let joined = join_observations_to_summaries(&derived.observations, &robust, Bucketing::AllTime);
    assert!(joined.is_empty(), "no summary row means no joined rows");
}

#[test]
fn config_driven_water_year_run_from_csv_to_export() {
    // A study-file-driven run: ingest a point table with one gross outlier
    // and one corrupt-free but unconvertible record, screen, derive
    // leniently, bucket by water year, tag, join, export.
    let study = r#"
        epoch = "2018-01-01"
        fiscal_start_month = 10
        elevation_ceiling_m = 10000.0
        bucket_by_water_year = true
        fail_fast = false

        [[seasons]]
        label = "frozen"
        months = [11, 12, 1, 2, 3, 4]

        [[seasons]]
        label = "intermediate_spring"
        months = [5]

        [[seasons]]
        label = "liquid"
        months = [6, 7, 8, 9]

        [[seasons]]
        label = "intermediate_fall"
        months = [10]

        [thresholds]
        max_std = 50.0
        min_observation_count = 2
        min_unique_date_count = 1
    "#;
    let config = parse_config(study).expect("study file should validate");

    // Day offsets: 1360 and 1361 fall in September 2021 (WY2021); 1370 and
    // 1371 in October 2021 (WY2022). 170239.0 m is a cloud-top return; the
    // NaN elevation row is sensor damage the screening must also catch.
    let day = 86_400.0;
    let csv = format!(
        "lake_id,latitude,longitude,elevation_m,delta_time,beam_id,area_m2\n\
         ID_230,67.0,-50.0,312.0,{},gt1l,184000.5\n\
         ID_230,67.0,-50.0,314.0,{},gt1r,184000.5\n\
         ID_230,67.0,-50.0,170239.0,{},gt2l,184000.5\n\
         ID_230,67.0,-50.0,318.0,{},gt2r,184000.5\n\
         ID_230,67.0,-50.0,316.0,{},gt3l,184000.5\n\
         ID_230,67.0,-50.0,NaN,{},gt3r,184000.5\n",
        1360.0 * day,
        1361.0 * day,
        1360.5 * day,
        1370.0 * day,
        1371.0 * day,
        1371.5 * day,
    );

    let points = parse_points_csv(&csv).expect("table should parse");
    assert_eq!(points.len(), 6);

    // Screening drops the cloud-top return and the NaN elevation row
    // (NaN never satisfies the keep predicate).
    let (mut screened, dropped) = screen_gross_outliers(points, config.elevation_ceiling_m);
    assert_eq!(dropped, 2);
    assert_eq!(screened.len(), 4);

    // Inject a record whose timestamp, not elevation, is the damage.
    screened.push(LakePoint {
        delta_time: f64::NAN,
        ..point("ID_230", 0.0, 320.0)
    });

    let season_map = config.season_map().unwrap();
    let derived = derive_observations(
        &screened,
        config.epoch,
        &season_map,
        config.fiscal_start_month,
        config.strictness(),
    )
    .expect("lenient derivation should not abort");
    assert_eq!(derived.observations.len(), 4);
    assert_eq!(derived.skipped.len(), 1);

    let summaries = aggregate(&derived.observations, config.bucketing(), true)
        .expect("non-empty input");
    assert_eq!(summaries.len(), 2, "one summary per water year");
    assert_eq!(summaries[0].time_bucket, "WY2021");
    assert_eq!(summaries[0].observation_count, 2);
    assert_eq!(summaries[1].time_bucket, "WY2022");
    assert_eq!(summaries[1].observation_count, 2);
    assert_eq!(summaries[0].area_m2, Some(184000.5));

    let tagged = tag_robustness(&summaries, &config.thresholds);
    assert!(tagged.iter().all(|s| s.is_robust == Some(false)),
        "count > 2 fails with exactly 2 observations per bucket");

    // Loosen the count threshold: both buckets become robust.
    let loose = RobustnessThresholds {
        min_observation_count: 1,
        ..config.thresholds
    };
    let robust = filter_robust(&summaries, &loose);
    assert_eq!(robust.len(), 2);

    let joined =
        join_observations_to_summaries(&derived.observations, &robust, config.bucketing());
    assert_eq!(joined.len(), 4);

    // Exported tables carry the derived fields and group statistics.
    let summary_csv = summaries_to_csv(&tagged);
    assert_eq!(summary_csv.lines().count(), 3);
    assert!(summary_csv.contains("ID_230,WY2021,"));
    assert!(summary_csv.contains("ID_230,WY2022,"));

    let joined_csv = joined_to_csv(&joined);
    assert_eq!(joined_csv.lines().count(), 5);
    assert!(joined_csv.contains("2021-09-")); // September dates, WY2021
    assert!(joined_csv.contains("2021-10-")); // October dates, WY2022
}

#[test]
fn rerunning_the_pipeline_replaces_summaries_identically() {
    // Aggregation is a pure function of its input: re-running the whole
    // chain yields an identical summary set, not an accumulated one.
    let points: Vec<LakePoint> = (0..10)
        .map(|i| point("A", i as f64 * 86_400.0, 100.0 + (i % 3) as f64))
        .collect();
    let derived = derive_observations(&points, epoch(), &three_phase_map(), 10, Strictness::FailFast)
        .expect("valid offsets");

    let first = aggregate(&derived.observations, Bucketing::AllTime, false).unwrap();
    let second = aggregate(&derived.observations, Bucketing::AllTime, false).unwrap();
    assert_eq!(first, second);
}
