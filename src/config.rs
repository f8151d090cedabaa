//! Study configuration.
//!
//! Every parameter the core takes — epoch, season map, fiscal start month,
//! robustness thresholds, the outlier ceiling — is explicit. This module
//! reads them from a TOML study file and validates everything up front, so
//! configuration mistakes fail before any data is touched, never mid-batch.
//! The core modules take these values as plain arguments and have no
//! defaults of their own.
//!
//! Example study file:
//!
//! ```toml
//! epoch = "2018-01-01"
//! fiscal_start_month = 10
//! elevation_ceiling_m = 10000.0
//! bucket_by_water_year = true
//! fail_fast = false
//!
//! [[seasons]]
//! label = "frozen"
//! months = [11, 12, 1, 2, 3, 4]
//!
//! [[seasons]]
//! label = "intermediate_spring"
//! months = [5]
//!
//! [[seasons]]
//! label = "liquid"
//! months = [6, 7, 8, 9]
//!
//! [[seasons]]
//! label = "intermediate_fall"
//! months = [10]
//!
//! [thresholds]
//! max_std = 50.0
//! min_observation_count = 25
//! min_unique_date_count = 3
//! ```

use crate::analysis::groupings::Bucketing;
use crate::model::{AnalysisError, RobustnessThresholds, Strictness};
use crate::season::{SeasonMap, SeasonSpec};
use chrono::NaiveDate;
use serde::Deserialize;
use std::error::Error;
use std::fs;

// ---------------------------------------------------------------------------
// Configuration schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct StudyConfig {
    /// Mission epoch the `delta_time` offsets count from, as a quoted
    /// ISO 8601 date.
    pub epoch: NaiveDate,
    /// First month of the water year (October for the hydrologic default).
    pub fiscal_start_month: u32,
    /// Elevations at or above this are screened as gross outliers.
    pub elevation_ceiling_m: f64,
    /// Aggregate per water year rather than over the whole record.
    pub bucket_by_water_year: bool,
    /// Abort the batch on the first unconvertible record instead of
    /// skipping it.
    pub fail_fast: bool,
    pub seasons: Vec<SeasonSpec>,
    pub thresholds: RobustnessThresholds,
}

impl StudyConfig {
    /// Validates everything the §-by-§ setup checks require: fiscal month
    /// range, threshold sanity, ceiling sanity, and the season partition.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !(1..=12).contains(&self.fiscal_start_month) {
            return Err(AnalysisError::Configuration(format!(
                "fiscal_start_month must be 1-12, got {}",
                self.fiscal_start_month
            )));
        }
        if !self.elevation_ceiling_m.is_finite() || self.elevation_ceiling_m <= 0.0 {
            return Err(AnalysisError::Configuration(format!(
                "elevation_ceiling_m must be finite and positive, got {}",
                self.elevation_ceiling_m
            )));
        }
        self.thresholds.validate()?;
        SeasonMap::new(&self.seasons)?;
        Ok(())
    }

    /// The validated season map.
    pub fn season_map(&self) -> Result<SeasonMap, AnalysisError> {
        SeasonMap::new(&self.seasons)
    }

    pub fn bucketing(&self) -> Bucketing {
        if self.bucket_by_water_year {
            Bucketing::ByWaterYear
        } else {
            Bucketing::AllTime
        }
    }

    pub fn strictness(&self) -> Strictness {
        if self.fail_fast {
            Strictness::FailFast
        } else {
            Strictness::Lenient
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Parses a study file from TOML text and validates it.
pub fn parse_config(text: &str) -> Result<StudyConfig, Box<dyn Error>> {
    let config: StudyConfig = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
}

/// Loads and validates a study file from disk.
pub fn load_config(path: &str) -> Result<StudyConfig, Box<dyn Error>> {
    let text = fs::read_to_string(path)?;
    parse_config(&text)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn study_toml() -> String {
        r#"
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
            min_observation_count = 25
            min_unique_date_count = 3
        "#
        .to_string()
    }

    #[test]
    fn test_well_formed_study_file_loads() {
        let config = parse_config(&study_toml()).expect("study file should parse and validate");
        assert_eq!(config.epoch, NaiveDate::from_ymd_opt(2018, 1, 1).unwrap());
        assert_eq!(config.fiscal_start_month, 10);
        assert_eq!(config.thresholds.max_std, 50.0);
        assert_eq!(config.bucketing(), Bucketing::ByWaterYear);
        assert_eq!(config.strictness(), Strictness::Lenient);
        assert_eq!(config.season_map().unwrap(), SeasonMap::lake_phase_default());
    }

    #[test]
    fn test_duplicated_season_month_fails_validation() {
        let text = study_toml().replace("months = [5]", "months = [5, 10]");
        let result = parse_config(&text);
        assert!(
            result.is_err(),
            "month 10 mapped twice should fail before any data step"
        );
    }

    #[test]
    fn test_non_positive_max_std_fails_validation() {
        let text = study_toml().replace("max_std = 50.0", "max_std = 0.0");
        assert!(parse_config(&text).is_err());
    }

    #[test]
    fn test_out_of_range_fiscal_month_fails_validation() {
        let text = study_toml().replace("fiscal_start_month = 10", "fiscal_start_month = 13");
        assert!(parse_config(&text).is_err());
    }

    #[test]
    fn test_bad_ceiling_fails_validation() {
        let text =
            study_toml().replace("elevation_ceiling_m = 10000.0", "elevation_ceiling_m = -1.0");
        assert!(parse_config(&text).is_err());
    }

    #[test]
    fn test_missing_thresholds_table_is_a_parse_error() {
        let text = study_toml().replace("[thresholds]", "[thresholds_typo]");
        assert!(parse_config(&text).is_err());
    }

    #[test]
    fn test_all_time_and_fail_fast_selectors() {
        let text = study_toml()
            .replace("bucket_by_water_year = true", "bucket_by_water_year = false")
            .replace("fail_fast = false", "fail_fast = true");
        let config = parse_config(&text).unwrap();
        assert_eq!(config.bucketing(), Bucketing::AllTime);
        assert_eq!(config.strictness(), Strictness::FailFast);
    }
}
