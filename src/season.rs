//! Seasonal lake-phase classification and water-year labeling.
//!
//! Greenland lakes cycle through frozen, transitional, and open-water
//! states over the year, and hydrologic accounting runs on water years
//! (October through September, labeled by the ending calendar year). Both
//! classifications are pure functions of the observation date.
//!
//! The month-to-phase mapping is study configuration, not a fixed enum:
//! different analysis passes have used a four-phase map (split spring/fall
//! shoulder seasons) and a three-phase map. `SeasonMap` validates at
//! construction that its labels partition the twelve months — a month
//! mapped twice or not at all is rejected before any data is touched, so
//! classification itself is total and infallible.

use crate::model::AnalysisError;
use chrono::{Datelike, NaiveDate, TimeDelta};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Season map
// ---------------------------------------------------------------------------

/// One label and the calendar months it covers, as written in the study
/// configuration file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SeasonSpec {
    pub label: String,
    pub months: Vec<u32>,
}

impl SeasonSpec {
    pub fn new(label: &str, months: &[u32]) -> Self {
        SeasonSpec {
            label: label.to_string(),
            months: months.to_vec(),
        }
    }
}

/// A validated month-to-label partition.
///
/// Construction checks that every month 1–12 is claimed by exactly one
/// label; lookup is then a total array index.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonMap {
    labels: Vec<String>,
    /// Index into `labels`, one slot per month (January first).
    month_to_label: [usize; 12],
}

impl SeasonMap {
    /// Builds a season map, validating the partition.
    ///
    /// Fails with `AnalysisError::Configuration` if a month is outside 1–12,
    /// claimed by more than one label, left unclaimed, or if a label name
    /// repeats.
    pub fn new(spec: &[SeasonSpec]) -> Result<SeasonMap, AnalysisError> {
        let mut labels: Vec<String> = Vec::with_capacity(spec.len());
        let mut month_to_label: [Option<usize>; 12] = [None; 12];

        for season in spec {
            if labels.contains(&season.label) {
                return Err(AnalysisError::Configuration(format!(
                    "season label '{}' appears more than once",
                    season.label
                )));
            }
            let label_index = labels.len();
            labels.push(season.label.clone());

            for &month in &season.months {
                if !(1..=12).contains(&month) {
                    return Err(AnalysisError::Configuration(format!(
                        "season '{}' lists invalid month {}",
                        season.label, month
                    )));
                }
                let slot = &mut month_to_label[(month - 1) as usize];
                if let Some(existing) = slot {
                    return Err(AnalysisError::Configuration(format!(
                        "month {} mapped to both '{}' and '{}'",
                        month, labels[*existing], season.label
                    )));
                }
                *slot = Some(label_index);
            }
        }

        let mut resolved = [0usize; 12];
        for (index, slot) in month_to_label.iter().enumerate() {
            match slot {
                Some(label_index) => resolved[index] = *label_index,
                None => {
                    return Err(AnalysisError::Configuration(format!(
                        "month {} is not mapped to any season",
                        index + 1
                    )));
                }
            }
        }

        Ok(SeasonMap {
            labels,
            month_to_label: resolved,
        })
    }

    /// The study's standing four-phase map: November through April frozen,
    /// May and October transitional, June through September liquid.
    pub fn lake_phase_default() -> SeasonMap {
        SeasonMap {
            labels: vec![
                "frozen".to_string(),
                "intermediate_spring".to_string(),
                "liquid".to_string(),
                "intermediate_fall".to_string(),
            ],
            // Jan Feb Mar Apr May Jun Jul Aug Sep Oct Nov Dec
            month_to_label: [0, 0, 0, 0, 1, 2, 2, 2, 2, 3, 0, 0],
        }
    }

    /// Classifies a date. Total: the partition check in `new` guarantees
    /// every month has a label.
    pub fn phase_for(&self, date: NaiveDate) -> &str {
        let month_index = (date.month() - 1) as usize;
        &self.labels[self.month_to_label[month_index]]
    }

    /// The labels in declaration order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

// ---------------------------------------------------------------------------
// Water years
// ---------------------------------------------------------------------------

/// Hydrologic water years start in October by convention.
pub const DEFAULT_FISCAL_START_MONTH: u32 = 10;

/// Labels the water year containing `date`.
///
/// A water year is named for the calendar year it ends in: dates in or
/// after the fiscal start month belong to the next year's label.
/// `water_year(2022-09-30, 10)` is `"WY2022"`; `water_year(2022-10-01, 10)`
/// is `"WY2023"`. Total over all valid dates.
pub fn water_year(date: NaiveDate, fiscal_start_month: u32) -> String {
    let ending_year = if date.month() >= fiscal_start_month {
        date.year() + 1
    } else {
        date.year()
    };
    format!("WY{}", ending_year)
}

/// First and last calendar day (inclusive) of the water year ending in
/// `ending_year`.
///
/// Fails only for out-of-range fiscal months or years beyond chrono's
/// representable dates.
pub fn water_year_span(
    ending_year: i32,
    fiscal_start_month: u32,
) -> Result<(NaiveDate, NaiveDate), AnalysisError> {
    if !(1..=12).contains(&fiscal_start_month) {
        return Err(AnalysisError::Configuration(format!(
            "fiscal start month must be 1-12, got {}",
            fiscal_start_month
        )));
    }
    let start = NaiveDate::from_ymd_opt(ending_year - 1, fiscal_start_month, 1).ok_or_else(
        || AnalysisError::Configuration(format!("water year {} start is unrepresentable", ending_year)),
    )?;
    let next_start = NaiveDate::from_ymd_opt(ending_year, fiscal_start_month, 1).ok_or_else(
        || AnalysisError::Configuration(format!("water year {} end is unrepresentable", ending_year)),
    )?;
    let end = next_start - TimeDelta::days(1);
    Ok((start, end))
}

/// 1-based day index of `date` within its containing water year.
///
/// The first day of the water year is 1; the last is 365 or 366. Used to
/// color observations by progress through the water year when plotting.
pub fn day_of_water_year(date: NaiveDate, fiscal_start_month: u32) -> Result<u32, AnalysisError> {
    if !(1..=12).contains(&fiscal_start_month) {
        return Err(AnalysisError::Configuration(format!(
            "fiscal start month must be 1-12, got {}",
            fiscal_start_month
        )));
    }
    let start_year = if date.month() >= fiscal_start_month {
        date.year()
    } else {
        date.year() - 1
    };
    let start = NaiveDate::from_ymd_opt(start_year, fiscal_start_month, 1).ok_or_else(|| {
        AnalysisError::Configuration(format!("water year starting {} is unrepresentable", start_year))
    })?;
    Ok((date - start).num_days() as u32 + 1)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
