//! Tabular export for plotting and GIS handoff.
//!
//! The analysis ends by handing plain tables to external tooling: CSV for
//! the QGIS/shapefile side and JSON for anything structured. Two format
//! rules come from the shapefile-bound path: list-valued columns are
//! dropped (`unique_dates` has no attribute-table representation), and an
//! undefined standard deviation renders as an empty field rather than the
//! literal `NaN`.

use crate::model::{JoinedObservation, LakeObservation, LakeSummary};
use std::error::Error;
use std::fs;

// ---------------------------------------------------------------------------
// CSV rendering
// ---------------------------------------------------------------------------

fn float_field(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        format!("{}", value)
    }
}

fn optional_field(value: Option<f64>) -> String {
    value.map(|v| format!("{}", v)).unwrap_or_default()
}

/// Renders summaries as CSV. The `unique_dates` list column is dropped;
/// `is_robust` is empty until a tagging pass has run.
pub fn summaries_to_csv(summaries: &[LakeSummary]) -> String {
    let mut out = String::from(
        "lake_id,time_bucket,elevation_mean,elevation_std,observation_count,unique_date_count,area_m2,is_robust\n",
    );
    for s in summaries {
        let is_robust = match s.is_robust {
            Some(flag) => flag.to_string(),
            None => String::new(),
        };
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{}\n",
            s.lake_id,
            s.time_bucket,
            float_field(s.elevation_mean),
            float_field(s.elevation_std),
            s.observation_count,
            s.unique_date_count,
            optional_field(s.area_m2),
            is_robust
        ));
    }
    out
}

/// Renders observations as CSV with the derived fields stringified
/// (ISO 8601 dates).
pub fn observations_to_csv(observations: &[LakeObservation]) -> String {
    let mut out = String::from(
        "lake_id,latitude,longitude,elevation_m,delta_time,beam_id,area_m2,obs_date,lake_phase,water_year\n",
    );
    for o in observations {
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{}\n",
            o.lake_id,
            o.latitude,
            o.longitude,
            o.elevation_m,
            o.delta_time,
            o.beam_id,
            optional_field(o.area_m2),
            o.obs_date.format("%Y-%m-%d"),
            o.lake_phase,
            o.water_year
        ));
    }
    out
}

/// Renders joined rows as CSV: the observation plus its group statistics
/// and the per-point deviation from the group mean.
pub fn joined_to_csv(joined: &[JoinedObservation]) -> String {
    let mut out = String::from(
        "lake_id,latitude,longitude,elevation_m,obs_date,lake_phase,water_year,time_bucket,lake_elevation_mean,lake_elevation_std,elevation_diff_from_mean\n",
    );
    for j in joined {
        let o = &j.observation;
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{},{}\n",
            o.lake_id,
            o.latitude,
            o.longitude,
            o.elevation_m,
            o.obs_date.format("%Y-%m-%d"),
            o.lake_phase,
            o.water_year,
            j.summary.time_bucket,
            float_field(j.summary.elevation_mean),
            float_field(j.summary.elevation_std),
            float_field(j.elevation_diff_from_mean)
        ));
    }
    out
}

// ---------------------------------------------------------------------------
// File writers
// ---------------------------------------------------------------------------

/// Writes rendered CSV to a file.
pub fn write_csv(path: &str, content: &str) -> Result<(), Box<dyn Error>> {
    fs::write(path, content)?;
    Ok(())
}

/// Writes summaries as pretty-printed JSON. Non-finite floats (a NaN
/// standard deviation) serialize as `null`.
pub fn write_summaries_json(path: &str, summaries: &[LakeSummary]) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(summaries)?;
    fs::write(path, json)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
