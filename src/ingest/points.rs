//! Point-table ingest.
//!
//! The extraction step walks each granule's six beam groups and flattens
//! them into one table of point records; the spatial join then tags each
//! record with the lake that contains it and the lake's area attribute.
//! This module reads that table (CSV) into `LakePoint`s and screens the
//! physically impossible elevations the altimeter occasionally reports.

use crate::model::LakePoint;
use std::error::Error;
use std::fs;

/// Expected column order of the point table:
/// `lake_id,latitude,longitude,elevation_m,delta_time,beam_id,area_m2`.
const POINT_FIELD_COUNT: usize = 7;

// ---------------------------------------------------------------------------
// CSV parsing
// ---------------------------------------------------------------------------

/// Parses the lake-tagged point table.
///
/// The header row is skipped. Rows with fewer than the expected fields are
/// skipped as incomplete (granule extractions end with partial lines often
/// enough that aborting on them would lose whole files). A complete row
/// whose required numeric field does not parse is an error — that is
/// corruption, not truncation. `area_m2` may be `null` or empty.
pub fn parse_points_csv(csv: &str) -> Result<Vec<LakePoint>, Box<dyn Error>> {
    let mut points = Vec::new();

    for (i, line) in csv.lines().enumerate() {
        if i == 0 || line.trim().is_empty() {
            continue; // Skip header or empty lines
        }

        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < POINT_FIELD_COUNT {
            continue; // Skip incomplete rows
        }

        // Helper to parse optional values that might be "null"
        let parse_optional = |s: &str| -> Option<f64> {
            if s.trim() == "null" || s.trim().is_empty() {
                None
            } else {
                s.trim().parse().ok()
            }
        };

        let line_number = i + 1;
        let required = |s: &str, name: &str| -> Result<f64, Box<dyn Error>> {
            s.trim()
                .parse()
                .map_err(|_| format!("line {}: bad {} value '{}'", line_number, name, s).into())
        };

        points.push(LakePoint {
            lake_id: fields[0].trim().to_string(),
            latitude: required(fields[1], "latitude")?,
            longitude: required(fields[2], "longitude")?,
            elevation_m: required(fields[3], "elevation")?,
            delta_time: required(fields[4], "delta_time")?,
            beam_id: fields[5].trim().to_string(),
            area_m2: parse_optional(fields[6]),
        });
    }

    Ok(points)
}

/// Reads and parses a point table from a file.
pub fn read_points_file(path: &str) -> Result<Vec<LakePoint>, Box<dyn Error>> {
    let csv = fs::read_to_string(path)?;
    parse_points_csv(&csv)
}

// ---------------------------------------------------------------------------
// Gross-outlier screening
// ---------------------------------------------------------------------------

/// Drops points at or above the elevation ceiling, keeping input order.
///
/// ATL06 heights over cloud tops and bad returns can run to tens of
/// thousands of meters; the study screens everything at or above the
/// configured ceiling (10 km over Greenland) before any aggregation.
/// Returns the kept points and the dropped count so callers can log it —
/// the drop must be visible, never silent.
pub fn screen_gross_outliers(points: Vec<LakePoint>, ceiling_m: f64) -> (Vec<LakePoint>, usize) {
    let before = points.len();
    let kept: Vec<LakePoint> = points
        .into_iter()
        .filter(|p| p.elevation_m < ceiling_m)
        .collect();
    let dropped = before - kept.len();
    (kept, dropped)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
