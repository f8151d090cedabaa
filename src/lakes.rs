//! Study region registry and lake metadata.
//!
//! Defines the canonical acquisition windows for the study — the bounding
//! geometry and date range every granule query derives from — and loads the
//! lake attribute table produced by the external spatial join. This is the
//! single source of truth for query parameters: other modules should
//! reference regions from here rather than hardcoding coordinates.
//!
//! Lake identifiers themselves are assigned upstream (each point arrives
//! tagged with the polygon that contains it); this module only carries the
//! per-lake attributes the analysis wants to look up on demand.

use std::error::Error;
use std::fs;

pub use crate::model::{BEAM_IDS, PRODUCT_ATL06};

// ---------------------------------------------------------------------------
// Study regions
// ---------------------------------------------------------------------------

/// One named acquisition window: where and when to query granules.
pub struct StudyRegion {
    pub name: &'static str,
    /// Human-readable description of the region's role in the study.
    pub description: &'static str,
    /// WGS84 bounding box as (west, south, east, north) degrees.
    pub bbox: [f64; 4],
    /// Acquisition window, ISO 8601 calendar dates (inclusive).
    pub start_date: &'static str,
    pub end_date: &'static str,
}

/// All acquisition windows used by the study.
pub static STUDY_REGIONS: &[StudyRegion] = &[
    StudyRegion {
        name: "west-greenland-margin",
        description: "Ice-marginal lake belt along the western Greenland \
                      ablation zone. Primary study region; bounds drawn \
                      around the IIML lake inventory coverage.",
        bbox: [-51.75, 66.85, -48.50, 69.10],
        start_date: "2022-11-01",
        end_date: "2023-03-01",
    },
    StudyRegion {
        name: "west-greenland-multiyear",
        description: "Same footprint, widened to the full mission record \
                      for the water-year analysis.",
        bbox: [-51.75, 66.85, -48.50, 69.10],
        start_date: "2018-10-14",
        end_date: "2023-09-30",
    },
];

/// Looks up a region by name. Returns `None` if not found.
pub fn find_region(name: &str) -> Option<&'static StudyRegion> {
    STUDY_REGIONS.iter().find(|r| r.name == name)
}

// ---------------------------------------------------------------------------
// Lake metadata
// ---------------------------------------------------------------------------

/// Per-lake attributes from the spatial join's attribute table export:
/// identifier, surface area, and centroid position.
#[derive(Debug, Clone, PartialEq)]
pub struct LakeRecord {
    pub lake_id: String,
    pub area_m2: f64,
    pub latitude: f64,
    pub longitude: f64,
}

/// Parses the lake attribute CSV (`lake_id,area_m2,latitude,longitude`,
/// header row required). Blank lines are skipped; a malformed data row is
/// an error rather than silently dropped, since the table is small and
/// hand-exported.
pub fn parse_lakes_csv(csv: &str) -> Result<Vec<LakeRecord>, Box<dyn Error>> {
    let mut lakes = Vec::new();

    for (line_number, line) in csv.lines().enumerate() {
        if line_number == 0 || line.trim().is_empty() {
            continue; // Skip header or empty lines
        }

        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < 4 {
            return Err(format!(
                "lake table line {}: expected 4 fields, got {}",
                line_number + 1,
                fields.len()
            )
            .into());
        }

        lakes.push(LakeRecord {
            lake_id: fields[0].trim().to_string(),
            area_m2: fields[1].trim().parse()?,
            latitude: fields[2].trim().parse()?,
            longitude: fields[3].trim().parse()?,
        });
    }

    Ok(lakes)
}

/// Reads and parses the lake attribute table from a file.
pub fn load_lakes(path: &str) -> Result<Vec<LakeRecord>, Box<dyn Error>> {
    let csv = fs::read_to_string(path)?;
    parse_lakes_csv(&csv)
}

/// Looks up a lake by identifier. Returns `None` if not found.
pub fn find_lake<'a>(lakes: &'a [LakeRecord], lake_id: &str) -> Option<&'a LakeRecord> {
    lakes.iter().find(|l| l.lake_id == lake_id)
}

/// All lake identifiers, in table order.
pub fn all_lake_ids(lakes: &[LakeRecord]) -> Vec<&str> {
    lakes.iter().map(|l| l.lake_id.as_str()).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
