//! The observation-to-lake analysis pipeline.
//!
//! A linear composition of stateless, pure transformations: derive calendar
//! fields, aggregate per (lake, time-bucket), classify group robustness,
//! join observations back to their groups. Every stage takes immutable
//! input and returns new records, so any stage can be re-run with new
//! parameters without re-deriving the ones upstream.
//!
//! Submodules:
//! - `derive` — attaches `obs_date`, `lake_phase`, and `water_year` to raw points.
//! - `groupings` — per-(lake, bucket) summary statistics.
//! - `robustness` — threshold classification and join-back.

pub mod derive;
pub mod groupings;
pub mod robustness;
