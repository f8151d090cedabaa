//! Lake surface elevation analysis from satellite laser altimetry.
//!
//! The crate turns extracted, lake-tagged ICESat-2 ATL06 point records into
//! per-lake summary statistics over configurable time buckets, classifies
//! each (lake, bucket) group as robust or not against caller-supplied
//! thresholds, and hands plain tables back out for plotting and GIS work.
//!
//! The analysis core (`timebase`, `season`, `analysis`) is pure and does no
//! I/O; acquisition, point-table ingest, and export are thin collaborators
//! around it (`ingest`, `export`), configured explicitly (`config`).

pub mod analysis;
pub mod config;
pub mod export;
pub mod ingest;
pub mod lakes;
pub mod logging;
pub mod model;
pub mod season;
pub mod timebase;
