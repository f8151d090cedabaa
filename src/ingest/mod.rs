//! Data ingest collaborators.
//!
//! Everything upstream of the analysis core: discovering and fetching
//! granules from the NSIDC archive, and reading the flat point tables the
//! external extraction + spatial-join steps produce. The core itself never
//! performs I/O; these modules hand it fully materialized records.
//!
//! Submodules:
//! - `nsidc` — granule discovery and download against the NASA CMR API.
//! - `points` — CSV ingest of extracted, lake-tagged point records.

pub mod nsidc;
pub mod points;
