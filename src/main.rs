//! Command-line entry point for the lake altimetry service.
//!
//! Three modes:
//!
//!   lakealt_service search <region>
//!       List ATL06 granules for a registered study region.
//!
//!   lakealt_service download <region> <dest_dir>
//!       Fetch those granules with an Earthdata token (EARTHDATA_TOKEN,
//!       .env honored).
//!
//!   lakealt_service analyze <study.toml> <points.csv> <out_dir>
//!       Run the full analysis over an extracted, lake-tagged point table
//!       and write the summary and joined-point tables.

use lakealt_service::analysis::derive::derive_observations;
use lakealt_service::analysis::groupings::aggregate;
use lakealt_service::analysis::robustness::{
    filter_robust, join_observations_to_summaries, tag_robustness,
};
use lakealt_service::config::load_config;
use lakealt_service::export;
use lakealt_service::ingest::{nsidc, points};
use lakealt_service::lakes;
use lakealt_service::logging::{self, DataSource, LogLevel};
use std::error::Error;
use std::time::Duration;

fn main() {
    logging::init_logger(LogLevel::Info, None, false);

    let args: Vec<String> = std::env::args().collect();
    let result = match args.get(1).map(String::as_str) {
        Some("search") if args.len() == 3 => run_search(&args[2]),
        Some("download") if args.len() == 4 => run_download(&args[2], &args[3]),
        Some("analyze") if args.len() == 5 => run_analyze(&args[2], &args[3], &args[4]),
        _ => {
            eprintln!("usage: lakealt_service search <region>");
            eprintln!("       lakealt_service download <region> <dest_dir>");
            eprintln!("       lakealt_service analyze <study.toml> <points.csv> <out_dir>");
            std::process::exit(2);
        }
    };

    if let Err(err) = result {
        logging::error(DataSource::System, None, &err.to_string());
        std::process::exit(1);
    }
}

fn region_query(region_name: &str) -> Result<nsidc::GranuleQuery, Box<dyn Error>> {
    let region = lakes::find_region(region_name)
        .ok_or_else(|| format!("unknown study region '{}'", region_name))?;
    nsidc::GranuleQuery::for_region(region)
}

fn http_client() -> Result<reqwest::blocking::Client, Box<dyn Error>> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(120))
        .build()?)
}

fn run_search(region_name: &str) -> Result<(), Box<dyn Error>> {
    let query = region_query(region_name)?;
    let client = http_client()?;
    let granules = nsidc::search_granules(&client, &query)?;

    logging::info(
        DataSource::Nsidc,
        None,
        &format!("{} granules match '{}'", granules.len(), region_name),
    );
    for granule in &granules {
        let size = granule
            .size_mb
            .map(|mb| format!("{:.1} MB", mb))
            .unwrap_or_else(|| "size unknown".to_string());
        println!("{}  {}  {}", granule.id, granule.title, size);
    }
    Ok(())
}

fn run_download(region_name: &str, dest_dir: &str) -> Result<(), Box<dyn Error>> {
    let query = region_query(region_name)?;
    let client = http_client()?;
    let token = nsidc::earthdata_token()?;
    let granules = nsidc::search_granules(&client, &query)?;

    std::fs::create_dir_all(dest_dir)?;

    let mut fetched = 0;
    let mut failed = 0;
    for granule in &granules {
        let dest = format!("{}/{}", dest_dir, granule.title);
        match nsidc::download_granule(&client, granule, &token, &dest) {
            Ok(bytes) => {
                fetched += 1;
                logging::debug(
                    DataSource::Nsidc,
                    Some(&granule.id),
                    &format!("wrote {} bytes to {}", bytes, dest),
                );
            }
            Err(err) => {
                failed += 1;
                logging::log_nsidc_failure(&granule.id, "download", err.as_ref());
            }
        }
    }

    logging::log_ingest_summary(DataSource::Nsidc, granules.len(), fetched, failed);
    Ok(())
}

fn run_analyze(config_path: &str, points_path: &str, out_dir: &str) -> Result<(), Box<dyn Error>> {
    let config = load_config(config_path)?;
    let season_map = config.season_map()?;

    let raw = points::read_points_file(points_path)?;
    let total = raw.len();
    let (screened, outliers) = points::screen_gross_outliers(raw, config.elevation_ceiling_m);
    logging::log_ingest_summary(DataSource::Points, total, screened.len(), outliers);

    let derived = derive_observations(
        &screened,
        config.epoch,
        &season_map,
        config.fiscal_start_month,
        config.strictness(),
    )?;
    if !derived.skipped.is_empty() {
        logging::warn(
            DataSource::Analysis,
            None,
            &format!("{} records had unconvertible timestamps", derived.skipped.len()),
        );
    }

    let summaries = aggregate(&derived.observations, config.bucketing(), true)?;
    let tagged = tag_robustness(&summaries, &config.thresholds);
    let robust = filter_robust(&summaries, &config.thresholds);
    logging::info(
        DataSource::Analysis,
        None,
        &format!("{} of {} lake groups are robust", robust.len(), summaries.len()),
    );

    let joined = join_observations_to_summaries(&derived.observations, &robust, config.bucketing());

    std::fs::create_dir_all(out_dir)?;
    export::write_csv(
        &format!("{}/lake_summaries.csv", out_dir),
        &export::summaries_to_csv(&tagged),
    )?;
    export::write_summaries_json(&format!("{}/lake_summaries.json", out_dir), &tagged)?;
    export::write_csv(
        &format!("{}/robust_points.csv", out_dir),
        &export::joined_to_csv(&joined),
    )?;
    logging::info(
        DataSource::Export,
        None,
        &format!("{} joined points written to {}", joined.len(), out_dir),
    );

    Ok(())
}
