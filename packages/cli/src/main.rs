#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the ward analysis engine.
//!
//! Reads JSON request files, runs the requested analysis, and prints the
//! result as JSON on stdout. Logging goes to stderr via `pretty_env_logger`
//! (`RUST_LOG=debug` for details).

mod input;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use ward_insights_analysis::config::AnalysisConfig;
use ward_insights_analysis::impact::ImpactEstimator;

use crate::input::{ClusterRequest, CorrelationRequest, WardRequest, read_json};

#[derive(Parser)]
#[command(name = "ward_insights", about = "Ward environment/education analysis tool")]
struct Cli {
    /// TOML file with analysis settings (defaults are built in)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Correlate one environment series with one education series
    Correlate {
        /// JSON file with `envValues` and `eduScores` arrays
        #[arg(long)]
        input: PathBuf,
    },
    /// Analyze a ward's air quality, school and energy records
    Analyze {
        /// JSON file with `ward`, `airQuality`, `schools` and `energy`
        #[arg(long)]
        input: PathBuf,
    },
    /// Group wards with similar profiles
    Cluster {
        /// JSON file with an array of ward profiles
        #[arg(long)]
        input: PathBuf,
        /// Number of clusters (overrides the configured default)
        #[arg(long)]
        clusters: Option<usize>,
    },
    /// Estimate the impact of a green action
    Impact {
        /// Action name (e.g. "`tree_planting`")
        #[arg(long)]
        action: String,
        /// Current AQI
        #[arg(long, default_value_t = 100)]
        aqi: u32,
        /// Current renewable energy share, in percent
        #[arg(long, default_value_t = 50.0)]
        energy: f64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::embedded()?,
    }
    .with_env_overrides()?;
    log::debug!("Using {config:?}");

    match cli.command {
        Commands::Correlate { input } => {
            let request: CorrelationRequest = read_json(&input)?;
            let result = config
                .correlation_analyzer()
                .correlate(&request.env_values, &request.edu_scores)?;
            print_json(&result)?;
        }
        Commands::Analyze { input } => {
            let request: WardRequest = read_json(&input)?;
            log::info!(
                "Analyzing {} ({} air quality, {} school, {} energy records)",
                request.ward,
                request.air_quality.len(),
                request.schools.len(),
                request.energy.len()
            );
            let analysis = config
                .correlation_analyzer()
                .analyze(&request.ward, &request.series());
            if let Some(error) = &analysis.error {
                log::warn!("Analysis for {} incomplete: {}", request.ward, error.message);
            }
            print_json(&analysis)?;
        }
        Commands::Cluster { input, clusters } => {
            let wards: ClusterRequest = read_json(&input)?;
            log::info!("Clustering {} wards", wards.len());
            let report = config.ward_clusterer().cluster(&wards, clusters);
            print_json(&report)?;
        }
        Commands::Impact {
            action,
            aqi,
            energy,
        } => {
            print_json(&ImpactEstimator::report(&action, aqi, energy))?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
