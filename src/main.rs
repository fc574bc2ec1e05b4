use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use next_pass::aoi::{resolve, AoiInput};
use next_pass::predict::{
    load_sources, predict, upcoming_line, write_geojson, PassOutcome, PredictOptions,
    SatelliteFilter,
};
use next_pass::reference::parse_reference;
use next_pass::Config;

#[derive(Parser)]
#[command(name = "next-pass")]
#[command(about = "Predict the next Sentinel and Landsat overpasses over an area of interest")]
struct Cli {
    /// Log level, overridden by RUST_LOG
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict the next passes over an area of interest
    Predict {
        /// `lat lon`, `south north west east`, or a KML/GeoJSON boundary file
        #[arg(short = 'b', long = "bbox", required = true, num_args = 1..=4, allow_negative_numbers = true)]
        aoi: Vec<String>,
        #[arg(short, long, value_enum, default_value_t = SatelliteFilter::All)]
        sat: SatelliteFilter,
        /// Reference instant, e.g. `now`, `2025-01-01T00:00:00Z` or `now - 2d`
        #[arg(short = 'd', long = "at", default_value = "now")]
        at: String,
        #[arg(short, long, default_value = "next_pass.yaml")]
        config: PathBuf,
        /// Write the selected footprints as GeoJSON
        #[arg(long)]
        geojson: Option<PathBuf>,
        /// Print the results as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Parse every configured plan document and report its coverage
    Validate {
        #[arg(short, long, default_value = "next_pass.yaml")]
        config: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();

    match cli.command {
        Commands::Predict {
            aoi,
            sat,
            at,
            config,
            geojson,
            json,
        } => run_predict(&aoi, sat, &at, &config, geojson.as_deref(), json),
        Commands::Validate { config } => validate(&config),
    }
}

fn load_config(path: &Path) -> Option<Config> {
    match Config::from_file(path) {
        Ok(config) => Some(config),
        Err(e) => {
            eprintln!("Error loading config {}: {}", path.display(), e);
            None
        }
    }
}

fn run_predict(
    aoi_args: &[String],
    filter: SatelliteFilter,
    at: &str,
    config_path: &Path,
    geojson: Option<&Path>,
    json: bool,
) -> ExitCode {
    let aoi = match AoiInput::from_args(aoi_args).and_then(|input| resolve(&input)) {
        Ok(aoi) => aoi,
        Err(e) => {
            eprintln!("Invalid AOI: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let reference = match parse_reference(at, chrono::Utc::now()) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Invalid reference time: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let Some(config) = load_config(config_path) else {
        return ExitCode::FAILURE;
    };

    log::info!("Predicting passes after {}", reference);
    let sources = load_sources(&config.plans);
    let options = PredictOptions {
        max_passes: config.max_passes,
        filter,
    };
    let prediction = predict(&sources, &aoi, reference, &options);

    if prediction.results.is_empty() {
        eprintln!("No configured satellite matches the filter");
        return ExitCode::FAILURE;
    }

    if json {
        match serde_json::to_string_pretty(&prediction) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error serializing results: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        for (satellite, result) in &prediction.results {
            println!("=== {} ===", satellite);
            match result {
                Ok(result) => {
                    for line in &result.summary {
                        println!("{}", line);
                    }
                    for group in &result.groups {
                        if let PassOutcome::Next(_) = group.outcome {
                            for upcoming in group.upcoming.iter().skip(1) {
                                println!("    then {}", upcoming_line(upcoming));
                            }
                        }
                    }
                }
                Err(e) => eprintln!("Error: {}", e),
            }
            println!();
        }
    }

    if let Some(path) = geojson {
        if let Err(e) = write_geojson(&prediction, path) {
            eprintln!("Error writing {}: {}", path.display(), e);
            return ExitCode::FAILURE;
        }
        log::info!("Footprints written to {}", path.display());
    }

    if prediction.successes().next().is_none() {
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn validate(config_path: &Path) -> ExitCode {
    let Some(config) = load_config(config_path) else {
        return ExitCode::FAILURE;
    };

    let mut failed = false;
    for source in load_sources(&config.plans) {
        match &source.plan {
            Ok(plan) => {
                for satellite in &source.satellites {
                    let stats = plan.stats(satellite);
                    let horizon = stats
                        .horizon
                        .map(|h| h.to_rfc3339())
                        .unwrap_or_else(|| "none".to_string());
                    println!(
                        "{}: {} entries, {} skipped, horizon {}",
                        satellite, stats.entries, stats.skipped, horizon
                    );
                }
            }
            Err(e) => {
                failed = true;
                eprintln!("{}: {}", source.satellites.join(", "), e);
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        println!("All plan sources are valid");
        ExitCode::SUCCESS
    }
}
