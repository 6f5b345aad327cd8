mod lookup;
mod script;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use findnest_core::Coordinates;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "findnest")]
#[command(about = "FindNest location core command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve a free-text address to coordinates
    Geocode {
        /// Address text, e.g. "123 Le Loi, Quận 1, TP.HCM"
        address: String,
    },
    /// Resolve a point to a structured address
    Reverse {
        /// Point as `lat,lng`
        #[arg(value_parser = parse_point, allow_hyphen_values = true)]
        at: Coordinates,
    },
    /// Run the AI listing search
    Search {
        query: String,
        /// Search origin as `lat,lng` (defaults to the configured map center)
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        near: Option<Coordinates>,
        /// Maximum number of results to print
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// Fetch a driving route between two points
    Route {
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        from: Coordinates,
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        to: Coordinates,
    },
    /// Fetch the configured map style, reporting whether the fallback is used
    Style,
    /// Replay a JSON script of location events against a headless map
    Session {
        /// Path to the script file (a JSON array of steps)
        script: PathBuf,
        /// Print the final snapshot as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
}

/// Parses `lat,lng` into validated coordinates.
fn parse_point(raw: &str) -> Result<Coordinates, String> {
    let (lat, lng) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected 'lat,lng', got '{raw}'"))?;
    let latitude = lat.trim().parse::<f64>().map_err(|e| e.to_string())?;
    let longitude = lng.trim().parse::<f64>().map_err(|e| e.to_string())?;
    Coordinates::new(latitude, longitude).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("findnest: run with --help to list commands");
        return Ok(());
    };

    let config = findnest_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::debug!(env = %config.env, api = %config.api_base_url, "configuration loaded");

    match command {
        Commands::Geocode { address } => lookup::run_geocode(&config, &address).await,
        Commands::Reverse { at } => lookup::run_reverse(&config, at).await,
        Commands::Search { query, near, limit } => {
            lookup::run_search(&config, &query, near, limit).await
        }
        Commands::Route { from, to } => lookup::run_route(&config, from, to).await,
        Commands::Style => lookup::run_style(&config).await,
        Commands::Session { script, json } => {
            let steps = script::load_script(&script)?;
            let outcome = script::run_session(&config, &steps).await?;
            script::print_outcome(&outcome, json)
        }
    }
}
