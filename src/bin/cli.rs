//! Race Scraper CLI
//!
//! Scrapes one results page and writes the rows to a CSV or JSON file.

use std::path::PathBuf;

use clap::Parser;
use race_scraper::{error::Result, models::Config, pipeline};

/// Race Scraper - timing site results exporter
#[derive(Parser, Debug)]
#[command(
    name = "race-scraper",
    version,
    about = "Extract race results from timing websites"
)]
struct Cli {
    /// URL of the race results page
    #[arg(short, long)]
    url: String,

    /// Output file; the extension selects the format (csv or json)
    #[arg(short, long, default_value = "results.csv")]
    output: PathBuf,

    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Keep every MobiiElite field, not only the displayed columns
    #[arg(long)]
    include_all_fields: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    if cli.include_all_fields {
        config.mobiielite.include_all_fields = true;
    }
    config.validate()?;

    match pipeline::run_scrape(&config, &cli.url, &cli.output) {
        Ok(count) => {
            log::info!("Done: {} rows", count);
            Ok(())
        }
        Err(e) => {
            log::error!("{}", e);
            Err(e)
        }
    }
}
