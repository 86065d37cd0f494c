//! Offline training job: reads the full sales history and rewrites the model artifact.

use anyhow::Context;
use clap::Parser;
use sales_forecast::logging::init_tracing;
use sales_forecast::{CsvStore, ForecastConfig, Trainer};
use std::path::PathBuf;
use tracing::error;

#[derive(Debug, Parser)]
#[command(name = "train", about = "Fit the daily demand model from sales and order history")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = ForecastConfig::resolve(args.config.as_deref())?;
    let store = CsvStore::open(&config.store.data_dir)
        .with_context(|| format!("opening store at {}", config.store.data_dir.display()))?;

    let report = Trainer::new(&store, config.pipeline()?, config.trainer_options()).run()?;

    eprintln!(
        "Model trained on {} daily records for {} products ({} to {}) and saved to {}",
        report.daily_records,
        report.products,
        report.first_date,
        report.last_date,
        report.model_path.display()
    );
    Ok(())
}

fn main() {
    let _ = dotenvy::dotenv();
    init_tracing();

    if let Err(err) = run(Args::parse()) {
        error!("{:#}", err);
        eprintln!("Training failed: {:#}", err);
        std::process::exit(1);
    }
}
