//! Prints a JSON array of `{product_id, predicted_quantity}` for the given date.

use clap::Parser;
use sales_forecast::logging::init_tracing;
use sales_forecast::predictor::to_json;
use sales_forecast::{CsvStore, ForecastConfig, Predictor};
use std::path::PathBuf;
use tracing::error;

#[derive(Debug, Parser)]
#[command(name = "predict", about = "Forecast per-product demand for one date")]
struct Args {
    /// Target date, YYYY-MM-DD
    date: String,

    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn run(args: Args) -> anyhow::Result<String> {
    let config = ForecastConfig::resolve(args.config.as_deref())?;
    let store = CsvStore::open(&config.store.data_dir)?;
    let predictor = Predictor::load(&store, &config.model.path, config.predictor_options())?;

    let predictions = predictor.predict_str(&args.date)?;
    Ok(to_json(&predictions)?)
}

fn main() {
    let _ = dotenvy::dotenv();
    init_tracing();

    match run(Args::parse()) {
        Ok(json) => println!("{}", json),
        Err(err) => {
            error!("{:#}", err);
            eprintln!("Prediction failed: {:#}", err);
            std::process::exit(1);
        }
    }
}
