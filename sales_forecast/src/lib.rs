//! # Sales Forecast
//!
//! Per-product daily demand forecasting for a retail shop.
//!
//! ## Pipelines
//!
//! - **Training**: point-of-sale and order line items are summed per day and
//!   product, turned into (product, day, month, weekday) feature rows and fitted
//!   with a random forest. The fitted model is persisted as a JSON artifact.
//! - **Prediction**: for a target date, every product currently in the store
//!   gets one integer quantity estimate. Products the model has never seen are
//!   predicted from the calendar features alone.
//!
//! ## Quick Start
//!
//! ```no_run
//! use sales_forecast::{CsvStore, ForestPipeline, Predictor, PredictorOptions, Trainer, TrainerOptions};
//!
//! let store = CsvStore::open("data")?;
//!
//! // Train and persist
//! let options = TrainerOptions {
//!     model_path: "models/sales_model.json".into(),
//!     summary_path: None,
//!     fill_missing_days: true,
//! };
//! Trainer::new(&store, ForestPipeline::new(100, 42)?, options).run()?;
//!
//! // Forecast a day
//! let predictor = Predictor::load(&store, "models/sales_model.json", PredictorOptions::default())?;
//! let predictions = predictor.predict_str("2024-06-03")?;
//! println!("{}", sales_forecast::predictor::to_json(&predictions)?);
//! # Ok::<(), sales_forecast::ForecastError>(())
//! ```

pub mod aggregate;
pub mod artifact;
pub mod config;
pub mod error;
pub mod features;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod predictor;
pub mod records;
pub mod store;
pub mod trainer;
pub mod utils;

// Re-export commonly used types
pub use crate::aggregate::{aggregate_records, fill_missing_days, Aggregator};
pub use crate::config::ForecastConfig;
pub use crate::error::{ForecastError, Result};
pub use crate::features::{CalendarFeatures, FeatureVector, ProductEncoder};
pub use crate::models::{DemandModel, FittedDemandModel, ForestPipeline, TrainedDemandModel};
pub use crate::predictor::{Predictor, PredictorOptions};
pub use crate::records::{
    DailyDemandRecord, PredictionRecord, ProductId, TransactionRecord, TransactionSource,
};
pub use crate::store::{CsvStore, InMemoryStore, SalesStore};
pub use crate::trainer::{Trainer, TrainerOptions, TrainingReport};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
