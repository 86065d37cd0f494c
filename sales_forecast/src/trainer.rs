//! Training pipeline: aggregate, featurize, fit, persist

use crate::aggregate::{fill_missing_days, write_summary, Aggregator};
use crate::artifact::save_model;
use crate::error::Result;
use crate::features::FeatureVector;
use crate::metrics::{forecast_accuracy, ForecastAccuracy};
use crate::models::{DemandModel, FittedDemandModel, ForestPipeline, TrainedDemandModel};
use crate::records::DailyDemandRecord;
use crate::store::SalesStore;
use chrono::NaiveDate;
use std::path::PathBuf;
use tracing::info;

/// Where the trainer writes its outputs
#[derive(Debug, Clone)]
pub struct TrainerOptions {
    /// Model artifact, overwritten on every run
    pub model_path: PathBuf,
    /// Optional CSV export of the aggregated series
    pub summary_path: Option<PathBuf>,
    /// Treat days without sales as zero demand when building the dataset
    pub fill_missing_days: bool,
}

/// Outcome of a successful training run
#[derive(Debug, Clone)]
pub struct TrainingReport {
    /// Aggregated (date, product) records with actual sales
    pub daily_records: usize,
    /// Rows the model was fitted on, including zero-filled days
    pub training_rows: usize,
    pub products: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    /// Fit on the training rows themselves
    pub accuracy: ForecastAccuracy,
    pub model_path: PathBuf,
}

/// Build the supervised dataset from daily demand records
pub fn build_dataset(records: &[DailyDemandRecord]) -> (Vec<FeatureVector>, Vec<f64>) {
    records
        .iter()
        .map(|r| {
            (
                FeatureVector::new(r.date, r.product_id),
                r.total_quantity as f64,
            )
        })
        .unzip()
}

/// Offline training job
#[derive(Debug)]
pub struct Trainer<'a, S: SalesStore> {
    store: &'a S,
    pipeline: ForestPipeline,
    options: TrainerOptions,
}

impl<'a, S: SalesStore> Trainer<'a, S> {
    pub fn new(store: &'a S, pipeline: ForestPipeline, options: TrainerOptions) -> Self {
        Self {
            store,
            pipeline,
            options,
        }
    }

    /// Fit a model from the store's full history without persisting it
    pub fn fit(&self) -> Result<(FittedDemandModel, TrainingReport)> {
        let records = Aggregator::new(self.store).aggregate()?;

        if let Some(summary) = &self.options.summary_path {
            write_summary(summary, &records)?;
        }

        // Aggregation guarantees at least one record, sorted by date
        let first_date = records[0].date;
        let last_date = records[records.len() - 1].date;

        let dataset = if self.options.fill_missing_days {
            fill_missing_days(&records)
        } else {
            records.clone()
        };
        let (rows, targets) = build_dataset(&dataset);
        info!(
            rows = rows.len(),
            first = %first_date,
            last = %last_date,
            model = self.pipeline.name(),
            "fitting demand model"
        );

        let model = self
            .pipeline
            .clone()
            .with_training_range(first_date, last_date)
            .fit(&rows, &targets)?;

        let fitted = model.predict(&rows)?;
        let accuracy = forecast_accuracy(&fitted, &targets)?;
        info!(%accuracy, "in-sample accuracy");

        let report = TrainingReport {
            daily_records: records.len(),
            training_rows: rows.len(),
            products: model.vocabulary_size(),
            first_date,
            last_date,
            accuracy,
            model_path: self.options.model_path.clone(),
        };
        Ok((model, report))
    }

    /// Run the whole job and overwrite the model artifact
    pub fn run(&self) -> Result<TrainingReport> {
        let (model, report) = self.fit()?;
        save_model(&self.options.model_path, &model)?;

        info!(
            products = report.products,
            daily_records = report.daily_records,
            path = %report.model_path.display(),
            "training complete"
        );
        Ok(report)
    }
}
