//! Random forest demand model
//!
//! The pipeline one-hot encodes product ids against the training vocabulary
//! and regresses quantity on the encoded row with a bootstrap forest.

use crate::error::{ForecastError, Result};
use crate::features::{FeatureVector, ProductEncoder};
use crate::models::{DemandModel, TrainedDemandModel};
use chrono::NaiveDate;
use forest_math::{FittedForest, ForestError, RandomForestRegressor, TreeParams};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TREES: usize = 100;
pub const DEFAULT_SEED: u64 = 42;

/// Encoder + random forest pipeline, unfitted
#[derive(Debug, Clone)]
pub struct ForestPipeline {
    /// Name of the model
    name: String,
    forest: RandomForestRegressor,
    /// Date span of the training rows, recorded on the fitted model
    training_range: Option<(NaiveDate, NaiveDate)>,
}

/// Fitted pipeline: product vocabulary plus forest parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedDemandModel {
    name: String,
    encoder: ProductEncoder,
    forest: FittedForest,
    training_range: Option<(NaiveDate, NaiveDate)>,
    training_rows: usize,
}

impl ForestPipeline {
    /// Create a pipeline with `n_trees` trees and a fixed seed
    pub fn new(n_trees: usize, seed: u64) -> Result<Self> {
        let forest = RandomForestRegressor::new(n_trees, seed)
            .map_err(|e| ForecastError::InvalidParameter(e.to_string()))?;

        Ok(Self {
            name: format!("Random Forest (trees={}, seed={})", n_trees, seed),
            forest,
            training_range: None,
        })
    }

    /// Replace the per-tree stopping rules
    pub fn with_tree_params(mut self, params: TreeParams) -> Result<Self> {
        self.forest = self
            .forest
            .with_tree_params(params)
            .map_err(|e| ForecastError::InvalidParameter(e.to_string()))?;
        Ok(self)
    }

    /// Record the date span the training rows cover
    pub fn with_training_range(mut self, first: NaiveDate, last: NaiveDate) -> Self {
        self.training_range = Some((first.min(last), first.max(last)));
        self
    }

    pub fn forest(&self) -> &RandomForestRegressor {
        &self.forest
    }
}

impl DemandModel for ForestPipeline {
    type Trained = FittedDemandModel;

    fn fit(&self, rows: &[FeatureVector], targets: &[f64]) -> Result<Self::Trained> {
        if rows.is_empty() {
            return Err(ForecastError::ValidationError(
                "Cannot fit a model without training rows".to_string(),
            ));
        }
        if rows.len() != targets.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "Feature rows ({}) don't match targets ({})",
                rows.len(),
                targets.len()
            )));
        }

        let encoder = ProductEncoder::fit(rows.iter().map(|row| row.product_id));
        let x = encoder.encode_all(rows);
        let forest = self.forest.fit(&x, targets)?;

        Ok(FittedDemandModel {
            name: self.name.clone(),
            encoder,
            forest,
            training_range: self.training_range,
            training_rows: rows.len(),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl FittedDemandModel {
    /// Estimate the quantity for a single raw feature row
    pub fn predict_one(&self, row: &FeatureVector) -> Result<f64> {
        Ok(self.forest.predict_row(&self.encoder.encode(row))?)
    }

    /// Fitted product vocabulary
    pub fn encoder(&self) -> &ProductEncoder {
        &self.encoder
    }

    pub fn forest(&self) -> &FittedForest {
        &self.forest
    }

    pub fn vocabulary_size(&self) -> usize {
        self.encoder.vocabulary_size()
    }

    /// First and last training dates, when recorded
    pub fn training_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.training_range
    }

    pub fn training_rows(&self) -> usize {
        self.training_rows
    }

    /// Check internal consistency of a model read back from storage
    pub fn validate(&self) -> forest_math::Result<()> {
        self.forest.validate()?;
        if !self.encoder.is_consistent() {
            return Err(ForestError::CorruptModel(
                "product encoder columns are not numbered 0..n".to_string(),
            ));
        }
        if self.forest.n_features() != self.encoder.width() {
            return Err(ForestError::CorruptModel(format!(
                "forest expects {} features but the encoder produces {}",
                self.forest.n_features(),
                self.encoder.width()
            )));
        }
        Ok(())
    }

    /// Whether `date` lies inside the training date span.
    ///
    /// Models without a recorded span cover every date.
    pub fn covers_date(&self, date: NaiveDate) -> bool {
        self.training_range
            .map_or(true, |(first, last)| first <= date && date <= last)
    }
}

impl TrainedDemandModel for FittedDemandModel {
    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<f64>> {
        rows.iter().map(|row| self.predict_one(row)).collect()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
