//! Prediction pipeline: one forecast per current product for a target date

use crate::artifact::load_model;
use crate::error::Result;
use crate::features::FeatureVector;
use crate::models::FittedDemandModel;
use crate::records::{PredictionRecord, ProductId};
use crate::store::SalesStore;
use crate::utils::{parse_target_date, round_quantity};
use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

/// How estimates are turned into output quantities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictorOptions {
    /// Floor negative estimates at zero
    pub clamp_negative: bool,
    /// Predict products on the rayon pool
    pub parallel: bool,
}

impl Default for PredictorOptions {
    fn default() -> Self {
        Self {
            clamp_negative: true,
            parallel: true,
        }
    }
}

/// On-demand forecaster bound to a store and a fitted model
#[derive(Debug)]
pub struct Predictor<'a, S: SalesStore> {
    store: &'a S,
    model: FittedDemandModel,
    options: PredictorOptions,
}

impl<'a, S: SalesStore> Predictor<'a, S> {
    /// Use an in-memory fitted model
    pub fn new(store: &'a S, model: FittedDemandModel, options: PredictorOptions) -> Self {
        Self {
            store,
            model,
            options,
        }
    }

    /// Load the persisted model; fails with `ModelNotFound` before the first training run
    pub fn load<P: AsRef<Path>>(
        store: &'a S,
        model_path: P,
        options: PredictorOptions,
    ) -> Result<Self> {
        let model = load_model(model_path)?;
        Ok(Self::new(store, model, options))
    }

    pub fn model(&self) -> &FittedDemandModel {
        &self.model
    }

    /// Forecast every store product for a `YYYY-MM-DD` date string
    pub fn predict_str(&self, date: &str) -> Result<Vec<PredictionRecord>> {
        let date = parse_target_date(date)?;
        self.predict_date(date)
    }

    /// Forecast every store product for `date`.
    ///
    /// Output follows the store's product order with duplicates collapsed.
    /// Products the model never saw are predicted from calendar features alone.
    pub fn predict_date(&self, date: NaiveDate) -> Result<Vec<PredictionRecord>> {
        if !self.model.covers_date(date) {
            if let Some((first, last)) = self.model.training_range() {
                warn!(
                    %date,
                    %first,
                    %last,
                    "target date is outside the training range; estimate is an extrapolation"
                );
            }
        }

        let mut seen = HashSet::new();
        let products: Vec<ProductId> = self
            .store
            .product_ids()?
            .into_iter()
            .filter(|id| seen.insert(*id))
            .collect();

        let unknown = products
            .iter()
            .filter(|id| !self.model.encoder().contains(**id))
            .count();
        if unknown > 0 {
            debug!(unknown, "products missing from the training vocabulary");
        }

        let model = &self.model;
        let clamp_negative = self.options.clamp_negative;
        let predict = |product_id: &ProductId| -> Result<PredictionRecord> {
            let estimate = model.predict_one(&FeatureVector::new(date, *product_id))?;
            Ok(PredictionRecord {
                product_id: *product_id,
                predicted_quantity: round_quantity(estimate, clamp_negative),
            })
        };

        let predictions = if self.options.parallel {
            products.par_iter().map(predict).collect::<Result<Vec<_>>>()?
        } else {
            products.iter().map(predict).collect::<Result<Vec<_>>>()?
        };

        info!(%date, products = predictions.len(), "generated predictions");
        Ok(predictions)
    }
}

/// Render predictions as the JSON array emitted on stdout
pub fn to_json(predictions: &[PredictionRecord]) -> Result<String> {
    Ok(serde_json::to_string(predictions)?)
}
