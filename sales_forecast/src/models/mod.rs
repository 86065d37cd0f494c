//! Demand models mapping (product, calendar) features to quantities

use crate::error::Result;
use crate::features::FeatureVector;
use std::fmt::Debug;

/// Fitted demand model
pub trait TrainedDemandModel: Debug {
    /// Estimate the quantity for each raw feature row
    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<f64>>;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Demand model that can be fitted on feature rows and targets
pub trait DemandModel: Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedDemandModel;

    /// Fit the model on raw feature rows and their observed quantities
    fn fit(&self, rows: &[FeatureVector], targets: &[f64]) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

pub mod random_forest;

pub use random_forest::{FittedDemandModel, ForestPipeline};
