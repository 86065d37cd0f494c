//! # Sales Forecast Workspace
//!
//! Umbrella crate re-exporting the workspace members:
//!
//! - [`forest_math`]: regression trees and the bootstrap random forest
//! - [`sales_forecast`]: aggregation, feature encoding, training and prediction
//!
//! ## Example
//!
//! ```
//! use sales_forecast_workspace::sales_forecast::{
//!     DemandModel, FeatureVector, ForestPipeline, TrainedDemandModel,
//! };
//! use sales_forecast_workspace::sales_forecast::utils::parse_target_date;
//!
//! let monday = parse_target_date("2024-01-01").unwrap();
//! let rows = vec![FeatureVector::new(monday, 1)];
//! let model = ForestPipeline::new(10, 42).unwrap().fit(&rows, &[6.0]).unwrap();
//!
//! assert_eq!(model.predict(&rows).unwrap(), vec![6.0]);
//! ```

pub use forest_math;
pub use sales_forecast;
