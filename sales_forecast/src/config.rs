//! Runtime configuration
//!
//! Settings come from a TOML file with `[store]`, `[model]`, `[training]` and
//! `[prediction]` tables. Every key has a default, so an absent file is fine.
//! Lookup order: explicit path, `$SALES_FORECAST_CONFIG`, then
//! `config/forecast.toml` if it exists. `SALES_FORECAST_DATA_DIR` and
//! `SALES_FORECAST_MODEL_PATH` override the file.

use crate::error::{ForecastError, Result};
use crate::models::random_forest::{DEFAULT_SEED, DEFAULT_TREES};
use crate::models::ForestPipeline;
use crate::predictor::PredictorOptions;
use crate::trainer::TrainerOptions;
use forest_math::TreeParams;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const ENV_CONFIG_PATH: &str = "SALES_FORECAST_CONFIG";
pub const ENV_DATA_DIR: &str = "SALES_FORECAST_DATA_DIR";
pub const ENV_MODEL_PATH: &str = "SALES_FORECAST_MODEL_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/forecast.toml";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastConfig {
    pub store: StoreConfig,
    pub model: ModelConfig,
    pub training: TrainingConfig,
    pub prediction: PredictionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Directory holding the exported shop tables
    pub data_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    /// Where the fitted model artifact lives
    pub path: PathBuf,
    pub n_trees: usize,
    pub seed: u64,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        let tree = TreeParams::default();
        Self {
            path: PathBuf::from("models/sales_model.json"),
            n_trees: DEFAULT_TREES,
            seed: DEFAULT_SEED,
            max_depth: tree.max_depth,
            min_samples_split: tree.min_samples_split,
            min_samples_leaf: tree.min_samples_leaf,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainingConfig {
    /// Optional CSV export of the aggregated daily series
    pub summary_path: Option<PathBuf>,
    /// Count days without sales as zero demand
    pub fill_missing_days: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            summary_path: None,
            fill_missing_days: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PredictionConfig {
    /// Floor negative estimates at zero
    pub clamp_negative: bool,
    /// Predict products on the rayon pool
    pub parallel: bool,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            clamp_negative: true,
            parallel: true,
        }
    }
}

impl ForecastConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ForecastConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ForecastError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Resolve configuration from the usual locations and apply env overrides
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var_os(ENV_CONFIG_PATH).map(PathBuf::from);
        let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);

        let mut config = match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => {
                debug!(path = %path.display(), "loading configuration");
                Self::load_from_file(&path)?
            }
            None if default_path.is_file() => {
                debug!(path = %default_path.display(), "loading default configuration");
                Self::load_from_file(&default_path)?
            }
            None => Self::default(),
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Override paths from environment variables, when set
    pub fn apply_env_overrides(&mut self) {
        if let Some(dir) = std::env::var_os(ENV_DATA_DIR) {
            self.store.data_dir = PathBuf::from(dir);
        }
        if let Some(path) = std::env::var_os(ENV_MODEL_PATH) {
            self.model.path = PathBuf::from(path);
        }
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.model.n_trees == 0 {
            return Err(ForecastError::Config(
                "model.n_trees must be at least 1".to_string(),
            ));
        }
        self.tree_params()
            .validate()
            .map_err(|e| ForecastError::Config(format!("model: {}", e)))?;
        if self.model.path.as_os_str().is_empty() {
            return Err(ForecastError::Config("model.path is empty".to_string()));
        }
        Ok(())
    }

    /// Tree stopping rules from the `[model]` table
    pub fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.model.max_depth,
            min_samples_split: self.model.min_samples_split,
            min_samples_leaf: self.model.min_samples_leaf,
        }
    }

    /// Build the unfitted pipeline described by the `[model]` table
    pub fn pipeline(&self) -> Result<ForestPipeline> {
        ForestPipeline::new(self.model.n_trees, self.model.seed)?.with_tree_params(self.tree_params())
    }

    pub fn trainer_options(&self) -> TrainerOptions {
        TrainerOptions {
            model_path: self.model.path.clone(),
            summary_path: self.training.summary_path.clone(),
            fill_missing_days: self.training.fill_missing_days,
        }
    }

    pub fn predictor_options(&self) -> PredictorOptions {
        PredictorOptions {
            clamp_negative: self.prediction.clamp_negative,
            parallel: self.prediction.parallel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serial_test::serial;
    use tempfile::TempDir;

    fn clear_env() {
        std::env::remove_var(ENV_CONFIG_PATH);
        std::env::remove_var(ENV_DATA_DIR);
        std::env::remove_var(ENV_MODEL_PATH);
    }

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config = ForecastConfig::from_toml_str("").unwrap();

        assert_eq!(config, ForecastConfig::default());
        assert_eq!(config.model.n_trees, 100);
        assert_eq!(config.model.seed, 42);
        assert!(config.prediction.clamp_negative);
        assert!(config.training.fill_missing_days);
    }

    #[test]
    fn test_partial_toml_overrides_fields() {
        let config = ForecastConfig::from_toml_str(
            r#"
            [store]
            data_dir = "/srv/shop"

            [model]
            n_trees = 25
            max_depth = 8

            [training]
            summary_path = "out/daily_sales_summary.csv"

            [prediction]
            parallel = false
            "#,
        )
        .unwrap();

        assert_eq!(config.store.data_dir, PathBuf::from("/srv/shop"));
        assert_eq!(config.model.n_trees, 25);
        assert_eq!(config.model.max_depth, Some(8));
        assert_eq!(config.model.seed, 42);
        assert_eq!(
            config.training.summary_path,
            Some(PathBuf::from("out/daily_sales_summary.csv"))
        );
        assert!(!config.prediction.parallel);
        assert!(config.prediction.clamp_negative);
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        for content in [
            "[model]\nn_trees = 0",
            "[model]\nmin_samples_split = 1",
            "[model]\nunknown_key = true",
            "not = [valid",
        ] {
            assert!(
                matches!(
                    ForecastConfig::from_toml_str(content),
                    Err(ForecastError::Config(_))
                ),
                "expected config error for {:?}",
                content
            );
        }
    }

    #[test]
    fn test_pipeline_uses_model_table() {
        let config = ForecastConfig::from_toml_str("[model]\nn_trees = 7\nseed = 3").unwrap();
        let pipeline = config.pipeline().unwrap();

        assert_eq!(pipeline.forest().n_trees(), 7);
        assert_eq!(pipeline.forest().seed(), 3);
    }

    #[test]
    #[serial]
    fn test_resolve_prefers_explicit_path() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("forecast.toml");
        std::fs::write(&path, "[model]\nn_trees = 12").unwrap();

        let config = ForecastConfig::resolve(Some(path.as_path())).unwrap();
        assert_eq!(config.model.n_trees, 12);
    }

    #[test]
    #[serial]
    fn test_resolve_reads_env_path_and_overrides() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("forecast.toml");
        std::fs::write(&path, "[store]\ndata_dir = \"from-file\"").unwrap();

        std::env::set_var(ENV_CONFIG_PATH, &path);
        std::env::set_var(ENV_MODEL_PATH, "/tmp/override.json");
        let config = ForecastConfig::resolve(None);
        clear_env();

        let config = config.unwrap();
        assert_eq!(config.store.data_dir, PathBuf::from("from-file"));
        assert_eq!(config.model.path, PathBuf::from("/tmp/override.json"));
    }

    #[test]
    #[serial]
    fn test_resolve_missing_explicit_file_is_an_error() {
        clear_env();
        let result = ForecastConfig::resolve(Some(Path::new("/no/such/forecast.toml")));
        assert!(matches!(result, Err(ForecastError::Config(_))));
    }
}
