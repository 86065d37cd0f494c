//! Model artifact persistence
//!
//! The fitted model is stored as a JSON envelope carrying a format version.
//! Saving writes a temp file next to the target and renames it into place,
//! so a reader never observes a half-written artifact.

use crate::error::{ForecastError, Result};
use crate::models::FittedDemandModel;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Current artifact format version
pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct ArtifactRef<'a> {
    format_version: u32,
    model: &'a FittedDemandModel,
}

#[derive(Deserialize)]
struct Artifact {
    format_version: u32,
    model: FittedDemandModel,
}

/// Persist a fitted model, replacing any previous artifact at `path`
pub fn save_model<P: AsRef<Path>>(path: P, model: &FittedDemandModel) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer(
            &mut writer,
            &ArtifactRef {
                format_version: FORMAT_VERSION,
                model,
            },
        )?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| ForecastError::IoError(e.error))?;

    info!(path = %path.display(), "saved model artifact");
    Ok(())
}

/// Load a previously saved model
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<FittedDemandModel> {
    let path = path.as_ref();
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ForecastError::ModelNotFound(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };

    let artifact: Artifact = serde_json::from_reader(BufReader::new(file))?;
    if artifact.format_version != FORMAT_VERSION {
        return Err(ForecastError::Serialization(format!(
            "Unsupported artifact format version {} (expected {})",
            artifact.format_version, FORMAT_VERSION
        )));
    }
    artifact.model.validate().map_err(|e| {
        ForecastError::Serialization(format!("Model artifact {}: {}", path.display(), e))
    })?;

    debug!(
        path = %path.display(),
        products = artifact.model.vocabulary_size(),
        "loaded model artifact"
    );
    Ok(artifact.model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureVector;
    use crate::models::{DemandModel, ForestPipeline, TrainedDemandModel};
    use chrono::{Duration, NaiveDate};
    use tempfile::TempDir;

    fn fitted() -> FittedDemandModel {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let rows: Vec<FeatureVector> = (0..30)
            .map(|i| FeatureVector::new(start + Duration::days(i), (i % 3) as u32 + 1))
            .collect();
        let targets: Vec<f64> = (0..30).map(|i| (i % 7) as f64 * 1.37 + 0.1).collect();
        ForestPipeline::new(8, 42)
            .unwrap()
            .with_training_range(start, start + Duration::days(29))
            .fit(&rows, &targets)
            .unwrap()
    }

    #[test]
    fn test_round_trip_preserves_predictions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sales_model.json");
        let model = fitted();

        save_model(&path, &model).unwrap();
        let loaded = load_model(&path).unwrap();

        let sample: Vec<FeatureVector> = (0..14)
            .map(|i| {
                FeatureVector::new(
                    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap() + Duration::days(i),
                    (i % 5) as u32,
                )
            })
            .collect();
        assert_eq!(model.predict(&sample).unwrap(), loaded.predict(&sample).unwrap());
        assert_eq!(model, loaded);
    }

    #[test]
    fn test_save_overwrites_previous_artifact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("model.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "stale").unwrap();

        save_model(&path, &fitted()).unwrap();

        assert!(load_model(&path).is_ok());
        // Only the artifact remains; the temp file was renamed away
        assert_eq!(std::fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[test]
    fn test_missing_artifact_is_model_not_found() {
        let dir = TempDir::new().unwrap();
        let result = load_model(dir.path().join("absent.json"));

        assert!(matches!(result, Err(ForecastError::ModelNotFound(_))));
    }

    #[test]
    fn test_corrupt_artifact_is_a_serialization_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            load_model(&path),
            Err(ForecastError::Serialization(_))
        ));
    }

    fn rewrite_artifact(path: &Path, edit: impl FnOnce(&mut serde_json::Value)) {
        let mut value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        edit(&mut value);
        std::fs::write(path, value.to_string()).unwrap();
    }

    #[test]
    fn test_dangling_node_index_is_a_serialization_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");
        save_model(&path, &fitted()).unwrap();

        rewrite_artifact(&path, |value| {
            value["model"]["forest"]["trees"][0]["nodes"][0] = serde_json::json!({
                "kind": "split",
                "feature": 0,
                "threshold": 0.5,
                "left": 7,
                "right": 9,
            });
        });

        assert!(matches!(
            load_model(&path),
            Err(ForecastError::Serialization(_))
        ));
    }

    #[test]
    fn test_empty_forest_is_a_serialization_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");
        save_model(&path, &fitted()).unwrap();

        rewrite_artifact(&path, |value| {
            value["model"]["forest"]["trees"] = serde_json::json!([]);
        });

        assert!(matches!(
            load_model(&path),
            Err(ForecastError::Serialization(_))
        ));
    }

    #[test]
    fn test_feature_width_mismatch_is_a_serialization_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");
        save_model(&path, &fitted()).unwrap();

        // Drop a product from the vocabulary so the encoder narrows by one column
        rewrite_artifact(&path, |value| {
            let vocabulary = value["model"]["encoder"]["columns"]
                .as_object_mut()
                .unwrap();
            let first = vocabulary.keys().next().unwrap().clone();
            vocabulary.remove(&first);
        });

        assert!(matches!(
            load_model(&path),
            Err(ForecastError::Serialization(_))
        ));
    }

    #[test]
    fn test_out_of_range_encoder_column_is_a_serialization_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");
        save_model(&path, &fitted()).unwrap();

        rewrite_artifact(&path, |value| {
            value["model"]["encoder"]["columns"]["1"] = serde_json::json!(99);
        });

        assert!(matches!(
            load_model(&path),
            Err(ForecastError::Serialization(_))
        ));
    }

    #[test]
    fn test_unknown_format_version_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");
        save_model(&path, &fitted()).unwrap();

        let mut value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        value["format_version"] = serde_json::json!(99);
        std::fs::write(&path, value.to_string()).unwrap();

        let err = load_model(&path).unwrap_err();
        assert!(err.to_string().contains("99"));
    }
}
