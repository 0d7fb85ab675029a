use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uf_core::{CategoryEncoder, FeatureScaler, OrderSource, PipelineError, PipelineResult, FEATURE_COUNT};
use uf_pipeline::{Collaborators, PipelineConfig, UnitForecaster};

use crate::{ArtifactError, CsvOrderStore, FittedScaler, LabelEncoder, LstmModel};

/// Where each startup artifact lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ArtifactPaths {
    pub dataset: PathBuf,
    pub marca_encoder: PathBuf,
    pub plant_encoder: PathBuf,
    pub scaler: PathBuf,
    pub model: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            dataset: PathBuf::from("consolidated_ordenes.csv"),
            marca_encoder: PathBuf::from("scaler_encoder/le_marca.json"),
            plant_encoder: PathBuf::from("scaler_encoder/le_plant.json"),
            scaler: PathBuf::from("scaler_encoder/feature_scaler.json"),
            model: PathBuf::from("model/lstm.json"),
        }
    }
}

/// Everything the forecaster needs, loaded once and never mutated.
pub struct ArtifactBundle {
    pub orders: Arc<CsvOrderStore>,
    pub marca: Arc<LabelEncoder>,
    pub plant: Arc<LabelEncoder>,
    pub scaler: Arc<FittedScaler>,
    pub model: Arc<LstmModel>,
}

impl ArtifactBundle {
    /// Fails with `ModelUnavailable` if any artifact is missing or inconsistent.
    pub fn load(paths: &ArtifactPaths, window_size: usize) -> PipelineResult<Self> {
        Self::try_load(paths, window_size).map_err(|e| {
            error!(error = %e, "artifact load failed");
            PipelineError::from(e)
        })
    }

    fn try_load(paths: &ArtifactPaths, window_size: usize) -> Result<Self, ArtifactError> {
        let bundle = Self {
            orders: Arc::new(CsvOrderStore::from_path(&paths.dataset)?),
            marca: Arc::new(LabelEncoder::from_path(&paths.marca_encoder)?),
            plant: Arc::new(LabelEncoder::from_path(&paths.plant_encoder)?),
            scaler: Arc::new(FittedScaler::from_path(&paths.scaler)?),
            model: Arc::new(LstmModel::from_path(&paths.model)?),
        };
        bundle.check_consistency(window_size)?;
        info!(
            window = window_size,
            units = bundle.orders.unit_ids().len(),
            marca_classes = bundle.marca.vocabulary_len(),
            plant_classes = bundle.plant.vocabulary_len(),
            "artifacts loaded"
        );
        Ok(bundle)
    }

    fn check_consistency(&self, window_size: usize) -> Result<(), ArtifactError> {
        if self.scaler.n_features() != FEATURE_COUNT {
            return Err(ArtifactError::invalid(
                "scaler",
                format!("fitted on {} columns, pipeline uses {FEATURE_COUNT}", self.scaler.n_features()),
            ));
        }
        if self.model.input_size() != FEATURE_COUNT {
            return Err(ArtifactError::invalid(
                "model",
                format!("expects {} features, pipeline uses {FEATURE_COUNT}", self.model.input_size()),
            ));
        }
        if self.model.seq_length() != window_size {
            return Err(ArtifactError::invalid(
                "model",
                format!("trained on {} steps, window is {window_size}", self.model.seq_length()),
            ));
        }
        Ok(())
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            orders: self.orders.clone(),
            marca: self.marca.clone(),
            plant: self.plant.clone(),
            scaler: self.scaler.clone(),
            model: self.model.clone(),
        }
    }

    pub fn forecaster(&self, config: PipelineConfig) -> PipelineResult<UnitForecaster> {
        UnitForecaster::new(self.collaborators(), config)
    }
}
