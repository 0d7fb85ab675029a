//! Concrete collaborators loaded from disk at startup: the order dataset,
//! fitted encoders and scaler, and the pretrained sequence model.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use uf_core::PipelineError;

pub mod bundle;
pub mod dataset;
pub mod encoder;
pub mod lstm;
pub mod scaler;

pub use bundle::{ArtifactBundle, ArtifactPaths};
pub use dataset::{parse_timestamp, CsvOrderStore};
pub use encoder::LabelEncoder;
pub use lstm::{DenseWeights, LstmLayerWeights, LstmModel, LstmWeights};
pub use scaler::FittedScaler;

#[derive(thiserror::Error, Debug)]
pub enum ArtifactError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid json in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("row {row}: cannot parse created_on {value:?}")]
    Timestamp { row: usize, value: String },
    #[error("row {row}: invalid equipment id {value:?}")]
    UnitId { row: usize, value: String },
    #[error("invalid {what}: {reason}")]
    Invalid { what: &'static str, reason: String },
}

impl ArtifactError {
    pub(crate) fn invalid(what: &'static str, reason: impl Into<String>) -> Self {
        ArtifactError::Invalid {
            what,
            reason: reason.into(),
        }
    }
}

/// Any artifact failure at startup means the process cannot serve.
impl From<ArtifactError> for PipelineError {
    fn from(err: ArtifactError) -> Self {
        PipelineError::ModelUnavailable(err.to_string())
    }
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let text = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })
}
