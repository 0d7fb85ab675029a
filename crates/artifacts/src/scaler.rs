use std::path::Path;

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use tracing::info;
use uf_core::{FeatureScaler, PipelineError, PipelineResult};

use crate::{read_json, ArtifactError};

/// Fitted per-column scaler parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FittedScaler {
    /// `x * scale + min`
    MinMax { scale: Vec<f64>, min: Vec<f64> },
    /// `(x - mean) / scale`
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    Identity { n_features: usize },
}

impl FittedScaler {
    pub fn from_path(path: &Path) -> Result<Self, ArtifactError> {
        let scaler: FittedScaler = read_json(path)?;
        scaler.validate()?;
        info!(path = %path.display(), kind = scaler.kind(), features = scaler.n_features(), "loaded scaler");
        Ok(scaler)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FittedScaler::MinMax { .. } => "min_max",
            FittedScaler::Standard { .. } => "standard",
            FittedScaler::Identity { .. } => "identity",
        }
    }

    pub fn validate(&self) -> Result<(), ArtifactError> {
        let (scale, offset) = match self {
            FittedScaler::MinMax { scale, min } => (scale, min),
            FittedScaler::Standard { mean, scale } => (scale, mean),
            FittedScaler::Identity { n_features } => {
                return if *n_features == 0 {
                    Err(ArtifactError::invalid("scaler", "no features"))
                } else {
                    Ok(())
                };
            }
        };
        if scale.is_empty() || scale.len() != offset.len() {
            return Err(ArtifactError::invalid(
                "scaler",
                format!("parameter lengths {} and {}", scale.len(), offset.len()),
            ));
        }
        if let Some(j) = scale.iter().position(|s| *s == 0.0 || !s.is_finite()) {
            return Err(ArtifactError::invalid("scaler", format!("column {j} has scale {}", scale[j])));
        }
        if let Some(j) = offset.iter().position(|v| !v.is_finite()) {
            return Err(ArtifactError::invalid("scaler", format!("column {j} has a non-finite offset")));
        }
        Ok(())
    }

    fn map_columns(
        &self,
        rows: ArrayView2<'_, f64>,
        f: impl Fn(usize, f64) -> f64,
    ) -> PipelineResult<Array2<f64>> {
        if rows.ncols() != self.n_features() {
            return Err(PipelineError::shape("scaler", self.n_features(), rows.ncols()));
        }
        let mut out = rows.to_owned();
        for (j, mut column) in out.columns_mut().into_iter().enumerate() {
            column.mapv_inplace(|v| f(j, v));
        }
        Ok(out)
    }
}

impl FeatureScaler for FittedScaler {
    fn n_features(&self) -> usize {
        match self {
            FittedScaler::MinMax { scale, .. } | FittedScaler::Standard { scale, .. } => scale.len(),
            FittedScaler::Identity { n_features } => *n_features,
        }
    }

    fn is_column_independent(&self) -> bool {
        true
    }

    fn transform(&self, rows: ArrayView2<'_, f64>) -> PipelineResult<Array2<f64>> {
        match self {
            FittedScaler::MinMax { scale, min } => self.map_columns(rows, |j, v| v * scale[j] + min[j]),
            FittedScaler::Standard { mean, scale } => self.map_columns(rows, |j, v| (v - mean[j]) / scale[j]),
            FittedScaler::Identity { .. } => self.map_columns(rows, |_, v| v),
        }
    }

    fn inverse_transform(&self, rows: ArrayView2<'_, f64>) -> PipelineResult<Array2<f64>> {
        match self {
            FittedScaler::MinMax { scale, min } => self.map_columns(rows, |j, v| (v - min[j]) / scale[j]),
            FittedScaler::Standard { mean, scale } => self.map_columns(rows, |j, v| v * scale[j] + mean[j]),
            FittedScaler::Identity { .. } => self.map_columns(rows, |_, v| v),
        }
    }
}
