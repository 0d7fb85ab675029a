//! Forward and inverse application of the fitted feature scaler.
//!
//! The scaler was fitted jointly on all four feature columns, so the model's
//! single scaled `days_diff` output is inverted by placing it in an otherwise
//! zero row and reading column 0 back. That is exact only for scalers whose
//! columns are independent; column-mixing scalers are refused at construction.

use std::sync::Arc;

use ndarray::Array2;
use uf_core::{FeatureScaler, PipelineError, PipelineResult, Window, DAYS_DIFF_COLUMN, FEATURE_COUNT};

pub struct ScalingAdapter {
    scaler: Arc<dyn FeatureScaler>,
}

impl ScalingAdapter {
    pub fn new(scaler: Arc<dyn FeatureScaler>) -> PipelineResult<Self> {
        if scaler.n_features() != FEATURE_COUNT {
            return Err(PipelineError::shape(
                "scaler",
                FEATURE_COUNT,
                scaler.n_features(),
            ));
        }
        if !scaler.is_column_independent() {
            return Err(PipelineError::ModelUnavailable(
                "scaler mixes feature columns; single-column inverse is undefined".into(),
            ));
        }
        Ok(Self { scaler })
    }

    pub fn scale(&self, window: &Window) -> PipelineResult<Window> {
        let rows = window.rows();
        if rows.ncols() != FEATURE_COUNT {
            return Err(PipelineError::shape("scale", FEATURE_COUNT, rows.ncols()));
        }
        let scaled = self.scaler.transform(rows)?;
        if scaled.dim() != rows.dim() {
            return Err(PipelineError::shape("scale", rows.dim(), scaled.dim()));
        }
        Window::from_rows(scaled)
    }

    /// Model output (scaled `days_diff`) back to days.
    pub fn unscale(&self, value: f64) -> PipelineResult<f64> {
        self.unscale_column(value, DAYS_DIFF_COLUMN)
    }

    pub fn unscale_column(&self, value: f64, feature_index: usize) -> PipelineResult<f64> {
        let row = single_value_row(value, feature_index)?;
        let restored = self.scaler.inverse_transform(row.view())?;
        read_back(&restored, feature_index)
    }

    /// Forward-scale a lone value placed in `feature_index` of a zero row.
    pub fn scale_column(&self, value: f64, feature_index: usize) -> PipelineResult<f64> {
        let row = single_value_row(value, feature_index)?;
        let scaled = self.scaler.transform(row.view())?;
        read_back(&scaled, feature_index)
    }
}

fn single_value_row(value: f64, feature_index: usize) -> PipelineResult<Array2<f64>> {
    if feature_index >= FEATURE_COUNT {
        return Err(PipelineError::shape(
            "unscale",
            format!("column < {FEATURE_COUNT}"),
            feature_index,
        ));
    }
    let mut row = Array2::zeros((1, FEATURE_COUNT));
    row[[0, feature_index]] = value;
    Ok(row)
}

fn read_back(rows: &Array2<f64>, feature_index: usize) -> PipelineResult<f64> {
    if rows.dim() != (1, FEATURE_COUNT) {
        return Err(PipelineError::shape("unscale", (1, FEATURE_COUNT), rows.dim()));
    }
    Ok(rows[[0, feature_index]])
}
