//! Boundaries to the dataset, fitted transforms and the pretrained model.
//!
//! Implementations are loaded once and shared read-only, so every trait is
//! `Send + Sync` and takes `&self`.

use ndarray::{Array2, ArrayD, ArrayView2, ArrayView3};

use crate::error::PipelineResult;
use crate::{Order, UnitId};

/// Read-only order history, queryable by unit.
pub trait OrderSource: Send + Sync {
    /// Orders for `unit` in arrival order. Empty when the unit is unknown.
    fn orders_for(&self, unit: UnitId) -> Vec<Order>;

    /// Distinct unit ids, ascending.
    fn unit_ids(&self) -> Vec<UnitId>;
}

/// Fitted string to integer lookup over a closed vocabulary.
pub trait CategoryEncoder: Send + Sync {
    /// `None` for values outside the fitted vocabulary.
    fn encode(&self, value: &str) -> Option<u32>;

    fn vocabulary_len(&self) -> usize;
}

/// Fitted multi-column scaler.
pub trait FeatureScaler: Send + Sync {
    fn n_features(&self) -> usize;

    /// True when each output column depends only on the same input column.
    fn is_column_independent(&self) -> bool;

    fn transform(&self, rows: ArrayView2<'_, f64>) -> PipelineResult<Array2<f64>>;

    fn inverse_transform(&self, rows: ArrayView2<'_, f64>) -> PipelineResult<Array2<f64>>;
}

/// One tensor returned from a model's serving entry point.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOutput {
    pub name: Option<String>,
    pub tensor: ArrayD<f32>,
}

/// Pretrained sequence model behind its serving signature.
pub trait SequenceModel: Send + Sync {
    fn name(&self) -> &str;

    /// Run the model on a `[batch, steps, features]` tensor.
    fn serve(&self, input: ArrayView3<'_, f32>) -> PipelineResult<Vec<ModelOutput>>;
}
