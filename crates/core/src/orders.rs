use chrono::NaiveDateTime;
use ndarray::{Array2, Array3, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};
use crate::{UnitId, FEATURE_COUNT};

/// One historical maintenance/service order for a unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub equipment: UnitId,
    pub created_on: NaiveDateTime,
    pub marca: String,
    pub plant: String,
    pub modelo: f64,
}

/// Derived numeric row for one order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FeatureVector {
    pub days_diff: f64,
    pub modelo: f64,
    pub marca_enc: u32,
    pub plant_enc: u32,
}

impl FeatureVector {
    /// Column order must match training: `[days_diff, modelo, marca_enc, plant_enc]`.
    pub fn to_row(&self) -> [f64; FEATURE_COUNT] {
        [
            self.days_diff,
            self.modelo,
            f64::from(self.marca_enc),
            f64::from(self.plant_enc),
        ]
    }
}

/// Model input of shape `[1, steps, FEATURE_COUNT]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    data: Array3<f64>,
}

impl Window {
    pub fn new(data: Array3<f64>) -> PipelineResult<Self> {
        let shape = data.shape();
        if shape[0] != 1 || shape[2] != FEATURE_COUNT {
            return Err(PipelineError::shape(
                "window",
                [1, shape[1], FEATURE_COUNT],
                shape,
            ));
        }
        Ok(Self { data })
    }

    /// Wrap `[steps, FEATURE_COUNT]` rows into a batch of one.
    pub fn from_rows(rows: Array2<f64>) -> PipelineResult<Self> {
        let (steps, cols) = rows.dim();
        let data = rows
            .into_shape_with_order((1, steps, cols))
            .map_err(|e| PipelineError::shape("window", [1, steps, cols], e.to_string()))?;
        Self::new(data)
    }

    pub fn steps(&self) -> usize {
        self.data.shape()[1]
    }

    pub fn shape(&self) -> [usize; 3] {
        let s = self.data.shape();
        [s[0], s[1], s[2]]
    }

    /// Timestep rows of the single batch entry.
    pub fn rows(&self) -> ArrayView2<'_, f64> {
        self.data.index_axis(ndarray::Axis(0), 0)
    }

    /// Tensor handed to the model, in the model's `float32` dtype.
    pub fn to_tensor(&self) -> Array3<f32> {
        self.data.mapv(|v| v as f32)
    }
}
