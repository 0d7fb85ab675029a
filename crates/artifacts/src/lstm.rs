//! Stacked LSTM with a dense head, evaluated from exported weights.
//!
//! Weight layout follows Keras: kernels are `[inputs][4 * hidden]` with the
//! gates packed as input, forget, cell, output.

use std::path::Path;

use ndarray::{s, Array1, Array2, ArrayView1, ArrayView3, Axis};
use serde::{Deserialize, Serialize};
use tracing::info;
use uf_core::{ModelOutput, PipelineError, PipelineResult, SequenceModel};

use crate::{read_json, ArtifactError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LstmLayerWeights {
    pub kernel: Vec<Vec<f32>>,
    pub recurrent_kernel: Vec<Vec<f32>>,
    pub bias: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseWeights {
    pub kernel: Vec<Vec<f32>>,
    pub bias: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LstmWeights {
    pub input_size: usize,
    pub hidden_size: usize,
    pub seq_length: usize,
    #[serde(default = "default_output_name")]
    pub output_name: String,
    pub layers: Vec<LstmLayerWeights>,
    pub dense: DenseWeights,
}

fn default_output_name() -> String {
    "output_0".to_string()
}

struct LstmLayer {
    kernel: Array2<f32>,
    recurrent: Array2<f32>,
    bias: Array1<f32>,
    hidden: usize,
}

impl LstmLayer {
    fn step(&self, x: ArrayView1<'_, f32>, h: &Array1<f32>, c: &Array1<f32>) -> (Array1<f32>, Array1<f32>) {
        let z = x.dot(&self.kernel) + h.dot(&self.recurrent) + &self.bias;
        let n = self.hidden;
        let i = z.slice(s![..n]).mapv(sigmoid);
        let f = z.slice(s![n..2 * n]).mapv(sigmoid);
        let g = z.slice(s![2 * n..3 * n]).mapv(f32::tanh);
        let o = z.slice(s![3 * n..]).mapv(sigmoid);
        let c_next = &f * c + &i * &g;
        let h_next = &o * &c_next.mapv(f32::tanh);
        (h_next, c_next)
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

pub struct LstmModel {
    layers: Vec<LstmLayer>,
    dense_kernel: Array2<f32>,
    dense_bias: Array1<f32>,
    input_size: usize,
    hidden_size: usize,
    seq_length: usize,
    output_name: String,
}

impl LstmModel {
    pub fn from_path(path: &Path) -> Result<Self, ArtifactError> {
        let weights: LstmWeights = read_json(path)?;
        let model = Self::from_weights(weights)?;
        info!(
            path = %path.display(),
            layers = model.layers.len(),
            hidden = model.hidden_size,
            seq_length = model.seq_length,
            "loaded sequence model"
        );
        Ok(model)
    }

    pub fn from_weights(w: LstmWeights) -> Result<Self, ArtifactError> {
        if w.layers.is_empty() || w.input_size == 0 || w.hidden_size == 0 || w.seq_length == 0 {
            return Err(ArtifactError::invalid("model", "empty architecture"));
        }
        let gates = 4 * w.hidden_size;
        let mut layers = Vec::with_capacity(w.layers.len());
        for (l, layer) in w.layers.into_iter().enumerate() {
            let inputs = if l == 0 { w.input_size } else { w.hidden_size };
            layers.push(LstmLayer {
                kernel: matrix(layer.kernel, inputs, gates, "lstm kernel")?,
                recurrent: matrix(layer.recurrent_kernel, w.hidden_size, gates, "lstm recurrent kernel")?,
                bias: vector(layer.bias, gates, "lstm bias")?,
                hidden: w.hidden_size,
            });
        }
        let units = w.dense.bias.len();
        if units == 0 {
            return Err(ArtifactError::invalid("model", "dense layer has no units"));
        }
        Ok(Self {
            layers,
            dense_kernel: matrix(w.dense.kernel, w.hidden_size, units, "dense kernel")?,
            dense_bias: vector(w.dense.bias, units, "dense bias")?,
            input_size: w.input_size,
            hidden_size: w.hidden_size,
            seq_length: w.seq_length,
            output_name: w.output_name,
        })
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn seq_length(&self) -> usize {
        self.seq_length
    }

    fn forward_one(&self, sequence: ndarray::ArrayView2<'_, f32>) -> Array1<f32> {
        let zeros = Array1::<f32>::zeros(self.hidden_size);
        let mut h = vec![zeros.clone(); self.layers.len()];
        let mut c = vec![zeros; self.layers.len()];
        for x in sequence.rows() {
            let mut input = x.to_owned();
            for (l, layer) in self.layers.iter().enumerate() {
                let (h_next, c_next) = layer.step(input.view(), &h[l], &c[l]);
                input = h_next.clone();
                h[l] = h_next;
                c[l] = c_next;
            }
        }
        let last = &h[self.layers.len() - 1];
        last.dot(&self.dense_kernel) + &self.dense_bias
    }
}

impl SequenceModel for LstmModel {
    fn name(&self) -> &str {
        "lstm"
    }

    fn serve(&self, input: ArrayView3<'_, f32>) -> PipelineResult<Vec<ModelOutput>> {
        let (batch, steps, features) = input.dim();
        if batch == 0 || steps != self.seq_length || features != self.input_size {
            return Err(PipelineError::Inference(format!(
                "expected input [n, {}, {}], got {:?}",
                self.seq_length,
                self.input_size,
                input.dim()
            )));
        }
        let units = self.dense_bias.len();
        let mut out = Array2::<f32>::zeros((batch, units));
        for (b, sequence) in input.axis_iter(Axis(0)).enumerate() {
            out.row_mut(b).assign(&self.forward_one(sequence));
        }
        if out.iter().any(|v| !v.is_finite()) {
            return Err(PipelineError::Inference("model produced a non-finite value".into()));
        }
        Ok(vec![ModelOutput {
            name: Some(self.output_name.clone()),
            tensor: out.into_dyn(),
        }])
    }
}

fn matrix(rows: Vec<Vec<f32>>, n_rows: usize, n_cols: usize, what: &'static str) -> Result<Array2<f32>, ArtifactError> {
    if rows.len() != n_rows || rows.iter().any(|r| r.len() != n_cols) {
        return Err(ArtifactError::invalid(
            "model",
            format!("{what} must be {n_rows}x{n_cols}"),
        ));
    }
    let flat: Vec<f32> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((n_rows, n_cols), flat)
        .map_err(|e| ArtifactError::invalid("model", format!("{what}: {e}")))
}

fn vector(values: Vec<f32>, len: usize, what: &'static str) -> Result<Array1<f32>, ArtifactError> {
    if values.len() != len {
        return Err(ArtifactError::invalid(
            "model",
            format!("{what} must have {len} entries, got {}", values.len()),
        ));
    }
    Ok(Array1::from_vec(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    /// One unit, one hidden cell, gates driven only by the bias.
    fn tiny(seq_length: usize) -> LstmWeights {
        LstmWeights {
            input_size: 4,
            hidden_size: 1,
            seq_length,
            output_name: default_output_name(),
            layers: vec![LstmLayerWeights {
                kernel: vec![vec![0.0; 4]; 4],
                recurrent_kernel: vec![vec![0.0; 4]],
                // i, f, c, o
                bias: vec![100.0, -100.0, 0.5, 100.0],
            }],
            dense: DenseWeights {
                kernel: vec![vec![2.0]],
                bias: vec![1.0],
            },
        }
    }

    #[test]
    fn bias_only_cell_is_deterministic() {
        let model = LstmModel::from_weights(tiny(3)).unwrap();
        let input = Array3::<f32>::ones((1, 3, 4));
        let out = model.serve(input.view()).unwrap();
        assert_eq!(out[0].name.as_deref(), Some("output_0"));
        assert_eq!(out[0].tensor.shape(), &[1, 1]);
        // Forget gate closed, input and output open: c = tanh(0.5), h = tanh(c).
        let expected = 2.0 * 0.5f32.tanh().tanh() + 1.0;
        assert!((out[0].tensor[[0, 0]] - expected).abs() < 1e-5);
    }

    #[test]
    fn input_drives_the_cell() {
        let mut w = tiny(2);
        w.layers[0].kernel[0][2] = 1.0;
        let model = LstmModel::from_weights(w).unwrap();
        let mut input = Array3::<f32>::zeros((1, 2, 4));
        let base = model.serve(input.view()).unwrap()[0].tensor[[0, 0]];
        input[[0, 1, 0]] = 3.0;
        let moved = model.serve(input.view()).unwrap()[0].tensor[[0, 0]];
        assert!(moved > base);
    }

    #[test]
    fn stacked_layers_take_hidden_inputs() {
        let mut w = tiny(2);
        w.layers.push(LstmLayerWeights {
            kernel: vec![vec![0.0; 4]],
            recurrent_kernel: vec![vec![0.0; 4]],
            bias: vec![100.0, -100.0, 0.5, 100.0],
        });
        let model = LstmModel::from_weights(w).unwrap();
        assert!(model.serve(Array3::<f32>::zeros((1, 2, 4)).view()).is_ok());
    }

    #[test]
    fn wrong_input_shape_is_an_inference_error() {
        let model = LstmModel::from_weights(tiny(40)).unwrap();
        let err = model.serve(Array3::<f32>::zeros((1, 3, 4)).view()).unwrap_err();
        assert!(matches!(err, PipelineError::Inference(_)));
    }

    #[test]
    fn malformed_weights_rejected() {
        let mut w = tiny(3);
        w.layers[0].recurrent_kernel = vec![vec![0.0; 3]];
        assert!(LstmModel::from_weights(w).is_err());
    }
}
