//! Baseline models for wiring and demos.

use ndarray::{ArrayD, ArrayView3, IxDyn};
use uf_core::{ModelOutput, PipelineError, PipelineResult, SequenceModel, DAYS_DIFF_COLUMN};

/// Predicts that the next gap equals the most recent one.
#[derive(Debug, Default, Clone, Copy)]
pub struct LastGapModel;

impl SequenceModel for LastGapModel {
    fn name(&self) -> &str {
        "last_gap"
    }

    fn serve(&self, input: ArrayView3<'_, f32>) -> PipelineResult<Vec<ModelOutput>> {
        let (batch, steps, features) = input.dim();
        if batch == 0 || steps == 0 || features <= DAYS_DIFF_COLUMN {
            return Err(PipelineError::Inference(format!(
                "last_gap needs a non-empty window, got {:?}",
                input.dim()
            )));
        }
        let last = input[[0, steps - 1, DAYS_DIFF_COLUMN]];
        let tensor = ArrayD::from_elem(IxDyn(&[1, 1]), last);
        Ok(vec![ModelOutput {
            name: Some("output_0".into()),
            tensor,
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn echoes_last_gap() {
        let mut input = Array3::<f32>::zeros((1, 3, 4));
        input[[0, 2, 0]] = 15.0;
        input[[0, 1, 0]] = 9.0;
        let out = LastGapModel.serve(input.view()).unwrap();
        assert_eq!(out[0].tensor[[0, 0]], 15.0);
    }

    #[test]
    fn empty_window_fails() {
        let input = Array3::<f32>::zeros((1, 0, 4));
        assert!(LastGapModel.serve(input.view()).is_err());
    }
}
