use std::sync::Arc;

use ndarray::ArrayD;
use tracing::debug;
use uf_core::{ModelOutput, PipelineError, PipelineResult, SequenceModel, Window, FEATURE_COUNT};

/// Calls the model's serving entry point and pulls out the scalar prediction.
pub struct InferenceInvoker {
    model: Arc<dyn SequenceModel>,
    output_name: Option<String>,
    window_size: usize,
}

impl InferenceInvoker {
    pub fn new(model: Arc<dyn SequenceModel>, output_name: Option<String>, window_size: usize) -> Self {
        Self {
            model,
            output_name,
            window_size,
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Scaled `days_diff` prediction at `[0][0]` of the selected output.
    pub fn infer(&self, window: &Window) -> PipelineResult<f64> {
        let expected = [1, self.window_size, FEATURE_COUNT];
        if window.shape() != expected {
            return Err(PipelineError::shape("infer", expected, window.shape()));
        }
        let tensor = window.to_tensor();
        let outputs = self.model.serve(tensor.view())?;
        let output = select_output(&outputs, self.output_name.as_deref())?;
        let value = leading_scalar(&output.tensor)?;
        debug!(model = self.model.name(), value, "model returned");
        Ok(value)
    }
}

fn select_output<'a>(outputs: &'a [ModelOutput], name: Option<&str>) -> PipelineResult<&'a ModelOutput> {
    match name {
        Some(name) => outputs
            .iter()
            .find(|o| o.name.as_deref() == Some(name))
            .ok_or_else(|| PipelineError::Inference(format!("model produced no output named {name:?}"))),
        None => outputs
            .first()
            .ok_or_else(|| PipelineError::Inference("model produced no outputs".into())),
    }
}

/// Element `[0, 0]` of a `[batch, n, 1, ...]` tensor.
fn leading_scalar(tensor: &ArrayD<f32>) -> PipelineResult<f64> {
    let shape = tensor.shape();
    let well_formed = shape.len() >= 2
        && shape[0] >= 1
        && shape[1] >= 1
        && shape[2..].iter().all(|&d| d == 1);
    if !well_formed {
        return Err(PipelineError::Inference(format!(
            "expected an output of at least [1, 1], got {shape:?}"
        )));
    }
    let value = tensor
        .iter()
        .next()
        .copied()
        .ok_or_else(|| PipelineError::Inference("empty output tensor".into()))?;
    if !value.is_finite() {
        return Err(PipelineError::Inference(format!("non-finite output {value}")));
    }
    Ok(f64::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, ArrayView3, IxDyn};

    struct Fixed(Vec<ModelOutput>);

    impl SequenceModel for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn serve(&self, _input: ArrayView3<'_, f32>) -> PipelineResult<Vec<ModelOutput>> {
            Ok(self.0.clone())
        }
    }

    fn output(name: Option<&str>, shape: &[usize], values: Vec<f32>) -> ModelOutput {
        ModelOutput {
            name: name.map(str::to_string),
            tensor: ArrayD::from_shape_vec(IxDyn(shape), values).unwrap(),
        }
    }

    fn window(steps: usize) -> Window {
        Window::from_rows(Array2::zeros((steps, 4))).unwrap()
    }

    #[test]
    fn takes_first_output_when_unnamed() {
        let model = Fixed(vec![output(None, &[1, 1], vec![0.25]), output(None, &[1, 1], vec![9.0])]);
        let invoker = InferenceInvoker::new(Arc::new(model), None, 3);
        assert_eq!(invoker.infer(&window(3)).unwrap(), 0.25);
    }

    #[test]
    fn selects_named_output() {
        let model = Fixed(vec![
            output(Some("aux"), &[1, 1], vec![7.0]),
            output(Some("output_0"), &[1, 2], vec![0.5, 0.9]),
        ]);
        let invoker = InferenceInvoker::new(Arc::new(model), Some("output_0".into()), 3);
        assert_eq!(invoker.infer(&window(3)).unwrap(), 0.5);
    }

    #[test]
    fn missing_named_output_fails() {
        let model = Fixed(vec![output(Some("aux"), &[1, 1], vec![7.0])]);
        let invoker = InferenceInvoker::new(Arc::new(model), Some("output_0".into()), 3);
        assert!(matches!(invoker.infer(&window(3)), Err(PipelineError::Inference(_))));
    }

    #[test]
    fn wrong_window_length_is_a_shape_error() {
        let model = Fixed(vec![output(None, &[1, 1], vec![1.0])]);
        let invoker = InferenceInvoker::new(Arc::new(model), None, 40);
        assert!(matches!(
            invoker.infer(&window(3)),
            Err(PipelineError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn rejects_bad_output_shapes_and_values() {
        for bad in [
            output(None, &[1], vec![1.0]),
            output(None, &[1, 0], vec![]),
            output(None, &[1, 1, 2], vec![1.0, 2.0]),
            output(None, &[1, 1], vec![f32::NAN]),
        ] {
            let invoker = InferenceInvoker::new(Arc::new(Fixed(vec![bad])), None, 3);
            assert!(matches!(invoker.infer(&window(3)), Err(PipelineError::Inference(_))));
        }
    }
}
