use ndarray::{Array2, ArrayView1};
use tracing::debug;
use uf_core::{FeatureVector, PipelineError, PipelineResult, Window, FEATURE_COUNT};

use crate::ShortHistoryPolicy;

/// Arranges feature rows into a fixed `[1, window_size, FEATURE_COUNT]` window.
#[derive(Debug, Clone)]
pub struct WindowAssembler {
    window_size: usize,
    policy: ShortHistoryPolicy,
}

impl WindowAssembler {
    pub fn new(window_size: usize, policy: ShortHistoryPolicy) -> Self {
        Self { window_size, policy }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn assemble(&self, features: &[FeatureVector]) -> PipelineResult<Window> {
        let recent = &features[features.len().saturating_sub(self.window_size)..];
        let short = self.window_size - recent.len();
        if recent.is_empty() || (short > 0 && self.policy == ShortHistoryPolicy::Reject) {
            return Err(PipelineError::InsufficientHistory {
                required: self.window_size,
                actual: recent.len(),
            });
        }
        if short > 0 {
            debug!(padding = short, "zero-padding short history");
        }

        let mut rows = Array2::<f64>::zeros((self.window_size, FEATURE_COUNT));
        for (i, fv) in recent.iter().enumerate() {
            let row = fv.to_row();
            rows.row_mut(short + i).assign(&ArrayView1::from(&row[..]));
        }
        Window::from_rows(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(n: usize) -> Vec<FeatureVector> {
        (0..n)
            .map(|i| FeatureVector {
                days_diff: i as f64,
                modelo: 1.0,
                marca_enc: 0,
                plant_enc: 1,
            })
            .collect()
    }

    #[test]
    fn exact_length_is_used_as_is() {
        let window = WindowAssembler::new(40, ShortHistoryPolicy::Reject).assemble(&rows(40)).unwrap();
        assert_eq!(window.shape(), [1, 40, 4]);
        assert_eq!(window.rows()[[0, 0]], 0.0);
        assert_eq!(window.rows()[[39, 0]], 39.0);
        assert_eq!(window.rows()[[39, 3]], 1.0);
    }

    #[test]
    fn long_input_keeps_the_tail() {
        let window = WindowAssembler::new(40, ShortHistoryPolicy::Reject).assemble(&rows(45)).unwrap();
        assert_eq!(window.steps(), 40);
        assert_eq!(window.rows()[[0, 0]], 5.0);
        assert_eq!(window.rows()[[39, 0]], 44.0);
    }

    #[test]
    fn short_input_rejected_by_default() {
        let err = WindowAssembler::new(40, ShortHistoryPolicy::default())
            .assemble(&rows(3))
            .unwrap_err();
        assert_eq!(err, PipelineError::InsufficientHistory { required: 40, actual: 3 });
    }

    #[test]
    fn short_input_padded_at_the_front() {
        let window = WindowAssembler::new(5, ShortHistoryPolicy::ZeroPadFront)
            .assemble(&rows(3))
            .unwrap();
        assert_eq!(window.shape(), [1, 5, 4]);
        assert!(window.rows().row(0).iter().all(|v| *v == 0.0));
        assert!(window.rows().row(1).iter().all(|v| *v == 0.0));
        assert_eq!(window.rows()[[4, 0]], 2.0);
        assert_eq!(window.rows()[[2, 3]], 1.0);
    }

    #[test]
    fn empty_input_never_padded() {
        let err = WindowAssembler::new(5, ShortHistoryPolicy::ZeroPadFront)
            .assemble(&[])
            .unwrap_err();
        assert_eq!(err, PipelineError::InsufficientHistory { required: 5, actual: 0 });
    }
}
