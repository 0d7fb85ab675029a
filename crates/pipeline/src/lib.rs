//! Prediction pipeline: order history in, days-to-next-order out.
//!
//! Stages run strictly forward:
//! extract -> features -> window -> scale -> infer -> unscale.

use serde::{Deserialize, Serialize};
use uf_core::WINDOW_SIZE;

pub mod baseline;
pub mod extract;
pub mod features;
pub mod forecaster;
pub mod inference;
pub mod scaling;
pub mod window;

pub use baseline::LastGapModel;
pub use extract::SequenceExtractor;
pub use features::FeatureBuilder;
pub use forecaster::{Collaborators, FleetForecast, UnitFailure, UnitForecast, UnitForecaster};
pub use inference::InferenceInvoker;
pub use scaling::ScalingAdapter;
pub use window::WindowAssembler;

/// What to do with a unit that has fewer orders than the window holds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShortHistoryPolicy {
    /// Fail with `InsufficientHistory`.
    #[default]
    Reject,
    /// Prepend all-zero feature rows (raw units, before scaling) up to the window size.
    ZeroPadFront,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub window_size: usize,
    pub short_history: ShortHistoryPolicy,
    /// Output tensor to read; `None` takes the first one the model returns.
    pub output_name: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_size: WINDOW_SIZE,
            short_history: ShortHistoryPolicy::Reject,
            output_name: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_fill_missing_fields() {
        let cfg: PipelineConfig = serde_json::from_str(r#"{"short_history":"zero_pad_front"}"#).unwrap();
        assert_eq!(cfg.window_size, 40);
        assert_eq!(cfg.short_history, ShortHistoryPolicy::ZeroPadFront);
        assert_eq!(cfg.output_name, None);
    }
}
