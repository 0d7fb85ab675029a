//! Core types and traits for unit forecasting.

use serde::{Deserialize, Serialize};

pub type UnitId = i64;

/// Number of timesteps the sequence model was trained on.
pub const WINDOW_SIZE: usize = 40;
/// Features per timestep, in `[days_diff, modelo, marca_enc, plant_enc]` order.
pub const FEATURE_COUNT: usize = 4;
/// Column holding `days_diff` in every feature row.
pub const DAYS_DIFF_COLUMN: usize = 0;

/// Estimated days until a unit's next order. Never negative.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, PartialOrd)]
pub struct Prediction(pub f64);

impl Prediction {
    /// Clamp a raw model value into a prediction.
    pub fn clamped(raw: f64) -> Self {
        Self(raw.max(0.0))
    }

    pub fn days(&self) -> f64 {
        self.0
    }

    pub fn urgency(&self) -> Urgency {
        Urgency::from_days(self.0)
    }
}

/// Dashboard urgency band for a predicted number of days.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Critical,
    Warning,
    Healthy,
}

impl Urgency {
    pub const CRITICAL_BELOW_DAYS: f64 = 3.0;
    pub const WARNING_BELOW_DAYS: f64 = 8.0;

    pub fn from_days(days: f64) -> Self {
        if days < Self::CRITICAL_BELOW_DAYS {
            Urgency::Critical
        } else if days < Self::WARNING_BELOW_DAYS {
            Urgency::Warning
        } else {
            Urgency::Healthy
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Critical => "critical",
            Urgency::Warning => "warning",
            Urgency::Healthy => "healthy",
        }
    }
}

/// `GET /units` element.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnitSummary {
    pub unit_id: UnitId,
}

/// `GET /predict/{unit_id}` body.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PredictionResponse {
    pub predicted_days_to_next_order: f64,
}

impl From<Prediction> for PredictionResponse {
    fn from(p: Prediction) -> Self {
        Self { predicted_days_to_next_order: p.0 }
    }
}

pub mod collaborators;
pub mod error;
pub mod orders;

pub use collaborators::{CategoryEncoder, FeatureScaler, ModelOutput, OrderSource, SequenceModel};
pub use error::{CategoryField, ErrorKind, PipelineError, PipelineResult};
pub use orders::{FeatureVector, Order, Window};
