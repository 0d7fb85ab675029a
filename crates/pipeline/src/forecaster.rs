use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};
use uf_core::{
    CategoryEncoder, ErrorKind, FeatureScaler, Order, OrderSource, PipelineError, PipelineResult,
    Prediction, SequenceModel, UnitId, Urgency,
};

use crate::extract::{most_recent, sort_chronologically};
use crate::{
    FeatureBuilder, InferenceInvoker, PipelineConfig, ScalingAdapter, SequenceExtractor,
    WindowAssembler,
};

/// Shared read-only handles the pipeline is built from.
#[derive(Clone)]
pub struct Collaborators {
    pub orders: Arc<dyn OrderSource>,
    pub marca: Arc<dyn CategoryEncoder>,
    pub plant: Arc<dyn CategoryEncoder>,
    pub scaler: Arc<dyn FeatureScaler>,
    pub model: Arc<dyn SequenceModel>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UnitForecast {
    pub unit_id: UnitId,
    pub predicted_days_to_next_order: f64,
    pub urgency: Urgency,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UnitFailure {
    pub unit_id: UnitId,
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct FleetForecast {
    /// Most urgent first.
    pub forecasts: Vec<UnitForecast>,
    pub failures: Vec<UnitFailure>,
}

/// End-to-end `predict(unit_id) -> days` plus the other caller-facing reads.
///
/// Holds no mutable state; share it behind an `Arc` across threads.
pub struct UnitForecaster {
    extractor: SequenceExtractor,
    features: FeatureBuilder,
    assembler: WindowAssembler,
    scaling: ScalingAdapter,
    invoker: InferenceInvoker,
}

impl UnitForecaster {
    pub fn new(collab: Collaborators, config: PipelineConfig) -> PipelineResult<Self> {
        if config.window_size == 0 {
            return Err(PipelineError::shape("config", "window_size > 0", 0));
        }
        let scaling = ScalingAdapter::new(collab.scaler)?;
        let invoker = InferenceInvoker::new(collab.model, config.output_name, config.window_size);
        info!(
            window = config.window_size,
            policy = ?config.short_history,
            model = invoker.model_name(),
            "forecaster ready"
        );
        Ok(Self {
            extractor: SequenceExtractor::new(collab.orders, config.window_size),
            features: FeatureBuilder::new(collab.marca, collab.plant),
            assembler: WindowAssembler::new(config.window_size, config.short_history),
            scaling,
            invoker,
        })
    }

    pub fn list_units(&self) -> Vec<UnitId> {
        self.extractor.unit_ids()
    }

    pub fn unit_history(&self, unit_id: UnitId) -> PipelineResult<Vec<Order>> {
        self.extractor.history(unit_id)
    }

    pub fn predict(&self, unit_id: UnitId) -> PipelineResult<Prediction> {
        let outcome = self
            .extractor
            .extract(unit_id)
            .and_then(|recent| self.run(&recent));
        match &outcome {
            Ok(p) => debug!(unit_id, predicted_days = p.days(), "prediction"),
            Err(e) => report(Some(unit_id), e),
        }
        outcome
    }

    /// Predict from a caller-supplied history instead of the dataset.
    pub fn predict_orders(&self, orders: &[Order]) -> PipelineResult<Prediction> {
        let mut sorted = orders.to_vec();
        sort_chronologically(&mut sorted);
        let recent = most_recent(sorted, self.assembler.window_size());
        self.run(&recent).inspect_err(|e| report(None, e))
    }

    /// Predict every known unit. A failing unit is recorded, never fatal.
    pub fn forecast_fleet(&self) -> FleetForecast {
        let mut fleet = FleetForecast::default();
        for unit_id in self.list_units() {
            match self.predict(unit_id) {
                Ok(p) => fleet.forecasts.push(UnitForecast {
                    unit_id,
                    predicted_days_to_next_order: p.days(),
                    urgency: p.urgency(),
                }),
                Err(e) => fleet.failures.push(UnitFailure {
                    unit_id,
                    kind: e.kind(),
                    message: e.to_string(),
                }),
            }
        }
        fleet.forecasts.sort_by(|a, b| {
            a.predicted_days_to_next_order
                .total_cmp(&b.predicted_days_to_next_order)
                .then_with(|| a.unit_id.cmp(&b.unit_id))
        });
        info!(
            forecasts = fleet.forecasts.len(),
            failures = fleet.failures.len(),
            "fleet forecast complete"
        );
        fleet
    }

    fn run(&self, recent: &[Order]) -> PipelineResult<Prediction> {
        let features = self.features.build(recent)?;
        let window = self.assembler.assemble(&features)?;
        let scaled = self.scaling.scale(&window)?;
        let raw = self.invoker.infer(&scaled)?;
        let days = self.scaling.unscale(raw)?;
        Ok(Prediction::clamped(days))
    }
}

fn report(unit_id: Option<UnitId>, err: &PipelineError) {
    match err.kind() {
        ErrorKind::Internal | ErrorKind::Unavailable => error!(?unit_id, error = %err, "prediction failed"),
        ErrorKind::InvalidInput => warn!(?unit_id, error = %err, "prediction rejected"),
        ErrorKind::NotFound | ErrorKind::InsufficientHistory => {
            debug!(?unit_id, error = %err, "prediction unavailable")
        }
    }
}
