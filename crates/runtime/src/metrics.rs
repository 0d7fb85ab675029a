use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use uf_core::{ErrorKind, PipelineResult, Prediction};

#[derive(Clone, Default)]
pub struct MetricsRegistry {
    inner: Arc<MetricsInner>,
}

#[derive(Default)]
struct MetricsInner {
    predictions: AtomicU64,
    not_found: AtomicU64,
    invalid_input: AtomicU64,
    insufficient_history: AtomicU64,
    internal_errors: AtomicU64,
    latency_peak_us: AtomicU64,
}

impl MetricsRegistry {
    /// Count one prediction outcome and its latency.
    pub fn record(&self, outcome: &PipelineResult<Prediction>, elapsed: Duration) {
        let counter = match outcome {
            Ok(_) => &self.inner.predictions,
            Err(e) => match e.kind() {
                ErrorKind::NotFound => &self.inner.not_found,
                ErrorKind::InvalidInput => &self.inner.invalid_input,
                ErrorKind::InsufficientHistory => &self.inner.insufficient_history,
                ErrorKind::Internal | ErrorKind::Unavailable => &self.inner.internal_errors,
            },
        };
        counter.fetch_add(1, Ordering::Relaxed);
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.inner.latency_peak_us.fetch_max(micros, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            predictions: self.inner.predictions.load(Ordering::Relaxed),
            not_found: self.inner.not_found.load(Ordering::Relaxed),
            invalid_input: self.inner.invalid_input.load(Ordering::Relaxed),
            insufficient_history: self.inner.insufficient_history.load(Ordering::Relaxed),
            internal_errors: self.inner.internal_errors.load(Ordering::Relaxed),
            latency_peak_us: self.inner.latency_peak_us.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub predictions: u64,
    pub not_found: u64,
    pub invalid_input: u64,
    pub insufficient_history: u64,
    pub internal_errors: u64,
    pub latency_peak_us: u64,
}

impl MetricsSnapshot {
    pub fn failures(&self) -> u64 {
        self.not_found + self.invalid_input + self.insufficient_history + self.internal_errors
    }

    pub fn to_json_line(&self, label: &str, elapsed: Option<Duration>) -> String {
        #[derive(Serialize)]
        struct Snapshot<'a> {
            label: &'a str,
            #[serde(flatten)]
            counts: &'a MetricsSnapshot,
            elapsed_ms: Option<u128>,
        }

        let payload = Snapshot {
            label,
            counts: self,
            elapsed_ms: elapsed.map(|d| d.as_millis()),
        };
        serde_json::to_string(&payload).unwrap_or_else(|_| String::from("{}"))
    }
}

pub struct RequestTimer {
    start: Instant,
}

impl RequestTimer {
    pub fn start() -> Self {
        Self { start: Instant::now() }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
