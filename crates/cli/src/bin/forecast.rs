use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;
use uf_core::{ErrorKind, PipelineError, PredictionResponse, UnitId, UnitSummary};
use uf_pipeline::ShortHistoryPolicy;
use uf_runtime::metrics::{MetricsRegistry, RequestTimer};
use uf_runtime::{init_tracing, start_forecaster, ServiceConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Days until each equipment unit's next service order")]
struct Args {
    /// JSON service config; flags below override it.
    #[arg(long, env = "UF_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, env = "UF_DATASET")]
    dataset: Option<PathBuf>,
    #[arg(long, env = "UF_MARCA_ENCODER")]
    marca_encoder: Option<PathBuf>,
    #[arg(long, env = "UF_PLANT_ENCODER")]
    plant_encoder: Option<PathBuf>,
    #[arg(long, env = "UF_SCALER")]
    scaler: Option<PathBuf>,
    #[arg(long, env = "UF_MODEL")]
    model: Option<PathBuf>,
    #[arg(long, value_enum, env = "UF_SHORT_HISTORY")]
    short_history: Option<ShortHistory>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every unit id in the dataset.
    Units,
    /// Print a unit's order history, oldest first.
    History { unit_id: UnitId },
    /// Predict days until a unit's next order.
    Predict { unit_id: UnitId },
    /// Predict every unit, most urgent first.
    Fleet,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ShortHistory {
    Reject,
    Pad,
}

impl From<ShortHistory> for ShortHistoryPolicy {
    fn from(value: ShortHistory) -> Self {
        match value {
            ShortHistory::Reject => ShortHistoryPolicy::Reject,
            ShortHistory::Pad => ShortHistoryPolicy::ZeroPadFront,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    kind: ErrorKind,
    unit_id: Option<UnitId>,
}

impl Args {
    fn service_config(&self) -> Result<ServiceConfig> {
        let mut cfg = match &self.config {
            Some(path) => ServiceConfig::from_file(path)?,
            None => ServiceConfig::default(),
        };
        let paths = &mut cfg.artifacts;
        for (slot, value) in [
            (&mut paths.dataset, &self.dataset),
            (&mut paths.marca_encoder, &self.marca_encoder),
            (&mut paths.plant_encoder, &self.plant_encoder),
            (&mut paths.scaler, &self.scaler),
            (&mut paths.model, &self.model),
        ] {
            if let Some(v) = value {
                *slot = v.clone();
            }
        }
        if let Some(policy) = self.short_history {
            cfg.pipeline.short_history = policy.into();
        }
        Ok(cfg)
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_error(unit_id: Option<UnitId>, err: &PipelineError) -> Result<ExitCode> {
    print_json(&ErrorBody {
        error: err.to_string(),
        kind: err.kind(),
        unit_id,
    })?;
    Ok(if err.is_user_visible() {
        ExitCode::from(2)
    } else {
        ExitCode::FAILURE
    })
}

fn main() -> Result<ExitCode> {
    init_tracing();
    let args = Args::parse();
    let cfg = args.service_config()?;
    let forecaster = start_forecaster(&cfg)?;

    match args.command {
        Command::Units => {
            let units: Vec<UnitSummary> = forecaster
                .list_units()
                .into_iter()
                .map(|unit_id| UnitSummary { unit_id })
                .collect();
            print_json(&units)?;
        }
        Command::History { unit_id } => match forecaster.unit_history(unit_id) {
            Ok(orders) => print_json(&orders)?,
            Err(e) => return print_error(Some(unit_id), &e),
        },
        Command::Predict { unit_id } => {
            let metrics = MetricsRegistry::default();
            let timer = RequestTimer::start();
            let outcome = forecaster.predict(unit_id);
            let elapsed = timer.elapsed();
            metrics.record(&outcome, elapsed);
            info!(metrics = %metrics.snapshot().to_json_line("predict", Some(elapsed)), "request done");
            match outcome {
                Ok(p) => print_json(&PredictionResponse::from(p))?,
                Err(e) => return print_error(Some(unit_id), &e),
            }
        }
        Command::Fleet => {
            let timer = RequestTimer::start();
            let fleet = forecaster.forecast_fleet();
            print_json(&fleet)?;
            info!(
                forecasts = fleet.forecasts.len(),
                failures = fleet.failures.len(),
                elapsed_ms = timer.elapsed().as_millis(),
                "fleet done"
            );
        }
    }

    Ok(ExitCode::SUCCESS)
}
