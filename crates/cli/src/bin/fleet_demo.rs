use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use clap::Parser;
use tracing::{info, warn};
use uf_artifacts::{CsvOrderStore, FittedScaler, LabelEncoder};
use uf_core::{Prediction, UnitId, FEATURE_COUNT};
use uf_pipeline::{
    Collaborators, LastGapModel, PipelineConfig, ShortHistoryPolicy, UnitForecaster,
};
use uf_runtime::init_tracing;
use uf_runtime::metrics::{MetricsRegistry, RequestTimer};

const BRANDS: [&str; 3] = ["CAT", "KOMATSU", "VOLVO"];
const PLANTS: [&str; 4] = ["P100", "P200", "P300", "P400"];

#[derive(Parser, Debug)]
#[command(about = "Synthetic fleet run through the forecast pipeline")]
struct Args {
    #[arg(long, default_value_t = 12)]
    units: i64,
    #[arg(long, default_value_t = 48)]
    orders_per_unit: usize,
    /// Zero-pad units with short histories instead of rejecting them.
    #[arg(long)]
    pad: bool,
}

/// Deterministic order export: each unit has its own service cadence, every
/// fourth unit is short on history and the last unit carries an unknown brand.
fn synthetic_csv(units: i64, orders_per_unit: usize) -> String {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap_or(NaiveDate::MIN);
    let mut csv = String::from("equipment,created_on,marca,plant,modelo\n");
    for unit in 0..units {
        let unit_id = 1000 + unit;
        let cadence = 2 + (unit * 5) % 11;
        let count = if unit % 4 == 3 { orders_per_unit / 5 } else { orders_per_unit };
        let brand = if unit == units - 1 { "RETIRED_BRAND" } else { BRANDS[unit as usize % BRANDS.len()] };
        let plant = PLANTS[unit as usize % PLANTS.len()];
        let mut at = start;
        for i in 0..count as i64 {
            at += Duration::days(cadence + (i * 3) % 4);
            let _ = writeln!(csv, "{unit_id},{at},{brand},{plant},{}", 10 + unit % 3);
        }
    }
    csv
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    info!(?args, "fleet_demo starting");

    let csv = synthetic_csv(args.units, args.orders_per_unit);
    let orders = CsvOrderStore::from_reader(csv.as_bytes()).context("synthetic dataset")?;
    let owned = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    let collab = Collaborators {
        orders: Arc::new(orders),
        marca: Arc::new(LabelEncoder::new(owned(&BRANDS[..]))?),
        plant: Arc::new(LabelEncoder::new(owned(&PLANTS[..]))?),
        scaler: Arc::new(FittedScaler::Identity { n_features: FEATURE_COUNT }),
        model: Arc::new(LastGapModel),
    };
    let config = PipelineConfig {
        short_history: if args.pad { ShortHistoryPolicy::ZeroPadFront } else { ShortHistoryPolicy::Reject },
        ..PipelineConfig::default()
    };
    let forecaster = UnitForecaster::new(collab, config)?;
    let metrics = MetricsRegistry::default();

    let run = RequestTimer::start();
    let mut ranking: Vec<(UnitId, Prediction)> = Vec::new();
    for unit_id in forecaster.list_units() {
        let timer = RequestTimer::start();
        let outcome = forecaster.predict(unit_id);
        metrics.record(&outcome, timer.elapsed());
        match outcome {
            Ok(p) => ranking.push((unit_id, p)),
            Err(e) => warn!(unit_id, kind = ?e.kind(), error = %e, "unit skipped"),
        }
    }

    rank_by_days(&mut ranking);
    for (rank, (unit_id, p)) in ranking.iter().enumerate() {
        info!(
            rank = rank + 1,
            unit_id = *unit_id,
            days = p.days(),
            urgency = p.urgency().as_str(),
            "fleet ranking"
        );
    }

    let snapshot = metrics.snapshot();
    info!(metrics = %snapshot.to_json_line("fleet_demo", Some(run.elapsed())), "final metrics summary");
    Ok(())
}

/// Soonest expected order first; ties go to the lower unit id.
fn rank_by_days(ranking: &mut [(UnitId, Prediction)]) {
    ranking.sort_by(|a, b| a.1.days().total_cmp(&b.1.days()).then_with(|| a.0.cmp(&b.0)));
}
