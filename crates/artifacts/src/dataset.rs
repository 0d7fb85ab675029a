use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;
use tracing::info;
use uf_core::{Order, OrderSource, UnitId};

use crate::ArtifactError;

#[derive(Debug, Deserialize)]
struct OrderRecord {
    equipment: String,
    created_on: String,
    marca: String,
    plant: String,
    modelo: f64,
}

/// Consolidated order export held in memory, indexed by unit.
#[derive(Debug, Default)]
pub struct CsvOrderStore {
    by_unit: BTreeMap<UnitId, Vec<Order>>,
    rows: usize,
}

impl CsvOrderStore {
    pub fn from_path(path: &Path) -> Result<Self, ArtifactError> {
        let file = File::open(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self::from_reader(file)?;
        info!(path = %path.display(), rows = store.rows, units = store.by_unit.len(), "loaded order dataset");
        Ok(store)
    }

    /// Columns are matched by header name; unknown columns are ignored.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ArtifactError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut store = Self::default();
        for (i, record) in rdr.deserialize::<OrderRecord>().enumerate() {
            let record = record?;
            // Header is line 1.
            let row = i + 2;
            let equipment = parse_unit_id(&record.equipment).ok_or_else(|| ArtifactError::UnitId {
                row,
                value: record.equipment.clone(),
            })?;
            let created_on =
                parse_timestamp(&record.created_on).ok_or_else(|| ArtifactError::Timestamp {
                    row,
                    value: record.created_on.clone(),
                })?;
            store.by_unit.entry(equipment).or_default().push(Order {
                equipment,
                created_on,
                marca: record.marca,
                plant: record.plant,
                modelo: record.modelo,
            });
            store.rows += 1;
        }
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }
}

impl OrderSource for CsvOrderStore {
    fn orders_for(&self, unit: UnitId) -> Vec<Order> {
        self.by_unit.get(&unit).cloned().unwrap_or_default()
    }

    fn unit_ids(&self) -> Vec<UnitId> {
        self.by_unit.keys().copied().collect()
    }
}

/// Accepts integer ids and integral floats such as `1001.0`.
fn parse_unit_id(raw: &str) -> Option<UnitId> {
    if let Ok(id) = raw.parse::<UnitId>() {
        return Some(id);
    }
    let value = raw.parse::<f64>().ok()?;
    (value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15).then_some(value as UnitId)
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse an order timestamp. Offset-aware values are normalised to UTC.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.naive_utc());
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}
