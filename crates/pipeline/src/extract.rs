use std::sync::Arc;

use uf_core::{Order, OrderSource, PipelineError, PipelineResult, UnitId};

/// Pulls a unit's history out of the dataset, oldest first.
pub struct SequenceExtractor {
    source: Arc<dyn OrderSource>,
    window_size: usize,
}

impl SequenceExtractor {
    pub fn new(source: Arc<dyn OrderSource>, window_size: usize) -> Self {
        Self { source, window_size }
    }

    /// The most recent `window_size` orders of `unit`, ascending by `created_on`.
    pub fn extract(&self, unit: UnitId) -> PipelineResult<Vec<Order>> {
        let orders = self.history(unit)?;
        Ok(most_recent(orders, self.window_size))
    }

    /// Full chronological history of `unit`.
    pub fn history(&self, unit: UnitId) -> PipelineResult<Vec<Order>> {
        let mut orders = self.source.orders_for(unit);
        if orders.is_empty() {
            return Err(PipelineError::NotFound { unit_id: unit });
        }
        sort_chronologically(&mut orders);
        Ok(orders)
    }

    pub fn unit_ids(&self) -> Vec<UnitId> {
        self.source.unit_ids()
    }
}

/// Stable sort, so orders sharing a timestamp keep arrival order.
pub fn sort_chronologically(orders: &mut [Order]) {
    orders.sort_by_key(|o| o.created_on);
}

/// Keep the last `n` elements.
pub fn most_recent<T>(mut items: Vec<T>, n: usize) -> Vec<T> {
    let excess = items.len().saturating_sub(n);
    items.drain(..excess);
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    struct MapSource(HashMap<UnitId, Vec<Order>>);

    impl OrderSource for MapSource {
        fn orders_for(&self, unit: UnitId) -> Vec<Order> {
            self.0.get(&unit).cloned().unwrap_or_default()
        }

        fn unit_ids(&self) -> Vec<UnitId> {
            let mut ids: Vec<_> = self.0.keys().copied().collect();
            ids.sort_unstable();
            ids
        }
    }

    fn order(day: u32, plant: &str) -> Order {
        Order {
            equipment: 1,
            created_on: NaiveDate::from_ymd_opt(2024, 1, day)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            marca: "A".into(),
            plant: plant.into(),
            modelo: 1.0,
        }
    }

    #[test]
    fn unknown_unit_is_not_found() {
        let extractor = SequenceExtractor::new(Arc::new(MapSource(HashMap::new())), 40);
        assert_eq!(
            extractor.extract(99).unwrap_err(),
            PipelineError::NotFound { unit_id: 99 }
        );
    }

    #[test]
    fn sorts_and_keeps_tail() {
        let orders = vec![order(5, "x"), order(1, "x"), order(3, "x"), order(2, "x")];
        let source = MapSource(HashMap::from([(1, orders)]));
        let extractor = SequenceExtractor::new(Arc::new(source), 2);
        let days: Vec<_> = extractor
            .extract(1)
            .unwrap()
            .iter()
            .map(|o| o.created_on.date().format("%d").to_string())
            .collect();
        assert_eq!(days, ["03", "05"]);
    }

    #[test]
    fn ties_keep_arrival_order() {
        let mut orders = vec![order(2, "second"), order(1, "first"), order(2, "third")];
        sort_chronologically(&mut orders);
        let plants: Vec<_> = orders.iter().map(|o| o.plant.as_str()).collect();
        assert_eq!(plants, ["first", "second", "third"]);
    }

    #[test]
    fn most_recent_shorter_than_n_is_untouched() {
        assert_eq!(most_recent(vec![1, 2, 3], 5), vec![1, 2, 3]);
        assert_eq!(most_recent(vec![1, 2, 3], 2), vec![2, 3]);
    }
}
