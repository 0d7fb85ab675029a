use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::debug;
use uf_core::{CategoryEncoder, CategoryField, FeatureVector, Order, PipelineError, PipelineResult};

/// Turns raw orders into model feature rows.
pub struct FeatureBuilder {
    marca: Arc<dyn CategoryEncoder>,
    plant: Arc<dyn CategoryEncoder>,
}

impl FeatureBuilder {
    pub fn new(marca: Arc<dyn CategoryEncoder>, plant: Arc<dyn CategoryEncoder>) -> Self {
        Self { marca, plant }
    }

    /// One feature vector per order, in chronological order.
    ///
    /// Input order does not matter: orders are stably sorted by `created_on`
    /// before gaps are taken. The first gap is always zero.
    pub fn build(&self, orders: &[Order]) -> PipelineResult<Vec<FeatureVector>> {
        let mut sorted: Vec<&Order> = orders.iter().collect();
        sorted.sort_by_key(|o| o.created_on);

        let mut previous: Option<NaiveDateTime> = None;
        let mut out = Vec::with_capacity(sorted.len());
        for order in sorted {
            let days_diff = previous.map_or(0.0, |prev| whole_days_between(prev, order.created_on));
            previous = Some(order.created_on);
            out.push(FeatureVector {
                days_diff,
                modelo: order.modelo,
                marca_enc: encode(self.marca.as_ref(), CategoryField::Marca, &order.marca)?,
                plant_enc: encode(self.plant.as_ref(), CategoryField::Plant, &order.plant)?,
            });
        }
        debug!(rows = out.len(), "built feature rows");
        Ok(out)
    }
}

/// Whole days elapsed, with partial days dropped.
pub fn whole_days_between(earlier: NaiveDateTime, later: NaiveDateTime) -> f64 {
    (later - earlier).num_days() as f64
}

fn encode(encoder: &dyn CategoryEncoder, field: CategoryField, value: &str) -> PipelineResult<u32> {
    encoder
        .encode(value)
        .ok_or_else(|| PipelineError::UnknownCategory {
            field,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    struct Vocab(&'static [&'static str]);

    impl CategoryEncoder for Vocab {
        fn encode(&self, value: &str) -> Option<u32> {
            self.0.iter().position(|v| *v == value).map(|i| i as u32)
        }

        fn vocabulary_len(&self) -> usize {
            self.0.len()
        }
    }

    fn builder() -> FeatureBuilder {
        FeatureBuilder::new(Arc::new(Vocab(&["A", "B"])), Arc::new(Vocab(&["P0", "P1"])))
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    fn order(created_on: NaiveDateTime, marca: &str) -> Order {
        Order {
            equipment: 1001,
            created_on,
            marca: marca.into(),
            plant: "P1".into(),
            modelo: 10.0,
        }
    }

    #[test]
    fn gaps_are_whole_days() {
        let orders = vec![
            order(at(2024, 1, 1, 0), "A"),
            order(at(2024, 1, 10, 0), "B"),
            order(at(2024, 1, 25, 0), "A"),
        ];
        let rows = builder().build(&orders).unwrap();
        let gaps: Vec<f64> = rows.iter().map(|r| r.days_diff).collect();
        assert_eq!(gaps, [0.0, 9.0, 15.0]);
        assert_eq!(rows[1].marca_enc, 1);
        assert_eq!(rows[0].plant_enc, 1);
        assert_eq!(rows[2].modelo, 10.0);
    }

    #[test]
    fn partial_days_are_truncated() {
        assert_eq!(whole_days_between(at(2024, 1, 1, 18), at(2024, 1, 3, 6)), 1.0);
        assert_eq!(whole_days_between(at(2024, 1, 1, 6), at(2024, 1, 1, 23)), 0.0);
    }

    #[test]
    fn shuffled_input_matches_sorted() {
        let sorted = vec![
            order(at(2023, 12, 30, 0), "A"),
            order(at(2024, 1, 2, 0), "B"),
            order(at(2024, 2, 1, 0), "A"),
            order(at(2024, 2, 4, 0), "B"),
        ];
        let shuffled = vec![sorted[2].clone(), sorted[0].clone(), sorted[3].clone(), sorted[1].clone()];
        assert_eq!(builder().build(&shuffled).unwrap(), builder().build(&sorted).unwrap());
    }

    #[test]
    fn first_gap_is_zero_even_for_a_single_order() {
        let rows = builder().build(&[order(at(2020, 6, 1, 12), "B")]).unwrap();
        assert_eq!(rows[0].days_diff, 0.0);
    }

    #[test]
    fn unknown_brand_is_an_error() {
        let orders = vec![order(at(2024, 1, 1, 0), "A"), order(at(2024, 1, 2, 0), "NOT_A_REAL_BRAND")];
        assert_eq!(
            builder().build(&orders).unwrap_err(),
            PipelineError::UnknownCategory {
                field: CategoryField::Marca,
                value: "NOT_A_REAL_BRAND".into(),
            }
        );
    }

    #[test]
    fn unknown_plant_is_an_error() {
        let mut o = order(at(2024, 1, 1, 0), "A");
        o.plant = "P9".into();
        let err = builder().build(&[o]).unwrap_err();
        assert!(matches!(err, PipelineError::UnknownCategory { field: CategoryField::Plant, .. }));
    }
}
