//! Table normalization
//!
//! This module turns the raw editable table into the integrator's input:
//! - Rows with an empty age or happiness cell are dropped
//! - Non-finite values are treated as empty
//! - Survivors are sorted ascending by age (stable, duplicates kept)

use tracing::debug;

use crate::types::{DropReason, DroppedRow, RawSample, SamplePoint, SampleSet};

/// Validated table ready for integration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedTable {
    pub samples: SampleSet,
    pub dropped_rows: Vec<DroppedRow>,
}

/// Normalizer for converting raw table rows to a sample set
pub struct Normalizer;

impl Normalizer {
    /// Filter and sort raw rows
    pub fn normalize(rows: &[RawSample]) -> NormalizedTable {
        let mut points = Vec::with_capacity(rows.len());
        let mut dropped_rows = Vec::new();

        for (index, row) in rows.iter().enumerate() {
            match classify(row) {
                Ok(point) => points.push(point),
                Err(reason) => {
                    debug!(index, ?reason, "dropping table row");
                    dropped_rows.push(DroppedRow { index, reason });
                }
            }
        }

        NormalizedTable {
            samples: SampleSet::from_points(points),
            dropped_rows,
        }
    }
}

fn classify(row: &RawSample) -> Result<SamplePoint, DropReason> {
    match (row.age, row.happiness) {
        (None, None) => Err(DropReason::MissingBoth),
        (None, Some(_)) => Err(DropReason::MissingAge),
        (Some(_), None) => Err(DropReason::MissingHappiness),
        (Some(age), Some(happiness)) if age.is_finite() && happiness.is_finite() => {
            Ok(SamplePoint::new(age, happiness))
        }
        (Some(_), Some(_)) => Err(DropReason::NonFinite),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_drops_incomplete_rows() {
        let rows = vec![
            RawSample::new(10.0, 0.6),
            RawSample {
                age: None,
                happiness: Some(0.3),
            },
            RawSample {
                age: Some(5.0),
                happiness: None,
            },
            RawSample::default(),
            RawSample::new(0.0, 0.5),
        ];

        let table = Normalizer::normalize(&rows);

        assert_eq!(
            table.samples.points(),
            &[SamplePoint::new(0.0, 0.5), SamplePoint::new(10.0, 0.6)]
        );
        assert_eq!(
            table.dropped_rows,
            vec![
                DroppedRow {
                    index: 1,
                    reason: DropReason::MissingAge
                },
                DroppedRow {
                    index: 2,
                    reason: DropReason::MissingHappiness
                },
                DroppedRow {
                    index: 3,
                    reason: DropReason::MissingBoth
                },
            ]
        );
    }

    #[test]
    fn test_non_finite_values_are_dropped() {
        let rows = vec![
            RawSample::new(f64::NAN, 0.5),
            RawSample::new(1.0, f64::INFINITY),
            RawSample::new(2.0, 0.5),
        ];

        let table = Normalizer::normalize(&rows);

        assert_eq!(table.samples.len(), 1);
        assert!(table
            .dropped_rows
            .iter()
            .all(|d| d.reason == DropReason::NonFinite));
    }

    #[test]
    fn test_sorts_by_age() {
        let rows = vec![
            RawSample::new(20.0, 0.7),
            RawSample::new(0.0, 0.5),
            RawSample::new(10.0, 0.6),
        ];

        let table = Normalizer::normalize(&rows);
        let ages: Vec<f64> = table.samples.points().iter().map(|p| p.age).collect();

        assert_eq!(ages, vec![0.0, 10.0, 20.0]);
        assert!(table.dropped_rows.is_empty());
    }

    #[test]
    fn test_negative_ages_pass_through() {
        // Domain checks belong to the integrator
        let table = Normalizer::normalize(&[RawSample::new(-3.0, 0.5), RawSample::new(1.0, 0.5)]);
        assert_eq!(table.samples.points()[0].age, -3.0);
    }
}
