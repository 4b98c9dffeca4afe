//! Step-function integration
//!
//! Integrates the happiness step function against the decay weight over
//! `[age[0], N]` where N is the largest age present. On each segment
//! `[age[i], age[i + 1])` the happiness is the left point's value, so the
//! segment integral has the closed form
//! `happiness[i] * (ln(age[i + 1] + 1) - ln(age[i] + 1))`.
//!
//! The last point's happiness never contributes: integration stops at N.

use tracing::warn;

use crate::decay;
use crate::error::ComputeError;
use crate::types::{SampleSet, SegmentArea};

/// Minimum number of points for a non-empty integral
pub const MIN_POINTS: usize = 2;

/// Closed-form integrator for piecewise-constant happiness
pub struct StepIntegrator;

impl StepIntegrator {
    /// Total happiness quantity
    pub fn integrate(samples: &SampleSet) -> Result<f64, ComputeError> {
        Ok(Self::segments(samples)?.iter().map(|s| s.area).sum())
    }

    /// Per-segment breakdown of the integral
    pub fn segments(samples: &SampleSet) -> Result<Vec<SegmentArea>, ComputeError> {
        check_input(samples)?;

        Ok(samples
            .segments()
            .map(|(left, right)| SegmentArea {
                start_age: left.age,
                end_age: right.age,
                happiness: left.happiness,
                area: left.happiness
                    * (decay::antiderivative(right.age) - decay::antiderivative(left.age)),
            })
            .collect())
    }
}

fn check_input(samples: &SampleSet) -> Result<(), ComputeError> {
    if samples.len() < MIN_POINTS {
        warn!(valid_points = samples.len(), "not enough points to integrate");
        return Err(ComputeError::InsufficientData {
            valid_points: samples.len(),
        });
    }

    // Sorted ascending, so the first point is the smallest age
    if let Some(bad) = samples.points().iter().find(|p| !decay::in_domain(p.age)) {
        warn!(age = bad.age, "age outside the logarithm's domain");
        return Err(ComputeError::DomainError { age: bad.age });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SamplePoint;
    use proptest::prelude::*;

    fn set(points: &[(f64, f64)]) -> SampleSet {
        SampleSet::from_points(points.iter().map(|&(a, h)| SamplePoint::new(a, h)).collect())
    }

    fn assert_close(actual: f64, expected: f64) {
        let tolerance = 1e-9 * expected.abs().max(1.0);
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_three_point_scenario() {
        let total = StepIntegrator::integrate(&set(&[(0.0, 0.5), (10.0, 0.6), (20.0, 0.7)])).unwrap();
        let expected = 0.5 * 11.0_f64.ln() + 0.6 * (21.0_f64.ln() - 11.0_f64.ln());

        assert_close(total, expected);
        assert!((total - 1.58692).abs() < 1e-5);
    }

    #[test]
    fn test_full_lifespan_constant_happiness() {
        let total = StepIntegrator::integrate(&set(&[(0.0, 1.0), (100.0, 1.0)])).unwrap();
        assert!((total - 4.61512).abs() < 1e-5);
    }

    #[test]
    fn test_last_point_happiness_is_unused() {
        let a = StepIntegrator::integrate(&set(&[(0.0, 0.5), (30.0, 0.9)])).unwrap();
        let b = StepIntegrator::integrate(&set(&[(0.0, 0.5), (30.0, -42.0)])).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_segment_breakdown() {
        let segments = StepIntegrator::segments(&set(&[(0.0, 0.5), (10.0, 0.6), (20.0, 0.7)])).unwrap();

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].start_age, 0.0);
        assert_eq!(segments[0].end_age, 10.0);
        assert_eq!(segments[0].happiness, 0.5);
        assert_eq!(segments[1].happiness, 0.6);
        assert_close(segments[0].area, 0.5 * 11.0_f64.ln());
    }

    #[test]
    fn test_duplicate_ages_contribute_zero() {
        let segments = StepIntegrator::segments(&set(&[(0.0, 0.5), (10.0, 99.0), (10.0, 0.6), (20.0, 0.1)])).unwrap();
        assert_eq!(segments[1].area, 0.0);
    }

    #[test]
    fn test_insufficient_data() {
        for points in [&[][..], &[(5.0, 0.8)][..]] {
            match StepIntegrator::integrate(&set(points)) {
                Err(ComputeError::InsufficientData { valid_points }) => {
                    assert_eq!(valid_points, points.len())
                }
                other => panic!("expected InsufficientData, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_domain_error() {
        for age in [-1.0, -2.5] {
            match StepIntegrator::integrate(&set(&[(age, 0.5), (10.0, 0.6)])) {
                Err(ComputeError::DomainError { age: bad }) => assert_eq!(bad, age),
                other => panic!("expected DomainError, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_single_out_of_domain_point_is_insufficient() {
        let result = StepIntegrator::integrate(&set(&[(-5.0, 0.5)]));
        assert!(matches!(result, Err(ComputeError::InsufficientData { .. })));
    }

    #[test]
    fn test_ages_between_minus_one_and_zero_are_allowed() {
        let total = StepIntegrator::integrate(&set(&[(-0.5, 1.0), (1.0, 1.0)])).unwrap();
        assert_close(total, 2.0_f64.ln() - 0.5_f64.ln());
    }

    proptest! {
        #[test]
        fn two_point_closed_form(
            a0 in -0.99f64..200.0,
            width in 0.0f64..200.0,
            h0 in -10.0f64..10.0,
            h1 in -10.0f64..10.0,
        ) {
            let a1 = a0 + width;
            let total = StepIntegrator::integrate(&set(&[(a0, h0), (a1, h1)])).unwrap();
            let expected = h0 * ((a1 + 1.0).ln() - (a0 + 1.0).ln());
            prop_assert!((total - expected).abs() <= 1e-9 * expected.abs().max(1.0));
        }

        #[test]
        fn segment_monotonic_in_right_age(
            a0 in 0.0f64..100.0,
            width in 0.1f64..50.0,
            extra in 0.1f64..50.0,
            h0 in -5.0f64..5.0,
        ) {
            let short = StepIntegrator::integrate(&set(&[(a0, h0), (a0 + width, 0.0)])).unwrap();
            let long = StepIntegrator::integrate(&set(&[(a0, h0), (a0 + width + extra, 0.0)])).unwrap();
            if h0 > 0.0 {
                prop_assert!(long > short);
            } else if h0 < 0.0 {
                prop_assert!(long < short);
            } else {
                prop_assert_eq!(long, short);
            }
        }

        #[test]
        fn integration_is_deterministic(
            points in proptest::collection::vec((0.0f64..100.0, -1.0f64..1.0), 2..30),
        ) {
            let samples = set(&points);
            let first = StepIntegrator::integrate(&samples).unwrap();
            let second = StepIntegrator::integrate(&samples).unwrap();
            prop_assert_eq!(first.to_bits(), second.to_bits());
        }

        #[test]
        fn equal_ages_contribute_nothing(age in 0.0f64..100.0, h in -10.0f64..10.0) {
            let total = StepIntegrator::integrate(&set(&[(age, h), (age, 0.3)])).unwrap();
            prop_assert_eq!(total, 0.0);
        }
    }
}
