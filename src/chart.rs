//! Chart data
//!
//! Builds the two curves the charting collaborator draws: the happiness step
//! curve and the decay weight reference curve.

use crate::config::SimulatorConfig;
use crate::decay;
use crate::types::{ChartData, CurvePoint, SampleSet};

/// Vertices of the happiness step curve with step-after interpolation.
///
/// Each value holds until the next point's age, so every point except the
/// last is followed by a corner at `(next.age, value)`.
pub fn step_curve(samples: &SampleSet) -> Vec<CurvePoint> {
    let points = samples.points();
    let mut curve = Vec::with_capacity(points.len() * 2);

    for (i, point) in points.iter().enumerate() {
        curve.push(CurvePoint {
            age: point.age,
            value: point.happiness,
        });
        if let Some(next) = points.get(i + 1) {
            curve.push(CurvePoint {
                age: next.age,
                value: point.happiness,
            });
        }
    }

    curve
}

/// Builder for chart data over a fixed display domain
#[derive(Debug, Clone)]
pub struct ChartBuilder {
    domain_start: f64,
    domain_end: f64,
    samples: usize,
}

impl Default for ChartBuilder {
    fn default() -> Self {
        Self::new(
            decay::DEFAULT_DOMAIN_START,
            decay::DEFAULT_DOMAIN_END,
            decay::DEFAULT_REFERENCE_SAMPLES,
        )
    }
}

impl ChartBuilder {
    pub fn new(domain_start: f64, domain_end: f64, samples: usize) -> Self {
        Self {
            domain_start,
            domain_end,
            samples,
        }
    }

    pub fn from_config(config: &SimulatorConfig) -> Self {
        Self::new(
            config.display_domain.0,
            config.display_domain.1,
            config.reference_samples,
        )
    }

    /// Build both curves for the given samples
    pub fn build(&self, samples: &SampleSet) -> ChartData {
        ChartData {
            step_curve: step_curve(samples),
            reference_curve: decay::reference_curve(
                self.domain_start,
                self.domain_end,
                self.samples,
            ),
        }
    }
}
