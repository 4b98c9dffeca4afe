//! Core types for the happiness simulator
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: editable table rows, the validated sample set, the integral
//! breakdown, chart data, and the encoded report.

use serde::{Deserialize, Serialize};

/// One row of the user-editable table.
///
/// Either cell may be empty; empty cells are dropped during normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// Age in years
    #[serde(alias = "Age")]
    pub age: Option<f64>,
    /// Happiness level at this age
    #[serde(alias = "Happiness")]
    pub happiness: Option<f64>,
}

impl RawSample {
    pub fn new(age: f64, happiness: f64) -> Self {
        Self {
            age: Some(age),
            happiness: Some(happiness),
        }
    }
}

/// A validated anchor of the happiness step function
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplePoint {
    pub age: f64,
    pub happiness: f64,
}

impl SamplePoint {
    pub fn new(age: f64, happiness: f64) -> Self {
        Self { age, happiness }
    }
}

/// Sample points sorted ascending by age.
///
/// The only way to build one is through [`SampleSet::from_points`], which
/// sorts, so `age[i] <= age[i + 1]` always holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<SamplePoint>", into = "Vec<SamplePoint>")]
pub struct SampleSet {
    points: Vec<SamplePoint>,
}

impl SampleSet {
    /// Build a sample set, stable-sorting the points by age
    pub fn from_points(mut points: Vec<SamplePoint>) -> Self {
        points.sort_by(|a, b| a.age.total_cmp(&b.age));
        Self { points }
    }

    pub fn points(&self) -> &[SamplePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The lifespan N: the largest age present, which bounds the integral
    pub fn lifespan(&self) -> Option<f64> {
        self.points.last().map(|p| p.age)
    }

    /// Consecutive (left, right) pairs, one per step segment
    pub fn segments(&self) -> impl Iterator<Item = (&SamplePoint, &SamplePoint)> {
        self.points.windows(2).map(|w| (&w[0], &w[1]))
    }
}

impl From<Vec<SamplePoint>> for SampleSet {
    fn from(points: Vec<SamplePoint>) -> Self {
        Self::from_points(points)
    }
}

impl From<SampleSet> for Vec<SamplePoint> {
    fn from(set: SampleSet) -> Self {
        set.points
    }
}

/// Why a table row was excluded from integration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    MissingAge,
    MissingHappiness,
    MissingBoth,
    NonFinite,
}

/// A table row excluded during normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedRow {
    /// Position of the row in the table as supplied
    pub index: usize,
    pub reason: DropReason,
}

/// Contribution of one step segment to the total
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentArea {
    pub start_age: f64,
    pub end_age: f64,
    /// Happiness held across the segment (the left point's value)
    pub happiness: f64,
    pub area: f64,
}

/// A single vertex of a plotted curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub age: f64,
    pub value: f64,
}

/// Data handed to the charting collaborator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    /// Happiness step curve, step-after interpolation
    pub step_curve: Vec<CurvePoint>,
    /// Decay weight sampled over the display domain
    pub reference_curve: Vec<CurvePoint>,
}

/// Result of one integration attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Ok {
        /// Full-precision total happiness quantity
        total: f64,
        /// Total rounded for display
        display: String,
    },
    InsufficientData {
        valid_points: usize,
        warning: String,
    },
    DomainError {
        age: f64,
        warning: String,
    },
}

impl Outcome {
    pub fn total(&self) -> Option<f64> {
        match self {
            Outcome::Ok { total, .. } => Some(*total),
            _ => None,
        }
    }

    pub fn warning(&self) -> Option<&str> {
        match self {
            Outcome::Ok { .. } => None,
            Outcome::InsufficientData { warning, .. } | Outcome::DomainError { warning, .. } => {
                Some(warning)
            }
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok { .. })
    }
}

/// Producer metadata embedded in every report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Everything one recomputation produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HappinessReport {
    pub producer: ReportProducer,
    pub computed_at_utc: String,
    pub outcome: Outcome,
    /// Largest age present after filtering
    pub lifespan: Option<f64>,
    /// Filtered, age-sorted samples
    pub samples: SampleSet,
    pub segments: Vec<SegmentArea>,
    pub dropped_rows: Vec<DroppedRow>,
    pub chart: ChartData,
}
