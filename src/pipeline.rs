//! Pipeline orchestration
//!
//! This module provides the public API of the simulator. Every recomputation
//! runs the full pipeline over the current table:
//! 1. Normalizer - drop incomplete rows and sort by age
//! 2. StepIntegrator - closed-form integral against the decay weight
//! 3. ChartBuilder - step curve and reference curve
//! 4. ReportEncoder - assemble the report
//!
//! Table edits are discrete events. A [`HappinessSession`] owns one user's
//! table and recomputes after each edit; sessions share nothing.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::adapter::{TableAdapter, TableFormat};
use crate::chart::ChartBuilder;
use crate::config::SimulatorConfig;
use crate::encoder::ReportEncoder;
use crate::error::ComputeError;
use crate::integrator::StepIntegrator;
use crate::normalizer::Normalizer;
use crate::types::{HappinessReport, RawSample};

/// Convert a serialized table to a report JSON (stateless, one-shot).
///
/// # Example
/// ```ignore
/// let report = table_to_report(
///     r#"[{"age": 0, "happiness": 1.0}, {"age": 100, "happiness": 1.0}]"#.to_string(),
///     TableFormat::Array,
/// )?;
/// ```
pub fn table_to_report(input: String, format: TableFormat) -> Result<String, ComputeError> {
    let rows = TableAdapter::parse(&input, format)?;
    let evaluator = Evaluator::default();
    let report = evaluator.evaluate(&rows)?;
    evaluator.encoder.encode_to_json(&report)
}

/// Run one recomputation over `rows` with the given configuration
pub fn evaluate(rows: &[RawSample], config: &SimulatorConfig) -> Result<HappinessReport, ComputeError> {
    Evaluator::new(config).evaluate(rows)
}

/// Stateless pipeline with fixed chart and encoding settings
#[derive(Debug, Clone)]
pub struct Evaluator {
    chart: ChartBuilder,
    encoder: ReportEncoder,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(&SimulatorConfig::default())
    }
}

impl Evaluator {
    pub fn new(config: &SimulatorConfig) -> Self {
        Self {
            chart: ChartBuilder::from_config(config),
            encoder: ReportEncoder::new(config),
        }
    }

    pub fn encoder(&self) -> &ReportEncoder {
        &self.encoder
    }

    /// Validate, sort, integrate and chart the rows
    pub fn evaluate(&self, rows: &[RawSample]) -> Result<HappinessReport, ComputeError> {
        let table = Normalizer::normalize(rows);
        let integration = StepIntegrator::segments(&table.samples);
        let chart = self.chart.build(&table.samples);

        debug!(
            rows = rows.len(),
            valid = table.samples.len(),
            ok = integration.is_ok(),
            "recomputed happiness quantity"
        );

        self.encoder.encode(table, integration, chart)
    }
}

/// One edit to the session's table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TableEdit {
    /// Insert a row at `index`, or append when no index is given
    Insert {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
        #[serde(default)]
        age: Option<f64>,
        #[serde(default)]
        happiness: Option<f64>,
    },
    /// Change cells of an existing row.
    ///
    /// An absent field leaves the cell alone; an explicit `null` clears it.
    Update {
        index: usize,
        #[serde(
            default,
            deserialize_with = "present",
            skip_serializing_if = "Option::is_none"
        )]
        age: Option<Option<f64>>,
        #[serde(
            default,
            deserialize_with = "present",
            skip_serializing_if = "Option::is_none"
        )]
        happiness: Option<Option<f64>>,
    },
    Delete {
        index: usize,
    },
    /// Replace the whole table
    Replace {
        rows: Vec<RawSample>,
    },
    /// Restore the configured initial table
    Reset,
}

// Distinguishes a field given as `null` from an absent field
fn present<'de, D>(deserializer: D) -> Result<Option<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer).map(Some)
}

/// A single user's editing session.
///
/// Owns the live table; each edit triggers a full recomputation.
#[derive(Debug, Clone)]
pub struct HappinessSession {
    id: Uuid,
    config: SimulatorConfig,
    rows: Vec<RawSample>,
    evaluator: Evaluator,
}

impl Default for HappinessSession {
    fn default() -> Self {
        Self::new(SimulatorConfig::default())
    }
}

impl HappinessSession {
    /// Start a session from the configured initial table
    pub fn new(config: SimulatorConfig) -> Self {
        let rows = config.initial_table.clone();
        Self::with_rows(config, rows)
    }

    /// Start a session from an explicit table
    pub fn with_rows(config: SimulatorConfig, rows: Vec<RawSample>) -> Self {
        let evaluator = Evaluator::new(&config);
        Self {
            id: Uuid::new_v4(),
            config,
            rows,
            evaluator,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current table, in edit order
    pub fn rows(&self) -> &[RawSample] {
        &self.rows
    }

    /// Recompute over the current table
    pub fn report(&self) -> Result<HappinessReport, ComputeError> {
        self.evaluator.evaluate(&self.rows)
    }

    /// Apply an edit and recompute.
    ///
    /// A rejected edit leaves the table untouched.
    pub fn apply(&mut self, edit: TableEdit) -> Result<HappinessReport, ComputeError> {
        debug!(session = %self.id, ?edit, "applying table edit");

        match edit {
            TableEdit::Insert {
                index,
                age,
                happiness,
            } => {
                let row = RawSample { age, happiness };
                match index {
                    None => self.rows.push(row),
                    Some(i) if i <= self.rows.len() => self.rows.insert(i, row),
                    Some(i) => return Err(self.out_of_range("insert at", i)),
                }
            }
            TableEdit::Update {
                index,
                age,
                happiness,
            } => {
                let len = self.rows.len();
                let row = self
                    .rows
                    .get_mut(index)
                    .ok_or_else(|| out_of_range("update", index, len))?;
                if let Some(age) = age {
                    row.age = age;
                }
                if let Some(happiness) = happiness {
                    row.happiness = happiness;
                }
            }
            TableEdit::Delete { index } => {
                if index >= self.rows.len() {
                    return Err(self.out_of_range("delete", index));
                }
                self.rows.remove(index);
            }
            TableEdit::Replace { rows } => self.rows = rows,
            TableEdit::Reset => self.rows = self.config.initial_table.clone(),
        }

        self.report()
    }

    /// Apply an edit given as JSON and return the report JSON
    pub fn apply_json(&mut self, edit_json: &str) -> Result<String, ComputeError> {
        let edit: TableEdit = serde_json::from_str(edit_json)?;
        let report = self.apply(edit)?;
        self.evaluator.encoder().encode_to_json(&report)
    }

    fn out_of_range(&self, action: &str, index: usize) -> ComputeError {
        out_of_range(action, index, self.rows.len())
    }
}

fn out_of_range(action: &str, index: usize, len: usize) -> ComputeError {
    ComputeError::InvalidEdit(format!(
        "cannot {action} row {index}: table has {len} rows"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DropReason, Outcome};
    use pretty_assertions::assert_eq;

    fn total(report: &HappinessReport) -> f64 {
        report.outcome.total().expect("expected a numeric total")
    }

    #[test]
    fn test_table_to_report() {
        let json = table_to_report(
            r#"[{"age": 0, "happiness": 1.0}, {"age": 100, "happiness": 1.0}]"#.to_string(),
            TableFormat::Array,
        )
        .unwrap();

        let report: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(report["outcome"]["status"], "ok");
        assert_eq!(report["outcome"]["display"], "4.61512");
        assert_eq!(report["producer"]["name"], "happiness-sim");
        assert_eq!(report["chart"]["reference_curve"].as_array().unwrap().len(), 500);
    }

    #[test]
    fn test_table_to_report_invalid_json() {
        assert!(table_to_report("not json".to_string(), TableFormat::Array).is_err());
    }

    #[test]
    fn test_evaluate_keeps_chart_on_failure() {
        let report = evaluate(&[RawSample::new(5.0, 0.8)], &SimulatorConfig::default()).unwrap();

        assert!(matches!(
            report.outcome,
            Outcome::InsufficientData { valid_points: 1, .. }
        ));
        assert_eq!(report.chart.step_curve.len(), 1);
        assert_eq!(report.chart.reference_curve.len(), 500);
    }

    #[test]
    fn test_default_session_table() {
        let session = HappinessSession::default();
        let report = session.report().unwrap();

        assert_eq!(session.rows().len(), 7);
        assert_eq!(report.lifespan, Some(100.0));
        assert!((total(&report) - 2.692476).abs() < 1e-6);
    }

    #[test]
    fn test_session_edits_recompute() {
        let mut session = HappinessSession::with_rows(SimulatorConfig::default(), Vec::new());

        let report = session
            .apply(TableEdit::Insert {
                index: None,
                age: Some(100.0),
                happiness: Some(1.0),
            })
            .unwrap();
        assert!(!report.outcome.is_ok());

        let report = session
            .apply(TableEdit::Insert {
                index: Some(0),
                age: Some(0.0),
                happiness: Some(1.0),
            })
            .unwrap();
        assert!((total(&report) - 101.0_f64.ln()).abs() < 1e-12);

        let report = session
            .apply(TableEdit::Update {
                index: 0,
                age: None,
                happiness: Some(Some(2.0)),
            })
            .unwrap();
        assert!((total(&report) - 2.0 * 101.0_f64.ln()).abs() < 1e-12);

        let report = session.apply(TableEdit::Delete { index: 1 }).unwrap();
        assert!(matches!(report.outcome, Outcome::InsufficientData { .. }));
        assert_eq!(session.rows(), &[RawSample::new(0.0, 2.0)]);
    }

    #[test]
    fn test_session_clearing_a_cell_drops_row() {
        let mut session = HappinessSession::with_rows(
            SimulatorConfig::default(),
            vec![RawSample::new(0.0, 0.5), RawSample::new(10.0, 0.6), RawSample::new(20.0, 0.7)],
        );

        let report = session.apply_json(r#"{"op": "update", "index": 1, "age": null}"#).unwrap();
        let report: HappinessReport = serde_json::from_str(&report).unwrap();

        assert_eq!(report.dropped_rows.len(), 1);
        assert_eq!(report.dropped_rows[0].reason, DropReason::MissingAge);
        assert_eq!(session.rows()[1].happiness, Some(0.6));
        assert!((total(&report) - 0.5 * 21.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_session_rejects_out_of_range_edits() {
        let mut session = HappinessSession::with_rows(SimulatorConfig::default(), vec![RawSample::new(0.0, 1.0)]);

        assert!(matches!(
            session.apply(TableEdit::Delete { index: 3 }),
            Err(ComputeError::InvalidEdit(_))
        ));
        assert!(matches!(
            session.apply(TableEdit::Insert {
                index: Some(5),
                age: None,
                happiness: None
            }),
            Err(ComputeError::InvalidEdit(_))
        ));
        assert!(matches!(
            session.apply(TableEdit::Update {
                index: 1,
                age: Some(Some(1.0)),
                happiness: None
            }),
            Err(ComputeError::InvalidEdit(_))
        ));
        assert_eq!(session.rows().len(), 1);
    }

    #[test]
    fn test_session_replace_and_reset() {
        let mut session = HappinessSession::default();

        let report = session
            .apply(TableEdit::Replace {
                rows: vec![RawSample::new(20.0, 0.7), RawSample::new(0.0, 0.5)],
            })
            .unwrap();
        assert!((total(&report) - 0.5 * 21.0_f64.ln()).abs() < 1e-12);

        session.apply(TableEdit::Reset).unwrap();
        assert_eq!(session.rows().len(), 7);
    }

    #[test]
    fn test_edit_json_shapes() {
        let edit: TableEdit = serde_json::from_str(r#"{"op": "reset"}"#).unwrap();
        assert_eq!(edit, TableEdit::Reset);

        let edit: TableEdit =
            serde_json::from_str(r#"{"op": "update", "index": 2, "happiness": 0.9}"#).unwrap();
        assert_eq!(
            edit,
            TableEdit::Update {
                index: 2,
                age: None,
                happiness: Some(Some(0.9))
            }
        );

        let edit: TableEdit = serde_json::from_str(r#"{"op": "insert", "age": 3}"#).unwrap();
        assert_eq!(
            edit,
            TableEdit::Insert {
                index: None,
                age: Some(3.0),
                happiness: None
            }
        );
    }

    #[test]
    fn test_sessions_are_isolated() {
        let mut a = HappinessSession::default();
        let b = HappinessSession::default();

        a.apply(TableEdit::Delete { index: 0 }).unwrap();

        assert_ne!(a.id(), b.id());
        assert_eq!(a.rows().len(), 6);
        assert_eq!(b.rows().len(), 7);
    }
}
