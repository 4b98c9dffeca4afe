//! Report encoding
//!
//! This module assembles the outputs of one recomputation into a
//! [`HappinessReport`] and serializes it. Recoverable integration failures are
//! encoded as the report's outcome rather than surfaced as errors.

use chrono::Utc;
use uuid::Uuid;

use crate::config::SimulatorConfig;
use crate::error::ComputeError;
use crate::normalizer::NormalizedTable;
use crate::types::{ChartData, HappinessReport, Outcome, ReportProducer, SegmentArea};
use crate::{PRODUCER_NAME, SIM_VERSION};

/// Encoder for producing report payloads
#[derive(Debug, Clone)]
pub struct ReportEncoder {
    instance_id: String,
    display_precision: usize,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new(&SimulatorConfig::default())
    }
}

impl ReportEncoder {
    /// Create an encoder with a unique instance ID
    pub fn new(config: &SimulatorConfig) -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
            display_precision: config.display_precision,
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String, config: &SimulatorConfig) -> Self {
        Self {
            instance_id,
            display_precision: config.display_precision,
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Build a report from the normalized table and the integration result
    pub fn encode(
        &self,
        table: NormalizedTable,
        integration: Result<Vec<SegmentArea>, ComputeError>,
        chart: ChartData,
    ) -> Result<HappinessReport, ComputeError> {
        let (outcome, segments) = match integration {
            Ok(segments) => {
                let total: f64 = segments.iter().map(|s| s.area).sum();
                let outcome = Outcome::Ok {
                    total,
                    display: format!("{:.*}", self.display_precision, total),
                };
                (outcome, segments)
            }
            Err(err) => (self.failure_outcome(err)?, Vec::new()),
        };

        Ok(HappinessReport {
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: SIM_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
            outcome,
            lifespan: table.samples.lifespan(),
            samples: table.samples,
            segments,
            dropped_rows: table.dropped_rows,
            chart,
        })
    }

    /// Encode to a pretty JSON string
    pub fn encode_to_json(&self, report: &HappinessReport) -> Result<String, ComputeError> {
        serde_json::to_string_pretty(report).map_err(ComputeError::JsonError)
    }

    fn failure_outcome(&self, err: ComputeError) -> Result<Outcome, ComputeError> {
        let warning = err.warning().unwrap_or_default();
        match err {
            ComputeError::InsufficientData { valid_points } => Ok(Outcome::InsufficientData {
                valid_points,
                warning,
            }),
            ComputeError::DomainError { age } => Ok(Outcome::DomainError { age, warning }),
            other => Err(other),
        }
    }
}
