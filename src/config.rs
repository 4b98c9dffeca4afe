//! Simulator configuration
//!
//! Loaded from a JSON file where every field is optional; missing fields fall
//! back to the defaults below. The CLI can override individual values.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::decay::{DEFAULT_DOMAIN_END, DEFAULT_DOMAIN_START, DEFAULT_REFERENCE_SAMPLES};
use crate::error::ComputeError;
use crate::types::RawSample;

/// Decimal places used when displaying the total
pub const DEFAULT_DISPLAY_PRECISION: usize = 5;

/// Largest precision that still carries meaningful f64 digits
pub const MAX_DISPLAY_PRECISION: usize = 15;

/// Ages of the table a new session starts with
pub const INITIAL_AGES: [f64; 7] = [0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 100.0];

/// Happiness values of the table a new session starts with
pub const INITIAL_HAPPINESS: [f64; 7] = [0.5, 0.6, 0.7, 0.8, 0.6, 0.7, 0.7];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Age range the reference curve covers, `[start, end]`
    pub display_domain: (f64, f64),
    /// Number of reference curve samples
    pub reference_samples: usize,
    /// Decimal places in the displayed total
    pub display_precision: usize,
    /// Table a new session starts with
    pub initial_table: Vec<RawSample>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            display_domain: (DEFAULT_DOMAIN_START, DEFAULT_DOMAIN_END),
            reference_samples: DEFAULT_REFERENCE_SAMPLES,
            display_precision: DEFAULT_DISPLAY_PRECISION,
            initial_table: default_table(),
        }
    }
}

/// The starter table: happiness sampled every decade, plus age 100
pub fn default_table() -> Vec<RawSample> {
    INITIAL_AGES
        .iter()
        .zip(INITIAL_HAPPINESS.iter())
        .map(|(&age, &happiness)| RawSample::new(age, happiness))
        .collect()
}

impl SimulatorConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON configuration file
    pub fn load(path: &Path) -> Result<Self, ComputeError> {
        let json = fs::read_to_string(path).map_err(|e| {
            ComputeError::ConfigError(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ComputeError> {
        let (start, end) = self.display_domain;
        if !start.is_finite() || !end.is_finite() {
            return Err(ComputeError::ConfigError(
                "display domain bounds must be finite".to_string(),
            ));
        }
        if start >= end {
            return Err(ComputeError::ConfigError(format!(
                "display domain start {start} must be below end {end}"
            )));
        }
        if self.display_precision > MAX_DISPLAY_PRECISION {
            return Err(ComputeError::ConfigError(format!(
                "display precision {} exceeds {MAX_DISPLAY_PRECISION}",
                self.display_precision
            )));
        }
        Ok(())
    }

    /// Format a total at the configured precision
    pub fn format_total(&self, total: f64) -> String {
        format!("{:.*}", self.display_precision, total)
    }
}
