//! Table input parsing
//!
//! The editable table arrives in one of three JSON shapes:
//! - an array of row objects
//! - NDJSON, one row object per line
//! - a column object, `{"Age": [...], "Happiness": [...]}`

use serde::{Deserialize, Serialize};

use crate::error::ComputeError;
use crate::types::RawSample;

/// Supported table encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableFormat {
    Array,
    Ndjson,
    Columns,
}

#[derive(Debug, Deserialize)]
struct ColumnTable {
    #[serde(alias = "Age", default)]
    age: Vec<Option<f64>>,
    #[serde(alias = "Happiness", default)]
    happiness: Vec<Option<f64>>,
}

/// Adapter from serialized tables to raw rows
pub struct TableAdapter;

impl TableAdapter {
    /// Parse a table in the given format
    pub fn parse(input: &str, format: TableFormat) -> Result<Vec<RawSample>, ComputeError> {
        match format {
            TableFormat::Array => Self::parse_array(input),
            TableFormat::Ndjson => Self::parse_ndjson(input),
            TableFormat::Columns => Self::parse_columns(input),
        }
    }

    /// Parse a JSON array of rows
    pub fn parse_array(json: &str) -> Result<Vec<RawSample>, ComputeError> {
        let rows: Vec<RawSample> = serde_json::from_str(json)?;
        Ok(rows)
    }

    /// Parse NDJSON rows, skipping blank lines
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<RawSample>, ComputeError> {
        let mut rows = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<RawSample>(trimmed) {
                Ok(row) => rows.push(row),
                Err(e) => {
                    return Err(ComputeError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(rows)
    }

    /// Parse a column-oriented table.
    ///
    /// A shorter column is padded with empty cells, which normalization drops.
    pub fn parse_columns(json: &str) -> Result<Vec<RawSample>, ComputeError> {
        let table: ColumnTable = serde_json::from_str(json)?;
        let len = table.age.len().max(table.happiness.len());

        Ok((0..len)
            .map(|i| RawSample {
                age: table.age.get(i).copied().flatten(),
                happiness: table.happiness.get(i).copied().flatten(),
            })
            .collect())
    }
}
