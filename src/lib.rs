//! Happiness Sim - lifetime happiness quantity under the subjective-time law
//!
//! Happiness is entered as a sparse table of (age, happiness) points and read
//! as a step function. Perceived time is assumed to run as `1 / (age + 1)`, so
//! the total happiness quantity over a lifespan N is
//!
//! ```text
//! ∫₀ᴺ f(y) / (y + 1) dy
//! ```
//!
//! evaluated in closed form per step segment. The pipeline is: table
//! adaptation → normalization → integration → chart data → report encoding.

pub mod adapter;
pub mod chart;
pub mod config;
pub mod decay;
pub mod encoder;
pub mod error;
pub mod integrator;
pub mod normalizer;
pub mod pipeline;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use adapter::{TableAdapter, TableFormat};
pub use config::SimulatorConfig;
pub use error::ComputeError;
pub use integrator::StepIntegrator;
pub use pipeline::{evaluate, table_to_report, Evaluator, HappinessSession, TableEdit};
pub use types::{HappinessReport, Outcome, RawSample, SamplePoint, SampleSet};

/// Version embedded in all reports
pub const SIM_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "happiness-sim";
