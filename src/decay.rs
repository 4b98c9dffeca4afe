//! Subjective-time decay weight
//!
//! Perceived duration of a unit of real time is assumed to shrink as
//! `1 / (age + 1)`. The weight is used both inside the integral and as a
//! plotted reference curve.

use crate::types::CurvePoint;

/// Start of the default display domain for the reference curve (years)
pub const DEFAULT_DOMAIN_START: f64 = 0.0;

/// End of the default display domain for the reference curve (years)
pub const DEFAULT_DOMAIN_END: f64 = 100.0;

/// Default number of reference curve samples
pub const DEFAULT_REFERENCE_SAMPLES: usize = 500;

/// Decay weight w(age) = 1 / (age + 1). Singular at age = -1.
pub fn weight(age: f64) -> f64 {
    1.0 / (age + 1.0)
}

/// Antiderivative of the weight, ln(age + 1).
///
/// Returns NaN for age < -1 and -inf at age = -1; callers check the domain.
pub fn antiderivative(age: f64) -> f64 {
    age.ln_1p()
}

/// Whether ln(age + 1) is defined for this age
pub fn in_domain(age: f64) -> bool {
    age > -1.0
}

/// Sample the weight at `samples` evenly spaced ages covering both ends of
/// `[start, end]`.
pub fn reference_curve(start: f64, end: f64, samples: usize) -> Vec<CurvePoint> {
    match samples {
        0 => Vec::new(),
        1 => vec![CurvePoint {
            age: start,
            value: weight(start),
        }],
        n => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| {
                    // Pin the last sample to `end` so rounding never overshoots
                    let age = if i == n - 1 {
                        end
                    } else {
                        start + step * i as f64
                    };
                    CurvePoint {
                        age,
                        value: weight(age),
                    }
                })
                .collect()
        }
    }
}
