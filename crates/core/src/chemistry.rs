//! Water chemistry advisories for logged readings.

use serde::{Deserialize, Serialize};

use crate::readings::Reading;

/// Ideal band for pH in a salt-water pool.
pub const PH_IDEAL: (f64, f64) = (7.2, 7.8);
/// Ideal band for free chlorine, ppm.
pub const CHLORINE_IDEAL_PPM: (f64, f64) = (1.0, 3.0);
/// Ideal band for salt, ppm.
pub const SALT_IDEAL_PPM: (f64, f64) = (2700.0, 3400.0);

/// Measured parameter an advisory refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    Ph,
    Chlorine,
    Salt,
}

/// Which side of the ideal band the measurement fell on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Low,
    High,
}

/// One actionable advisory derived from a reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advisory {
    pub parameter: Parameter,
    pub level: Level,
    pub message: String,
}

fn check_band(
    parameter: Parameter,
    value: f64,
    band: (f64, f64),
    low_hint: &str,
    high_hint: &str,
    unit: &str,
) -> Option<Advisory> {
    let (min, max) = band;
    if value < min {
        return Some(Advisory {
            parameter,
            level: Level::Low,
            message: format!("{value}{unit} is below {min}{unit}; {low_hint}"),
        });
    }
    if value > max {
        return Some(Advisory {
            parameter,
            level: Level::High,
            message: format!("{value}{unit} is above {max}{unit}; {high_hint}"),
        });
    }
    None
}

/// Evaluate a reading against the ideal bands.
///
/// Balanced water yields an empty list. Advisories come back in a fixed
/// order: pH, chlorine, salt.
pub fn evaluate(reading: &Reading) -> Vec<Advisory> {
    let mut advisories = Vec::new();
    if let Some(advisory) = check_band(
        Parameter::Ph,
        reading.ph,
        PH_IDEAL,
        "add soda ash to raise it",
        "add muriatic acid to lower it",
        "",
    ) {
        advisories.push(advisory);
    }
    if let Some(advisory) = check_band(
        Parameter::Chlorine,
        reading.chlorine,
        CHLORINE_IDEAL_PPM,
        "raise the chlorinator output or shock the pool",
        "lower the chlorinator output",
        " ppm",
    ) {
        advisories.push(advisory);
    }
    if let Some(advisory) = check_band(
        Parameter::Salt,
        reading.salt,
        SALT_IDEAL_PPM,
        "add pool salt",
        "partially drain and refill with fresh water",
        " ppm",
    ) {
        advisories.push(advisory);
    }
    advisories
}

/// Whether every parameter sits inside its ideal band.
pub fn is_balanced(reading: &Reading) -> bool {
    evaluate(reading).is_empty()
}
