//! Pool reading domain model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation failures for a logged reading.
#[derive(Debug, Error, PartialEq)]
pub enum ReadingError {
    #[error("pH {0} is outside the measurable range 0-14")]
    PhOutOfRange(f64),
    #[error("chlorine {0} ppm cannot be negative")]
    NegativeChlorine(f64),
    #[error("salt {0} ppm cannot be negative")]
    NegativeSalt(f64),
}

/// One logged set of pool measurements, the payload shape submitted to
/// `/api/submitReading`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub date: NaiveDate,
    /// pH, unitless.
    pub ph: f64,
    /// Free chlorine, ppm.
    pub chlorine: f64,
    /// Salt, ppm.
    pub salt: f64,
}

impl Reading {
    pub fn new(date: NaiveDate, ph: f64, chlorine: f64, salt: f64) -> Self {
        Self {
            date,
            ph,
            chlorine,
            salt,
        }
    }

    /// Plausibility check before a reading is submitted.
    pub fn validate(&self) -> Result<(), ReadingError> {
        if !(0.0..=14.0).contains(&self.ph) {
            return Err(ReadingError::PhOutOfRange(self.ph));
        }
        if self.chlorine < 0.0 {
            return Err(ReadingError::NegativeChlorine(self.chlorine));
        }
        if self.salt < 0.0 {
            return Err(ReadingError::NegativeSalt(self.salt));
        }
        Ok(())
    }
}
