//! Scale calibration
//!
//! A calibration converts document pixels to real-world units. It comes from a
//! reference segment drawn over a dimension of known length. The ratio is
//! stored as pixels per unit. Zero means uncalibrated, and then quantities
//! stay in raw pixels.

use serde::{Deserialize, Serialize};

use crate::annotation::Annotation;

/// Units offered by the calibration prompt
pub const CALIBRATION_UNITS: [&str; 6] = ["ft", "in", "yd", "m", "cm", "mm"];

/// Why a calibration attempt was rejected
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalibrationError {
    #[error("known distance is not a number: {0:?}")]
    InvalidDistance(String),

    #[error("known distance must be greater than zero, got {0}")]
    NonPositiveDistance(f64),

    #[error("reference segment has zero length")]
    DegenerateReference,

    #[error("reference needs at least 2 points, got {0}")]
    TooFewPoints(usize),

    #[error("unsupported unit {0:?}, expected one of ft, in, yd, m, cm, mm")]
    UnknownUnit(String),
}

/// Pixels-per-unit ratio for the loaded document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calibration {
    pixels_per_unit: f64,
    unit: String,
}

impl Calibration {
    /// The uncalibrated state
    pub fn uncalibrated() -> Self {
        Self::default()
    }

    /// Calibration from an explicit ratio
    pub fn from_ratio(
        pixels_per_unit: f64,
        unit: impl Into<String>,
    ) -> Result<Self, CalibrationError> {
        if !pixels_per_unit.is_finite() || pixels_per_unit <= 0.0 {
            return Err(CalibrationError::DegenerateReference);
        }
        Ok(Self { pixels_per_unit, unit: unit.into() })
    }

    /// Document pixels per real-world unit, 0 when uncalibrated
    pub fn pixels_per_unit(&self) -> f64 {
        self.pixels_per_unit
    }

    /// Real-world unit name
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Whether a ratio has been set
    pub fn is_calibrated(&self) -> bool {
        self.pixels_per_unit > 0.0
    }

    /// Convert a pixel length to real-world units (identity when uncalibrated)
    pub fn to_real_length(&self, pixels: f64) -> f64 {
        if self.is_calibrated() {
            pixels / self.pixels_per_unit
        } else {
            pixels
        }
    }

    /// Convert a pixel area to square real-world units (identity when uncalibrated)
    pub fn to_real_area(&self, square_pixels: f64) -> f64 {
        if self.is_calibrated() {
            square_pixels / (self.pixels_per_unit * self.pixels_per_unit)
        } else {
            square_pixels
        }
    }
}

/// Whether `unit` is one of [`CALIBRATION_UNITS`]
pub fn is_supported_unit(unit: &str) -> bool {
    CALIBRATION_UNITS.contains(&unit)
}

/// Parse the known-distance text typed into the calibration prompt
pub fn parse_known_distance(input: &str) -> Result<f64, CalibrationError> {
    let trimmed = input.trim();
    let value = trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| CalibrationError::InvalidDistance(trimmed.to_string()))?;

    if value <= 0.0 {
        return Err(CalibrationError::NonPositiveDistance(value));
    }
    Ok(value)
}

/// Derive a calibration from a finished reference annotation
///
/// `pixels_per_unit = path_length / known_distance`. The caller keeps its
/// previous calibration when this fails.
pub fn finish_calibration(
    reference: &Annotation,
    known_distance: f64,
    unit: &str,
) -> Result<Calibration, CalibrationError> {
    if !known_distance.is_finite() || known_distance <= 0.0 {
        return Err(CalibrationError::NonPositiveDistance(known_distance));
    }

    if !is_supported_unit(unit) {
        return Err(CalibrationError::UnknownUnit(unit.to_string()));
    }

    let point_count = reference.points().len();
    if point_count < 2 {
        return Err(CalibrationError::TooFewPoints(point_count));
    }

    let reference_px = reference.path_length();
    if reference_px <= 0.0 {
        return Err(CalibrationError::DegenerateReference);
    }

    Ok(Calibration { pixels_per_unit: reference_px / known_distance, unit: unit.to_string() })
}
