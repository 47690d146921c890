//! Canvas configuration
//!
//! Every field has a default so partial JSON documents deserialize cleanly.

use serde::{Deserialize, Serialize};

use crate::calibration;

/// Errors from [`CanvasConfig::validate`]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("min_zoom must be positive, got {0}")]
    NonPositiveMinZoom(f64),

    #[error("min_zoom {min} exceeds max_zoom {max}")]
    InvertedZoomRange { min: f64, max: f64 },

    #[error("zoom_step must be positive, got {0}")]
    NonPositiveZoomStep(f64),

    #[error("fit_padding must not be negative, got {0}")]
    NegativePadding(f64),

    #[error("quantity_precision {0} is above the supported maximum of 6")]
    PrecisionTooHigh(u32),

    #[error("default_unit {0:?} is not a calibration unit")]
    UnknownDefaultUnit(String),
}

/// Unit cost applied per annotation kind when a line item is derived
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitCosts {
    pub count: f64,
    pub linear: f64,
    pub area: f64,
}

/// Tunables for the takeoff canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Lower zoom bound
    pub min_zoom: f64,
    /// Upper zoom bound
    pub max_zoom: f64,
    /// Additive step used by the zoom in/out controls
    pub zoom_step: f64,
    /// Screen pixels kept free on every side by fit-to-bounds
    pub fit_padding: f64,
    /// Fit-to-bounds never magnifies beyond this
    pub fit_max_zoom: f64,
    /// Decimal places kept on derived quantities
    pub quantity_precision: u32,
    /// Unit offered by the calibration prompt when the user does not pick one
    pub default_unit: String,
    /// Re-derive existing line items whenever the calibration changes
    pub rescale_on_calibration: bool,
    /// Pick radius for select-mode hit testing, in screen pixels
    pub hit_tolerance: f64,
    pub unit_costs: UnitCosts,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.05,
            max_zoom: 5.0,
            zoom_step: 0.1,
            fit_padding: 40.0,
            fit_max_zoom: 1.0,
            quantity_precision: 2,
            default_unit: "ft".to_string(),
            rescale_on_calibration: true,
            hit_tolerance: 6.0,
            unit_costs: UnitCosts::default(),
        }
    }
}

impl CanvasConfig {
    /// Check the configuration for values the canvas cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_zoom <= 0.0 {
            return Err(ConfigError::NonPositiveMinZoom(self.min_zoom));
        }
        if self.min_zoom > self.max_zoom {
            return Err(ConfigError::InvertedZoomRange {
                min: self.min_zoom,
                max: self.max_zoom,
            });
        }
        if self.zoom_step <= 0.0 {
            return Err(ConfigError::NonPositiveZoomStep(self.zoom_step));
        }
        if self.fit_padding < 0.0 {
            return Err(ConfigError::NegativePadding(self.fit_padding));
        }
        if self.quantity_precision > 6 {
            return Err(ConfigError::PrecisionTooHigh(self.quantity_precision));
        }
        if !calibration::is_supported_unit(&self.default_unit) {
            return Err(ConfigError::UnknownDefaultUnit(self.default_unit.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(CanvasConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: CanvasConfig =
            serde_json::from_str(r#"{"max_zoom": 8.0, "unit_costs": {"linear": 2.5}}"#)
                .expect("config should parse");
        assert_eq!(config.max_zoom, 8.0);
        assert_eq!(config.min_zoom, 0.05);
        assert_eq!(config.unit_costs.linear, 2.5);
        assert_eq!(config.unit_costs.area, 0.0);
        assert_eq!(config.default_unit, "ft");
    }

    #[test]
    fn test_rejects_inverted_zoom_range() {
        let config = CanvasConfig { min_zoom: 3.0, max_zoom: 2.0, ..CanvasConfig::default() };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvertedZoomRange { min: 3.0, max: 2.0 })
        );
    }

    #[test]
    fn test_rejects_zero_min_zoom() {
        let config = CanvasConfig { min_zoom: 0.0, ..CanvasConfig::default() };
        assert!(matches!(config.validate(), Err(ConfigError::NonPositiveMinZoom(_))));
    }

    #[test]
    fn test_rejects_unknown_default_unit() {
        let config = CanvasConfig { default_unit: "parsec".to_string(), ..CanvasConfig::default() };
        assert_eq!(
            config.validate(),
            Err(ConfigError::UnknownDefaultUnit("parsec".to_string()))
        );
    }
}
