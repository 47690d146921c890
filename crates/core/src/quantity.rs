//! Quantity derivation
//!
//! Turns a completed annotation into a quantity and unit. Derivation is a pure
//! function of the annotation, the calibration and the rounding precision, so
//! line items can be recomputed at any time and always agree.

use crate::annotation::{Annotation, AnnotationKind};
use crate::calibration::Calibration;
use crate::config::CanvasConfig;
use crate::line_item::{round_to, LineItem, MANUAL_TAKEOFF_CATEGORY};

/// Unit used for counted items
pub const COUNT_UNIT: &str = "ea";
/// Fallback unit for uncalibrated lengths
pub const PIXEL_UNIT: &str = "px";
/// Fallback unit for uncalibrated areas
pub const SQUARE_PIXEL_UNIT: &str = "sq px";

/// Note attached to line items measured in pixels
pub(crate) const UNCALIBRATED_NOTE: &str =
    "Uncalibrated: quantity is in drawing pixels, not real-world units";

/// Measured amount with its unit
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    pub value: f64,
    pub unit: String,
}

impl Quantity {
    /// Whether the unit is a pixel fallback rather than a real-world unit
    pub fn is_pixel_fallback(&self) -> bool {
        self.unit == PIXEL_UNIT || self.unit == SQUARE_PIXEL_UNIT
    }
}

/// Quantity for a completed annotation
///
/// Returns `None` for scale references, which never become line items.
pub fn derive_quantity(
    annotation: &Annotation,
    calibration: &Calibration,
    precision: u32,
) -> Option<Quantity> {
    let (value, unit) = match annotation.kind() {
        AnnotationKind::Count => (1.0, COUNT_UNIT.to_string()),
        AnnotationKind::Linear => {
            let raw = annotation.path_length();
            if calibration.is_calibrated() {
                (calibration.to_real_length(raw), calibration.unit().to_string())
            } else {
                (raw, PIXEL_UNIT.to_string())
            }
        }
        AnnotationKind::Area => {
            let raw = annotation.area();
            if calibration.is_calibrated() {
                (calibration.to_real_area(raw), format!("sq {}", calibration.unit()))
            } else {
                (raw, SQUARE_PIXEL_UNIT.to_string())
            }
        }
        AnnotationKind::ScaleCalibration => return None,
    };

    Some(Quantity { value: round_to(value, precision), unit })
}

/// Line item for a completed annotation, priced with the configured unit costs
pub fn derive_line_item(
    annotation: &Annotation,
    calibration: &Calibration,
    config: &CanvasConfig,
) -> Option<LineItem> {
    let quantity = derive_quantity(annotation, calibration, config.quantity_precision)?;

    let unit_cost = match annotation.kind() {
        AnnotationKind::Count => config.unit_costs.count,
        AnnotationKind::Linear => config.unit_costs.linear,
        AnnotationKind::Area => config.unit_costs.area,
        AnnotationKind::ScaleCalibration => 0.0,
    };

    let notes =
        if quantity.is_pixel_fallback() { UNCALIBRATED_NOTE.to_string() } else { String::new() };

    let mut item = LineItem {
        id: annotation.id(),
        description: format!("{} (page {})", annotation.kind().label(), annotation.page()),
        quantity: quantity.value,
        unit: quantity.unit,
        category: MANUAL_TAKEOFF_CATEGORY.to_string(),
        unit_cost: 0.0,
        total_cost: 0.0,
        notes,
        page: annotation.page(),
    };
    item.set_unit_cost(unit_cost);
    Some(item)
}
