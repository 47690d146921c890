//! Takeoff Core Library
//!
//! Measurement canvas for construction takeoff: geometry, viewport transform,
//! scale calibration, annotation state machine, quantity derivation and
//! document paging. Rendering and persistence of the estimate live in the
//! hosting application; this crate only publishes line items.

pub mod annotation;
pub mod calibration;
pub mod canvas;
pub mod config;
pub mod csv_export;
pub mod geometry;
pub mod line_item;
pub mod paging;
pub mod quantity;
pub mod viewport;

pub use annotation::{Annotation, AnnotationCollection, AnnotationId, AnnotationKind};
pub use calibration::{
    finish_calibration, parse_known_distance, Calibration, CalibrationError, CALIBRATION_UNITS,
};
pub use canvas::{
    CanvasError, CanvasState, Container, DistanceEntry, DistancePrompt, FinishOutcome, NoPrompt,
    PointerButton, PointerOutcome, RenderOutcome, TakeoffCanvas, Tool,
};
pub use config::{CanvasConfig, ConfigError, UnitCosts};
pub use csv_export::{export_line_items_csv, CsvExportConfig, CsvExportError, CsvExportResult};
pub use geometry::{centroid, distance, path_length, polygon_area, Point};
pub use line_item::{EstimateLedger, EstimateSink, LineItem, MANUAL_TAKEOFF_CATEGORY};
pub use paging::{ContentSize, DocumentPager, RenderTicket, SourceKind};
pub use quantity::{derive_line_item, derive_quantity, Quantity};
pub use viewport::{ScreenPoint, Viewport, ViewportState};
