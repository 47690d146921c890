//! Viewport transform between screen space and document space
//!
//! The forward projection is `screen = document * zoom + pan + container_origin`.
//! [`Viewport::screen_to_document`] is its inverse and the only place pointer
//! positions are interpreted, so stored annotations stay in document space and
//! survive any zoom or pan change untouched.

use std::fmt;

use crate::config::CanvasConfig;
use crate::geometry::Point;

/// Pointer position in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Zoom and pan consumed by the rendering layer
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportState {
    pub zoom: f64,
    pub pan_offset_x: f64,
    pub pan_offset_y: f64,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self { zoom: 1.0, pan_offset_x: 0.0, pan_offset_y: 0.0 }
    }
}

/// Pan/zoom state with configured bounds
#[derive(Debug, Clone)]
pub struct Viewport {
    state: ViewportState,
    min_zoom: f64,
    max_zoom: f64,
    zoom_step: f64,
    fit_padding: f64,
    fit_max_zoom: f64,
}

impl Viewport {
    /// Create a viewport at 100% with no pan
    pub fn new(config: &CanvasConfig) -> Self {
        Self {
            state: ViewportState::default(),
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            zoom_step: config.zoom_step,
            fit_padding: config.fit_padding,
            fit_max_zoom: config.fit_max_zoom,
        }
    }

    /// Current zoom and pan
    pub fn state(&self) -> ViewportState {
        self.state
    }

    /// Current zoom factor (1.0 = 100%)
    pub fn zoom(&self) -> f64 {
        self.state.zoom
    }

    /// Zoom as a whole percentage for the toolbar readout
    pub fn zoom_percent(&self) -> u32 {
        (self.state.zoom * 100.0).round() as u32
    }

    /// Current pan offset in screen pixels
    pub fn pan(&self) -> (f64, f64) {
        (self.state.pan_offset_x, self.state.pan_offset_y)
    }

    /// Set the zoom factor, clamped to the configured bounds
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() {
            self.state.zoom = self.clamp_zoom(zoom);
        }
    }

    /// Increase zoom by one step
    pub fn zoom_in(&mut self) {
        self.set_zoom(self.state.zoom + self.zoom_step);
    }

    /// Decrease zoom by one step
    pub fn zoom_out(&mut self) {
        self.set_zoom(self.state.zoom - self.zoom_step);
    }

    /// Zoom while keeping the document point under `screen` fixed on screen
    pub fn zoom_at(&mut self, screen: ScreenPoint, container_origin: ScreenPoint, new_zoom: f64) {
        if !new_zoom.is_finite() {
            return;
        }
        let anchor = self.screen_to_document(screen, container_origin);
        let zoom = self.clamp_zoom(new_zoom);

        self.state.zoom = zoom;
        self.state.pan_offset_x = screen.x - container_origin.x - anchor.x * zoom;
        self.state.pan_offset_y = screen.y - container_origin.y - anchor.y * zoom;
    }

    /// Set the pan offset directly
    pub fn set_pan(&mut self, x: f64, y: f64) {
        self.state.pan_offset_x = x;
        self.state.pan_offset_y = y;
    }

    /// Pan by a screen-space delta (drag gesture)
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.state.pan_offset_x += dx;
        self.state.pan_offset_y += dy;
    }

    /// Back to 100% with no pan
    pub fn reset(&mut self) {
        self.state = ViewportState::default();
    }

    /// Map a pointer position to document space
    pub fn screen_to_document(&self, screen: ScreenPoint, container_origin: ScreenPoint) -> Point {
        Point::new(
            (screen.x - container_origin.x - self.state.pan_offset_x) / self.state.zoom,
            (screen.y - container_origin.y - self.state.pan_offset_y) / self.state.zoom,
        )
    }

    /// Project a document point onto the screen
    pub fn document_to_screen(&self, point: Point, container_origin: ScreenPoint) -> ScreenPoint {
        ScreenPoint::new(
            point.x * self.state.zoom + self.state.pan_offset_x + container_origin.x,
            point.y * self.state.zoom + self.state.pan_offset_y + container_origin.y,
        )
    }

    /// Fit content of the given size into the container and center it
    ///
    /// Uses the largest zoom that keeps `fit_padding` free on every side,
    /// capped at `fit_max_zoom` so small images are not blown up. Non-positive
    /// dimensions leave the viewport unchanged.
    pub fn fit_to_bounds(
        &mut self,
        content_width: f64,
        content_height: f64,
        container_width: f64,
        container_height: f64,
    ) -> ViewportState {
        if content_width <= 0.0
            || content_height <= 0.0
            || container_width <= 0.0
            || container_height <= 0.0
        {
            return self.state;
        }

        let available_width = (container_width - self.fit_padding * 2.0).max(0.0);
        let available_height = (container_height - self.fit_padding * 2.0).max(0.0);

        let fit = (available_width / content_width).min(available_height / content_height);
        let zoom = self.clamp_zoom(fit.min(self.fit_max_zoom));

        self.state = ViewportState {
            zoom,
            pan_offset_x: (container_width - content_width * zoom) / 2.0,
            pan_offset_y: (container_height - content_height * zoom) / 2.0,
        };
        self.state
    }

    fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.max(self.min_zoom).min(self.max_zoom)
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Zoom: {}% | Pan: ({:.1}, {:.1})",
            self.zoom_percent(),
            self.state.pan_offset_x,
            self.state.pan_offset_y
        )
    }
}
