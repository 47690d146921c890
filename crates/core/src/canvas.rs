//! Takeoff canvas controller
//!
//! Owns the annotation state machine and everything it needs: the viewport,
//! the calibration, paging and the estimate sink. The UI shell forwards
//! pointer and keyboard events to the transition methods here. It renders
//! from the accessors and never mutates fields directly.
//!
//! ```text
//! Idle --click (Linear/Area/Scale)--> Drawing --click--> Drawing
//!   ^                                    |
//!   +------ finish / cancel / switch ----+
//! ```
//!
//! Count clicks complete immediately and never enter `Drawing`.

use tracing::{debug, info, warn};

use crate::annotation::{Annotation, AnnotationCollection, AnnotationId, AnnotationKind};
use crate::calibration::{self, Calibration, CalibrationError};
use crate::config::{CanvasConfig, ConfigError};
use crate::line_item::{EstimateLedger, EstimateSink, LineItem};
use crate::paging::{ContentSize, DocumentPager, RenderTicket, SourceKind};
use crate::quantity::{derive_line_item, UNCALIBRATED_NOTE};
use crate::viewport::{ScreenPoint, Viewport, ViewportState};

/// Errors reported synchronously to the user
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CanvasError {
    #[error("calibration rejected: {0}")]
    Calibration(#[from] CalibrationError),

    #[error("invalid canvas configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Active tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    #[default]
    Select,
    Pan,
    Count,
    Linear,
    Area,
    ScaleCalibration,
}

impl Tool {
    /// Annotation kind drawn by this tool, if any
    pub fn annotation_kind(self) -> Option<AnnotationKind> {
        match self {
            Tool::Select | Tool::Pan => None,
            Tool::Count => Some(AnnotationKind::Count),
            Tool::Linear => Some(AnnotationKind::Linear),
            Tool::Area => Some(AnnotationKind::Area),
            Tool::ScaleCalibration => Some(AnnotationKind::ScaleCalibration),
        }
    }
}

/// Pointer button that produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerButton {
    #[default]
    Primary,
    Middle,
    Secondary,
}

/// Annotation state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasState {
    Idle,
    Drawing,
}

/// What a pointer-down did
#[derive(Debug, Clone, PartialEq)]
pub enum PointerOutcome {
    Ignored,
    PanStarted,
    /// Select mode pick; `None` when nothing was hit
    Selected(Option<AnnotationId>),
    /// Count placed and its line item published
    Counted(LineItem),
    /// New in-progress annotation
    Started(AnnotationId),
    /// Point appended to the in-progress annotation
    PointAdded { id: AnnotationId, points: usize },
}

/// What a finish gesture did
#[derive(Debug, Clone, PartialEq)]
pub enum FinishOutcome {
    /// No annotation was in progress
    NothingToFinish,
    /// Fewer than two points; the annotation was dropped
    Discarded,
    /// Annotation stored and its line item published
    Completed(LineItem),
    /// New calibration applied
    Calibrated(Calibration),
    /// The user dismissed the distance prompt
    CalibrationCancelled,
}

/// Whether a finished page render was used
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderOutcome {
    Applied(ViewportState),
    Stale,
}

/// Answer to the calibration prompt
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DistanceEntry {
    /// Raw text typed by the user
    pub value: String,
    /// Unit picked by the user; the configured default when absent
    #[serde(default)]
    pub unit: Option<String>,
}

impl DistanceEntry {
    pub fn new(value: impl Into<String>, unit: Option<&str>) -> Self {
        Self { value: value.into(), unit: unit.map(str::to_string) }
    }
}

/// Asks the user for the real-world length of a calibration reference
pub trait DistancePrompt {
    /// `None` means the user cancelled
    fn request_known_distance(
        &mut self,
        reference_px: f64,
        default_unit: &str,
    ) -> Option<DistanceEntry>;
}

/// Prompt that is always cancelled
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrompt;

impl DistancePrompt for NoPrompt {
    fn request_known_distance(
        &mut self,
        _reference_px: f64,
        _default_unit: &str,
    ) -> Option<DistanceEntry> {
        None
    }
}

impl DistancePrompt for DistanceEntry {
    fn request_known_distance(
        &mut self,
        _reference_px: f64,
        _default_unit: &str,
    ) -> Option<DistanceEntry> {
        Some(self.clone())
    }
}

/// Visible area of the canvas on screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Container {
    pub origin: ScreenPoint,
    pub width: f64,
    pub height: f64,
}

impl Default for Container {
    fn default() -> Self {
        Self { origin: ScreenPoint::default(), width: 1280.0, height: 800.0 }
    }
}

/// Interactive takeoff canvas for one loaded document
pub struct TakeoffCanvas<S: EstimateSink = EstimateLedger> {
    config: CanvasConfig,
    viewport: Viewport,
    container: Container,
    pager: DocumentPager,
    content_size: Option<ContentSize>,
    calibration: Calibration,
    tool: Tool,
    drawing: Option<Annotation>,
    annotations: AnnotationCollection,
    selected: Option<AnnotationId>,
    drag_anchor: Option<ScreenPoint>,
    sink: S,
}

impl TakeoffCanvas<EstimateLedger> {
    /// Canvas publishing into an in-memory ledger
    pub fn with_ledger(config: CanvasConfig) -> Result<Self, CanvasError> {
        Self::new(config, EstimateLedger::new())
    }
}

impl<S: EstimateSink> TakeoffCanvas<S> {
    /// Create a canvas with an empty single-image document loaded
    pub fn new(config: CanvasConfig, sink: S) -> Result<Self, CanvasError> {
        config.validate()?;
        Ok(Self {
            viewport: Viewport::new(&config),
            config,
            container: Container::default(),
            pager: DocumentPager::image(),
            content_size: None,
            calibration: Calibration::uncalibrated(),
            tool: Tool::Select,
            drawing: None,
            annotations: AnnotationCollection::new(),
            selected: None,
            drag_anchor: None,
            sink,
        })
    }

    // ----- document -----

    /// Load a new document and request its first page
    ///
    /// Resets calibration, annotations and viewport. Line items already
    /// published stay in the estimate.
    pub fn load_document(&mut self, source: SourceKind, page_count: u32) -> RenderTicket {
        self.pager = match source {
            SourceKind::Image => DocumentPager::image(),
            SourceKind::Paged => DocumentPager::paged(page_count),
        };
        self.calibration = Calibration::uncalibrated();
        self.annotations.clear();
        self.drawing = None;
        self.selected = None;
        self.drag_anchor = None;
        self.tool = Tool::Select;
        self.content_size = None;
        self.viewport.reset();

        info!(?source, pages = self.pager.page_count(), "document loaded");
        self.pager.request_render()
    }

    /// Move by `delta` pages; `None` when already at the first or last page
    pub fn change_page(&mut self, delta: i64) -> Option<RenderTicket> {
        let ticket = self.pager.change_page(delta)?;
        self.on_page_changed();
        Some(ticket)
    }

    /// Jump to an absolute page
    pub fn go_to_page(&mut self, page: u32) -> Option<RenderTicket> {
        let ticket = self.pager.go_to_page(page)?;
        self.on_page_changed();
        Some(ticket)
    }

    fn on_page_changed(&mut self) {
        if self.drawing.take().is_some() {
            debug!("in-progress annotation discarded on page change");
        }
        self.selected = None;
        self.content_size = None;
    }

    /// Apply a finished page render, unless a newer page request superseded it
    pub fn render_complete(&mut self, ticket: RenderTicket, size: ContentSize) -> RenderOutcome {
        if !self.pager.is_current(ticket) {
            debug!(
                page = ticket.page,
                generation = ticket.generation,
                current = self.pager.generation(),
                "stale render ignored"
            );
            return RenderOutcome::Stale;
        }
        self.content_size = Some(size);
        RenderOutcome::Applied(self.fit_to_content())
    }

    /// Resize or move the on-screen container and refit the current page
    pub fn set_container(&mut self, origin: ScreenPoint, width: f64, height: f64) {
        self.container = Container { origin, width, height };
        self.fit_to_content();
    }

    /// Fit the current page into the container
    pub fn fit_to_content(&mut self) -> ViewportState {
        match self.content_size {
            Some(size) => self.viewport.fit_to_bounds(
                size.width,
                size.height,
                self.container.width,
                self.container.height,
            ),
            None => self.viewport.state(),
        }
    }

    // ----- viewport -----

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    /// Wheel zoom around the pointer
    pub fn zoom_at(&mut self, screen: ScreenPoint, zoom: f64) {
        self.viewport.zoom_at(screen, self.container.origin, zoom);
    }

    // ----- tools -----

    /// Switch tools, discarding any in-progress annotation
    pub fn select_tool(&mut self, tool: Tool) {
        if tool == self.tool {
            return;
        }
        if let Some(discarded) = self.drawing.take() {
            debug!(
                kind = ?discarded.kind(),
                points = discarded.points().len(),
                "in-progress annotation discarded on tool switch"
            );
        }
        self.drag_anchor = None;
        debug!(from = ?self.tool, to = ?tool, "tool selected");
        self.tool = tool;
    }

    /// Start drawing a scale reference
    pub fn begin_calibration(&mut self) {
        self.select_tool(Tool::ScaleCalibration);
    }

    // ----- pointer -----

    /// Handle a pointer press at a screen position
    pub fn pointer_down(&mut self, screen: ScreenPoint, button: PointerButton) -> PointerOutcome {
        let pan_gesture = button == PointerButton::Middle
            || (button == PointerButton::Primary && self.tool == Tool::Pan);
        if pan_gesture {
            self.drag_anchor = Some(screen);
            return PointerOutcome::PanStarted;
        }
        if button != PointerButton::Primary {
            return PointerOutcome::Ignored;
        }

        let point = self.viewport.screen_to_document(screen, self.container.origin);

        let kind = match self.tool.annotation_kind() {
            Some(kind) => kind,
            None => {
                let tolerance = self.config.hit_tolerance / self.viewport.zoom();
                self.selected = self.hit_test(&point, tolerance);
                return PointerOutcome::Selected(self.selected);
            }
        };

        if kind == AnnotationKind::Count {
            let annotation = Annotation::begin(kind, self.annotation_page(), point);
            debug!(x = point.x, y = point.y, "count placed");
            return match self.store_completed(annotation) {
                Some(item) => PointerOutcome::Counted(item),
                None => PointerOutcome::Ignored,
            };
        }

        match self.drawing.as_mut() {
            Some(annotation) => {
                annotation.push_point(point);
                PointerOutcome::PointAdded {
                    id: annotation.id(),
                    points: annotation.points().len(),
                }
            }
            None => {
                let annotation = Annotation::begin(kind, self.annotation_page(), point);
                let id = annotation.id();
                debug!(?kind, "drawing started");
                self.drawing = Some(annotation);
                PointerOutcome::Started(id)
            }
        }
    }

    /// Handle pointer motion; pans while a drag is active
    pub fn pointer_move(&mut self, screen: ScreenPoint) -> bool {
        let Some(anchor) = self.drag_anchor else {
            return false;
        };
        self.viewport.pan_by(screen.x - anchor.x, screen.y - anchor.y);
        self.drag_anchor = Some(screen);
        true
    }

    /// Handle a pointer release
    pub fn pointer_up(&mut self) {
        self.drag_anchor = None;
    }

    // ----- drawing -----

    /// Complete the in-progress annotation (double-click or Enter)
    pub fn finish(
        &mut self,
        prompt: &mut impl DistancePrompt,
    ) -> Result<FinishOutcome, CanvasError> {
        let Some(mut annotation) = self.drawing.take() else {
            return Ok(FinishOutcome::NothingToFinish);
        };

        if !annotation.complete() {
            debug!(
                kind = ?annotation.kind(),
                points = annotation.points().len(),
                "degenerate annotation discarded"
            );
            return Ok(FinishOutcome::Discarded);
        }

        if annotation.kind() == AnnotationKind::ScaleCalibration {
            // The reference is never kept, whatever the outcome
            self.tool = Tool::Select;
            return self.finish_calibration(&annotation, prompt);
        }

        match self.store_completed(annotation) {
            Some(item) => Ok(FinishOutcome::Completed(item)),
            None => Ok(FinishOutcome::Discarded),
        }
    }

    fn finish_calibration(
        &mut self,
        reference: &Annotation,
        prompt: &mut impl DistancePrompt,
    ) -> Result<FinishOutcome, CanvasError> {
        let reference_px = reference.path_length();
        let Some(entry) = prompt.request_known_distance(reference_px, &self.config.default_unit)
        else {
            debug!("calibration prompt dismissed");
            return Ok(FinishOutcome::CalibrationCancelled);
        };

        // A blank unit field means the default was left selected
        let unit = entry
            .unit
            .map(|unit| unit.trim().to_string())
            .filter(|unit| !unit.is_empty())
            .unwrap_or_else(|| self.config.default_unit.clone());
        let calibration = calibration::parse_known_distance(&entry.value)
            .and_then(|distance| calibration::finish_calibration(reference, distance, &unit))
            .map_err(|error| {
                warn!(%error, "calibration rejected, keeping previous scale");
                error
            })?;

        self.apply_calibration(calibration.clone());
        Ok(FinishOutcome::Calibrated(calibration))
    }

    /// Replace the calibration, rescaling existing line items when configured
    pub fn apply_calibration(&mut self, calibration: Calibration) {
        info!(
            pixels_per_unit = calibration.pixels_per_unit(),
            unit = calibration.unit(),
            "calibration applied"
        );
        self.calibration = calibration;
        if self.config.rescale_on_calibration {
            self.recompute_line_items();
        }
    }

    /// Re-derive and republish every measured line item from the current calibration
    ///
    /// Unit cost and user notes already stored in the sink are kept.
    pub fn recompute_line_items(&mut self) {
        let mut updated = 0usize;
        for annotation in self.annotations.all() {
            if !matches!(annotation.kind(), AnnotationKind::Linear | AnnotationKind::Area) {
                continue;
            }
            let Some(mut item) = derive_line_item(annotation, &self.calibration, &self.config)
            else {
                continue;
            };
            if let Some(existing) = self.sink.current(item.id) {
                item.set_unit_cost(existing.unit_cost);
                if !existing.notes.is_empty() && existing.notes != UNCALIBRATED_NOTE {
                    item.notes = existing.notes;
                }
            }
            self.sink.upsert(item);
            updated += 1;
        }
        debug!(updated, "line items recomputed");
    }

    /// Abandon the in-progress annotation (Escape)
    pub fn cancel(&mut self) -> bool {
        self.drawing.take().is_some()
    }

    /// Remove the last point of the in-progress annotation
    ///
    /// Removing the only point abandons the annotation.
    pub fn undo_last_point(&mut self) -> bool {
        let Some(annotation) = self.drawing.as_mut() else {
            return false;
        };
        annotation.pop_point();
        if annotation.points().is_empty() {
            self.drawing = None;
        }
        true
    }

    fn store_completed(&mut self, annotation: Annotation) -> Option<LineItem> {
        let item = derive_line_item(&annotation, &self.calibration, &self.config)?;
        self.sink.upsert(item.clone());
        debug!(
            id = %annotation.id(),
            quantity = item.quantity,
            unit = %item.unit,
            "annotation completed"
        );
        self.annotations.add(annotation);
        Some(item)
    }

    // ----- deletion -----

    /// Delete an annotation and its line item; unknown IDs are a no-op
    pub fn delete(&mut self, id: AnnotationId) -> bool {
        if self.annotations.remove(id).is_none() {
            return false;
        }
        self.sink.remove(id);
        if self.selected == Some(id) {
            self.selected = None;
        }
        debug!(%id, "annotation deleted");
        true
    }

    /// Delete the current selection
    pub fn delete_selected(&mut self) -> bool {
        match self.selected {
            Some(id) => self.delete(id),
            None => false,
        }
    }

    /// Delete a line item from the estimate together with its annotation
    pub fn remove_line_item(&mut self, id: AnnotationId) {
        self.sink.remove(id);
        if self.annotations.remove(id).is_some() && self.selected == Some(id) {
            self.selected = None;
        }
    }

    // ----- queries -----

    fn annotation_page(&self) -> u32 {
        match self.pager.source() {
            SourceKind::Image => 1,
            SourceKind::Paged => self.pager.current_page(),
        }
    }

    /// Completed annotations shown on the current page
    pub fn visible_annotations(&self) -> Vec<&Annotation> {
        match self.pager.source() {
            SourceKind::Image => self.annotations.all(),
            SourceKind::Paged => self.annotations.for_page(self.pager.current_page()),
        }
    }

    /// Topmost visible annotation near a document point
    pub fn hit_test(&self, point: &crate::geometry::Point, tolerance: f64) -> Option<AnnotationId> {
        self.visible_annotations()
            .into_iter()
            .rev()
            .find(|annotation| annotation.hit_test(point, tolerance))
            .map(Annotation::id)
    }

    pub fn state(&self) -> CanvasState {
        if self.drawing.is_some() {
            CanvasState::Drawing
        } else {
            CanvasState::Idle
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn in_progress(&self) -> Option<&Annotation> {
        self.drawing.as_ref()
    }

    pub fn selected(&self) -> Option<AnnotationId> {
        self.selected
    }

    pub fn annotations(&self) -> &AnnotationCollection {
        &self.annotations
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_state(&self) -> ViewportState {
        self.viewport.state()
    }

    pub fn current_page(&self) -> u32 {
        self.pager.current_page()
    }

    pub fn page_count(&self) -> u32 {
        self.pager.page_count()
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Give up the canvas and keep the sink
    pub fn into_sink(self) -> S {
        self.sink
    }
}
