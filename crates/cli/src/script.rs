//! Scripted canvas sessions
//!
//! A script is a JSON document describing the loaded document, the on-screen
//! container and a list of input events. Replaying it drives a
//! [`TakeoffCanvas`] exactly as the UI shell would.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use takeoff_core::{
    AnnotationId, Calibration, CanvasConfig, CanvasError, ContentSize, DistanceEntry,
    FinishOutcome, LineItem, NoPrompt, PointerButton, PointerOutcome, RenderOutcome, RenderTicket,
    ScreenPoint, SourceKind, TakeoffCanvas, Tool, ViewportState,
};
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    #[serde(default)]
    pub document: DocumentSetup,
    #[serde(default)]
    pub container: Option<ContainerRect>,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentSetup {
    pub kind: SourceKind,
    #[serde(default = "default_pages")]
    pub pages: u32,
}

impl Default for DocumentSetup {
    fn default() -> Self {
        Self { kind: SourceKind::Image, pages: 1 }
    }
}

fn default_pages() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContainerRect {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SelectTool {
        tool: Tool,
    },
    BeginCalibration,
    PointerDown {
        x: f64,
        y: f64,
        #[serde(default)]
        button: PointerButton,
    },
    PointerMove {
        x: f64,
        y: f64,
    },
    PointerUp,
    /// Primary press and release at one position
    Click {
        x: f64,
        y: f64,
    },
    /// Finish gesture; `known_distance` answers the calibration prompt
    Finish {
        #[serde(default)]
        known_distance: Option<String>,
        #[serde(default)]
        unit: Option<String>,
    },
    Cancel,
    Undo,
    ChangePage {
        delta: i64,
    },
    GoToPage {
        page: u32,
    },
    /// Completes the render issued as `request` (0-based), or the latest one
    RenderComplete {
        width: f64,
        height: f64,
        #[serde(default)]
        request: Option<usize>,
    },
    ZoomIn,
    ZoomOut,
    ZoomAt {
        x: f64,
        y: f64,
        zoom: f64,
    },
    FitToContent,
    DeleteLast,
    DeleteSelected,
}

impl Event {
    fn name(&self) -> &'static str {
        match self {
            Event::SelectTool { .. } => "select_tool",
            Event::BeginCalibration => "begin_calibration",
            Event::PointerDown { .. } => "pointer_down",
            Event::PointerMove { .. } => "pointer_move",
            Event::PointerUp => "pointer_up",
            Event::Click { .. } => "click",
            Event::Finish { .. } => "finish",
            Event::Cancel => "cancel",
            Event::Undo => "undo",
            Event::ChangePage { .. } => "change_page",
            Event::GoToPage { .. } => "go_to_page",
            Event::RenderComplete { .. } => "render_complete",
            Event::ZoomIn => "zoom_in",
            Event::ZoomOut => "zoom_out",
            Event::ZoomAt { .. } => "zoom_at",
            Event::FitToContent => "fit_to_content",
            Event::DeleteLast => "delete_last",
            Event::DeleteSelected => "delete_selected",
        }
    }
}

/// One replayed event and what it did
#[derive(Debug, Clone, Serialize)]
pub struct EventRecord {
    pub index: usize,
    pub event: &'static str,
    pub outcome: String,
}

/// Canvas state after a replay
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub page: u32,
    pub page_count: u32,
    pub tool: Tool,
    pub calibration: Calibration,
    pub viewport: ViewportState,
    pub annotations: usize,
    pub line_items: Vec<LineItem>,
    pub total_cost: f64,
    pub events: Vec<EventRecord>,
}

struct Session {
    canvas: TakeoffCanvas,
    tickets: Vec<RenderTicket>,
    completed: Vec<AnnotationId>,
}

/// Replay a script against a fresh canvas
///
/// Rejected calibration input is recorded and replay continues, unless
/// `strict` is set.
pub fn replay(script: &Script, config: CanvasConfig, strict: bool) -> Result<Report> {
    let mut canvas = TakeoffCanvas::with_ledger(config)?;
    let first = canvas.load_document(script.document.kind, script.document.pages);

    if let Some(container) = &script.container {
        canvas.set_container(
            ScreenPoint::new(container.x, container.y),
            container.width,
            container.height,
        );
    }

    let mut session = Session { canvas, tickets: vec![first], completed: Vec::new() };
    let mut records = Vec::with_capacity(script.events.len());

    for (index, event) in script.events.iter().enumerate() {
        let outcome = match session.apply(event) {
            Ok(outcome) => outcome,
            Err(error) if !strict && is_user_input_error(&error) => format!("rejected: {error}"),
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("event {index} ({}) failed", event.name()));
            }
        };
        debug!(index, event = event.name(), %outcome, "event replayed");
        records.push(EventRecord { index, event: event.name(), outcome });
    }

    let canvas = &session.canvas;
    Ok(Report {
        page: canvas.current_page(),
        page_count: canvas.page_count(),
        tool: canvas.tool(),
        calibration: canvas.calibration().clone(),
        viewport: canvas.viewport_state(),
        annotations: canvas.annotations().len(),
        line_items: canvas.sink().items().to_vec(),
        total_cost: canvas.sink().total_cost(),
        events: records,
    })
}

fn is_user_input_error(error: &anyhow::Error) -> bool {
    matches!(error.downcast_ref::<CanvasError>(), Some(CanvasError::Calibration(_)))
}

impl Session {
    fn apply(&mut self, event: &Event) -> Result<String> {
        let canvas = &mut self.canvas;
        let outcome = match event {
            Event::SelectTool { tool } => {
                canvas.select_tool(*tool);
                format!("tool {tool:?}")
            }
            Event::BeginCalibration => {
                canvas.begin_calibration();
                "calibrating".to_string()
            }
            Event::PointerDown { x, y, button } => {
                let outcome = canvas.pointer_down(ScreenPoint::new(*x, *y), *button);
                self.describe_pointer(outcome)
            }
            Event::PointerMove { x, y } => {
                if canvas.pointer_move(ScreenPoint::new(*x, *y)) {
                    "panned".to_string()
                } else {
                    "moved".to_string()
                }
            }
            Event::PointerUp => {
                canvas.pointer_up();
                "released".to_string()
            }
            Event::Click { x, y } => {
                let outcome = canvas.pointer_down(ScreenPoint::new(*x, *y), PointerButton::Primary);
                self.canvas.pointer_up();
                self.describe_pointer(outcome)
            }
            Event::Finish { known_distance, unit } => {
                let outcome = match known_distance {
                    Some(value) => {
                        let mut entry = DistanceEntry { value: value.clone(), unit: unit.clone() };
                        canvas.finish(&mut entry)?
                    }
                    None => canvas.finish(&mut NoPrompt)?,
                };
                self.describe_finish(outcome)
            }
            Event::Cancel => {
                if canvas.cancel() {
                    "cancelled".to_string()
                } else {
                    "nothing to cancel".to_string()
                }
            }
            Event::Undo => {
                if canvas.undo_last_point() {
                    "point removed".to_string()
                } else {
                    "nothing to undo".to_string()
                }
            }
            Event::ChangePage { delta } => {
                let ticket = canvas.change_page(*delta);
                self.record_ticket(ticket)
            }
            Event::GoToPage { page } => {
                let ticket = canvas.go_to_page(*page);
                self.record_ticket(ticket)
            }
            Event::RenderComplete { width, height, request } => {
                let index = request.unwrap_or(self.tickets.len().saturating_sub(1));
                let ticket = *self.tickets.get(index).with_context(|| {
                    format!(
                        "render request {index} was never issued ({} so far)",
                        self.tickets.len()
                    )
                })?;
                match self.canvas.render_complete(ticket, ContentSize::new(*width, *height)) {
                    RenderOutcome::Applied(state) => {
                        format!("applied at {:.0}%", state.zoom * 100.0)
                    }
                    RenderOutcome::Stale => "stale".to_string(),
                }
            }
            Event::ZoomIn => {
                canvas.zoom_in();
                format!("{}%", canvas.viewport().zoom_percent())
            }
            Event::ZoomOut => {
                canvas.zoom_out();
                format!("{}%", canvas.viewport().zoom_percent())
            }
            Event::ZoomAt { x, y, zoom } => {
                canvas.zoom_at(ScreenPoint::new(*x, *y), *zoom);
                format!("{}%", canvas.viewport().zoom_percent())
            }
            Event::FitToContent => {
                let state = canvas.fit_to_content();
                format!("{:.0}%", state.zoom * 100.0)
            }
            Event::DeleteLast => {
                let deleted = self.completed.pop().filter(|id| self.canvas.delete(*id));
                match deleted {
                    Some(id) => format!("deleted {id}"),
                    None => "nothing to delete".to_string(),
                }
            }
            Event::DeleteSelected => {
                if canvas.delete_selected() {
                    "deleted selection".to_string()
                } else {
                    "nothing selected".to_string()
                }
            }
        };
        Ok(outcome)
    }

    fn record_ticket(&mut self, ticket: Option<RenderTicket>) -> String {
        match ticket {
            Some(ticket) => {
                self.tickets.push(ticket);
                format!("page {}", ticket.page)
            }
            None => format!("stayed on page {}", self.canvas.current_page()),
        }
    }

    fn describe_pointer(&mut self, outcome: PointerOutcome) -> String {
        match outcome {
            PointerOutcome::Ignored => "ignored".to_string(),
            PointerOutcome::PanStarted => "pan started".to_string(),
            PointerOutcome::Selected(Some(id)) => format!("selected {id}"),
            PointerOutcome::Selected(None) => "nothing selected".to_string(),
            PointerOutcome::Counted(item) => {
                self.completed.push(item.id);
                format!("counted {} {}", item.quantity, item.unit)
            }
            PointerOutcome::Started(_) => "drawing started".to_string(),
            PointerOutcome::PointAdded { points, .. } => format!("point {points} added"),
        }
    }

    fn describe_finish(&mut self, outcome: FinishOutcome) -> String {
        match outcome {
            FinishOutcome::NothingToFinish => "nothing to finish".to_string(),
            FinishOutcome::Discarded => "discarded".to_string(),
            FinishOutcome::Completed(item) => {
                self.completed.push(item.id);
                format!("completed {} {}", item.quantity, item.unit)
            }
            FinishOutcome::Calibrated(calibration) => {
                format!(
                    "calibrated {} px per {}",
                    calibration.pixels_per_unit(),
                    calibration.unit()
                )
            }
            FinishOutcome::CalibrationCancelled => "calibration cancelled".to_string(),
        }
    }
}
