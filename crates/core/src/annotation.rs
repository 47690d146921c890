//! Takeoff annotation data model
//!
//! Annotations are manual measurements drawn over a blueprint page. Points are
//! stored in document space and their order is meaningful: consecutive points
//! form the segments of a run or the edges of an area.

use std::collections::{BTreeMap, HashMap};

use crate::geometry::{self, Point};

/// Unique identifier for an annotation
///
/// Shared with the line item derived from it, so deleting either side can
/// find the other.
pub type AnnotationId = uuid::Uuid;

/// What an annotation measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum AnnotationKind {
    /// Single click per counted item
    Count,
    /// Open polyline, measured by length
    Linear,
    /// Closed polygon, measured by enclosed area
    Area,
    /// Reference segment of known real-world length
    ScaleCalibration,
}

impl AnnotationKind {
    /// Whether this kind is drawn with several clicks and an explicit finish
    pub fn is_multi_point(self) -> bool {
        !matches!(self, AnnotationKind::Count)
    }

    /// Human-readable name used in line item descriptions
    pub fn label(self) -> &'static str {
        match self {
            AnnotationKind::Count => "Count",
            AnnotationKind::Linear => "Linear Measurement",
            AnnotationKind::Area => "Area Measurement",
            AnnotationKind::ScaleCalibration => "Scale Reference",
        }
    }
}

/// One manual measurement
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Annotation {
    id: AnnotationId,
    kind: AnnotationKind,
    points: Vec<Point>,
    /// 1-based sheet number
    page: u32,
    completed: bool,
}

impl Annotation {
    /// Start an annotation at its first click
    ///
    /// `Count` annotations are complete immediately; every other kind keeps
    /// accepting points until [`Annotation::complete`] is called.
    pub fn begin(kind: AnnotationKind, page: u32, first: Point) -> Self {
        Self {
            id: AnnotationId::new_v4(),
            kind,
            points: vec![first],
            page,
            completed: !kind.is_multi_point(),
        }
    }

    /// Get the annotation ID
    pub fn id(&self) -> AnnotationId {
        self.id
    }

    /// Get the annotation kind
    pub fn kind(&self) -> AnnotationKind {
        self.kind
    }

    /// Points in measurement order
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Page this annotation was drawn on
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Whether the annotation is frozen
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Append a point while drawing; returns false once completed
    pub fn push_point(&mut self, point: Point) -> bool {
        if self.completed {
            return false;
        }
        self.points.push(point);
        true
    }

    /// Drop the most recent point while drawing
    pub fn pop_point(&mut self) -> Option<Point> {
        if self.completed {
            return None;
        }
        self.points.pop()
    }

    /// Freeze the annotation
    ///
    /// Fails (returns false) when fewer than two points were recorded; such an
    /// annotation must be discarded by the caller.
    pub fn complete(&mut self) -> bool {
        if self.completed {
            return true;
        }
        if self.points.len() < 2 {
            return false;
        }
        self.completed = true;
        true
    }

    /// Length of the drawn path in document pixels
    pub fn path_length(&self) -> f64 {
        geometry::path_length(&self.points)
    }

    /// Enclosed area in square document pixels
    pub fn area(&self) -> f64 {
        geometry::polygon_area(&self.points)
    }

    /// Anchor for the quantity label
    pub fn label_position(&self) -> Option<Point> {
        match self.kind {
            AnnotationKind::Area => geometry::centroid(&self.points),
            _ => self.points.first().copied(),
        }
    }

    /// Check if a point hits this annotation (for selection)
    pub fn hit_test(&self, point: &Point, tolerance: f64) -> bool {
        match self.kind {
            AnnotationKind::Count => self
                .points
                .first()
                .is_some_and(|p| p.distance_to(point) <= tolerance),
            AnnotationKind::Linear | AnnotationKind::ScaleCalibration => {
                if self.points.len() == 1 {
                    return self.points[0].distance_to(point) <= tolerance;
                }
                self.points.windows(2).any(|w| {
                    geometry::distance_to_segment(point, &w[0], &w[1]) <= tolerance
                })
            }
            AnnotationKind::Area => {
                let n = self.points.len();
                let near_edge = (0..n).any(|i| {
                    let next = (i + 1) % n;
                    geometry::distance_to_segment(point, &self.points[i], &self.points[next])
                        <= tolerance
                });
                near_edge || point_in_polygon(point, &self.points)
            }
        }
    }
}

/// Even-odd ray cast
fn point_in_polygon(point: &Point, polygon: &[Point]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (a, b) = (&polygon[i], &polygon[j]);
        if (a.y > point.y) != (b.y > point.y)
            && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Completed annotations for the loaded document
///
/// Keeps a per-page index so the overlay for the displayed sheet can be built
/// without scanning every annotation.
#[derive(Debug, Default)]
pub struct AnnotationCollection {
    annotations: HashMap<AnnotationId, Annotation>,
    by_page: BTreeMap<u32, Vec<AnnotationId>>,
}

impl AnnotationCollection {
    /// Create a new empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an annotation to the collection
    pub fn add(&mut self, annotation: Annotation) {
        let id = annotation.id();
        let page = annotation.page();

        if self.annotations.insert(id, annotation).is_none() {
            self.by_page.entry(page).or_default().push(id);
        }
    }

    /// Remove an annotation by ID
    pub fn remove(&mut self, id: AnnotationId) -> Option<Annotation> {
        let annotation = self.annotations.remove(&id)?;
        let page = annotation.page();
        if let Some(page_annotations) = self.by_page.get_mut(&page) {
            page_annotations.retain(|&aid| aid != id);
            if page_annotations.is_empty() {
                self.by_page.remove(&page);
            }
        }
        Some(annotation)
    }

    /// Get an annotation by ID
    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.get(&id)
    }

    /// Annotations drawn on `page`, in drawing order
    pub fn for_page(&self, page: u32) -> Vec<&Annotation> {
        self.by_page
            .get(&page)
            .map(|ids| ids.iter().filter_map(|id| self.annotations.get(id)).collect())
            .unwrap_or_default()
    }

    /// All annotations, ordered by page then drawing order
    pub fn all(&self) -> Vec<&Annotation> {
        self.by_page
            .values()
            .flatten()
            .filter_map(|id| self.annotations.get(id))
            .collect()
    }

    /// Get count of annotations
    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    /// Check if collection is empty
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Clear all annotations
    pub fn clear(&mut self) {
        self.annotations.clear();
        self.by_page.clear();
    }
}
