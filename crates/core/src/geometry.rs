//! Planar geometry over document-space points
//!
//! All functions are pure and total: any finite point sequence yields a finite
//! result, and short sequences degrade to zero instead of failing.

/// Point in document space
///
/// Document space is the unscaled coordinate system of the loaded page or
/// image. It does not change when the viewport zooms or pans.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Calculate distance to another point
    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Euclidean distance between two points
pub fn distance(a: Point, b: Point) -> f64 {
    a.distance_to(&b)
}

/// Length of the open polyline through `points`, in input order
pub fn path_length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| w[0].distance_to(&w[1])).sum()
}

/// Area enclosed by the polygon through `points` (shoelace formula)
///
/// The ring is closed implicitly from the last point back to the first.
/// Winding direction does not affect the result.
pub fn polygon_area(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].x * points[j].y;
        area -= points[j].x * points[i].y;
    }
    (area / 2.0).abs()
}

/// Vertex average, used to anchor quantity labels on the overlay
pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let sum_x: f64 = points.iter().map(|p| p.x).sum();
    let sum_y: f64 = points.iter().map(|p| p.y).sum();
    Some(Point::new(sum_x / n, sum_y / n))
}

/// Distance from `point` to the segment `start..end`
pub(crate) fn distance_to_segment(point: &Point, start: &Point, end: &Point) -> f64 {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let length_sq = dx * dx + dy * dy;

    if length_sq < 1e-12 {
        return point.distance_to(start);
    }

    let t = ((point.x - start.x) * dx + (point.y - start.y) * dy) / length_sq;
    let t = t.clamp(0.0, 1.0);

    let closest = Point::new(start.x + t * dx, start.y + t * dy);
    point.distance_to(&closest)
}
