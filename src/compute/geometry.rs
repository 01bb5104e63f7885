//! Axis-aligned rectangle geometry on the plot.
//!
//! Coordinates are meters with the origin at the top-left plot corner, X
//! growing right and Y growing down.

use serde::{Deserialize, Serialize};

/// A point on the plot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn left(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn top(&self) -> f64 {
        self.y
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    #[inline]
    pub fn perimeter(&self) -> f64 {
        2.0 * (self.width + self.height)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Same size, moved to a new top-left corner.
    pub fn moved_to(&self, x: f64, y: f64) -> Self {
        Self { x, y, ..*self }
    }

    /// Whether two rectangles come closer than `margin` on both axes.
    ///
    /// Touching at exactly `margin` does not count as overlap. A negative
    /// margin tolerates that much interpenetration.
    pub fn overlaps(&self, other: &Rect, margin: f64) -> bool {
        let separated = self.right() + margin <= other.left()
            || other.right() + margin <= self.left()
            || self.bottom() + margin <= other.top()
            || other.bottom() + margin <= self.top();
        !separated
    }

    /// Euclidean distance between the closest edges; zero when touching or
    /// intersecting.
    pub fn edge_distance(&self, other: &Rect) -> f64 {
        let dx = (self.left() - other.right())
            .max(other.left() - self.right())
            .max(0.0);
        let dy = (self.top() - other.bottom())
            .max(other.top() - self.bottom())
            .max(0.0);
        dx.hypot(dy)
    }

    /// Whether the rectangle lies fully inside a `width` x `height` plot.
    pub fn within(&self, width: f64, height: f64) -> bool {
        self.left() >= 0.0 && self.top() >= 0.0 && self.right() <= width && self.bottom() <= height
    }

    /// Point at fractional coordinates inside the rectangle.
    pub fn point_at(&self, fx: f64, fy: f64) -> Point {
        Point::new(self.x + fx * self.width, self.y + fy * self.height)
    }
}

/// Point on the boundary of a `width` x `height` plot, reached by walking
/// clockwise from the origin for `fraction` of the perimeter.
pub fn perimeter_point(width: f64, height: f64, fraction: f64) -> Point {
    let perimeter = 2.0 * (width + height);
    let mut d = fraction.clamp(0.0, 1.0) * perimeter;

    if d <= width {
        return Point::new(d, 0.0);
    }
    d -= width;
    if d <= height {
        return Point::new(width, d);
    }
    d -= height;
    if d <= width {
        return Point::new(width - d, height);
    }
    d -= width;
    Point::new(0.0, (height - d).max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_squares_overlap_for_any_margin() {
        let a = Rect::new(0.0, 0.0, 2.0, 2.0);
        let b = Rect::new(0.0, 0.0, 2.0, 2.0);
        for margin in [-1.5, -0.5, 0.0, 0.5, 2.0] {
            assert!(a.overlaps(&b, margin), "margin {margin}");
        }
    }

    #[test]
    fn test_separation_boundary_inclusive() {
        let a = Rect::new(0.0, 0.0, 2.0, 2.0);
        let b = Rect::new(4.0, 0.0, 2.0, 2.0);
        assert!(!a.overlaps(&b, 2.0));
        assert!(!b.overlaps(&a, 2.0));
        assert!(a.overlaps(&b, 2.0 + 1e-9));

        let below = Rect::new(0.0, 4.5, 2.0, 2.0);
        assert!(!a.overlaps(&below, 2.5));
        assert!(a.overlaps(&below, 2.6));
    }

    #[test]
    fn test_diagonal_neighbours_are_separated_on_one_axis() {
        let a = Rect::new(0.0, 0.0, 2.0, 2.0);
        let b = Rect::new(3.0, 3.0, 2.0, 2.0);
        assert!(!a.overlaps(&b, 1.0));
        assert!((a.edge_distance(&b) - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_edge_distance() {
        let a = Rect::new(0.0, 0.0, 2.0, 2.0);
        assert_eq!(a.edge_distance(&Rect::new(5.0, 1.0, 1.0, 1.0)), 3.0);
        assert_eq!(a.edge_distance(&Rect::new(1.0, 1.0, 3.0, 3.0)), 0.0);
    }

    #[test]
    fn test_within() {
        assert!(Rect::new(0.0, 0.0, 40.0, 30.0).within(40.0, 30.0));
        assert!(!Rect::new(-0.1, 0.0, 1.0, 1.0).within(40.0, 30.0));
        assert!(!Rect::new(39.5, 0.0, 1.0, 1.0).within(40.0, 30.0));
    }

    #[test]
    fn test_perimeter_point_walks_clockwise() {
        let (w, h) = (40.0, 30.0);
        let close = |p: Point, x: f64, y: f64| (p.x - x).abs() < 1e-9 && (p.y - y).abs() < 1e-9;

        assert!(close(perimeter_point(w, h, 0.0), 0.0, 0.0));
        assert!(close(perimeter_point(w, h, 20.0 / 140.0), 20.0, 0.0));
        assert!(close(perimeter_point(w, h, 55.0 / 140.0), 40.0, 15.0));
        assert!(close(perimeter_point(w, h, 80.0 / 140.0), 30.0, 30.0));
        assert!(close(perimeter_point(w, h, 125.0 / 140.0), 0.0, 15.0));
        assert!(close(perimeter_point(w, h, 1.0), 0.0, 0.0));
    }
}
