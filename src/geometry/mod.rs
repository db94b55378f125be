//! Geometric primitives in page space.
//!
//! PDF page coordinates run left-to-right and bottom-to-top, so rectangles
//! here are `(left, bottom, right, top)` with `left <= right` and
//! `bottom <= top`. Everything the redactor intersects — glyph boxes, path
//! bounds, XObject bounds, target areas — is one of these axis-aligned boxes.

use serde::Serialize;

use crate::content::Matrix;

/// A 2D point in page space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    /// Create a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in page space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    /// Left edge (minimum x)
    pub left: f64,
    /// Bottom edge (minimum y)
    pub bottom: f64,
    /// Right edge (maximum x)
    pub right: f64,
    /// Top edge (maximum y)
    pub top: f64,
}

impl Rect {
    /// Create a rectangle from two opposite corners.
    ///
    /// Coordinates are normalized so the invariants `left <= right` and
    /// `bottom <= top` always hold, whichever corners the caller passes.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_redact::geometry::Rect;
    ///
    /// let r = Rect::new(110.0, 70.0, 10.0, 20.0);
    /// assert_eq!(r.left, 10.0);
    /// assert_eq!(r.bottom, 20.0);
    /// assert_eq!(r.right, 110.0);
    /// assert_eq!(r.top, 70.0);
    /// ```
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            left: x0.min(x1),
            bottom: y0.min(y1),
            right: x0.max(x1),
            top: y0.max(y1),
        }
    }

    /// Rectangle from origin and extent, as the `re` operator gives them.
    ///
    /// Negative widths and heights are legal in content streams; they are
    /// normalized away here.
    pub fn from_origin_size(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Width of the rectangle.
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    /// Height of the rectangle.
    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    /// Check whether the interiors overlap.
    ///
    /// Strict: rectangles that merely share an edge do not intersect. This
    /// is what keeps redaction from swallowing the glyph sitting flush
    /// against a target area.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left < other.right
            && self.right > other.left
            && self.bottom < other.top
            && self.top > other.bottom
    }

    /// Overlapping region, if any.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }
        Some(Rect {
            left: self.left.max(other.left),
            bottom: self.bottom.max(other.bottom),
            right: self.right.min(other.right),
            top: self.top.min(other.top),
        })
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            left: self.left.min(other.left),
            bottom: self.bottom.min(other.bottom),
            right: self.right.max(other.right),
            top: self.top.max(other.top),
        }
    }

    /// Check if the rectangle contains a point (edges inclusive).
    pub fn contains_point(&self, p: &Point) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.bottom && p.y <= self.top
    }

    /// Check if `other` lies entirely within this rectangle.
    pub fn contains(&self, other: &Rect) -> bool {
        other.left >= self.left
            && other.right <= self.right
            && other.bottom >= self.bottom
            && other.top <= self.top
    }

    /// Image of the rectangle under an affine map.
    ///
    /// Transforms the four corners and takes their axis-aligned bounding
    /// box, which is how glyph and path boxes reach device space.
    pub fn transform(&self, m: &Matrix) -> Rect {
        let corners = [
            m.transform_point(self.left, self.bottom),
            m.transform_point(self.right, self.bottom),
            m.transform_point(self.left, self.top),
            m.transform_point(self.right, self.top),
        ];
        let mut out = Rect::new(corners[0].x, corners[0].y, corners[1].x, corners[1].y);
        for p in &corners[2..] {
            out = out.union(&Rect::new(p.x, p.y, p.x, p.y));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_normalizes_corners() {
        let r = Rect::new(100.0, 50.0, 0.0, 0.0);
        assert_eq!(r.left, 0.0);
        assert_eq!(r.bottom, 0.0);
        assert_eq!(r.right, 100.0);
        assert_eq!(r.top, 50.0);
        assert_eq!(r.width(), 100.0);
        assert_eq!(r.height(), 50.0);
    }

    #[test]
    fn test_from_origin_size_negative_extent() {
        let r = Rect::from_origin_size(100.0, 200.0, -50.0, -30.0);
        assert_eq!(r.left, 50.0);
        assert_eq!(r.bottom, 170.0);
        assert_eq!(r.right, 100.0);
        assert_eq!(r.top, 200.0);
    }

    #[test]
    fn test_intersects_overlap_and_disjoint() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(50.0, 50.0, 150.0, 150.0);
        let c = Rect::new(200.0, 200.0, 300.0, 300.0);

        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_edge_touching_does_not_intersect() {
        let a = Rect::new(0.0, 0.0, 50.0, 50.0);
        let b = Rect::new(50.0, 0.0, 100.0, 50.0);
        assert!(!a.intersects(&b));
        assert!(a.intersection(&b).is_none());
    }

    #[test]
    fn test_intersection_region() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(60.0, 40.0, 160.0, 140.0);
        let i = a.intersection(&b).unwrap();
        assert_eq!(i, Rect::new(60.0, 40.0, 100.0, 100.0));
    }

    #[test]
    fn test_union() {
        let a = Rect::new(0.0, 0.0, 50.0, 50.0);
        let b = Rect::new(25.0, 25.0, 75.0, 75.0);
        let u = a.union(&b);
        assert_eq!(u, Rect::new(0.0, 0.0, 75.0, 75.0));
    }

    #[test]
    fn test_contains_point_edges_inclusive() {
        let r = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(r.contains_point(&Point::new(0.0, 0.0)));
        assert!(r.contains_point(&Point::new(100.0, 100.0)));
        assert!(r.contains_point(&Point::new(50.0, 50.0)));
        assert!(!r.contains_point(&Point::new(150.0, 50.0)));
    }

    #[test]
    fn test_contains_rect() {
        let outer = Rect::new(0.0, 0.0, 100.0, 100.0);
        let inner = Rect::new(10.0, 10.0, 90.0, 90.0);
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
    }

    #[test]
    fn test_transform_translation() {
        let r = Rect::new(0.0, 0.0, 10.0, 20.0);
        let m = Matrix::translation(5.0, 7.0);
        assert_eq!(r.transform(&m), Rect::new(5.0, 7.0, 15.0, 27.0));
    }

    #[test]
    fn test_transform_rotation_takes_aabb() {
        // 90-degree rotation maps [0,0,10,20] onto [-20,0,0,10].
        let r = Rect::new(0.0, 0.0, 10.0, 20.0);
        let m = Matrix::rotation(std::f64::consts::FRAC_PI_2);
        let t = r.transform(&m);
        assert!((t.left - -20.0).abs() < 1e-9);
        assert!((t.bottom - 0.0).abs() < 1e-9);
        assert!((t.right - 0.0).abs() < 1e-9);
        assert!((t.top - 10.0).abs() < 1e-9);
    }
}
