//! Rectangle shape.

use super::{ShapeGeometry, ShapeKind};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// A rectangle given by its anchor corner and signed extents.
///
/// Negative `width`/`height` mean the drag went toward the top-left of the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectangleShape {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl RectangleShape {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Get the rectangle as a normalized kurbo Rect.
    pub fn as_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height).abs()
    }
}

impl ShapeGeometry for RectangleShape {
    const KIND: ShapeKind = ShapeKind::Rectangle;

    fn from_drag(anchor: Point, current: Point) -> Self {
        Self::new(anchor.x, anchor.y, current.x - anchor.x, current.y - anchor.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_from_drag() {
        let rect = RectangleShape::from_drag(Point::new(10.0, 10.0), Point::new(50.0, 30.0));
        assert!((rect.x - 10.0).abs() < f64::EPSILON);
        assert!((rect.y - 10.0).abs() < f64::EPSILON);
        assert!((rect.width - 40.0).abs() < f64::EPSILON);
        assert!((rect.height - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rectangle_keeps_signed_extents() {
        let rect = RectangleShape::from_drag(Point::new(100.0, 100.0), Point::new(50.0, 60.0));
        assert!((rect.x - 100.0).abs() < f64::EPSILON);
        assert!((rect.width + 50.0).abs() < f64::EPSILON);
        assert!((rect.height + 40.0).abs() < f64::EPSILON);

        let bounds = rect.as_rect();
        assert!((bounds.x0 - 50.0).abs() < f64::EPSILON);
        assert!((bounds.y0 - 60.0).abs() < f64::EPSILON);
        assert!((bounds.x1 - 100.0).abs() < f64::EPSILON);
        assert!((bounds.y1 - 100.0).abs() < f64::EPSILON);
    }
}
