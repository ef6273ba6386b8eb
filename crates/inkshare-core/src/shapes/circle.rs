//! Circle shape.

use super::{ShapeGeometry, ShapeKind};
use kurbo::{Circle, Point};
use serde::{Deserialize, Serialize};

/// A circle given by its center and a non-negative radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircleShape {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl CircleShape {
    pub fn new(x: f64, y: f64, radius: f64) -> Self {
        Self { x, y, radius }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Get the circle as a kurbo Circle.
    pub fn as_circle(&self) -> Circle {
        Circle::new(self.center(), self.radius)
    }
}

impl ShapeGeometry for CircleShape {
    const KIND: ShapeKind = ShapeKind::Circle;

    /// The radius is the horizontal distance from the center to the pointer.
    /// Vertical movement does not change it.
    fn from_drag(anchor: Point, current: Point) -> Self {
        Self::new(anchor.x, anchor.y, (current.x - anchor.x).abs())
    }
}
