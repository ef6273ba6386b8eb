//! Freehand stroke segment.

use super::{ShapeGeometry, ShapeKind};
use kurbo::{Line, Point};
use serde::{Deserialize, Serialize};

/// One incremental segment of a freehand path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeSegment {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl StrokeSegment {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn start(&self) -> Point {
        Point::new(self.x1, self.y1)
    }

    pub fn end(&self) -> Point {
        Point::new(self.x2, self.y2)
    }

    /// Get the segment as a kurbo Line.
    pub fn as_line(&self) -> Line {
        Line::new(self.start(), self.end())
    }
}

impl ShapeGeometry for StrokeSegment {
    const KIND: ShapeKind = ShapeKind::Line;
    const CONTINUOUS: bool = true;

    fn from_drag(anchor: Point, current: Point) -> Self {
        Self::new(anchor.x, anchor.y, current.x, current.y)
    }
}
