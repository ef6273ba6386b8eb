//! Shape definitions and the geometry that turns a pointer drag into a shape.

mod circle;
mod rectangle;
mod stroke;

pub use circle::CircleShape;
pub use rectangle::RectangleShape;
pub use stroke::StrokeSegment;

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Convert to an `image` pixel.
    pub fn to_rgba(self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, self.a])
    }
}

/// The closed set of drawable shape kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Line,
    Rectangle,
    Circle,
}

impl ShapeKind {
    /// All kinds, in toolbar order.
    pub const ALL: [ShapeKind; 3] = [ShapeKind::Line, ShapeKind::Rectangle, ShapeKind::Circle];

    /// Wire name used as the event-name prefix.
    pub fn as_str(self) -> &'static str {
        match self {
            ShapeKind::Line => "line",
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Circle => "circle",
        }
    }
}

impl std::fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A shape payload of any kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Stroke(StrokeSegment),
    Rectangle(RectangleShape),
    Circle(CircleShape),
}

impl Shape {
    /// The kind of this shape.
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Stroke(_) => ShapeKind::Line,
            Shape::Rectangle(_) => ShapeKind::Rectangle,
            Shape::Circle(_) => ShapeKind::Circle,
        }
    }

    /// Axis-aligned bounds of the shape outline, before stroke width.
    pub fn bounds(&self) -> Rect {
        match self {
            Shape::Stroke(s) => Rect::from_points(s.start(), s.end()),
            Shape::Rectangle(r) => r.as_rect(),
            Shape::Circle(c) => Rect::new(
                c.x - c.radius,
                c.y - c.radius,
                c.x + c.radius,
                c.y + c.radius,
            ),
        }
    }
}

impl From<StrokeSegment> for Shape {
    fn from(segment: StrokeSegment) -> Self {
        Shape::Stroke(segment)
    }
}

impl From<RectangleShape> for Shape {
    fn from(rect: RectangleShape) -> Self {
        Shape::Rectangle(rect)
    }
}

impl From<CircleShape> for Shape {
    fn from(circle: CircleShape) -> Self {
        Shape::Circle(circle)
    }
}

/// Geometry capability shared by every shape payload.
///
/// A tool computes its payload from the gesture anchor and the current pointer
/// position; everything else about a tool is the same across kinds.
pub trait ShapeGeometry: Copy + Into<Shape> {
    /// The kind this payload belongs to.
    const KIND: ShapeKind;

    /// Whether the anchor follows the pointer after every sample (freehand paths).
    const CONTINUOUS: bool = false;

    /// Compute the payload for a drag from `anchor` to `current`.
    fn from_drag(anchor: Point, current: Point) -> Self;
}
