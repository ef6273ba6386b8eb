//! Raster layer and the stroke rasterizer used for every shape kind.

use crate::shapes::{Shape, StrokeSegment};
use image::{Rgba, RgbaImage};
use kurbo::{Circle, Line, ParamCurveNearest, Point, Rect};
use serde::{Deserialize, Serialize};

use crate::shapes::SerializableColor;

/// Stroke properties applied when painting shapes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    /// Stroke color.
    #[serde(default = "default_stroke_color")]
    pub color: SerializableColor,
    /// Stroke width in backing-store pixels.
    #[serde(default = "default_stroke_width")]
    pub width: f64,
}

fn default_stroke_color() -> SerializableColor {
    SerializableColor::black()
}

fn default_stroke_width() -> f64 {
    1.0
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: default_stroke_color(),
            width: default_stroke_width(),
        }
    }
}

impl StrokeStyle {
    /// Half the stroke width, never thinner than half a pixel.
    fn half_width(&self) -> f64 {
        (self.width / 2.0).max(0.5)
    }
}

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// One raster layer in backing-store pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pixels: RgbaImage,
}

impl Layer {
    /// Create a fully transparent layer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Borrow the underlying pixels.
    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Read one pixel, `None` outside the layer.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        self.pixels.get_pixel_checked(x, y).copied()
    }

    /// Whether every pixel is fully transparent.
    pub fn is_blank(&self) -> bool {
        self.pixels.pixels().all(|p| p.0[3] == 0)
    }

    /// Number of non-transparent pixels.
    pub fn painted_pixels(&self) -> usize {
        self.pixels.pixels().filter(|p| p.0[3] != 0).count()
    }

    /// Blank the whole layer.
    pub fn clear(&mut self) {
        for p in self.pixels.pixels_mut() {
            *p = TRANSPARENT;
        }
    }

    /// Copy `image` over this layer at the origin, clipped to the layer.
    pub fn replace(&mut self, image: &RgbaImage) {
        image::imageops::replace(&mut self.pixels, image, 0, 0);
    }

    /// Put `image` beneath the existing content, aligned at the origin.
    pub fn underlay(&mut self, image: &RgbaImage) {
        let mut base = RgbaImage::new(self.pixels.width(), self.pixels.height());
        image::imageops::replace(&mut base, image, 0, 0);
        image::imageops::overlay(&mut base, &self.pixels, 0, 0);
        self.pixels = base;
    }

    /// Stroke the outline of a shape.
    pub fn stroke_shape(&mut self, shape: &Shape, style: &StrokeStyle) {
        match shape {
            Shape::Stroke(segment) => self.stroke_segment(segment, style),
            Shape::Rectangle(rect) => self.stroke_rect(rect.as_rect(), style),
            Shape::Circle(circle) => self.stroke_circle(circle.as_circle(), style),
        }
    }

    /// Stroke a single freehand segment.
    pub fn stroke_segment(&mut self, segment: &StrokeSegment, style: &StrokeStyle) {
        self.stroke_line(segment.as_line(), style);
    }

    fn stroke_rect(&mut self, rect: Rect, style: &StrokeStyle) {
        let corners = [
            Point::new(rect.x0, rect.y0),
            Point::new(rect.x1, rect.y0),
            Point::new(rect.x1, rect.y1),
            Point::new(rect.x0, rect.y1),
        ];
        for i in 0..corners.len() {
            let next = corners[(i + 1) % corners.len()];
            self.stroke_line(Line::new(corners[i], next), style);
        }
    }

    fn stroke_line(&mut self, line: Line, style: &StrokeStyle) {
        let half = style.half_width();
        let bounds = Rect::from_points(line.p0, line.p1).inflate(half, half);
        let color = style.color.to_rgba();
        self.fill_where(bounds, color, |p| line.nearest(p, 1e-9).distance_sq <= half * half);
    }

    fn stroke_circle(&mut self, circle: Circle, style: &StrokeStyle) {
        let half = style.half_width();
        let reach = circle.radius + half;
        let bounds = Rect::new(
            circle.center.x - reach,
            circle.center.y - reach,
            circle.center.x + reach,
            circle.center.y + reach,
        );
        let color = style.color.to_rgba();
        self.fill_where(bounds, color, |p| {
            (p.distance(circle.center) - circle.radius).abs() <= half
        });
    }

    /// Set every pixel inside `bounds` whose center satisfies `covered`.
    fn fill_where(&mut self, bounds: Rect, color: Rgba<u8>, covered: impl Fn(Point) -> bool) {
        if !bounds.is_finite() || self.pixels.width() == 0 || self.pixels.height() == 0 {
            return;
        }
        let max_x = self.pixels.width() as f64;
        let max_y = self.pixels.height() as f64;
        let x0 = bounds.x0.floor().clamp(0.0, max_x) as u32;
        let x1 = bounds.x1.ceil().clamp(0.0, max_x) as u32;
        let y0 = bounds.y0.floor().clamp(0.0, max_y) as u32;
        let y1 = bounds.y1.ceil().clamp(0.0, max_y) as u32;

        for y in y0..y1 {
            for x in x0..x1 {
                let center = Point::new(x as f64 + 0.5, y as f64 + 0.5);
                if covered(center) {
                    self.pixels.put_pixel(x, y, color);
                }
            }
        }
    }
}
