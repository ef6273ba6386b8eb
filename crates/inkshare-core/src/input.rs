//! Pointer input and page-to-surface coordinate mapping.

use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};

/// Pointer event phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
}

/// A pointer sample in page coordinates, as delivered by the host UI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub position: Point,
}

impl PointerEvent {
    pub fn down(x: f64, y: f64) -> Self {
        Self {
            phase: PointerPhase::Down,
            position: Point::new(x, y),
        }
    }

    pub fn moved(x: f64, y: f64) -> Self {
        Self {
            phase: PointerPhase::Move,
            position: Point::new(x, y),
        }
    }

    pub fn up(x: f64, y: f64) -> Self {
        Self {
            phase: PointerPhase::Up,
            position: Point::new(x, y),
        }
    }
}

/// On-screen placement of a surface.
///
/// Maps page coordinates to backing-store pixels, correcting for the surface offset
/// on the page and for the ratio between its displayed size and its backing store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Top-left corner of the surface in page coordinates.
    pub origin: Point,
    /// Displayed (CSS) size of the surface.
    pub display_size: Size,
    /// Backing-store size in pixels.
    pub backing_size: Size,
}

impl Viewport {
    /// A viewport whose displayed size equals its backing store, placed at the page origin.
    pub fn identity(width: u32, height: u32) -> Self {
        let size = Size::new(width as f64, height as f64);
        Self {
            origin: Point::ZERO,
            display_size: size,
            backing_size: size,
        }
    }

    /// Convert a page-space point to backing-store pixels.
    ///
    /// A viewport with an empty displayed size maps everything to the origin rather
    /// than producing non-finite coordinates.
    pub fn to_surface(&self, page: Point) -> Point {
        if self.display_size.width <= 0.0 || self.display_size.height <= 0.0 {
            return Point::ZERO;
        }
        Point::new(
            (page.x - self.origin.x) / self.display_size.width * self.backing_size.width,
            (page.y - self.origin.y) / self.display_size.height * self.backing_size.height,
        )
    }
}
