//! Two-layer drawing surface: a preview layer for in-progress shapes over a
//! committed layer holding finished artwork.
//!
//! The committed layer only ever grows (short of an explicit [`SurfacePair::reset`]).
//! The preview layer is replaced by every live rectangle or circle and blanked by
//! their commits. Freehand segments never touch the preview: each one is appended to
//! the committed layer as it arrives, so strokes from several participants can be in
//! flight on one surface at once.

mod raster;

pub use raster::{Layer, StrokeStyle};

use crate::shapes::Shape;
use image::RgbaImage;

/// Saved committed-layer pixels, used to survive a backing-store resize.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pixels: RgbaImage,
}

impl Snapshot {
    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }
}

#[derive(Debug, Clone)]
struct Layers {
    preview: Layer,
    committed: Layer,
}

impl Layers {
    fn new(width: u32, height: u32) -> Self {
        Self {
            preview: Layer::new(width, height),
            committed: Layer::new(width, height),
        }
    }
}

/// Preview and committed raster layers for one drawable region.
#[derive(Debug, Clone)]
pub struct SurfacePair {
    /// `None` while the surface is not mounted.
    layers: Option<Layers>,
    /// Style used for every shape painted on this surface.
    style: StrokeStyle,
}

impl SurfacePair {
    /// Create an unmounted surface. Painting is a no-op until [`SurfacePair::mount`].
    pub fn unmounted(style: StrokeStyle) -> Self {
        Self {
            layers: None,
            style,
        }
    }

    /// Create a mounted surface with blank layers.
    pub fn new(width: u32, height: u32, style: StrokeStyle) -> Self {
        Self {
            layers: Some(Layers::new(width, height)),
            style,
        }
    }

    /// Attach backing layers. Mounting an already mounted surface resizes it.
    pub fn mount(&mut self, width: u32, height: u32) {
        if self.layers.is_some() {
            self.resize(width, height);
        } else {
            self.layers = Some(Layers::new(width, height));
        }
    }

    /// Detach the backing layers, discarding their content.
    pub fn unmount(&mut self) {
        self.layers = None;
    }

    pub fn is_mounted(&self) -> bool {
        self.layers.is_some()
    }

    /// Backing-store dimensions, `None` while unmounted.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.layers.as_ref().map(|l| l.committed.dimensions())
    }

    pub fn style(&self) -> &StrokeStyle {
        &self.style
    }

    pub fn set_style(&mut self, style: StrokeStyle) {
        self.style = style;
    }

    /// The preview layer, if mounted.
    pub fn preview(&self) -> Option<&Layer> {
        self.layers.as_ref().map(|l| &l.preview)
    }

    /// The committed layer, if mounted.
    pub fn committed(&self) -> Option<&Layer> {
        self.layers.as_ref().map(|l| &l.committed)
    }

    fn preview_mut(&mut self) -> Option<&mut Layer> {
        self.layers.as_mut().map(|l| &mut l.preview)
    }

    fn committed_mut(&mut self) -> Option<&mut Layer> {
        self.layers.as_mut().map(|l| &mut l.committed)
    }

    /// Show an in-progress shape.
    ///
    /// Rectangles and circles replace the whole preview. Freehand segments are
    /// appended straight to the committed layer.
    pub fn paint_preview(&mut self, shape: &Shape) {
        if let Shape::Stroke(_) = shape {
            self.paint_committed(shape);
            return;
        }
        let style = self.style;
        if let Some(preview) = self.preview_mut() {
            preview.clear();
            preview.stroke_shape(shape, &style);
        }
    }

    /// Append a finished shape to the committed layer. The preview is left alone.
    pub fn paint_committed(&mut self, shape: &Shape) {
        let style = self.style;
        if let Some(committed) = self.committed_mut() {
            committed.stroke_shape(shape, &style);
        }
    }

    /// Blank the preview layer.
    pub fn clear_preview(&mut self) {
        if let Some(preview) = self.preview_mut() {
            preview.clear();
        }
    }

    /// Finish a shape: append it to the committed layer and, for rectangles and
    /// circles, blank the preview it was shown on.
    pub fn commit(&mut self, shape: &Shape) {
        self.paint_committed(shape);
        if !matches!(shape, Shape::Stroke(_)) {
            self.clear_preview();
        }
    }

    /// Capture the committed layer's pixels.
    pub fn snapshot_committed(&self) -> Option<Snapshot> {
        self.committed().map(|layer| Snapshot {
            pixels: layer.image().clone(),
        })
    }

    /// Put saved pixels back onto the committed layer, clipped to its current size.
    pub fn restore_committed(&mut self, snapshot: &Snapshot) {
        if let Some(committed) = self.committed_mut() {
            committed.replace(&snapshot.pixels);
        }
    }

    /// Change the backing-store dimensions, keeping committed content.
    ///
    /// Snapshot, resize and restore run as one call, so nothing can paint between the
    /// reallocation and the restore. The preview is transient and comes back blank.
    pub fn resize(&mut self, width: u32, height: u32) {
        let Some(snapshot) = self.snapshot_committed() else {
            return;
        };
        if snapshot.dimensions() == (width, height) {
            return;
        }
        log::debug!(
            "Resizing surface {:?} -> {:?}",
            snapshot.dimensions(),
            (width, height)
        );
        self.layers = Some(Layers::new(width, height));
        self.restore_committed(&snapshot);
    }

    /// Paint externally rendered pixels (e.g. a document page) beneath the committed artwork.
    pub fn paint_background(&mut self, image: &RgbaImage) {
        if let Some(committed) = self.committed_mut() {
            committed.underlay(image);
        }
    }

    /// Explicit external reset: blank both layers.
    pub fn reset(&mut self) {
        self.clear_preview();
        if let Some(committed) = self.committed_mut() {
            committed.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{CircleShape, RectangleShape, StrokeSegment};

    fn rect(x: f64, y: f64, w: f64, h: f64) -> Shape {
        Shape::Rectangle(RectangleShape::new(x, y, w, h))
    }

    fn seg(x1: f64, y1: f64, x2: f64, y2: f64) -> Shape {
        Shape::Stroke(StrokeSegment::new(x1, y1, x2, y2))
    }

    #[test]
    fn test_preview_is_replaced_not_accumulated() {
        let mut once = SurfacePair::new(64, 64, StrokeStyle::default());
        once.paint_preview(&rect(10.0, 10.0, 20.0, 20.0));

        let mut many = SurfacePair::new(64, 64, StrokeStyle::default());
        many.paint_preview(&rect(5.0, 5.0, 50.0, 50.0));
        for _ in 0..3 {
            many.paint_preview(&rect(10.0, 10.0, 20.0, 20.0));
        }

        assert_eq!(once.preview(), many.preview());
        assert!(many.committed().unwrap().is_blank());
    }

    #[test]
    fn test_stroke_segments_go_straight_to_committed() {
        let mut pair = SurfacePair::new(64, 64, StrokeStyle::default());
        pair.paint_preview(&seg(0.0, 10.0, 30.0, 10.0));
        let after_one = pair.committed().unwrap().painted_pixels();
        assert!(after_one > 0);
        pair.paint_preview(&seg(30.0, 10.0, 30.0, 40.0));
        assert!(pair.committed().unwrap().painted_pixels() > after_one);
        assert!(pair.preview().unwrap().is_blank());
    }

    #[test]
    fn test_commit_clears_preview_and_appends() {
        let mut pair = SurfacePair::new(64, 64, StrokeStyle::default());
        pair.commit(&rect(2.0, 2.0, 10.0, 10.0));
        let first = pair.committed().unwrap().clone();

        pair.paint_preview(&rect(20.0, 20.0, 30.0, 30.0));
        pair.commit(&rect(20.0, 20.0, 30.0, 30.0));

        assert!(pair.preview().unwrap().is_blank());
        let committed = pair.committed().unwrap();
        // Prior content survives.
        for (x, y, p) in first.image().enumerate_pixels() {
            if p.0[3] != 0 {
                assert_eq!(committed.pixel(x, y), Some(*p));
            }
        }
        assert!(committed.painted_pixels() > first.painted_pixels());
    }

    #[test]
    fn test_stroke_survives_shape_preview() {
        let mut pair = SurfacePair::new(64, 64, StrokeStyle::default());
        pair.paint_preview(&seg(0.0, 10.0, 30.0, 10.0));
        pair.paint_preview(&Shape::Circle(CircleShape::new(40.0, 40.0, 5.0)));
        pair.clear_preview();
        pair.commit(&seg(30.0, 10.0, 30.0, 10.0));
        assert_eq!(pair.committed().unwrap().pixel(15, 10).map(|p| p.0[3]), Some(255));
    }

    #[test]
    fn test_stroke_commit_keeps_shape_preview() {
        let mut pair = SurfacePair::new(64, 64, StrokeStyle::default());
        pair.paint_preview(&rect(20.0, 20.0, 30.0, 30.0));
        let preview = pair.preview().unwrap().clone();

        pair.paint_preview(&seg(0.0, 5.0, 10.0, 5.0));
        pair.commit(&seg(10.0, 5.0, 12.0, 5.0));
        assert_eq!(pair.preview(), Some(&preview));
        assert!(!pair.committed().unwrap().is_blank());
    }

    #[test]
    fn test_unmounted_surface_ignores_paint() {
        let mut pair = SurfacePair::unmounted(StrokeStyle::default());
        pair.paint_preview(&rect(0.0, 0.0, 5.0, 5.0));
        pair.commit(&rect(0.0, 0.0, 5.0, 5.0));
        pair.resize(10, 10);
        assert!(!pair.is_mounted());
        assert!(pair.committed().is_none());
        assert!(pair.snapshot_committed().is_none());

        pair.mount(32, 16);
        assert_eq!(pair.dimensions(), Some((32, 16)));
        assert!(pair.committed().unwrap().is_blank());
    }

    #[test]
    fn test_resize_preserves_overlap() {
        let mut pair = SurfacePair::new(64, 64, StrokeStyle::default());
        pair.commit(&rect(4.0, 4.0, 40.0, 40.0));
        pair.commit(&Shape::Circle(CircleShape::new(50.0, 50.0, 10.0)));
        pair.paint_preview(&rect(1.0, 1.0, 3.0, 3.0));
        let before = pair.committed().unwrap().clone();

        pair.resize(48, 80);
        assert_eq!(pair.dimensions(), Some((48, 80)));
        assert!(pair.preview().unwrap().is_blank());

        let after = pair.committed().unwrap();
        for y in 0..64 {
            for x in 0..48 {
                assert_eq!(after.pixel(x, y), before.pixel(x, y));
            }
        }
        for y in 64..80 {
            for x in 0..48 {
                assert_eq!(after.pixel(x, y).map(|p| p.0[3]), Some(0));
            }
        }
    }

    #[test]
    fn test_snapshot_restore_roundtrip() {
        let mut pair = SurfacePair::new(32, 32, StrokeStyle::default());
        pair.commit(&rect(2.0, 2.0, 20.0, 20.0));
        let snapshot = pair.snapshot_committed().unwrap();
        pair.reset();
        assert!(pair.committed().unwrap().is_blank());
        pair.restore_committed(&snapshot);
        assert_eq!(pair.committed().unwrap().image(), snapshot.image());
    }

    #[test]
    fn test_paint_background_keeps_artwork_on_top() {
        let mut pair = SurfacePair::new(8, 8, StrokeStyle::default());
        pair.commit(&seg(0.0, 1.0, 8.0, 1.0));
        let stroke_pixel = pair.committed().unwrap().pixel(4, 1);

        let mut page = RgbaImage::new(4, 4);
        for p in page.pixels_mut() {
            *p = image::Rgba([255, 255, 255, 255]);
        }
        pair.paint_background(&page);

        let committed = pair.committed().unwrap();
        assert_eq!(committed.pixel(3, 3), Some(image::Rgba([255, 255, 255, 255])));
        assert_eq!(committed.pixel(4, 4).map(|p| p.0[3]), Some(0));
        assert_eq!(committed.pixel(2, 1), stroke_pixel);
        assert_eq!(committed.pixel(6, 1), stroke_pixel);
        assert!(pair.preview().unwrap().is_blank());
    }
}
