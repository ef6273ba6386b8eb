//! Intake of rendered document pages.
//!
//! Decoding documents is someone else's job. This module only defines what a decoded
//! page looks like when it arrives, how big its surface should be, and the handle
//! participants exchange to announce a document.

use crate::registry::SurfaceId;
use image::RgbaImage;
use kurbo::Size;
use serde::{Deserialize, Serialize};

/// Reference to an uploaded document, as announced on the channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentHandle {
    pub url: String,
}

impl DocumentHandle {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// How a page in document units maps to its displayed and backing-store size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    /// Display scale applied to the page's natural size.
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Backing-store pixels per displayed pixel.
    #[serde(default = "default_resolution")]
    pub resolution: f64,
}

fn default_scale() -> f64 {
    0.7
}

fn default_resolution() -> f64 {
    2.5
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            resolution: default_resolution(),
        }
    }
}

impl PageLayout {
    /// Displayed size of a page with the given natural size.
    pub fn display_size(&self, page: Size) -> Size {
        Size::new(page.width * self.scale, page.height * self.scale)
    }

    /// Backing-store dimensions for a page with the given natural size.
    pub fn backing_size(&self, page: Size) -> (u32, u32) {
        let display = self.display_size(page);
        let to_px = |v: f64| (v * self.resolution).round().clamp(0.0, u32::MAX as f64) as u32;
        (to_px(display.width), to_px(display.height))
    }
}

/// A decoded page ready to be painted under the drawings of one surface.
#[derive(Debug, Clone)]
pub struct PageRender {
    /// Surface the page belongs to; a new surface is created for unseen ids.
    pub surface: SurfaceId,
    /// Page pixels, already at backing-store resolution.
    pub pixels: RgbaImage,
}

impl PageRender {
    pub fn new(surface: impl Into<SurfaceId>, pixels: RgbaImage) -> Self {
        Self {
            surface: surface.into(),
            pixels,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }
}
