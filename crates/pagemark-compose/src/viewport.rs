// Imports
use p2d::bounding_volume::Aabb;
use serde::{Deserialize, Serialize};

/// The pixel dimensions and zoom scale a page is currently rendered with.
///
/// Viewports are transient: they are replaced wholesale on zoom, resize or rotation and are never persisted
/// together with annotation geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename = "viewport")]
pub struct Viewport {
    /// The page width in pixels.
    #[serde(rename = "width")]
    pub width: f64,
    /// The page height in pixels.
    #[serde(rename = "height")]
    pub height: f64,
    /// The zoom scale.
    #[serde(rename = "scale")]
    pub scale: f64,
}

impl Viewport {
    /// A new viewport.
    ///
    /// # Panics
    ///
    /// Panics when width, height or scale are not strictly positive.
    pub fn new(width: f64, height: f64, scale: f64) -> Self {
        let viewport = Self {
            width,
            height,
            scale,
        };
        viewport.assert_valid();
        viewport
    }

    /// Asserts that the viewport has a strictly positive, finite size and scale.
    ///
    /// A viewport violating this is an integration bug in the caller, not a recoverable state.
    pub fn assert_valid(&self) {
        assert!(
            self.width.is_finite() && self.width > 0.0,
            "viewport width must be > 0, is {}",
            self.width
        );
        assert!(
            self.height.is_finite() && self.height > 0.0,
            "viewport height must be > 0, is {}",
            self.height
        );
        assert!(
            self.scale.is_finite() && self.scale > 0.0,
            "viewport scale must be > 0, is {}",
            self.scale
        );
    }

    /// The page size in pixels.
    pub fn size(&self) -> na::Vector2<f64> {
        na::vector![self.width, self.height]
    }

    /// The page bounds in pixels, with the origin in the upper left corner.
    pub fn bounds(&self) -> Aabb {
        Aabb::new(na::point![0.0, 0.0], na::point![self.width, self.height])
    }

    /// The page bounds shrunk by the given margin on every side.
    ///
    /// Collapses to the page center on an axis where the margin exceeds half the extent.
    pub fn inner_bounds(&self, margin: f64) -> Aabb {
        let margin_x = margin.min(self.width * 0.5);
        let margin_y = margin.min(self.height * 0.5);
        Aabb::new(
            na::point![margin_x, margin_y],
            na::point![self.width - margin_x, self.height - margin_y],
        )
    }

    /// The size of one pixel, expressed in normalized coordinates.
    pub fn pixel_epsilon(&self) -> na::Vector2<f64> {
        na::vector![1.0 / self.width, 1.0 / self.height]
    }

    /// Scales a stroke width stored in pen units to pixels.
    pub fn pixel_line_width(&self, line_width: f64) -> f64 {
        line_width * self.scale
    }
}
