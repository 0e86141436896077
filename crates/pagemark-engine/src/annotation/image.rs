// Imports
use super::geometry::{self, Geometry, GeometryLimits, Handle, ResizeCorner};
use p2d::bounding_volume::Aabb;
use pagemark_compose::{NormalizedRect, Viewport};
use serde::{Deserialize, Serialize};

/// An image annotation. The image content itself is owned by the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "image")]
pub struct ImageData {
    #[serde(rename = "rect")]
    pub rect: NormalizedRect,
    /// Opaque reference to the image content.
    #[serde(default, rename = "content_ref")]
    pub content_ref: String,
}

impl Geometry for ImageData {
    fn bounds(&self, viewport: &Viewport) -> Option<Aabb> {
        Some(geometry::rect_to_aabb(&self.rect, viewport))
    }

    fn safe_margin(&self, limits: &GeometryLimits) -> f64 {
        limits.min_safe_margin
    }

    fn translated(&self, offset: na::Vector2<f64>, limits: &GeometryLimits) -> Self {
        Self {
            rect: geometry::translate_rect(
                &self.rect,
                offset,
                self.safe_margin(limits),
                &limits.viewport,
            ),
            ..self.clone()
        }
    }

    fn resized(
        &self,
        corner: ResizeCorner,
        offset: na::Vector2<f64>,
        keep_ratio: bool,
        limits: &GeometryLimits,
    ) -> Self {
        Self {
            rect: geometry::resize_rect(
                &self.rect,
                corner,
                offset,
                keep_ratio,
                self.safe_margin(limits),
                limits,
            ),
            ..self.clone()
        }
    }

    /// Images keep their aspect ratio, the proportional modifier unlocks it.
    fn locks_aspect_ratio(&self) -> bool {
        true
    }

    fn snapped(&self, margin: f64, handle: Handle, limits: &GeometryLimits) -> Self {
        Self {
            rect: geometry::snap_rect(&self.rect, margin, handle, &limits.viewport),
            ..self.clone()
        }
    }
}
