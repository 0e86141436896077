// Imports
use super::geometry::{self, Geometry, GeometryLimits, Handle, ResizeCorner};
use p2d::bounding_volume::{Aabb, BoundingVolume};
use pagemark_compose::{Color, NormalizedRect, Viewport};
use serde::{Deserialize, Serialize};

/// The geometry of circle and square annotations, both stroked along their rect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "shape")]
pub struct ShapeData {
    #[serde(rename = "rect")]
    pub rect: NormalizedRect,
    /// The stroke width in pen units.
    #[serde(rename = "line_width")]
    pub line_width: f64,
    #[serde(default, rename = "color")]
    pub color: Color,
}

impl Geometry for ShapeData {
    fn bounds(&self, viewport: &Viewport) -> Option<Aabb> {
        Some(
            geometry::rect_to_aabb(&self.rect, viewport)
                .loosened(viewport.pixel_line_width(self.line_width) * 0.5),
        )
    }

    fn safe_margin(&self, limits: &GeometryLimits) -> f64 {
        limits.safe_margin(self.line_width)
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

    fn snapped(&self, margin: f64, handle: Handle, limits: &GeometryLimits) -> Self {
        Self {
            rect: geometry::snap_rect(&self.rect, margin, handle, &limits.viewport),
            ..self.clone()
        }
    }
}
