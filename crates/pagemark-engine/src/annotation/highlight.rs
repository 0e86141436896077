// Imports
use super::geometry::{self, Geometry, GeometryLimits, Handle};
use p2d::bounding_volume::{Aabb, BoundingVolume};
use pagemark_compose::ext::AabbExt;
use pagemark_compose::{Color, NormalizedRect, Viewport};
use serde::{Deserialize, Serialize};

/// How highlighted text is marked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "highlight_style")]
pub enum HighlightStyle {
    #[serde(rename = "highlight")]
    Highlight,
    #[serde(rename = "underline")]
    Underline,
    #[serde(rename = "strikeout")]
    StrikeOut,
}

impl Default for HighlightStyle {
    fn default() -> Self {
        Self::Highlight
    }
}

/// A text markup annotation, one rect per marked line of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "highlight")]
pub struct HighlightData {
    #[serde(rename = "rects")]
    pub rects: Vec<NormalizedRect>,
    #[serde(default, rename = "style")]
    pub style: HighlightStyle,
    #[serde(default = "default_highlight_color", rename = "color")]
    pub color: Color,
}

fn default_highlight_color() -> Color {
    Color::YELLOW
}

impl HighlightData {
    fn with_offset(&self, offset: na::Vector2<f64>, viewport: &Viewport) -> Self {
        Self {
            rects: self
                .rects
                .iter()
                .map(|rect| {
                    geometry::aabb_to_rect(
                        &geometry::rect_to_aabb(rect, viewport).translate(offset),
                        viewport,
                    )
                })
                .collect(),
            ..self.clone()
        }
    }
}

/// Highlights are moved as one rigid group of rects and are not resizable.
impl Geometry for HighlightData {
    fn bounds(&self, viewport: &Viewport) -> Option<Aabb> {
        self.rects
            .iter()
            .map(|rect| geometry::rect_to_aabb(rect, viewport))
            .reduce(|acc, bounds| acc.merged(&bounds))
    }

    fn safe_margin(&self, limits: &GeometryLimits) -> f64 {
        limits.min_safe_margin
    }

    fn translated(&self, offset: na::Vector2<f64>, limits: &GeometryLimits) -> Self {
        let viewport = &limits.viewport;
        let Some(bounds) = self.bounds(viewport) else {
            return self.clone();
        };
        let moved = bounds.translate(offset);
        let fit = moved.offset_to_fit_into(&viewport.inner_bounds(self.safe_margin(limits)));

        self.with_offset(offset + fit, viewport)
    }

    fn snapped(&self, margin: f64, _handle: Handle, limits: &GeometryLimits) -> Self {
        let viewport = &limits.viewport;
        let Some(bounds) = self.bounds(viewport) else {
            return self.clone();
        };
        let offset = bounds.offset_to_fit_into(&viewport.inner_bounds(margin));
        if offset == na::Vector2::zeros() {
            return self.clone();
        }
        self.with_offset(offset, viewport)
    }
}
