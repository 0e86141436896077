// Imports
use super::geometry::{self, Geometry, GeometryLimits, Handle, ResizeCorner};
use p2d::bounding_volume::Aabb;
use pagemark_compose::{Color, NormalizedRect, Viewport};
use serde::{Deserialize, Serialize};

/// Font attributes of a text box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename = "font_attrs")]
pub struct FontAttrs {
    #[serde(rename = "family")]
    pub family: String,
    /// The font size in pen units.
    #[serde(rename = "size")]
    pub size: f64,
    #[serde(rename = "bold")]
    pub bold: bool,
    #[serde(rename = "italic")]
    pub italic: bool,
    #[serde(rename = "color")]
    pub color: Color,
}

impl Default for FontAttrs {
    fn default() -> Self {
        Self {
            family: String::from("sans-serif"),
            size: 14.0,
            bold: false,
            italic: false,
            color: Color::BLACK,
        }
    }
}

/// A text box annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "textbox")]
pub struct TextBoxData {
    #[serde(rename = "rect")]
    pub rect: NormalizedRect,
    #[serde(default, rename = "text")]
    pub text: String,
    #[serde(default, rename = "font")]
    pub font: FontAttrs,
}

impl Geometry for TextBoxData {
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

    fn snapped(&self, margin: f64, handle: Handle, limits: &GeometryLimits) -> Self {
        Self {
            rect: geometry::snap_rect(&self.rect, margin, handle, &limits.viewport),
            ..self.clone()
        }
    }
}
