//! Conversions between document-normalized geometry and pixel geometry.
//!
//! Normalized coordinates express fractions of the page width (x) and height (y) and are what gets stored.
//! Pixel geometry is always re-derived from them for the current [Viewport], never the other way around.

// Imports
use crate::Viewport;
use p2d::bounding_volume::Aabb;
use serde::{Deserialize, Serialize};

/// Clamps a normalized coordinate into `[0, 1]`. `NaN` maps to `0`.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// A point as fractions of the page width and height.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename = "normalized_point")]
pub struct NormalizedPoint {
    /// Fraction of the page width.
    #[serde(rename = "x")]
    pub x: f64,
    /// Fraction of the page height.
    #[serde(rename = "y")]
    pub y: f64,
}

impl NormalizedPoint {
    /// A new point, clamped into the unit square.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: clamp_unit(x),
            y: clamp_unit(y),
        }
    }

    /// The point clamped into the unit square.
    pub fn clamped(self) -> Self {
        Self::new(self.x, self.y)
    }
}

/// A rectangle as fractions of the page width and height.
///
/// Holds `left <= right` and `top <= bottom`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename = "normalized_rect")]
pub struct NormalizedRect {
    /// Left edge.
    #[serde(rename = "left")]
    pub left: f64,
    /// Top edge.
    #[serde(rename = "top")]
    pub top: f64,
    /// Right edge.
    #[serde(rename = "right")]
    pub right: f64,
    /// Bottom edge.
    #[serde(rename = "bottom")]
    pub bottom: f64,
}

impl NormalizedRect {
    /// A new rect from its edges. The edges are clamped into the unit square and reordered if necessary.
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        let (left, right) = (clamp_unit(left), clamp_unit(right));
        let (top, bottom) = (clamp_unit(top), clamp_unit(bottom));

        Self {
            left: left.min(right),
            top: top.min(bottom),
            right: left.max(right),
            bottom: top.max(bottom),
        }
    }

    /// The rect with its invariants restored.
    pub fn clamped(self) -> Self {
        Self::new(self.left, self.top, self.right, self.bottom)
    }

    /// Width as fraction of the page width.
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    /// Height as fraction of the page height.
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// An ordered, non-empty sequence of normalized points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<NormalizedPoint>", into = "Vec<NormalizedPoint>")]
pub struct NormalizedPath {
    points: Vec<NormalizedPoint>,
}

impl TryFrom<Vec<NormalizedPoint>> for NormalizedPath {
    type Error = anyhow::Error;

    fn try_from(points: Vec<NormalizedPoint>) -> Result<Self, Self::Error> {
        Self::try_from_points(points)
            .ok_or_else(|| anyhow::anyhow!("a normalized path needs at least one point"))
    }
}

impl From<NormalizedPath> for Vec<NormalizedPoint> {
    fn from(path: NormalizedPath) -> Self {
        path.points
    }
}

impl NormalizedPath {
    /// Try to create a path from the points, clamping each of them. Returns None if there are no points.
    pub fn try_from_points(points: impl IntoIterator<Item = NormalizedPoint>) -> Option<Self> {
        let points = points
            .into_iter()
            .map(NormalizedPoint::clamped)
            .collect::<Vec<NormalizedPoint>>();

        (!points.is_empty()).then_some(Self { points })
    }

    /// The points of the path.
    pub fn points(&self) -> &[NormalizedPoint] {
        &self.points
    }

    /// The number of points. Never zero.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false, paths hold at least one point.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The first point.
    pub fn first(&self) -> NormalizedPoint {
        self.points[0]
    }

    /// The last point.
    pub fn last(&self) -> NormalizedPoint {
        self.points[self.points.len() - 1]
    }
}

/// A rectangle in pixel space, as left, top, width and height.
///
/// `right` and `bottom` are derived, so converting back from this representation has to reconstruct them
/// before normalizing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename = "pixel_rect")]
pub struct PixelRect {
    /// Left edge in pixels.
    #[serde(rename = "left")]
    pub left: f64,
    /// Top edge in pixels.
    #[serde(rename = "top")]
    pub top: f64,
    /// Width in pixels.
    #[serde(rename = "width")]
    pub width: f64,
    /// Height in pixels.
    #[serde(rename = "height")]
    pub height: f64,
}

impl PixelRect {
    /// A new pixel rect.
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// The derived right edge.
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// The derived bottom edge.
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Converts to an axis aligned bounding box.
    pub fn to_aabb(&self) -> Aabb {
        Aabb::new(
            na::point![self.left, self.top],
            na::point![self.right(), self.bottom()],
        )
    }

    /// Converts from an axis aligned bounding box.
    pub fn from_aabb(aabb: Aabb) -> Self {
        let extents = aabb.extents();
        Self::new(aabb.mins[0], aabb.mins[1], extents[0], extents[1])
    }
}

/// Converts a normalized rect to pixels for the viewport.
pub fn rect_to_pixels(rect: &NormalizedRect, viewport: &Viewport) -> PixelRect {
    viewport.assert_valid();

    PixelRect::new(
        rect.left * viewport.width,
        rect.top * viewport.height,
        rect.width() * viewport.width,
        rect.height() * viewport.height,
    )
}

/// Converts a pixel rect to a normalized rect for the viewport, clamping it into the page.
pub fn rect_to_normalized(rect: &PixelRect, viewport: &Viewport) -> NormalizedRect {
    viewport.assert_valid();

    NormalizedRect::new(
        rect.left / viewport.width,
        rect.top / viewport.height,
        rect.right() / viewport.width,
        rect.bottom() / viewport.height,
    )
}

/// Converts a normalized point to a pixel position for the viewport.
pub fn point_to_pixels(point: NormalizedPoint, viewport: &Viewport) -> na::Vector2<f64> {
    viewport.assert_valid();

    na::vector![point.x * viewport.width, point.y * viewport.height]
}

/// Converts a pixel position to a normalized point for the viewport, clamping it into the page.
pub fn point_to_normalized(pos: na::Vector2<f64>, viewport: &Viewport) -> NormalizedPoint {
    viewport.assert_valid();

    NormalizedPoint::new(pos[0] / viewport.width, pos[1] / viewport.height)
}

/// Converts a normalized path point-wise to pixel positions.
pub fn path_to_pixels(path: &NormalizedPath, viewport: &Viewport) -> Vec<na::Vector2<f64>> {
    path.points()
        .iter()
        .map(|point| point_to_pixels(*point, viewport))
        .collect()
}

/// Converts pixel positions point-wise to a normalized path. None if there are no positions.
pub fn path_to_normalized(
    positions: &[na::Vector2<f64>],
    viewport: &Viewport,
) -> Option<NormalizedPath> {
    NormalizedPath::try_from_points(
        positions
            .iter()
            .map(|pos| point_to_normalized(*pos, viewport)),
    )
}

/// Scales a line width in pen units to pixels.
pub fn pixel_line_width(line_width: f64, viewport: &Viewport) -> f64 {
    viewport.assert_valid();

    viewport.pixel_line_width(line_width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn rect_to_pixels_scenario() {
        let viewport = Viewport::new(1000.0, 1000.0, 1.0);
        let rect = NormalizedRect::new(0.10, 0.10, 0.30, 0.30);

        let pixel_rect = rect_to_pixels(&rect, &viewport);
        assert_relative_eq!(pixel_rect.left, 100.0);
        assert_relative_eq!(pixel_rect.top, 100.0);
        assert_relative_eq!(pixel_rect.width, 200.0);
        assert_relative_eq!(pixel_rect.height, 200.0);
    }

    #[test]
    fn rect_round_trip_within_one_pixel() {
        let rects = [
            NormalizedRect::new(0.0, 0.0, 1.0, 1.0),
            NormalizedRect::new(0.123, 0.456, 0.789, 0.999),
            NormalizedRect::new(0.5, 0.5, 0.5, 0.5),
        ];
        let viewports = [
            Viewport::new(1.0, 1.0, 1.0),
            Viewport::new(612.0, 792.0, 1.5),
            Viewport::new(3.0, 7919.0, 0.25),
        ];

        for viewport in viewports.iter() {
            let eps = viewport.pixel_epsilon();
            for rect in rects.iter() {
                let back = rect_to_normalized(&rect_to_pixels(rect, viewport), viewport);

                assert_abs_diff_eq!(back.left, rect.left, epsilon = eps[0]);
                assert_abs_diff_eq!(back.right, rect.right, epsilon = eps[0]);
                assert_abs_diff_eq!(back.top, rect.top, epsilon = eps[1]);
                assert_abs_diff_eq!(back.bottom, rect.bottom, epsilon = eps[1]);
            }
        }
    }

    #[test]
    fn out_of_page_pixels_are_clamped() {
        let viewport = Viewport::new(200.0, 100.0, 1.0);

        let rect = rect_to_normalized(&PixelRect::new(-50.0, 20.0, 400.0, 10.0), &viewport);
        assert_relative_eq!(rect.left, 0.0);
        assert_relative_eq!(rect.right, 1.0);
        assert_relative_eq!(rect.top, 0.2);
        assert_relative_eq!(rect.bottom, 0.3);

        let point = point_to_normalized(na::vector![f64::NAN, 150.0], &viewport);
        assert_eq!(point, NormalizedPoint::new(0.0, 1.0));
    }

    #[test]
    fn rect_edges_are_reordered() {
        let rect = NormalizedRect::new(0.8, 0.9, 0.2, 0.1);
        assert_eq!(rect, NormalizedRect::new(0.2, 0.1, 0.8, 0.9));
        assert!(rect.width() >= 0.0 && rect.height() >= 0.0);
    }

    #[test]
    fn empty_path_is_rejected() {
        assert!(NormalizedPath::try_from_points([]).is_none());
        assert!(serde_json::from_str::<NormalizedPath>("[]").is_err());
    }
}
