// Imports
use crate::ext::{KurboShapeExt, Vector2Ext};
use kurbo::{PathEl, Shape};
use na::Rotation2;
use p2d::bounding_volume::{Aabb, BoundingVolume};

/// An arrow in pixel space.
///
/// All doc-comments of this file rely on the following graphic:
///
/// ```text
///         tip
///         /|\
///        / | \
///       /  |  \
///    lline |  rline
///          |
///          |
///          |
///         start
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arrow {
    /// Start of the arrow, the source point.
    pub start: na::Vector2<f64>,
    /// Tip of the arrow, the target point.
    pub tip: na::Vector2<f64>,
}

impl Arrow {
    /// The tip lines (rline & lline) length when the arrow has no stroke width.
    const TIP_LINES_DEFAULT_LENGTH: f64 = 10.0;

    /// The angle for `rline` and `lline` to the stem of the arrow.
    const TIP_LINES_STEM_OBTUSE_ANGLE: f64 = (13.0 / 16.0) * std::f64::consts::PI;

    /// The default direction vector (the stem) if the stem has length 0.
    const DEFAULT_DIRECTION_VECTOR: na::Vector2<f64> = na::Vector2::new(1.0, 0.0);

    /// A new arrow with the given start and tip.
    pub fn new(start: na::Vector2<f64>, tip: na::Vector2<f64>) -> Self {
        Self { start, tip }
    }

    /// The arrow as path, the stem followed by the head polyline.
    pub fn to_kurbo(&self, stroke_width: f64) -> kurbo::BezPath {
        let mut bez_path =
            kurbo::Line::new(self.start.to_kurbo_point(), self.tip.to_kurbo_point()).to_path(0.25);

        bez_path.extend([
            PathEl::MoveTo(self.compute_lline(stroke_width).to_kurbo_point()),
            PathEl::LineTo(self.tip.to_kurbo_point()),
            PathEl::LineTo(self.compute_rline(stroke_width).to_kurbo_point()),
        ]);

        bez_path
    }

    /// The end of the `lline` of the arrow head.
    pub fn compute_lline(&self, stroke_width: f64) -> na::Vector2<f64> {
        Rotation2::new(Self::TIP_LINES_STEM_OBTUSE_ANGLE)
            * self.compute_stem_direction_vector()
            * Self::compute_tip_lines_length(stroke_width)
            + self.tip
    }

    /// The end of the `rline` of the arrow head.
    pub fn compute_rline(&self, stroke_width: f64) -> na::Vector2<f64> {
        Rotation2::new(-Self::TIP_LINES_STEM_OBTUSE_ANGLE)
            * self.compute_stem_direction_vector()
            * Self::compute_tip_lines_length(stroke_width)
            + self.tip
    }

    /// The bounds of the arrow including its head, loosened by half the stroke width.
    ///
    /// The head extends beyond the two endpoints, so the bounds are computed from the head polygon.
    pub fn bounds(&self, stroke_width: f64) -> Aabb {
        self.to_kurbo(stroke_width)
            .bounds_to_p2d_aabb()
            .loosened(stroke_width * 0.5)
    }

    /// The normalized direction vector from `start` to `tip`.
    fn compute_stem_direction_vector(&self) -> na::Vector2<f64> {
        let direction_vector = self.tip - self.start;

        if direction_vector.norm() == 0.0 {
            Self::DEFAULT_DIRECTION_VECTOR
        } else {
            direction_vector / direction_vector.norm()
        }
    }

    fn compute_tip_lines_length(stroke_width: f64) -> f64 {
        Self::TIP_LINES_DEFAULT_LENGTH * (1.0 + 0.18 * stroke_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn head_extends_bounds_beyond_endpoints() {
        let arrow = Arrow::new(na::vector![100.0, 100.0], na::vector![200.0, 100.0]);

        let bounds = arrow.bounds(0.0);
        // horizontal arrow: the head spreads vertically around the tip
        assert!(bounds.mins[1] < 100.0);
        assert!(bounds.maxs[1] > 100.0);
        assert_relative_eq!(bounds.mins[0], 100.0);
        assert_relative_eq!(bounds.maxs[0], 200.0);
    }

    #[test]
    fn head_is_symmetric_to_the_stem() {
        let arrow = Arrow::new(na::vector![0.0, 0.0], na::vector![0.0, 50.0]);

        let lline = arrow.compute_lline(2.0);
        let rline = arrow.compute_rline(2.0);
        assert_relative_eq!(lline[0], -rline[0], epsilon = 1e-9);
        assert_relative_eq!(lline[1], rline[1], epsilon = 1e-9);
        assert!(lline[1] < 50.0);
    }

    #[test]
    fn zero_length_arrow_has_a_head() {
        let arrow = Arrow::new(na::vector![10.0, 10.0], na::vector![10.0, 10.0]);
        let bounds = arrow.bounds(0.0);
        assert!(bounds.extents()[0] > 0.0 && bounds.extents()[1] > 0.0);
    }
}
