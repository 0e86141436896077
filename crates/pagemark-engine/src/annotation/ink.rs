// Imports
use super::geometry::{self, Geometry, GeometryLimits, Handle, ResizeCorner};
use p2d::bounding_volume::{Aabb, BoundingVolume};
use pagemark_compose::coordspace::{self, NormalizedPath};
use pagemark_compose::ext::AabbExt;
use pagemark_compose::{Color, Viewport};
use serde::{Deserialize, Serialize};

/// A freehand ink annotation, made of one or more paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "ink")]
pub struct InkData {
    #[serde(rename = "paths")]
    pub paths: Vec<NormalizedPath>,
    /// The stroke width in pen units.
    #[serde(rename = "line_width")]
    pub line_width: f64,
    #[serde(default, rename = "color")]
    pub color: Color,
}

impl InkData {
    /// The paths in pixels.
    pub fn pixel_paths(&self, viewport: &Viewport) -> Vec<Vec<na::Vector2<f64>>> {
        self.paths
            .iter()
            .map(|path| coordspace::path_to_pixels(path, viewport))
            .collect()
    }

    /// The stroke width in pixels.
    pub fn pixel_line_width(&self, viewport: &Viewport) -> f64 {
        viewport.pixel_line_width(self.line_width)
    }

    /// Bounds of all path points in pixels, without the stroke width.
    fn point_bounds(&self, viewport: &Viewport) -> Option<Aabb> {
        let positions = self.pixel_paths(viewport).into_iter().flatten().collect::<Vec<_>>();
        Aabb::from_positions(positions.iter())
    }

    /// Maps every point through the function, in pixel space.
    fn map_points(
        &self,
        viewport: &Viewport,
        mut f: impl FnMut(na::Vector2<f64>) -> na::Vector2<f64>,
    ) -> Self {
        let paths = self
            .paths
            .iter()
            .filter_map(|path| {
                let positions = coordspace::path_to_pixels(path, viewport)
                    .into_iter()
                    .map(&mut f)
                    .collect::<Vec<_>>();
                coordspace::path_to_normalized(&positions, viewport)
            })
            .collect();

        Self {
            paths,
            line_width: self.line_width,
            color: self.color,
        }
    }
}

impl Geometry for InkData {
    fn bounds(&self, viewport: &Viewport) -> Option<Aabb> {
        Some(
            self.point_bounds(viewport)?
                .loosened(self.pixel_line_width(viewport) * 0.5),
        )
    }

    fn safe_margin(&self, limits: &GeometryLimits) -> f64 {
        limits.safe_margin(self.line_width)
    }

    /// Each point is clamped on its own, keeping its distance to the extreme point on the violating side.
    /// So only the violating extreme gets pulled back to the margin and the stroke is not distorted.
    fn translated(&self, offset: na::Vector2<f64>, limits: &GeometryLimits) -> Self {
        let viewport = &limits.viewport;
        let Some(bounds) = self.point_bounds(viewport) else {
            return self.clone();
        };
        let margin = self.safe_margin(limits);
        let size = viewport.size();

        self.map_points(viewport, |pos| {
            let mut moved = pos + offset;
            for i in 0..2 {
                let lower = margin + (pos[i] - bounds.mins[i]);
                let upper = size[i] - margin - (bounds.maxs[i] - pos[i]);
                moved[i] = geometry::clamp_lower_first(moved[i], lower, upper);
            }
            moved
        })
    }

    /// Scales the points from the corner opposite to the dragged one.
    fn resized(
        &self,
        corner: ResizeCorner,
        offset: na::Vector2<f64>,
        keep_ratio: bool,
        limits: &GeometryLimits,
    ) -> Self {
        let viewport = &limits.viewport;
        let Some(start) = self.point_bounds(viewport) else {
            return self.clone();
        };
        let resized = geometry::resize_bounds(
            &start,
            corner,
            offset,
            keep_ratio,
            self.safe_margin(limits),
            limits,
        );
        let start_size = start.extents();
        let new_size = resized.extents();

        self.map_points(viewport, |pos| {
            let mut mapped = pos;
            for i in 0..2 {
                mapped[i] = if start_size[i] > 0.0 {
                    resized.mins[i] + (pos[i] - start.mins[i]) * new_size[i] / start_size[i]
                } else {
                    resized.mins[i] + (pos[i] - start.mins[i])
                };
            }
            mapped
        })
    }

    /// Ink is always snapped rigidly, resizing already keeps the scaled points inside the page.
    fn snapped(&self, margin: f64, _handle: Handle, limits: &GeometryLimits) -> Self {
        let viewport = &limits.viewport;
        let Some(bounds) = self.point_bounds(viewport) else {
            return self.clone();
        };
        let offset = bounds.offset_to_fit_into(&viewport.inner_bounds(margin));
        if offset == na::Vector2::zeros() {
            return self.clone();
        }
        self.map_points(viewport, |pos| pos + offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pagemark_compose::NormalizedPoint;

    fn limits() -> GeometryLimits {
        GeometryLimits {
            viewport: Viewport::new(1000.0, 1000.0, 1.0),
            min_safe_margin: 1.0,
            min_size: 8.0,
        }
    }

    fn ink(points: &[(f64, f64)], line_width: f64) -> InkData {
        InkData {
            paths: vec![NormalizedPath::try_from_points(
                points.iter().map(|(x, y)| NormalizedPoint::new(*x, *y)),
            )
            .unwrap()],
            line_width,
            color: Color::BLACK,
        }
    }

    #[test]
    fn bounds_include_half_the_stroke() {
        let ink = ink(&[(0.1, 0.1), (0.2, 0.3)], 4.0);
        let bounds = ink.bounds(&limits().viewport).unwrap();
        assert_relative_eq!(bounds.mins, na::point![98.0, 98.0]);
        assert_relative_eq!(bounds.maxs, na::point![202.0, 302.0]);
    }

    #[test]
    fn move_near_edge_keeps_the_shape() {
        let ink = ink(&[(0.8, 0.5), (0.9, 0.6), (0.95, 0.55)], 20.0);

        let moved = ink.translated(na::vector![500.0, 0.0], &limits());
        let before = ink.pixel_paths(&limits().viewport).remove(0);
        let after = moved.pixel_paths(&limits().viewport).remove(0);

        // the rightmost point is pulled back to the margin
        assert_relative_eq!(after[2][0], 990.0, epsilon = 1e-9);
        for (b, a) in before.iter().zip(after.iter()) {
            assert_relative_eq!(a[0] - b[0], 40.0, epsilon = 1e-9);
            assert_relative_eq!(a[1], b[1], epsilon = 1e-9);
        }
    }

    #[test]
    fn resize_scales_points() {
        let ink = ink(&[(0.1, 0.1), (0.2, 0.2)], 2.0);

        let resized = ink.resized(
            ResizeCorner::BottomRight,
            na::vector![100.0, 100.0],
            false,
            &limits(),
        );
        let points = resized.pixel_paths(&limits().viewport).remove(0);
        assert_relative_eq!(points[0], na::vector![100.0, 100.0], epsilon = 1e-9);
        assert_relative_eq!(points[1], na::vector![300.0, 300.0], epsilon = 1e-9);
    }
}
