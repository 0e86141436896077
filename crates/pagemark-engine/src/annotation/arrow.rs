// Imports
use super::geometry::{ArrowEnd, Geometry, GeometryLimits, Handle, ResizeCorner};
use p2d::bounding_volume::Aabb;
use pagemark_compose::coordspace;
use pagemark_compose::ext::AabbExt;
use pagemark_compose::shapes::Arrow;
use pagemark_compose::{Color, NormalizedPoint, Viewport};
use serde::{Deserialize, Serialize};

/// An arrow annotation pointing from the source to the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "arrow")]
pub struct ArrowData {
    #[serde(rename = "source")]
    pub source: NormalizedPoint,
    #[serde(rename = "target")]
    pub target: NormalizedPoint,
    /// The stroke width in pen units.
    #[serde(rename = "line_width")]
    pub line_width: f64,
    #[serde(default, rename = "color")]
    pub color: Color,
}

impl ArrowData {
    /// The arrow in pixels.
    pub fn to_pixel_arrow(&self, viewport: &Viewport) -> Arrow {
        Arrow::new(
            coordspace::point_to_pixels(self.source, viewport),
            coordspace::point_to_pixels(self.target, viewport),
        )
    }

    /// The pixel position of an endpoint.
    pub fn endpoint(&self, end: ArrowEnd, viewport: &Viewport) -> na::Vector2<f64> {
        match end {
            ArrowEnd::Source => coordspace::point_to_pixels(self.source, viewport),
            ArrowEnd::Target => coordspace::point_to_pixels(self.target, viewport),
        }
    }

    /// One endpoint moved by the pixel offset, clamped to the page inset by the safe margin. The other stays.
    pub fn with_endpoint_moved(
        &self,
        end: ArrowEnd,
        offset: na::Vector2<f64>,
        limits: &GeometryLimits,
    ) -> Self {
        let viewport = &limits.viewport;
        let page = viewport.inner_bounds(self.safe_margin(limits));
        let moved = self.endpoint(end, viewport) + offset;
        let clamped = na::vector![
            moved[0].clamp(page.mins[0], page.maxs[0]),
            moved[1].clamp(page.mins[1], page.maxs[1])
        ];
        let point = coordspace::point_to_normalized(clamped, viewport);

        match end {
            ArrowEnd::Source => Self {
                source: point,
                ..self.clone()
            },
            ArrowEnd::Target => Self {
                target: point,
                ..self.clone()
            },
        }
    }

    /// The endpoint nearest to the corner of the bounds.
    pub fn endpoint_nearest_to(&self, corner: ResizeCorner, viewport: &Viewport) -> ArrowEnd {
        let corner_pos = match self.bounds(viewport) {
            Some(bounds) => corner.pos_on(&bounds),
            None => return ArrowEnd::Target,
        };
        let source_dist = (self.endpoint(ArrowEnd::Source, viewport) - corner_pos).norm_squared();
        let target_dist = (self.endpoint(ArrowEnd::Target, viewport) - corner_pos).norm_squared();

        if source_dist < target_dist {
            ArrowEnd::Source
        } else {
            ArrowEnd::Target
        }
    }

    fn endpoints_bounds(&self, viewport: &Viewport) -> Aabb {
        Aabb::new_positive(
            self.endpoint(ArrowEnd::Source, viewport).into(),
            self.endpoint(ArrowEnd::Target, viewport).into(),
        )
    }

    fn with_both_moved(&self, offset: na::Vector2<f64>, viewport: &Viewport) -> Self {
        Self {
            source: coordspace::point_to_normalized(
                self.endpoint(ArrowEnd::Source, viewport) + offset,
                viewport,
            ),
            target: coordspace::point_to_normalized(
                self.endpoint(ArrowEnd::Target, viewport) + offset,
                viewport,
            ),
            ..self.clone()
        }
    }
}

impl Geometry for ArrowData {
    /// The bounds of the whole arrow polygon, the head extends beyond the endpoints.
    fn bounds(&self, viewport: &Viewport) -> Option<Aabb> {
        Some(
            self.to_pixel_arrow(viewport)
                .bounds(viewport.pixel_line_width(self.line_width)),
        )
    }

    fn safe_margin(&self, limits: &GeometryLimits) -> f64 {
        limits.safe_margin(self.line_width)
    }

    fn translated(&self, offset: na::Vector2<f64>, limits: &GeometryLimits) -> Self {
        let viewport = &limits.viewport;
        let moved = self.endpoints_bounds(viewport).translate(offset);
        let fit = moved.offset_to_fit_into(&viewport.inner_bounds(self.safe_margin(limits)));

        self.with_both_moved(offset + fit, viewport)
    }

    /// Dragging a corner repositions the endpoint nearest to it.
    fn resized(
        &self,
        corner: ResizeCorner,
        offset: na::Vector2<f64>,
        _keep_ratio: bool,
        limits: &GeometryLimits,
    ) -> Self {
        let end = self.endpoint_nearest_to(corner, &limits.viewport);
        self.with_endpoint_moved(end, offset, limits)
    }

    fn snapped(&self, margin: f64, handle: Handle, limits: &GeometryLimits) -> Self {
        let viewport = &limits.viewport;

        match handle {
            Handle::Endpoint(end) => {
                let page = viewport.inner_bounds(margin);
                let pos = self.endpoint(end, viewport);
                let offset = na::vector![
                    pos[0].clamp(page.mins[0], page.maxs[0]) - pos[0],
                    pos[1].clamp(page.mins[1], page.maxs[1]) - pos[1]
                ];
                if offset == na::Vector2::zeros() {
                    return self.clone();
                }
                let snapped = coordspace::point_to_normalized(pos + offset, viewport);
                match end {
                    ArrowEnd::Source => Self {
                        source: snapped,
                        ..self.clone()
                    },
                    ArrowEnd::Target => Self {
                        target: snapped,
                        ..self.clone()
                    },
                }
            }
            Handle::Move | Handle::Corner(_) => {
                let offset = self
                    .endpoints_bounds(viewport)
                    .offset_to_fit_into(&viewport.inner_bounds(margin));
                if offset == na::Vector2::zeros() {
                    return self.clone();
                }
                self.with_both_moved(offset, viewport)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn limits() -> GeometryLimits {
        GeometryLimits {
            viewport: Viewport::new(1000.0, 1000.0, 1.0),
            min_safe_margin: 1.0,
            min_size: 8.0,
        }
    }

    fn arrow() -> ArrowData {
        ArrowData {
            source: NormalizedPoint::new(0.1, 0.5),
            target: NormalizedPoint::new(0.4, 0.5),
            line_width: 4.0,
            color: Color::RED,
        }
    }

    #[test]
    fn bounds_cover_the_head() {
        let bounds = arrow().bounds(&limits().viewport).unwrap();
        assert!(bounds.mins[1] < 498.0);
        assert!(bounds.maxs[1] > 502.0);
    }

    #[test]
    fn point_moves_one_endpoint_clamped() {
        let moved = arrow().with_endpoint_moved(ArrowEnd::Target, na::vector![0.0, -900.0], &limits());
        let viewport = limits().viewport;
        assert_relative_eq!(moved.endpoint(ArrowEnd::Target, &viewport)[1], 2.0, epsilon = 1e-9);
        assert_eq!(moved.source, arrow().source);
    }

    #[test]
    fn resize_drags_nearest_endpoint() {
        let resized = arrow().resized(
            ResizeCorner::TopLeft,
            na::vector![-50.0, 0.0],
            false,
            &limits(),
        );
        let viewport = limits().viewport;
        assert_relative_eq!(resized.endpoint(ArrowEnd::Source, &viewport)[0], 50.0, epsilon = 1e-9);
        assert_eq!(resized.target, arrow().target);
    }
}
