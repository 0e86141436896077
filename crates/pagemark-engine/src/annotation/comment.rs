// Imports
use super::geometry::{Geometry, GeometryLimits, Handle};
use super::AnnotationId;
use p2d::bounding_volume::Aabb;
use pagemark_compose::coordspace;
use pagemark_compose::{NormalizedPoint, Viewport};
use serde::{Deserialize, Serialize};

/// A comment pinned to an anchor point, starting a thread of replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "comment")]
pub struct CommentData {
    #[serde(rename = "anchor")]
    pub anchor: NormalizedPoint,
    #[serde(default, rename = "text")]
    pub text: String,
    /// The replies of the thread, oldest first.
    #[serde(default, rename = "replies")]
    pub replies: Vec<AnnotationId>,
}

impl CommentData {
    /// The side length of the comment pin in pixels at scale 1.
    pub const PIN_SIZE: f64 = 24.0;

    fn pin_half_extent(viewport: &Viewport) -> f64 {
        Self::PIN_SIZE * viewport.scale * 0.5
    }
}

impl Geometry for CommentData {
    /// The pin, centered on the anchor.
    fn bounds(&self, viewport: &Viewport) -> Option<Aabb> {
        Some(Aabb::from_half_extents(
            coordspace::point_to_pixels(self.anchor, viewport).into(),
            na::Vector2::repeat(Self::pin_half_extent(viewport)),
        ))
    }

    fn safe_margin(&self, limits: &GeometryLimits) -> f64 {
        limits.min_safe_margin
    }

    fn translated(&self, offset: na::Vector2<f64>, limits: &GeometryLimits) -> Self {
        let viewport = &limits.viewport;
        let page = viewport.inner_bounds(self.safe_margin(limits));
        let moved = coordspace::point_to_pixels(self.anchor, viewport) + offset;

        Self {
            anchor: coordspace::point_to_normalized(
                na::vector![
                    moved[0].clamp(page.mins[0], page.maxs[0]),
                    moved[1].clamp(page.mins[1], page.maxs[1])
                ],
                viewport,
            ),
            ..self.clone()
        }
    }

    fn snapped(&self, margin: f64, _handle: Handle, limits: &GeometryLimits) -> Self {
        let viewport = &limits.viewport;
        let page = viewport.inner_bounds(margin);
        let pos = coordspace::point_to_pixels(self.anchor, viewport);
        let clamped = na::vector![
            pos[0].clamp(page.mins[0], page.maxs[0]),
            pos[1].clamp(page.mins[1], page.maxs[1])
        ];
        if clamped == pos {
            return self.clone();
        }

        Self {
            anchor: coordspace::point_to_normalized(clamped, viewport),
            ..self.clone()
        }
    }
}

/// A reply in a comment thread. Replies have no geometry of their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "reply")]
pub struct ReplyData {
    /// The comment the reply belongs to.
    #[serde(rename = "parent")]
    pub parent: AnnotationId,
    #[serde(default, rename = "text")]
    pub text: String,
}

impl Geometry for ReplyData {
    fn bounds(&self, _viewport: &Viewport) -> Option<Aabb> {
        None
    }

    fn safe_margin(&self, limits: &GeometryLimits) -> f64 {
        limits.min_safe_margin
    }

    fn translated(&self, _offset: na::Vector2<f64>, _limits: &GeometryLimits) -> Self {
        self.clone()
    }

    fn snapped(&self, _margin: f64, _handle: Handle, _limits: &GeometryLimits) -> Self {
        self.clone()
    }
}
