// Imports
use p2d::bounding_volume::Aabb;
use pagemark_compose::coordspace::{self, NormalizedRect, PixelRect};
use pagemark_compose::ext::AabbExt;
use pagemark_compose::Viewport;
use serde::{Deserialize, Serialize};

/// A corner of the bounds, dragged to resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename = "resize_corner")]
pub enum ResizeCorner {
    #[serde(rename = "top_left")]
    TopLeft,
    #[serde(rename = "top_right")]
    TopRight,
    #[serde(rename = "bottom_right")]
    BottomRight,
    #[serde(rename = "bottom_left")]
    BottomLeft,
}

impl ResizeCorner {
    pub const ALL: [Self; 4] = [
        Self::TopLeft,
        Self::TopRight,
        Self::BottomRight,
        Self::BottomLeft,
    ];

    /// Whether the corner drags the left edge. Otherwise it drags the right edge.
    pub fn moves_left(self) -> bool {
        matches!(self, Self::TopLeft | Self::BottomLeft)
    }

    /// Whether the corner drags the top edge. Otherwise it drags the bottom edge.
    pub fn moves_top(self) -> bool {
        matches!(self, Self::TopLeft | Self::TopRight)
    }

    /// The position of the corner on the bounds.
    pub fn pos_on(self, bounds: &Aabb) -> na::Vector2<f64> {
        na::vector![
            if self.moves_left() {
                bounds.mins[0]
            } else {
                bounds.maxs[0]
            },
            if self.moves_top() {
                bounds.mins[1]
            } else {
                bounds.maxs[1]
            }
        ]
    }
}

/// One of the two endpoints of an arrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename = "arrow_end")]
pub enum ArrowEnd {
    #[serde(rename = "source")]
    Source,
    #[serde(rename = "target")]
    Target,
}

/// The interaction affordance a gesture was started with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename = "handle")]
pub enum Handle {
    /// Dragging the annotation itself.
    #[serde(rename = "move")]
    Move,
    /// Dragging a resize corner.
    #[serde(rename = "corner")]
    Corner(ResizeCorner),
    /// Dragging an arrow endpoint.
    #[serde(rename = "endpoint")]
    Endpoint(ArrowEnd),
}

/// The limits geometry is mutated within.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryLimits {
    /// The viewport the pointer deltas are expressed in.
    pub viewport: Viewport,
    /// Lower bound of the safe margin in pixels.
    pub min_safe_margin: f64,
    /// Minimum width and height in pixels of resized geometry.
    pub min_size: f64,
}

impl GeometryLimits {
    /// The minimum distance to the page edges for geometry stroked with the given width in pen units.
    pub fn safe_margin(&self, line_width: f64) -> f64 {
        (self.viewport.pixel_line_width(line_width) * 0.5).max(self.min_safe_margin)
    }
}

/// The mutation rules of an annotation's kind-specific geometry.
///
/// Mutations are pure: they are applied to the geometry remembered at gesture start and return the result, so
/// repeated calls with the same total pointer displacement always produce the same geometry.
pub trait Geometry: Clone {
    /// The bounding rect in pixels, or None for annotations without own geometry.
    fn bounds(&self, viewport: &Viewport) -> Option<Aabb>;

    /// The minimum pixel distance to the page edges.
    fn safe_margin(&self, limits: &GeometryLimits) -> f64;

    /// Translated by the pixel offset, kept inside the page.
    fn translated(&self, offset: na::Vector2<f64>, limits: &GeometryLimits) -> Self;

    /// Resized by dragging the corner by the pixel offset.
    fn resized(
        &self,
        _corner: ResizeCorner,
        _offset: na::Vector2<f64>,
        _keep_ratio: bool,
        _limits: &GeometryLimits,
    ) -> Self {
        self.clone()
    }

    /// Whether resizing keeps the aspect ratio unless the proportional modifier is pressed.
    fn locks_aspect_ratio(&self) -> bool {
        false
    }

    /// Pulled back inside `[margin, dimension - margin]`, adjusting what the handle controls.
    fn snapped(&self, margin: f64, handle: Handle, limits: &GeometryLimits) -> Self;
}

/// Clamps into `[lower, upper]`, preferring the lower bound when the range is empty.
pub(crate) fn clamp_lower_first(value: f64, lower: f64, upper: f64) -> f64 {
    value.min(upper).max(lower)
}

/// Converts a normalized rect to pixel bounds.
pub(crate) fn rect_to_aabb(rect: &NormalizedRect, viewport: &Viewport) -> Aabb {
    coordspace::rect_to_pixels(rect, viewport).to_aabb()
}

/// Converts pixel bounds to a normalized rect.
pub(crate) fn aabb_to_rect(bounds: &Aabb, viewport: &Viewport) -> NormalizedRect {
    coordspace::rect_to_normalized(&PixelRect::from_aabb(*bounds), viewport)
}

/// Translates the bounds by the offset, then pulls them back inside the page inset by the margin.
pub(crate) fn translate_bounds(
    bounds: &Aabb,
    offset: na::Vector2<f64>,
    margin: f64,
    viewport: &Viewport,
) -> Aabb {
    let moved = bounds.translate(offset);
    moved.translate(moved.offset_to_fit_into(&viewport.inner_bounds(margin)))
}

/// Resizes the bounds by dragging the corner by the offset.
///
/// The dragged edges stay inside the page inset by the margin and at least `min_size` apart from the fixed
/// edges. When keeping the ratio, the axis that changed relatively more drives the other one and the result
/// is scaled down to fit, anchored at the opposite corner.
pub(crate) fn resize_bounds(
    start: &Aabb,
    corner: ResizeCorner,
    offset: na::Vector2<f64>,
    keep_ratio: bool,
    margin: f64,
    limits: &GeometryLimits,
) -> Aabb {
    let page = limits.viewport.inner_bounds(margin);
    let min_size = limits.min_size;
    let start_size = start.extents();
    let anchor = corner_opposite(corner).pos_on(start);
    // +1 when the dragged corner grows in positive direction
    let dir = na::vector![
        if corner.moves_left() { -1.0 } else { 1.0 },
        if corner.moves_top() { -1.0 } else { 1.0 }
    ];
    let dragged = corner.pos_on(start) + offset;

    // The space available from the anchor to the page edge, in direction of the dragged corner
    let available = na::vector![
        if dir[0] > 0.0 {
            page.maxs[0] - anchor[0]
        } else {
            anchor[0] - page.mins[0]
        },
        if dir[1] > 0.0 {
            page.maxs[1] - anchor[1]
        } else {
            anchor[1] - page.mins[1]
        }
    ]
    .map(|a| a.max(0.0));

    let mut size = na::vector![
        clamp_lower_first((dragged[0] - anchor[0]) * dir[0], min_size, available[0]),
        clamp_lower_first((dragged[1] - anchor[1]) * dir[1], min_size, available[1])
    ];

    if keep_ratio && start_size[0] > 0.0 && start_size[1] > 0.0 {
        let ratio = start_size[0] / start_size[1];
        let rel_change_x = (size[0] / start_size[0] - 1.0).abs();
        let rel_change_y = (size[1] / start_size[1] - 1.0).abs();

        if rel_change_x >= rel_change_y {
            size[1] = size[0] / ratio;
        } else {
            size[0] = size[1] * ratio;
        }

        let grow = (min_size / size[0]).max(min_size / size[1]).max(1.0);
        size *= grow;
        let shrink = (available[0] / size[0]).min(available[1] / size[1]).min(1.0);
        if shrink.is_finite() {
            size *= shrink;
        }
    }

    Aabb::new_positive(
        na::Point2::from(anchor),
        na::Point2::from(anchor + size.component_mul(&dir)),
    )
}

/// Pulls the bounds back inside the page inset by the margin.
///
/// For a corner handle only the edges dragged by that corner are adjusted, otherwise the bounds are translated.
pub(crate) fn snap_bounds(bounds: &Aabb, margin: f64, handle: Handle, viewport: &Viewport) -> Aabb {
    let page = viewport.inner_bounds(margin);

    match handle {
        Handle::Corner(corner) => {
            let mut mins = bounds.mins;
            let mut maxs = bounds.maxs;
            if corner.moves_left() {
                mins[0] = mins[0].clamp(page.mins[0], page.maxs[0]);
            } else {
                maxs[0] = maxs[0].clamp(page.mins[0], page.maxs[0]);
            }
            if corner.moves_top() {
                mins[1] = mins[1].clamp(page.mins[1], page.maxs[1]);
            } else {
                maxs[1] = maxs[1].clamp(page.mins[1], page.maxs[1]);
            }
            Aabb::new_positive(mins, maxs)
        }
        Handle::Move | Handle::Endpoint(_) => {
            bounds.translate(bounds.offset_to_fit_into(&page))
        }
    }
}

/// Translates a normalized rect by a pixel offset, see [translate_bounds].
pub(crate) fn translate_rect(
    rect: &NormalizedRect,
    offset: na::Vector2<f64>,
    margin: f64,
    viewport: &Viewport,
) -> NormalizedRect {
    aabb_to_rect(
        &translate_bounds(&rect_to_aabb(rect, viewport), offset, margin, viewport),
        viewport,
    )
}

/// Resizes a normalized rect by a pixel offset, see [resize_bounds].
pub(crate) fn resize_rect(
    rect: &NormalizedRect,
    corner: ResizeCorner,
    offset: na::Vector2<f64>,
    keep_ratio: bool,
    margin: f64,
    limits: &GeometryLimits,
) -> NormalizedRect {
    let viewport = &limits.viewport;
    aabb_to_rect(
        &resize_bounds(
            &rect_to_aabb(rect, viewport),
            corner,
            offset,
            keep_ratio,
            margin,
            limits,
        ),
        viewport,
    )
}

/// Snaps a normalized rect into the page, see [snap_bounds].
pub(crate) fn snap_rect(
    rect: &NormalizedRect,
    margin: f64,
    handle: Handle,
    viewport: &Viewport,
) -> NormalizedRect {
    aabb_to_rect(
        &snap_bounds(&rect_to_aabb(rect, viewport), margin, handle, viewport),
        viewport,
    )
}

fn corner_opposite(corner: ResizeCorner) -> ResizeCorner {
    match corner {
        ResizeCorner::TopLeft => ResizeCorner::BottomRight,
        ResizeCorner::TopRight => ResizeCorner::BottomLeft,
        ResizeCorner::BottomRight => ResizeCorner::TopLeft,
        ResizeCorner::BottomLeft => ResizeCorner::TopRight,
    }
}
