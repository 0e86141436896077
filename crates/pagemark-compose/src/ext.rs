// Imports
use p2d::bounding_volume::Aabb;

/// Extension trait for [`na::Vector2<f64>`].
pub trait Vector2Ext
where
    Self: Sized,
{
    /// a new vector by taking the mins of each x and y values
    fn mins(&self, other: &Self) -> Self;
    /// a new vector by taking the maxs of each x and y values
    fn maxs(&self, other: &Self) -> Self;
    /// Converts to kurbo::Point
    fn to_kurbo_point(&self) -> kurbo::Point;
    /// Converts from kurbo::Point
    fn from_kurbo_point(kurbo_point: kurbo::Point) -> Self;
    /// Whether both components are finite
    fn all_finite(&self) -> bool;
    /// Approximate equality
    fn approx_eq(&self, other: &Self) -> bool;
}

impl Vector2Ext for na::Vector2<f64> {
    fn mins(&self, other: &Self) -> Self {
        na::vector![self[0].min(other[0]), self[1].min(other[1])]
    }

    fn maxs(&self, other: &Self) -> Self {
        na::vector![self[0].max(other[0]), self[1].max(other[1])]
    }

    fn to_kurbo_point(&self) -> kurbo::Point {
        kurbo::Point {
            x: self[0],
            y: self[1],
        }
    }

    fn from_kurbo_point(kurbo_point: kurbo::Point) -> Self {
        na::vector![kurbo_point.x, kurbo_point.y]
    }

    fn all_finite(&self) -> bool {
        self[0].is_finite() && self[1].is_finite()
    }

    fn approx_eq(&self, other: &Self) -> bool {
        approx::relative_eq!(self[0], other[0]) && approx::relative_eq!(self[1], other[1])
    }
}

/// Extension trait for [p2d::bounding_volume::Aabb].
pub trait AabbExt
where
    Self: Sized,
{
    /// New Aabb, ensuring its mins, maxs are valid (maxs >= mins)
    fn new_positive(start: na::Point2<f64>, end: na::Point2<f64>) -> Self;
    /// Bounding box around the given positions. None if there are none.
    fn from_positions<'a>(positions: impl IntoIterator<Item = &'a na::Vector2<f64>>)
        -> Option<Self>;
    /// Asserts the bounds are finite and positive
    fn assert_valid(&self) -> anyhow::Result<()>;
    /// Translates the Aabb by a offset
    fn translate(&self, offset: na::Vector2<f64>) -> Self;
    /// The offset that moves self inside the container with the smallest possible translation.
    ///
    /// On an axis where self is larger than the container, it gets aligned to the container's minimum.
    fn offset_to_fit_into(&self, container: &Self) -> na::Vector2<f64>;
    /// Whether the given point lies inside the bounds loosened by the tolerance
    fn contains_pos_w_tolerance(&self, pos: na::Vector2<f64>, tolerance: f64) -> bool;
    /// Converts a Aabb to a kurbo Rectangle
    fn to_kurbo_rect(&self) -> kurbo::Rect;
    /// Converts a kurbo Rectangle to Aabb
    fn from_kurbo_rect(rect: kurbo::Rect) -> Self;
    /// Approximate equality
    fn approx_eq(&self, other: &Self) -> bool;
}

impl AabbExt for Aabb {
    fn new_positive(start: na::Point2<f64>, end: na::Point2<f64>) -> Self {
        Aabb::new(
            na::point![start[0].min(end[0]), start[1].min(end[1])],
            na::point![start[0].max(end[0]), start[1].max(end[1])],
        )
    }

    fn from_positions<'a>(
        positions: impl IntoIterator<Item = &'a na::Vector2<f64>>,
    ) -> Option<Self> {
        let mut positions = positions.into_iter();
        let first = positions.next()?;
        let (mins, maxs) = positions.fold((*first, *first), |(mins, maxs), pos| {
            (mins.mins(pos), maxs.maxs(pos))
        });

        Some(Aabb::new(mins.into(), maxs.into()))
    }

    fn assert_valid(&self) -> anyhow::Result<()> {
        if !self.mins.coords.all_finite()
            || !self.maxs.coords.all_finite()
            || self.maxs[0] < self.mins[0]
            || self.maxs[1] < self.mins[1]
        {
            Err(anyhow::anyhow!(
                "Assert bounds valid failed, invalid bounds `{:?}`.",
                self,
            ))
        } else {
            Ok(())
        }
    }

    fn translate(&self, offset: na::Vector2<f64>) -> Aabb {
        Aabb::new(self.mins + offset, self.maxs + offset)
    }

    fn offset_to_fit_into(&self, container: &Self) -> na::Vector2<f64> {
        let mut offset = na::Vector2::zeros();

        for i in 0..2 {
            offset[i] = if self.maxs[i] - self.mins[i] > container.maxs[i] - container.mins[i]
                || self.mins[i] < container.mins[i]
            {
                container.mins[i] - self.mins[i]
            } else if self.maxs[i] > container.maxs[i] {
                container.maxs[i] - self.maxs[i]
            } else {
                0.0
            };
        }

        offset
    }

    fn contains_pos_w_tolerance(&self, pos: na::Vector2<f64>, tolerance: f64) -> bool {
        pos[0] >= self.mins[0] - tolerance
            && pos[0] <= self.maxs[0] + tolerance
            && pos[1] >= self.mins[1] - tolerance
            && pos[1] <= self.maxs[1] + tolerance
    }

    fn to_kurbo_rect(&self) -> kurbo::Rect {
        kurbo::Rect::from_points(
            self.mins.coords.to_kurbo_point(),
            self.maxs.coords.to_kurbo_point(),
        )
    }

    fn from_kurbo_rect(rect: kurbo::Rect) -> Self {
        Aabb::new(na::point![rect.x0, rect.y0], na::point![rect.x1, rect.y1])
    }

    fn approx_eq(&self, other: &Self) -> bool {
        self.mins.coords.approx_eq(&other.mins.coords)
            && self.maxs.coords.approx_eq(&other.maxs.coords)
    }
}

/// Extension trait for types that implement [kurbo::Shape].
pub trait KurboShapeExt
where
    Self: Sized + kurbo::Shape,
{
    /// Converting the bounds to parry2d aabb bounds
    fn bounds_to_p2d_aabb(&self) -> Aabb {
        let rect = self.bounding_box();
        Aabb::new(na::point![rect.x0, rect.y0], na::point![rect.x1, rect.y1])
    }
}

impl KurboShapeExt for kurbo::BezPath {}
impl KurboShapeExt for kurbo::Line {}
impl KurboShapeExt for kurbo::Rect {}
