// Imports
use p2d::bounding_volume::Aabb;

/// A circle in pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    /// The center.
    pub center: na::Vector2<f64>,
    /// The radius.
    pub radius: f64,
}

/// Whether a segment enters or leaves the circle at a crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossingKind {
    /// The segment enters the circle.
    Enter,
    /// The segment leaves the circle.
    Exit,
}

/// A point where a segment crosses the circle boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    /// The position along the segment, in `[0, 1]`.
    pub t: f64,
    /// The crossing position.
    pub pos: na::Vector2<f64>,
    /// The crossing direction.
    pub kind: CrossingKind,
}

impl Circle {
    /// A new circle.
    pub fn new(center: na::Vector2<f64>, radius: f64) -> Self {
        Self { center, radius }
    }

    /// The bounds of the circle.
    pub fn bounds(&self) -> Aabb {
        Aabb::from_half_extents(self.center.into(), na::Vector2::repeat(self.radius))
    }

    /// Whether the position lies strictly inside the circle. Points on the boundary are outside.
    pub fn contains(&self, pos: na::Vector2<f64>) -> bool {
        (pos - self.center).norm_squared() < self.radius * self.radius
    }

    /// The crossings of the segment from `start` to `end` with the circle boundary, ordered along the segment.
    ///
    /// Crossings are consistent with [Circle::contains] of the endpoints: a segment whose endpoints are both
    /// outside has either no or exactly two crossings, a segment with one endpoint inside has exactly one.
    /// Segments only touching the boundary tangentially do not cross it.
    pub fn segment_crossings(
        &self,
        start: na::Vector2<f64>,
        end: na::Vector2<f64>,
    ) -> Vec<Crossing> {
        let start_inside = self.contains(start);
        let end_inside = self.contains(end);

        if start_inside && end_inside {
            return vec![];
        }

        let dir = end - start;
        let a = dir.norm_squared();
        if a == 0.0 {
            return vec![];
        }
        let offset = start - self.center;
        let b = 2.0 * offset.dot(&dir);
        let c = offset.norm_squared() - self.radius * self.radius;
        let discriminant = b * b - 4.0 * a * c;

        if discriminant <= 0.0 {
            return vec![];
        }

        let sqrt_disc = discriminant.sqrt();
        let t_enter = ((-b - sqrt_disc) / (2.0 * a)).clamp(0.0, 1.0);
        let t_exit = ((-b + sqrt_disc) / (2.0 * a)).clamp(0.0, 1.0);
        let crossing = |t: f64, kind: CrossingKind| Crossing {
            t,
            pos: start + dir * t,
            kind,
        };

        match (start_inside, end_inside) {
            (false, false) => {
                // Both roots have to lie strictly inside the segment for it to pass through the circle
                if t_enter > 0.0 && t_exit < 1.0 && t_enter < t_exit {
                    vec![
                        crossing(t_enter, CrossingKind::Enter),
                        crossing(t_exit, CrossingKind::Exit),
                    ]
                } else {
                    vec![]
                }
            }
            (true, false) => vec![crossing(t_exit, CrossingKind::Exit)],
            (false, true) => vec![crossing(t_enter, CrossingKind::Enter)],
            (true, true) => unreachable!(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn segment_passing_through() {
        let circle = Circle::new(na::vector![50.0, 0.0], 10.0);

        let crossings = circle.segment_crossings(na::vector![0.0, 0.0], na::vector![100.0, 0.0]);
        assert_eq!(crossings.len(), 2);
        assert_eq!(crossings[0].kind, CrossingKind::Enter);
        assert_eq!(crossings[1].kind, CrossingKind::Exit);
        assert_relative_eq!(crossings[0].pos, na::vector![40.0, 0.0]);
        assert_relative_eq!(crossings[1].pos, na::vector![60.0, 0.0]);
        assert!(crossings[0].t < crossings[1].t);
    }

    #[test]
    fn segment_leaving() {
        let circle = Circle::new(na::vector![0.0, 0.0], 5.0);

        let crossings = circle.segment_crossings(na::vector![0.0, 0.0], na::vector![0.0, 20.0]);
        assert_eq!(crossings.len(), 1);
        assert_eq!(crossings[0].kind, CrossingKind::Exit);
        assert_relative_eq!(crossings[0].pos, na::vector![0.0, 5.0]);
    }

    #[test]
    fn segment_missing_or_touching() {
        let circle = Circle::new(na::vector![0.0, 0.0], 5.0);

        assert!(circle
            .segment_crossings(na::vector![-10.0, 20.0], na::vector![10.0, 20.0])
            .is_empty());
        // tangent
        assert!(circle
            .segment_crossings(na::vector![-10.0, 5.0], na::vector![10.0, 5.0])
            .is_empty());
        // ends before reaching the circle
        assert!(circle
            .segment_crossings(na::vector![-20.0, 0.0], na::vector![-10.0, 0.0])
            .is_empty());
    }

    #[test]
    fn boundary_point_is_outside() {
        let circle = Circle::new(na::vector![0.0, 0.0], 5.0);
        assert!(!circle.contains(na::vector![5.0, 0.0]));
        assert!(circle.contains(na::vector![4.999, 0.0]));
    }
}
