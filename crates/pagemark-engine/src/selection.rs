// Imports
use crate::annotation::{Annotation, ArrowEnd, GeometryLimits, Handle, ResizeCorner};
use crate::permissions::PermissionOracle;
use crate::store::{AnnotationKey, AnnotationStore};
use crate::WidgetFlags;
use p2d::bounding_volume::{Aabb, BoundingVolume};
use pagemark_compose::Viewport;
use std::time::Instant;
use tracing::trace;

/// The selected annotations, in the order they were selected.
///
/// Gestures are forwarded to every member. Each member computes its mutation against the geometry it
/// remembered at gesture start, so members move together as one rigid group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    keys: Vec<AnnotationKey>,
}

impl SelectionSet {
    pub fn keys(&self) -> &[AnnotationKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn has(&self, key: AnnotationKey) -> bool {
        self.keys.contains(&key)
    }

    /// Appends the key. Returns false if it already is a member.
    pub fn add(&mut self, key: AnnotationKey) -> bool {
        if self.has(key) {
            return false;
        }
        self.keys.push(key);
        true
    }

    /// Removes the key. Returns false if it was not a member.
    pub fn delete(&mut self, key: AnnotationKey) -> bool {
        let len = self.keys.len();
        self.keys.retain(|k| *k != key);
        self.keys.len() != len
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Toggles the key.
    ///
    /// Additive toggling flips the membership of the key only. Otherwise the selection is replaced by the key,
    /// or cleared if the key was its sole member.
    pub fn toggle(&mut self, key: AnnotationKey, additive: bool) {
        if additive {
            if !self.delete(key) {
                self.keys.push(key);
            }
        } else if self.keys == [key] {
            self.keys.clear();
        } else {
            self.keys.clear();
            self.keys.push(key);
        }
    }

    /// Removes members that were trashed or dropped from the store.
    pub fn retain_live(&mut self, store: &AnnotationStore) -> bool {
        let len = self.keys.len();
        self.keys
            .retain(|key| store.is_tombstoned(*key) == Some(false));
        self.keys.len() != len
    }

    /// The union of the members' current bounds in pixels. Recomputed on every call.
    pub fn bounds(&self, store: &AnnotationStore, viewport: &Viewport) -> Option<Aabb> {
        self.keys
            .iter()
            .filter_map(|key| store.live_bounds(*key, viewport))
            .reduce(|acc, bounds| acc.merged(&bounds))
    }

    /// Remembers the start geometry of every member.
    pub fn start_gesture(&self, store: &mut AnnotationStore, limits: GeometryLimits) {
        for key in self.keys.iter() {
            if let Some(annotation) = store.get_mut(*key) {
                annotation.remember_start(limits);
            }
        }
    }

    /// Forgets the remembered start geometry of every member.
    pub fn finish_gesture(&self, store: &mut AnnotationStore) {
        for key in self.keys.iter() {
            if let Some(annotation) = store.get_mut(*key) {
                annotation.finish_gesture();
            }
        }
    }

    /// Moves every member by the pointer displacement since gesture start.
    pub fn move_by(
        &self,
        offset: na::Vector2<f64>,
        store: &mut AnnotationStore,
        oracle: &dyn PermissionOracle,
        now: Instant,
    ) -> WidgetFlags {
        self.mutate_members(store, oracle, now, |annotation| annotation.move_by(offset))
    }

    /// Resizes every member by dragging the corner by the pointer displacement since gesture start.
    pub fn resize(
        &self,
        corner: ResizeCorner,
        offset: na::Vector2<f64>,
        proportional: bool,
        store: &mut AnnotationStore,
        oracle: &dyn PermissionOracle,
        now: Instant,
    ) -> WidgetFlags {
        self.mutate_members(store, oracle, now, |annotation| {
            annotation.resize(corner, offset, proportional)
        })
    }

    /// Moves an arrow endpoint of every member by the pointer displacement since gesture start.
    pub fn point(
        &self,
        end: ArrowEnd,
        offset: na::Vector2<f64>,
        store: &mut AnnotationStore,
        oracle: &dyn PermissionOracle,
        now: Instant,
    ) -> WidgetFlags {
        self.mutate_members(store, oracle, now, |annotation| annotation.point(end, offset))
    }

    /// The snap pass at gesture end, pulling every member back inside the page.
    pub fn check_for_out_of_bounds(
        &self,
        margin: f64,
        handle: Handle,
        limits: &GeometryLimits,
        store: &mut AnnotationStore,
        oracle: &dyn PermissionOracle,
        now: Instant,
    ) -> WidgetFlags {
        let mut widget_flags = WidgetFlags::default();

        for key in self.keys.iter() {
            let Some(annotation) = store.get(*key) else {
                continue;
            };
            if !oracle.can_manage(annotation) {
                trace!("Skipping snap of annotation `{}`, not permitted", annotation.id);
                continue;
            }
            let mut snapped = annotation.clone();
            snapped.snap_to_bounds(margin, handle, limits);
            if snapped.kind == annotation.kind {
                continue;
            }

            store.modify(*key, now, |annotation| annotation.kind = snapped.kind);
            widget_flags.store_modified = true;
            widget_flags.redraw = true;
        }

        widget_flags
    }

    fn mutate_members(
        &self,
        store: &mut AnnotationStore,
        oracle: &dyn PermissionOracle,
        now: Instant,
        mutate: impl Fn(&mut Annotation),
    ) -> WidgetFlags {
        let mut widget_flags = WidgetFlags::default();

        for key in self.keys.iter() {
            let Some(annotation) = store.get(*key) else {
                continue;
            };
            if annotation.is_tombstoned() {
                continue;
            }
            if !oracle.can_manage(annotation) {
                trace!("Skipping annotation `{}`, not permitted", annotation.id);
                continue;
            }
            if annotation.gesture_start().is_none() {
                trace!("Skipping annotation `{}`, it joined after gesture start", annotation.id);
                continue;
            }

            store.modify(*key, now, &mutate);
            widget_flags.store_modified = true;
            widget_flags.redraw = true;
        }

        widget_flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{AnnotationKind, ShapeData};
    use crate::permissions::{AllowAll, AuthorOnly};
    use crate::timestamp::Timestamp;
    use approx::assert_relative_eq;
    use pagemark_compose::{Color, NormalizedRect};

    fn limits() -> GeometryLimits {
        GeometryLimits {
            viewport: Viewport::new(1000.0, 1000.0, 1.0),
            min_safe_margin: 1.0,
            min_size: 8.0,
        }
    }

    fn square(author: &str, left: f64, top: f64) -> Annotation {
        Annotation::new(
            AnnotationKind::Square(ShapeData {
                rect: NormalizedRect::new(left, top, left + 0.1, top + 0.1),
                line_width: 2.0,
                color: Color::RED,
            }),
            author,
            Timestamp::from_millis(1),
        )
    }

    fn top_left(store: &AnnotationStore, key: AnnotationKey) -> na::Vector2<f64> {
        let bounds = store.get(key).unwrap().bounding_rect(&limits().viewport).unwrap();
        bounds.mins.coords
    }

    #[test]
    fn toggle_rules() {
        let mut store = AnnotationStore::default();
        let now = Instant::now();
        let a = store.insert_new(square("me", 0.1, 0.1), now);
        let b = store.insert_new(square("me", 0.5, 0.5), now);
        let mut selection = SelectionSet::default();

        selection.toggle(a, false);
        assert_eq!(selection.keys(), &[a]);
        selection.toggle(b, true);
        assert_eq!(selection.keys(), &[a, b]);
        selection.toggle(a, true);
        assert_eq!(selection.keys(), &[b]);
        // clicking the sole member toggles it off
        selection.toggle(b, false);
        assert!(selection.is_empty());

        selection.toggle(a, true);
        selection.toggle(b, true);
        selection.toggle(b, false);
        assert_eq!(selection.keys(), &[b]);
    }

    #[test]
    fn multi_move_is_rigid() {
        let mut store = AnnotationStore::default();
        let now = Instant::now();
        let a = store.insert_new(square("me", 0.1, 0.1), now);
        let b = store.insert_new(square("me", 0.6, 0.3), now);
        let mut selection = SelectionSet::default();
        selection.add(a);
        selection.add(b);
        let relative = top_left(&store, b) - top_left(&store, a);

        selection.start_gesture(&mut store, limits());
        for step in 1..=10 {
            let _ = selection.move_by(
                na::vector![12.5 * step as f64, -7.0 * step as f64],
                &mut store,
                &AllowAll,
                now,
            );
        }
        selection.finish_gesture(&mut store);

        assert_relative_eq!(top_left(&store, a), na::vector![224.0, 29.0], epsilon = 1e-6);
        assert_relative_eq!(top_left(&store, b) - top_left(&store, a), relative, epsilon = 1e-6);
    }

    #[test]
    fn denied_members_are_skipped() {
        let mut store = AnnotationStore::default();
        let now = Instant::now();
        let mine = store.insert_new(square("me", 0.1, 0.1), now);
        let theirs = store.insert_new(square("them", 0.5, 0.5), now);
        let before = store.get(theirs).unwrap().kind.clone();
        let mut selection = SelectionSet::default();
        selection.add(theirs);
        selection.add(mine);

        selection.start_gesture(&mut store, limits());
        let widget_flags =
            selection.move_by(na::vector![10.0, 0.0], &mut store, &AuthorOnly::new("me"), now);
        assert!(widget_flags.store_modified);
        assert_eq!(store.get(theirs).unwrap().kind, before);
        assert_relative_eq!(top_left(&store, mine)[0], 109.0, epsilon = 1e-6);
    }

    #[test]
    fn members_added_after_gesture_start_are_skipped() {
        let mut store = AnnotationStore::default();
        let now = Instant::now();
        let a = store.insert_new(square("me", 0.1, 0.1), now);
        let late = store.insert_new(square("me", 0.5, 0.5), now);
        let before = store.get(late).unwrap().kind.clone();
        let mut selection = SelectionSet::default();
        selection.add(a);

        selection.start_gesture(&mut store, limits());
        selection.add(late);
        let _ = selection.move_by(na::vector![10.0, 0.0], &mut store, &AllowAll, now);
        selection.finish_gesture(&mut store);

        assert_eq!(store.get(late).unwrap().kind, before);
        assert_relative_eq!(top_left(&store, a)[0], 109.0, epsilon = 1e-6);
    }

    #[test]
    fn bounds_union_members() {
        let mut store = AnnotationStore::default();
        let now = Instant::now();
        let a = store.insert_new(square("me", 0.1, 0.1), now);
        let b = store.insert_new(square("me", 0.5, 0.6), now);
        let mut selection = SelectionSet::default();
        assert!(selection.bounds(&store, &limits().viewport).is_none());
        selection.add(a);
        selection.add(b);

        let bounds = selection.bounds(&store, &limits().viewport).unwrap();
        assert_relative_eq!(bounds.mins, na::point![99.0, 99.0], epsilon = 1e-9);
        assert_relative_eq!(bounds.maxs, na::point![601.0, 701.0], epsilon = 1e-9);
    }
}
