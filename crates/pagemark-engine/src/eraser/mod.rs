// Modules
pub mod split;

// Re-exports
pub use split::{split_path, SplitOutcome};

// Imports
use crate::annotation::{Annotation, AnnotationKind, InkData};
use crate::changelog::ChangeAction;
use crate::config::EraserConfig;
use crate::permissions::PermissionOracle;
use crate::store::{AnnotationKey, AnnotationStore};
use crate::WidgetFlags;
use pagemark_compose::coordspace;
use pagemark_compose::ext::AabbExt;
use pagemark_compose::shapes::Circle;
use pagemark_compose::Viewport;
use std::time::Instant;
use tracing::{debug, trace};

/// Trashes every live annotation whose bounds are within the tolerance of the position.
pub fn erase_whole_objects(
    pos: na::Vector2<f64>,
    tolerance: f64,
    viewport: &Viewport,
    store: &mut AnnotationStore,
    oracle: &dyn PermissionOracle,
    now: Instant,
) -> WidgetFlags {
    let mut widget_flags = WidgetFlags::default();

    let colliding = store
        .keys_as_rendered()
        .into_iter()
        .filter(|key| {
            store
                .live_bounds(*key, viewport)
                .map(|bounds| bounds.contains_pos_w_tolerance(pos, tolerance))
                .unwrap_or(false)
        })
        .collect::<Vec<AnnotationKey>>();

    for key in colliding {
        let Some(annotation) = store.get(key) else {
            continue;
        };
        if !oracle.can_delete(annotation) {
            trace!("Not erasing annotation `{}`, not permitted", annotation.id);
            continue;
        }
        if store.trash(key, now) {
            widget_flags.store_modified = true;
            widget_flags.redraw = true;
        }
    }

    widget_flags
}

/// Removes the eraser circle from every path of the ink.
///
/// Returns None if no path was touched. Untouched paths are kept as they are.
pub fn erase_ink(ink: &InkData, circle: &Circle, viewport: &Viewport) -> Option<InkData> {
    let mut touched = false;
    let mut paths = Vec::with_capacity(ink.paths.len());

    for path in ink.paths.iter() {
        let positions = coordspace::path_to_pixels(path, viewport);
        match split_path(&positions, circle) {
            SplitOutcome::Untouched => paths.push(path.clone()),
            SplitOutcome::Removed => touched = true,
            SplitOutcome::Pieces(pieces) => {
                touched = true;
                paths.extend(
                    pieces
                        .iter()
                        .filter_map(|piece| coordspace::path_to_normalized(piece, viewport)),
                );
            }
        }
    }

    touched.then(|| InkData {
        paths,
        line_width: ink.line_width,
        color: ink.color,
    })
}

#[derive(Debug, Clone)]
struct EraseTarget {
    key: AnnotationKey,
    /// The state at gesture start.
    previous_state: Annotation,
    touched: bool,
}

/// The stroke eraser, cutting ink paths along the eraser circle.
///
/// A gesture starts with [StrokeEraser::start], which snapshots every erasable ink annotation. Sampled pointer
/// positions are buffered and processed at most once per sample window. [StrokeEraser::finish] processes what is
/// left in the buffer and commits one edit per touched annotation, so nothing erased is ever lost, no matter
/// whether the gesture ended regularly, got cancelled or the tool was switched.
#[derive(Debug, Clone, Default)]
pub struct StrokeEraser {
    targets: Vec<EraseTarget>,
    samples: Vec<na::Vector2<f64>>,
    last_processed: Option<Instant>,
    in_progress: bool,
}

impl StrokeEraser {
    /// Whether a gesture is in progress.
    pub fn in_progress(&self) -> bool {
        self.in_progress
    }

    /// Starts a gesture, snapshotting every live ink annotation the oracle permits managing.
    pub fn start(&mut self, store: &AnnotationStore, oracle: &dyn PermissionOracle) {
        self.samples.clear();
        self.last_processed = None;
        self.in_progress = true;

        self.targets = store
            .keys_as_rendered()
            .into_iter()
            .filter_map(|key| {
                let annotation = store.get(key)?;
                if !matches!(annotation.kind, AnnotationKind::Ink(_)) {
                    return None;
                }
                if !oracle.can_manage(annotation) {
                    trace!("Ink `{}` is not erasable, not permitted", annotation.id);
                    return None;
                }
                Some(EraseTarget {
                    key,
                    previous_state: annotation.snapshot(),
                    touched: false,
                })
            })
            .collect();
    }

    /// Buffers a sampled pointer position, processing the buffer if the sample window has passed.
    pub fn sample(
        &mut self,
        pos: na::Vector2<f64>,
        now: Instant,
        viewport: &Viewport,
        config: &EraserConfig,
        store: &mut AnnotationStore,
    ) -> WidgetFlags {
        if !self.in_progress {
            return WidgetFlags::default();
        }
        self.samples.push(pos);

        let due = self
            .last_processed
            .map(|last| now.saturating_duration_since(last) >= config.sample_window())
            .unwrap_or(true);
        if !due {
            return WidgetFlags::default();
        }
        self.last_processed = Some(now);
        self.process_samples(viewport, config, store)
    }

    /// Ends the gesture, processing the remaining buffered positions and committing the touched annotations.
    ///
    /// Annotations without any remaining path are trashed if the oracle permits it, and restored otherwise.
    pub fn finish(
        &mut self,
        now: Instant,
        viewport: &Viewport,
        config: &EraserConfig,
        store: &mut AnnotationStore,
        oracle: &dyn PermissionOracle,
    ) -> WidgetFlags {
        if !self.in_progress {
            return WidgetFlags::default();
        }
        let mut widget_flags = self.process_samples(viewport, config, store);

        for target in std::mem::take(&mut self.targets) {
            if !target.touched {
                continue;
            }
            let Some(annotation) = store.get_mut(target.key) else {
                continue;
            };
            let erased_completely = match &annotation.kind {
                AnnotationKind::Ink(ink) => ink.paths.is_empty(),
                _ => false,
            };

            let action = if !erased_completely {
                ChangeAction::Update
            } else if oracle.can_delete(&target.previous_state) {
                ChangeAction::Delete
            } else {
                debug!(
                    "Restoring completely erased ink `{}`, deleting it is not permitted",
                    annotation.id
                );
                annotation.kind = target.previous_state.kind.clone();
                continue;
            };

            debug!("Committing erased ink `{}` as {action:?}", annotation.id);
            if store
                .commit_edit(target.key, action, target.previous_state, now)
                .is_some()
            {
                widget_flags.store_modified = true;
            }
        }

        self.samples.clear();
        self.last_processed = None;
        self.in_progress = false;
        widget_flags.redraw = true;
        widget_flags
    }

    fn process_samples(
        &mut self,
        viewport: &Viewport,
        config: &EraserConfig,
        store: &mut AnnotationStore,
    ) -> WidgetFlags {
        let mut widget_flags = WidgetFlags::default();

        for pos in std::mem::take(&mut self.samples) {
            for target in self.targets.iter_mut() {
                let Some(annotation) = store.get_mut(target.key) else {
                    continue;
                };
                if annotation.is_tombstoned() {
                    continue;
                }
                let AnnotationKind::Ink(ink) = &annotation.kind else {
                    continue;
                };
                let circle = Circle::new(
                    pos,
                    config.circle_radius(viewport, ink.pixel_line_width(viewport)),
                );
                if let Some(erased) = erase_ink(ink, &circle, viewport) {
                    annotation.kind = AnnotationKind::Ink(erased);
                    target.touched = true;
                    widget_flags.redraw = true;
                }
            }
        }

        widget_flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::ShapeData;
    use crate::permissions::{AllowAll, AuthorOnly};
    use crate::timestamp::Timestamp;
    use approx::assert_relative_eq;
    use pagemark_compose::{Color, NormalizedPath, NormalizedPoint, NormalizedRect};
    use std::time::Duration;

    fn viewport() -> Viewport {
        Viewport::new(1000.0, 1000.0, 1.0)
    }

    fn eraser_config() -> EraserConfig {
        // radius 10 for a stroke of width 2
        EraserConfig {
            width: 9.0,
            ..Default::default()
        }
    }

    fn ink(author: &str) -> Annotation {
        let path = NormalizedPath::try_from_points([
            NormalizedPoint::new(0.0, 0.5),
            NormalizedPoint::new(0.1, 0.5),
            NormalizedPoint::new(0.2, 0.5),
        ])
        .unwrap();
        Annotation::new(
            AnnotationKind::Ink(InkData {
                paths: vec![path],
                line_width: 2.0,
                color: Color::BLACK,
            }),
            author,
            Timestamp::from_millis(1),
        )
    }

    fn ink_data(store: &AnnotationStore, key: AnnotationKey) -> InkData {
        match &store.get(key).unwrap().kind {
            AnnotationKind::Ink(ink) => ink.clone(),
            _ => unreachable!(),
        }
    }

    #[test]
    fn erasing_the_midpoint_splits_the_stroke() {
        let now = Instant::now();
        let mut store = AnnotationStore::default();
        let key = store.insert_new(ink("me"), now);
        let before = store.get(key).unwrap().snapshot();
        let _ = store.flush_pending();

        let mut eraser = StrokeEraser::default();
        eraser.start(&store, &AllowAll);
        let _ = eraser.sample(na::vector![100.0, 500.0], now, &viewport(), &eraser_config(), &mut store);
        let _ = eraser.finish(now, &viewport(), &eraser_config(), &mut store, &AllowAll);

        let paths = ink_data(&store, key).pixel_paths(&viewport());
        assert_eq!(paths.len(), 2);
        assert_relative_eq!(paths[0][0], na::vector![0.0, 500.0], epsilon = 1e-9);
        assert_relative_eq!(paths[0][1], na::vector![90.0, 500.0], epsilon = 1e-9);
        assert_relative_eq!(paths[1][0], na::vector![110.0, 500.0], epsilon = 1e-9);
        assert_relative_eq!(paths[1][1], na::vector![200.0, 500.0], epsilon = 1e-9);

        let changes = store.flush_pending();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].action, ChangeAction::Update);
        assert_eq!(changes[0].previous_state.as_ref(), Some(&before));
        assert!(store.get(key).unwrap().added_at > before.added_at);
    }

    #[test]
    fn gesture_missing_every_stroke_is_a_noop() {
        let now = Instant::now();
        let mut store = AnnotationStore::default();
        let key = store.insert_new(ink("me"), now);
        let _ = store.flush_pending();
        let before = store.get(key).unwrap().clone();

        let mut eraser = StrokeEraser::default();
        eraser.start(&store, &AllowAll);
        let _ = eraser.sample(na::vector![500.0, 100.0], now, &viewport(), &eraser_config(), &mut store);
        let _ = eraser.finish(now, &viewport(), &eraser_config(), &mut store, &AllowAll);

        assert_eq!(store.get(key).unwrap(), &before);
        assert!(!store.has_pending());
    }

    #[test]
    fn buffered_samples_are_flushed_on_finish() {
        let now = Instant::now();
        let mut store = AnnotationStore::default();
        let key = store.insert_new(ink("me"), now);
        let _ = store.flush_pending();

        let mut eraser = StrokeEraser::default();
        eraser.start(&store, &AllowAll);
        let _ = eraser.sample(na::vector![500.0, 100.0], now, &viewport(), &eraser_config(), &mut store);
        // inside the sample window, only buffered
        let _ = eraser.sample(
            na::vector![100.0, 500.0],
            now + Duration::from_millis(1),
            &viewport(),
            &eraser_config(),
            &mut store,
        );
        assert_eq!(ink_data(&store, key).paths.len(), 1);

        let _ = eraser.finish(now, &viewport(), &eraser_config(), &mut store, &AllowAll);
        assert_eq!(ink_data(&store, key).paths.len(), 2);
        assert!(!eraser.in_progress());
    }

    #[test]
    fn completely_erased_ink_is_trashed() {
        let now = Instant::now();
        let mut store = AnnotationStore::default();
        let key = store.insert_new(ink("me"), now);
        let _ = store.flush_pending();
        let config = EraserConfig {
            width: 300.0,
            ..Default::default()
        };

        let mut eraser = StrokeEraser::default();
        eraser.start(&store, &AllowAll);
        let _ = eraser.sample(na::vector![100.0, 500.0], now, &viewport(), &config, &mut store);
        let _ = eraser.finish(now, &viewport(), &config, &mut store, &AllowAll);

        assert_eq!(store.is_tombstoned(key), Some(true));
        let changes = store.flush_pending();
        assert_eq!(changes[0].action, ChangeAction::Delete);
    }

    #[test]
    fn foreign_ink_is_not_erasable() {
        let now = Instant::now();
        let mut store = AnnotationStore::default();
        let key = store.insert_new(ink("them"), now);
        let _ = store.flush_pending();
        let before = ink_data(&store, key);

        let mut eraser = StrokeEraser::default();
        let oracle = AuthorOnly::new("me");
        eraser.start(&store, &oracle);
        let _ = eraser.sample(na::vector![100.0, 500.0], now, &viewport(), &eraser_config(), &mut store);
        let _ = eraser.finish(now, &viewport(), &eraser_config(), &mut store, &oracle);

        assert_eq!(ink_data(&store, key), before);
    }

    #[test]
    fn whole_object_eraser_uses_tolerance() {
        let now = Instant::now();
        let mut store = AnnotationStore::default();
        let square = Annotation::new(
            AnnotationKind::Square(ShapeData {
                rect: NormalizedRect::new(0.1, 0.1, 0.2, 0.2),
                line_width: 0.0,
                color: Color::RED,
            }),
            "me",
            Timestamp::from_millis(1),
        );
        let key = store.insert_new(square, now);

        let _ = erase_whole_objects(na::vector![230.0, 150.0], 15.0, &viewport(), &mut store, &AllowAll, now);
        assert_eq!(store.is_tombstoned(key), Some(false));

        let widget_flags =
            erase_whole_objects(na::vector![210.0, 150.0], 15.0, &viewport(), &mut store, &AllowAll, now);
        assert!(widget_flags.store_modified);
        assert_eq!(store.is_tombstoned(key), Some(true));
    }
}
