// Imports
use crate::annotation::{Annotation, AnnotationId};
use crate::changelog::{ChangeLog, History};
use crate::config::EngineConfig;
use crate::hooks::{CommentHooks, LifecycleEvent, NoopHooks};
use crate::pens::{Pen, PenBehaviour, PenStyle};
use crate::permissions::{AllowAll, PermissionOracle};
use crate::selection::SelectionSet;
use crate::store::{
    AnnotationKey, AnnotationStore, ImportError, ImportReport, MergeOutcome, RenderItem,
};
use crate::WidgetFlags;
use pagemark_compose::penevent::{PenEvent, PenProgress};
use pagemark_compose::Viewport;
use std::time::Instant;
use tracing::{debug, trace};

/// A mutable view into the engine, excluding the pen.
#[derive(Debug)]
pub struct EngineViewMut<'a> {
    pub config: &'a EngineConfig,
    pub viewport: &'a Viewport,
    pub store: &'a mut AnnotationStore,
    pub selection: &'a mut SelectionSet,
    pub oracle: &'a dyn PermissionOracle,
}

/// The engine.
///
/// Holds the annotations of one page and routes pen events, remote updates and history steps to them.
/// Every entry point returns [WidgetFlags] for the presentation layer.
#[derive(Debug)]
pub struct Engine {
    pub config: EngineConfig,
    viewport: Viewport,
    store: AnnotationStore,
    selection: SelectionSet,
    pen: Pen,
    changelog: Box<dyn ChangeLog>,
    oracle: Box<dyn PermissionOracle>,
    hooks: Box<dyn CommentHooks>,
}

impl Engine {
    /// A new engine with the bundled history, permitting everything and without comment hooks.
    pub fn new(config: EngineConfig, viewport: Viewport) -> Self {
        viewport.assert_valid();

        Self {
            changelog: Box::new(History::new(config.history_max_len)),
            config,
            viewport,
            store: AnnotationStore::default(),
            selection: SelectionSet::default(),
            pen: Pen::default(),
            oracle: Box::new(AllowAll),
            hooks: Box::new(NoopHooks),
        }
    }

    /// Replaces the change log collaborator.
    pub fn with_changelog(mut self, changelog: Box<dyn ChangeLog>) -> Self {
        self.changelog = changelog;
        self
    }

    /// Replaces the permission collaborator.
    pub fn with_oracle(mut self, oracle: Box<dyn PermissionOracle>) -> Self {
        self.oracle = oracle;
        self
    }

    /// Replaces the comment lifecycle hooks.
    pub fn with_hooks(mut self, hooks: Box<dyn CommentHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn pen_style(&self) -> PenStyle {
        self.pen.style()
    }

    pub fn can_undo(&self) -> bool {
        self.changelog.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.changelog.can_redo()
    }

    /// Sets a new viewport. Pixel geometry is always derived from the normalized geometry, nothing is converted.
    ///
    /// # Panics
    ///
    /// Panics if the viewport has a non-positive size or scale.
    pub fn set_viewport(&mut self, viewport: Viewport) -> WidgetFlags {
        viewport.assert_valid();
        self.viewport = viewport;

        let mut widget_flags = WidgetFlags::default();
        widget_flags.redraw = true;
        widget_flags
    }

    /// Handle a pen event. Finished gestures are committed to the change log.
    pub fn handle_pen_event(&mut self, event: PenEvent, now: Instant) -> WidgetFlags {
        let (event_result, mut widget_flags) = self.pen.handle_event(
            event,
            now,
            &mut EngineViewMut {
                config: &self.config,
                viewport: &self.viewport,
                store: &mut self.store,
                selection: &mut self.selection,
                oracle: self.oracle.as_ref(),
            },
        );

        if event_result.progress == PenProgress::Finished {
            widget_flags |= self.commit_pending();
        }
        widget_flags |= self.dispatch_lifecycle_events();
        widget_flags
    }

    /// Switches the tool. A gesture of the current tool that is still in progress is finished and committed.
    pub fn change_pen_style(&mut self, style: PenStyle, now: Instant) -> WidgetFlags {
        if self.pen.style() == style {
            return WidgetFlags::default();
        }

        let mut widget_flags = self.pen.deinit(
            now,
            &mut EngineViewMut {
                config: &self.config,
                viewport: &self.viewport,
                store: &mut self.store,
                selection: &mut self.selection,
                oracle: self.oracle.as_ref(),
            },
        );
        self.pen = Pen::new(style);

        widget_flags |= self.commit_pending();
        widget_flags |= self.dispatch_lifecycle_events();
        widget_flags.redraw = true;
        widget_flags
    }

    /// Commits pending edits whose debounce window has passed, and drops committed tombstones.
    ///
    /// Nothing is committed while a gesture is in progress, the gesture end commits it as a whole.
    pub fn tick(&mut self, now: Instant) -> WidgetFlags {
        let mut widget_flags = WidgetFlags::default();
        if self.pen.in_progress() {
            return widget_flags;
        }

        if self
            .store
            .pending_is_due(now, self.config.commit_debounce())
        {
            widget_flags |= self.commit_pending();
        }
        widget_flags |= self.drop_tombstoned();
        widget_flags
    }

    /// Commits all pending edits as one change log entry.
    pub fn commit_pending(&mut self) -> WidgetFlags {
        let mut widget_flags = WidgetFlags::default();

        let changes = self.store.flush_pending();
        if changes.is_empty() {
            return widget_flags;
        }
        debug!("Committing {} changes", changes.len());
        self.changelog.record(changes);

        widget_flags.hide_undo = Some(!self.changelog.can_undo());
        widget_flags.hide_redo = Some(!self.changelog.can_redo());
        widget_flags
    }

    /// Undo the latest committed changes, restoring the previous states.
    pub fn undo(&mut self) -> WidgetFlags {
        if self.pen.in_progress() {
            debug!("Not undoing while a gesture is in progress");
            return WidgetFlags::default();
        }
        let mut widget_flags = self.commit_pending();

        if let Some(changes) = self.changelog.undo() {
            for change in changes.iter().rev() {
                if let Some(id) = change.id() {
                    self.store.restore_state(change.previous_state.as_ref(), id);
                }
            }
            widget_flags |= self.after_history_step();
        }

        widget_flags.hide_undo = Some(!self.changelog.can_undo());
        widget_flags.hide_redo = Some(!self.changelog.can_redo());
        widget_flags
    }

    /// Redo the latest undone changes, restoring the current states.
    pub fn redo(&mut self) -> WidgetFlags {
        if self.pen.in_progress() {
            debug!("Not redoing while a gesture is in progress");
            return WidgetFlags::default();
        }
        let mut widget_flags = self.commit_pending();

        if let Some(changes) = self.changelog.redo() {
            for change in changes.iter() {
                if let Some(id) = change.id() {
                    self.store.restore_state(change.current_state.as_ref(), id);
                }
            }
            widget_flags |= self.after_history_step();
        }

        widget_flags.hide_undo = Some(!self.changelog.can_undo());
        widget_flags.hide_redo = Some(!self.changelog.can_redo());
        widget_flags
    }

    /// Inserts a newly drawn annotation. The addition is committed with the next commit.
    pub fn insert_annotation(
        &mut self,
        annotation: Annotation,
        now: Instant,
    ) -> (AnnotationKey, WidgetFlags) {
        let key = self.store.insert_new(annotation, now);

        let mut widget_flags = self.dispatch_lifecycle_events();
        widget_flags.store_modified = true;
        widget_flags.redraw = true;
        (key, widget_flags)
    }

    /// Merges a snapshot from the sync collaborator.
    pub fn merge_remote(&mut self, remote: Annotation) -> (MergeOutcome, WidgetFlags) {
        let outcome = self.store.merge_remote(remote);

        let mut widget_flags = self.dispatch_lifecycle_events();
        widget_flags.selection_changed = self.selection.retain_live(&self.store);
        widget_flags.store_modified = true;
        widget_flags.redraw = true;
        (outcome, widget_flags)
    }

    /// Imports a JSON array of snapshots from the sync collaborator.
    pub fn import_remote_json(
        &mut self,
        json: &str,
    ) -> Result<(ImportReport, WidgetFlags), ImportError> {
        let report = self.store.import_remote_json(json)?;

        let mut widget_flags = self.dispatch_lifecycle_events();
        widget_flags.selection_changed = self.selection.retain_live(&self.store);
        widget_flags.store_modified = true;
        widget_flags.redraw = true;
        Ok((report, widget_flags))
    }

    /// The render data of all live annotations in paint order.
    pub fn render_items(&self) -> Vec<RenderItem> {
        self.store.render_items(&self.viewport)
    }

    /// The top-most live annotation at the pixel position.
    pub fn hit_test(&self, pos: na::Vector2<f64>) -> Option<AnnotationKey> {
        self.store.hit_test(
            pos,
            &self.viewport,
            self.config.selector_config.hit_tolerance,
        )
    }

    /// Selects all live annotations with own geometry.
    pub fn select_all(&mut self) -> WidgetFlags {
        if self.pen.in_progress() {
            debug!("Not changing the selection while a gesture is in progress");
            return WidgetFlags::default();
        }
        self.selection.clear();
        for key in self.store.keys_as_rendered() {
            if self.store.live_bounds(key, &self.viewport).is_some() {
                self.selection.add(key);
            }
        }

        let mut widget_flags = WidgetFlags::default();
        widget_flags.selection_changed = true;
        widget_flags.redraw = true;
        widget_flags
    }

    pub fn deselect_all(&mut self) -> WidgetFlags {
        if self.pen.in_progress() {
            debug!("Not changing the selection while a gesture is in progress");
            return WidgetFlags::default();
        }
        let mut widget_flags = WidgetFlags::default();
        if self.selection.is_empty() {
            return widget_flags;
        }
        self.selection.clear();
        widget_flags.selection_changed = true;
        widget_flags.redraw = true;
        widget_flags
    }

    /// Trashes the selected annotations the oracle permits deleting, committed as one change log entry.
    pub fn trash_selection(&mut self, now: Instant) -> WidgetFlags {
        if self.pen.in_progress() {
            debug!("Not changing the selection while a gesture is in progress");
            return WidgetFlags::default();
        }
        let mut widget_flags = WidgetFlags::default();

        for key in self.selection.keys().to_vec() {
            let Some(annotation) = self.store.get(key) else {
                continue;
            };
            if !self.oracle.can_delete(annotation) {
                trace!("Not trashing annotation `{}`, not permitted", annotation.id);
                continue;
            }
            widget_flags.store_modified |= self.store.trash(key, now);
        }
        widget_flags.selection_changed = self.selection.retain_live(&self.store);

        widget_flags |= self.commit_pending();
        widget_flags |= self.dispatch_lifecycle_events();
        widget_flags.redraw = true;
        widget_flags
    }

    /// Physically removes committed tombstones from the working set. Returns their ids.
    pub fn drop_tombstoned(&mut self) -> WidgetFlags {
        let mut widget_flags = WidgetFlags::default();

        let dropped: Vec<AnnotationId> = self.store.drop_tombstoned();
        if !dropped.is_empty() {
            debug!("Dropped {} tombstoned annotations", dropped.len());
            widget_flags.selection_changed = self.selection.retain_live(&self.store);
        }
        widget_flags
    }

    /// Snapshots of all annotations in paint order, for the sync and persistence collaborators.
    pub fn export_snapshots(&self) -> Vec<Annotation> {
        self.store.export_snapshots()
    }

    fn after_history_step(&mut self) -> WidgetFlags {
        let mut widget_flags = self.dispatch_lifecycle_events();
        widget_flags.selection_changed = self.selection.retain_live(&self.store);
        widget_flags.store_modified = true;
        widget_flags.redraw = true;
        widget_flags
    }

    /// Calls the comment hooks for the lifecycle events of the store.
    fn dispatch_lifecycle_events(&mut self) -> WidgetFlags {
        for event in self.store.drain_lifecycle_events() {
            match event {
                LifecycleEvent::Attached(id) => {
                    if let Some(annotation) = self.store.get_by_id(id) {
                        self.hooks.on_attach(id, &annotation.kind);
                    }
                }
                LifecycleEvent::Detached(id) => self.hooks.on_detach(id),
            }
        }
        WidgetFlags::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{AnnotationKind, CommentData, InkData, ShapeData};
    use crate::changelog::Change;
    use crate::config::EraserStyle;
    use crate::timestamp::Timestamp;
    use approx::assert_relative_eq;
    use pagemark_compose::penevent::{Element, ModifierKey};
    use pagemark_compose::{Color, NormalizedPath, NormalizedPoint, NormalizedRect};
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::rc::Rc;
    use std::time::Duration;

    fn viewport() -> Viewport {
        Viewport::new(1000.0, 1000.0, 1.0)
    }

    fn square(left: f64, top: f64) -> Annotation {
        Annotation::new(
            AnnotationKind::Square(ShapeData {
                rect: NormalizedRect::new(left, top, left + 0.1, top + 0.1),
                line_width: 2.0,
                color: Color::RED,
            }),
            "me",
            Timestamp::from_millis(1),
        )
    }

    fn ink() -> Annotation {
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
            "me",
            Timestamp::from_millis(1),
        )
    }

    fn down(x: f64, y: f64) -> PenEvent {
        PenEvent::Down {
            element: Element::new(na::vector![x, y]),
            modifier_keys: HashSet::new(),
        }
    }

    fn up(x: f64, y: f64) -> PenEvent {
        PenEvent::Up {
            element: Element::new(na::vector![x, y]),
            modifier_keys: HashSet::new(),
        }
    }

    fn top_left(engine: &Engine, key: AnnotationKey) -> na::Vector2<f64> {
        engine
            .store()
            .live_bounds(key, &engine.viewport())
            .unwrap()
            .mins
            .coords
    }

    fn path_count(engine: &Engine, key: AnnotationKey) -> usize {
        match &engine.store().get(key).unwrap().kind {
            AnnotationKind::Ink(ink) => ink.paths.len(),
            _ => unreachable!(),
        }
    }

    fn eraser_engine(now: Instant) -> (Engine, AnnotationKey) {
        let mut config = EngineConfig::default();
        config.eraser_config.style = EraserStyle::SplitStrokes;
        // eraser circle radius 10 for the stroke width 2
        config.eraser_config.width = 9.0;
        let mut engine = Engine::new(config, viewport());
        let (key, _) = engine.insert_annotation(ink(), now);
        let _ = engine.commit_pending();
        let _ = engine.change_pen_style(PenStyle::Eraser, now);
        (engine, key)
    }

    #[test]
    fn dragging_the_selection_is_one_history_entry() {
        let now = Instant::now();
        let mut engine = Engine::new(EngineConfig::default(), viewport());
        let (a, _) = engine.insert_annotation(square(0.1, 0.1), now);
        let (b, _) = engine.insert_annotation(square(0.6, 0.3), now);
        let _ = engine.tick(now + Duration::from_secs(1));
        assert!(engine.can_undo());
        let relative = top_left(&engine, b) - top_left(&engine, a);

        let _ = engine.select_all();
        let _ = engine.handle_pen_event(down(150.0, 150.0), now);
        let _ = engine.handle_pen_event(down(160.0, 155.0), now);
        let _ = engine.handle_pen_event(down(270.0, 90.0), now);
        let _ = engine.handle_pen_event(up(275.0, 80.0), now);

        assert_relative_eq!(top_left(&engine, a), na::vector![224.0, 29.0], epsilon = 1e-6);
        assert_relative_eq!(top_left(&engine, b) - top_left(&engine, a), relative, epsilon = 1e-6);
        assert_eq!(engine.selection().len(), 2);

        let _ = engine.undo();
        assert_relative_eq!(top_left(&engine, a), na::vector![99.0, 99.0], epsilon = 1e-6);
        let _ = engine.redo();
        assert_relative_eq!(top_left(&engine, a), na::vector![224.0, 29.0], epsilon = 1e-6);
    }

    #[test]
    fn clicking_the_sole_selected_annotation_deselects_it() {
        let now = Instant::now();
        let mut engine = Engine::new(EngineConfig::default(), viewport());
        let (a, _) = engine.insert_annotation(square(0.1, 0.1), now);

        let _ = engine.handle_pen_event(down(150.0, 150.0), now);
        let _ = engine.handle_pen_event(up(150.0, 150.0), now);
        assert_eq!(engine.selection().keys(), &[a]);

        let _ = engine.handle_pen_event(down(150.0, 150.0), now);
        let _ = engine.handle_pen_event(up(150.0, 150.0), now);
        assert!(engine.selection().is_empty());
    }

    #[test]
    fn shift_click_adds_to_the_selection() {
        let now = Instant::now();
        let mut engine = Engine::new(EngineConfig::default(), viewport());
        let (a, _) = engine.insert_annotation(square(0.1, 0.1), now);
        let (b, _) = engine.insert_annotation(square(0.5, 0.5), now);

        let _ = engine.handle_pen_event(down(150.0, 150.0), now);
        let _ = engine.handle_pen_event(up(150.0, 150.0), now);
        let _ = engine.handle_pen_event(
            PenEvent::Down {
                element: Element::new(na::vector![550.0, 550.0]),
                modifier_keys: HashSet::from([ModifierKey::KeyboardShift]),
            },
            now,
        );
        let _ = engine.handle_pen_event(up(550.0, 550.0), now);
        assert_eq!(engine.selection().keys(), &[a, b]);

        // clicking empty space without shift clears the selection
        let _ = engine.handle_pen_event(down(900.0, 100.0), now);
        let _ = engine.handle_pen_event(up(900.0, 100.0), now);
        assert!(engine.selection().is_empty());
    }

    #[test]
    fn rubber_band_selects_contained() {
        let now = Instant::now();
        let mut engine = Engine::new(EngineConfig::default(), viewport());
        let (a, _) = engine.insert_annotation(square(0.1, 0.1), now);
        let _ = engine.insert_annotation(square(0.5, 0.5), now);

        let _ = engine.handle_pen_event(down(50.0, 50.0), now);
        let _ = engine.handle_pen_event(down(250.0, 250.0), now);
        let _ = engine.handle_pen_event(up(300.0, 300.0), now);
        assert_eq!(engine.selection().keys(), &[a]);
    }

    #[test]
    fn resize_with_a_corner_handle() {
        let now = Instant::now();
        let mut engine = Engine::new(EngineConfig::default(), viewport());
        let (a, _) = engine.insert_annotation(square(0.1, 0.1), now);
        let _ = engine.select_all();

        // bottom right corner of the bounds is at (201, 201)
        let _ = engine.handle_pen_event(down(201.0, 201.0), now);
        let _ = engine.handle_pen_event(up(251.0, 221.0), now);

        let bounds = engine.store().live_bounds(a, &viewport()).unwrap();
        assert_relative_eq!(bounds.mins, na::point![99.0, 99.0], epsilon = 1e-6);
        assert_relative_eq!(bounds.maxs, na::point![251.0, 221.0], epsilon = 1e-6);
    }

    #[test]
    fn stroke_eraser_splits_and_undoes() {
        let now = Instant::now();
        let (mut engine, key) = eraser_engine(now);
        let entries_before = engine.can_undo();

        let _ = engine.handle_pen_event(down(100.0, 500.0), now);
        let _ = engine.handle_pen_event(up(100.0, 500.0), now);
        assert!(entries_before && engine.can_undo());
        assert_eq!(path_count(&engine, key), 2);

        let _ = engine.undo();
        assert_eq!(path_count(&engine, key), 1);
        let _ = engine.redo();
        assert_eq!(path_count(&engine, key), 2);
    }

    #[test]
    fn cancelled_erasure_is_committed() {
        let now = Instant::now();
        let (mut engine, key) = eraser_engine(now);

        let _ = engine.handle_pen_event(down(500.0, 100.0), now);
        // buffered inside the sample window
        let _ = engine.handle_pen_event(down(100.0, 500.0), now + Duration::from_millis(1));
        let _ = engine.handle_pen_event(PenEvent::Cancel, now + Duration::from_millis(2));

        assert_eq!(path_count(&engine, key), 2);
        let _ = engine.undo();
        assert_eq!(path_count(&engine, key), 1);
    }

    #[test]
    fn switching_tools_commits_the_erasure() {
        let now = Instant::now();
        let (mut engine, key) = eraser_engine(now);

        let _ = engine.handle_pen_event(down(100.0, 500.0), now);
        let _ = engine.change_pen_style(PenStyle::Selector, now);

        assert_eq!(engine.pen_style(), PenStyle::Selector);
        assert_eq!(path_count(&engine, key), 2);
        assert!(!engine.store().has_pending());
    }

    #[test]
    fn edits_are_debounced() {
        let now = Instant::now();
        let mut engine = Engine::new(EngineConfig::default(), viewport());
        let _ = engine.insert_annotation(square(0.1, 0.1), now);

        let _ = engine.tick(now + Duration::from_millis(100));
        assert!(!engine.can_undo());
        let widget_flags = engine.tick(now + Duration::from_millis(300));
        assert!(engine.can_undo());
        assert_eq!(widget_flags.hide_undo, Some(false));
    }

    #[test]
    fn remote_replacement_during_a_drag_is_moved_along() {
        let now = Instant::now();
        let mut engine = Engine::new(EngineConfig::default(), viewport());
        let (a, _) = engine.insert_annotation(square(0.1, 0.1), now);
        let _ = engine.commit_pending();
        let _ = engine.select_all();

        let _ = engine.handle_pen_event(down(150.0, 150.0), now);
        let _ = engine.handle_pen_event(down(170.0, 150.0), now);
        assert_relative_eq!(top_left(&engine, a), na::vector![119.0, 99.0], epsilon = 1e-6);

        let mut remote = square(0.5, 0.5);
        remote.id = engine.store().get(a).unwrap().id;
        remote.added_at =
            Timestamp::from_millis(engine.store().get(a).unwrap().added_at.as_millis() + 60_000);
        let (outcome, _) = engine.merge_remote(remote);
        assert_eq!(outcome, MergeOutcome::Replaced(a));

        let _ = engine.handle_pen_event(down(190.0, 150.0), now);
        let _ = engine.handle_pen_event(up(190.0, 150.0), now);
        assert_relative_eq!(top_left(&engine, a), na::vector![539.0, 499.0], epsilon = 1e-6);
        assert!(engine.store().get(a).unwrap().gesture_start().is_none());
    }

    #[test]
    fn selection_commands_wait_for_the_gesture_to_end() {
        let now = Instant::now();
        let mut engine = Engine::new(EngineConfig::default(), viewport());
        let (a, _) = engine.insert_annotation(square(0.1, 0.1), now);
        let (b, _) = engine.insert_annotation(square(0.5, 0.5), now);
        let _ = engine.commit_pending();

        // rubber band from empty space
        let _ = engine.handle_pen_event(down(50.0, 50.0), now);
        assert!(!engine.select_all().selection_changed);
        assert!(engine.selection().is_empty());
        let _ = engine.handle_pen_event(down(250.0, 250.0), now);
        let _ = engine.handle_pen_event(up(300.0, 300.0), now);
        assert_eq!(engine.selection().keys(), &[a]);

        // dragging the selected annotation
        let _ = engine.handle_pen_event(down(150.0, 150.0), now);
        let _ = engine.handle_pen_event(down(170.0, 150.0), now);
        assert!(!engine.select_all().selection_changed);
        assert!(!engine.deselect_all().selection_changed);
        assert!(!engine.trash_selection(now).store_modified);
        let _ = engine.handle_pen_event(down(190.0, 150.0), now);
        let _ = engine.handle_pen_event(up(190.0, 150.0), now);

        assert_eq!(engine.selection().keys(), &[a]);
        assert_eq!(engine.store().is_tombstoned(a), Some(false));
        assert_relative_eq!(top_left(&engine, a), na::vector![139.0, 99.0], epsilon = 1e-6);
        assert_relative_eq!(top_left(&engine, b), na::vector![499.0, 499.0], epsilon = 1e-6);
    }

    #[derive(Debug, Clone, Default)]
    struct RecordingLog(Rc<RefCell<Vec<Vec<Change>>>>);

    impl ChangeLog for RecordingLog {
        fn record(&mut self, changes: Vec<Change>) {
            self.0.borrow_mut().push(changes);
        }
    }

    #[test]
    fn remote_replacement_during_erasure_commits_once() {
        let now = Instant::now();
        let log = RecordingLog::default();
        let mut config = EngineConfig::default();
        config.eraser_config.style = EraserStyle::SplitStrokes;
        config.eraser_config.width = 9.0;
        let mut engine = Engine::new(config, viewport()).with_changelog(Box::new(log.clone()));
        let (key, _) = engine.insert_annotation(ink(), now);
        let _ = engine.commit_pending();
        let _ = engine.change_pen_style(PenStyle::Eraser, now);
        let at_down = engine.store().get(key).unwrap().snapshot();
        let groups_before = log.0.borrow().len();

        let _ = engine.handle_pen_event(down(100.0, 500.0), now);
        assert_eq!(path_count(&engine, key), 2);

        let mut remote = at_down.clone();
        remote.added_at = Timestamp::from_millis(at_down.added_at.as_millis() + 60_000);
        if let AnnotationKind::Ink(ink) = &mut remote.kind {
            ink.color = Color::RED;
        }
        let _ = engine.merge_remote(remote);
        assert_eq!(path_count(&engine, key), 1);

        // buffered inside the sample window, processed on release
        let _ = engine.handle_pen_event(up(100.0, 500.0), now + Duration::from_millis(1));

        let groups = log.0.borrow();
        assert_eq!(groups.len(), groups_before + 1);
        let changes = &groups[groups_before];
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].previous_state.as_ref(), Some(&at_down));
        match &changes[0].current_state.as_ref().unwrap().kind {
            AnnotationKind::Ink(ink) => {
                assert_eq!(ink.paths.len(), 2);
                assert_eq!(ink.color, Color::RED);
            }
            _ => unreachable!(),
        }
    }

    #[derive(Debug, Clone, Default)]
    struct RecordingHooks(Rc<RefCell<Vec<LifecycleEvent>>>);

    impl CommentHooks for RecordingHooks {
        fn on_attach(&mut self, id: AnnotationId, _kind: &AnnotationKind) {
            self.0.borrow_mut().push(LifecycleEvent::Attached(id));
        }

        fn on_detach(&mut self, id: AnnotationId) {
            self.0.borrow_mut().push(LifecycleEvent::Detached(id));
        }
    }

    #[test]
    fn comment_hooks_follow_the_lifecycle() {
        let now = Instant::now();
        let hooks = RecordingHooks::default();
        let mut engine =
            Engine::new(EngineConfig::default(), viewport()).with_hooks(Box::new(hooks.clone()));
        let comment = Annotation::new(
            AnnotationKind::Comment(CommentData {
                anchor: NormalizedPoint::new(0.5, 0.5),
                text: String::from("hi"),
                replies: vec![],
            }),
            "me",
            Timestamp::from_millis(1),
        );
        let id = comment.id;

        let _ = engine.insert_annotation(comment, now);
        let _ = engine.commit_pending();
        let _ = engine.select_all();
        let _ = engine.trash_selection(now);
        assert_eq!(
            *hooks.0.borrow(),
            vec![LifecycleEvent::Attached(id), LifecycleEvent::Detached(id)]
        );

        // undoing the trashing brings the comment back
        let _ = engine.undo();
        assert_eq!(hooks.0.borrow().last(), Some(&LifecycleEvent::Attached(id)));
    }
}
