// Imports
use super::PenBehaviour;
use super::PenStyle;
use crate::annotation::{AnnotationKind, ArrowEnd, Handle, ResizeCorner};
use crate::engine::EngineViewMut;
use crate::store::AnnotationKey;
use crate::WidgetFlags;
use p2d::bounding_volume::Aabb;
use pagemark_compose::ext::AabbExt;
use pagemark_compose::penevent::{ModifierKey, PenEvent, PenProgress};
use pagemark_compose::EventResult;
use std::collections::HashSet;
use std::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum SelectorState {
    Idle,
    /// Rubber band selection.
    Selecting {
        start_pos: na::Vector2<f64>,
        current_pos: na::Vector2<f64>,
    },
    ModifySelection {
        handle: Handle,
        start_pos: na::Vector2<f64>,
        current_pos: na::Vector2<f64>,
        /// An already selected annotation that was clicked. Toggled on release if the pointer was not dragged.
        clicked: Option<AnnotationKey>,
        additive: bool,
        dragged: bool,
    },
}

impl Default for SelectorState {
    fn default() -> Self {
        Self::Idle
    }
}

#[derive(Clone, Debug, Default)]
pub struct Selector {
    pub(super) state: SelectorState,
}

impl PenBehaviour for Selector {
    fn style(&self) -> PenStyle {
        PenStyle::Selector
    }

    fn deinit(&mut self, now: Instant, engine_view: &mut EngineViewMut) -> WidgetFlags {
        let widget_flags = self.finish_modify(now, engine_view);
        self.state = SelectorState::Idle;
        widget_flags
    }

    fn handle_event(
        &mut self,
        event: PenEvent,
        now: Instant,
        engine_view: &mut EngineViewMut,
    ) -> (EventResult<PenProgress>, WidgetFlags) {
        let mut widget_flags = WidgetFlags::default();

        let event_result = match (&mut self.state, event) {
            (
                SelectorState::Idle,
                PenEvent::Down {
                    element,
                    modifier_keys,
                },
            ) => {
                widget_flags |= self.start(element.pos, &modifier_keys, engine_view);
                EventResult::handled(PenProgress::InProgress)
            }
            (SelectorState::Selecting { current_pos, .. }, PenEvent::Down { element, .. }) => {
                *current_pos = element.pos;
                widget_flags.redraw = true;
                EventResult::handled(PenProgress::InProgress)
            }
            (SelectorState::Selecting { start_pos, .. }, PenEvent::Up { element, .. }) => {
                let band = Aabb::new_positive((*start_pos).into(), element.pos.into());
                for key in engine_view
                    .store
                    .keys_in_rect(band, engine_view.viewport)
                {
                    engine_view.selection.add(key);
                }
                self.state = SelectorState::Idle;
                widget_flags.selection_changed = true;
                widget_flags.redraw = true;
                EventResult::handled(PenProgress::Finished)
            }
            (
                SelectorState::ModifySelection {
                    handle,
                    start_pos,
                    current_pos,
                    dragged,
                    ..
                },
                PenEvent::Down {
                    element,
                    modifier_keys,
                },
            ) => {
                *current_pos = element.pos;
                let offset = element.pos - *start_pos;
                if !*dragged && offset.norm() > Self::DRAG_THRESHOLD {
                    *dragged = true;
                }
                if *dragged {
                    widget_flags |= Self::modify(*handle, offset, &modifier_keys, now, engine_view);
                }
                EventResult::handled(PenProgress::InProgress)
            }
            (
                SelectorState::ModifySelection {
                    handle,
                    start_pos,
                    current_pos,
                    dragged,
                    ..
                },
                PenEvent::Up {
                    element,
                    modifier_keys,
                },
            ) => {
                *current_pos = element.pos;
                let offset = element.pos - *start_pos;
                if *dragged || offset.norm() > Self::DRAG_THRESHOLD {
                    *dragged = true;
                    widget_flags |= Self::modify(*handle, offset, &modifier_keys, now, engine_view);
                }
                widget_flags |= self.finish_modify(now, engine_view);
                self.state = SelectorState::Idle;
                EventResult::handled(PenProgress::Finished)
            }
            (
                SelectorState::Selecting { .. } | SelectorState::ModifySelection { .. },
                PenEvent::Cancel | PenEvent::Proximity { .. },
            ) => {
                widget_flags |= self.finish_modify(now, engine_view);
                self.state = SelectorState::Idle;
                widget_flags.redraw = true;
                EventResult::handled(PenProgress::Finished)
            }
            (
                SelectorState::Idle,
                PenEvent::Up { .. } | PenEvent::Proximity { .. } | PenEvent::Cancel,
            ) => EventResult::ignored(PenProgress::Idle),
        };

        (event_result, widget_flags)
    }

    fn in_progress(&self) -> bool {
        self.state != SelectorState::Idle
    }
}

impl Selector {
    /// The size of the resize and endpoint handles in pixels.
    const HANDLE_SIZE: f64 = 12.0;
    /// Pointer movements up to this distance in pixels are clicks, not drags.
    const DRAG_THRESHOLD: f64 = 2.0;

    fn start(
        &mut self,
        pos: na::Vector2<f64>,
        modifier_keys: &HashSet<ModifierKey>,
        engine_view: &mut EngineViewMut,
    ) -> WidgetFlags {
        let mut widget_flags = WidgetFlags::default();
        let additive = modifier_keys.contains(&ModifierKey::KeyboardShift);
        let tolerance = engine_view.config.selector_config.hit_tolerance;

        let (handle, clicked) = if let Some(handle) = Self::handle_at(pos, engine_view) {
            (handle, None)
        } else if let Some(key) = engine_view
            .store
            .hit_test(pos, engine_view.viewport, tolerance)
        {
            engine_view.store.update_chrono_to_last(key);
            widget_flags.redraw = true;

            if engine_view.selection.has(key) {
                (Handle::Move, Some(key))
            } else {
                engine_view.selection.toggle(key, additive);
                widget_flags.selection_changed = true;
                (Handle::Move, None)
            }
        } else {
            if !additive && !engine_view.selection.is_empty() {
                engine_view.selection.clear();
                widget_flags.selection_changed = true;
                widget_flags.redraw = true;
            }
            self.state = SelectorState::Selecting {
                start_pos: pos,
                current_pos: pos,
            };
            return widget_flags;
        };

        debug!("Starting to modify the selection with handle {handle:?}");
        engine_view.selection.start_gesture(
            engine_view.store,
            engine_view.config.geometry_limits(*engine_view.viewport),
        );
        self.state = SelectorState::ModifySelection {
            handle,
            start_pos: pos,
            current_pos: pos,
            clicked,
            additive,
            dragged: false,
        };

        widget_flags
    }

    /// The handle under the position.
    ///
    /// The endpoints of a single selected arrow take precedence over the resize corners of the selection bounds.
    fn handle_at(pos: na::Vector2<f64>, engine_view: &EngineViewMut) -> Option<Handle> {
        let tolerance = engine_view.config.selector_config.hit_tolerance;
        let half_size = Self::HANDLE_SIZE * 0.5;

        if let [key] = engine_view.selection.keys() {
            if let Some(AnnotationKind::Arrow(arrow)) =
                engine_view.store.get(*key).map(|annotation| &annotation.kind)
            {
                for end in [ArrowEnd::Target, ArrowEnd::Source] {
                    if (arrow.endpoint(end, engine_view.viewport) - pos).norm() <= half_size + tolerance {
                        return Some(Handle::Endpoint(end));
                    }
                }
            }
        }

        let bounds = engine_view
            .selection
            .bounds(engine_view.store, engine_view.viewport)?;
        ResizeCorner::ALL
            .into_iter()
            .find(|corner| {
                Aabb::from_half_extents(
                    corner.pos_on(&bounds).into(),
                    na::Vector2::repeat(half_size),
                )
                .contains_pos_w_tolerance(pos, tolerance)
            })
            .map(Handle::Corner)
    }

    /// Applies the total pointer offset of the gesture to the selection.
    fn modify(
        handle: Handle,
        offset: na::Vector2<f64>,
        modifier_keys: &HashSet<ModifierKey>,
        now: Instant,
        engine_view: &mut EngineViewMut,
    ) -> WidgetFlags {
        let selection = &*engine_view.selection;

        match handle {
            Handle::Move => selection.move_by(offset, engine_view.store, engine_view.oracle, now),
            Handle::Corner(corner) => {
                let proportional = engine_view.config.selector_config.resize_lock_aspectratio
                    || modifier_keys.contains(&ModifierKey::KeyboardCtrl);
                selection.resize(
                    corner,
                    offset,
                    proportional,
                    engine_view.store,
                    engine_view.oracle,
                    now,
                )
            }
            Handle::Endpoint(end) => {
                selection.point(end, offset, engine_view.store, engine_view.oracle, now)
            }
        }
    }

    /// Ends a modification of the selection.
    ///
    /// Dragged selections get the snap pass, clicked members are toggled.
    fn finish_modify(&mut self, now: Instant, engine_view: &mut EngineViewMut) -> WidgetFlags {
        let mut widget_flags = WidgetFlags::default();

        let SelectorState::ModifySelection {
            handle,
            clicked,
            additive,
            dragged,
            ..
        } = self.state
        else {
            return widget_flags;
        };

        if dragged {
            let limits = engine_view.config.geometry_limits(*engine_view.viewport);
            widget_flags |= engine_view.selection.check_for_out_of_bounds(
                engine_view.config.selector_config.snap_margin,
                handle,
                &limits,
                engine_view.store,
                engine_view.oracle,
                now,
            );
        }
        engine_view.selection.finish_gesture(engine_view.store);

        if let (false, Some(key)) = (dragged, clicked) {
            engine_view.selection.toggle(key, additive);
            widget_flags.selection_changed = true;
        }

        self.state = SelectorState::Idle;
        widget_flags.redraw = true;
        widget_flags
    }
}
