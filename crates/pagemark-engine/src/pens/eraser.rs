// Imports
use super::PenBehaviour;
use super::PenStyle;
use crate::config::EraserStyle;
use crate::engine::EngineViewMut;
use crate::eraser::{self, StrokeEraser};
use crate::WidgetFlags;
use pagemark_compose::penevent::{Element, PenEvent, PenProgress};
use pagemark_compose::EventResult;
use std::time::Instant;

#[derive(Debug, Clone, Copy)]
pub enum EraserState {
    Up,
    Proximity(Element),
    /// The style is fixed for the whole gesture.
    Down {
        style: EraserStyle,
        element: Element,
    },
}

#[derive(Clone, Debug)]
pub struct Eraser {
    pub(crate) state: EraserState,
    stroke_eraser: StrokeEraser,
}

impl Default for Eraser {
    fn default() -> Self {
        Self {
            state: EraserState::Up,
            stroke_eraser: StrokeEraser::default(),
        }
    }
}

impl PenBehaviour for Eraser {
    fn style(&self) -> PenStyle {
        PenStyle::Eraser
    }

    fn deinit(&mut self, now: Instant, engine_view: &mut EngineViewMut) -> WidgetFlags {
        let widget_flags = self.finish(now, engine_view);
        self.state = EraserState::Up;
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
            (EraserState::Up | EraserState::Proximity(_), PenEvent::Down { element, .. }) => {
                let style = engine_view.config.eraser_config.style;
                if style == EraserStyle::SplitStrokes {
                    self.stroke_eraser
                        .start(engine_view.store, engine_view.oracle);
                }
                self.state = EraserState::Down { style, element };
                widget_flags |= self.erase(element, now, engine_view);
                EventResult::handled(PenProgress::InProgress)
            }
            (EraserState::Down { element: current, .. }, PenEvent::Down { element, .. }) => {
                *current = element;
                widget_flags |= self.erase(element, now, engine_view);
                EventResult::handled(PenProgress::InProgress)
            }
            (EraserState::Down { .. }, PenEvent::Up { element, .. }) => {
                widget_flags |= self.erase(element, now, engine_view);
                widget_flags |= self.finish(now, engine_view);
                self.state = EraserState::Up;
                EventResult::handled(PenProgress::Finished)
            }
            (EraserState::Down { .. }, PenEvent::Cancel) => {
                widget_flags |= self.finish(now, engine_view);
                self.state = EraserState::Up;
                EventResult::handled(PenProgress::Finished)
            }
            (EraserState::Down { .. }, PenEvent::Proximity { .. }) => {
                // the pen left the surface without an up event
                widget_flags |= self.finish(now, engine_view);
                self.state = EraserState::Up;
                EventResult::handled(PenProgress::Finished)
            }
            (EraserState::Up | EraserState::Proximity(_), PenEvent::Proximity { element, .. }) => {
                self.state = EraserState::Proximity(element);
                EventResult::ignored(PenProgress::Idle)
            }
            (EraserState::Proximity(_), PenEvent::Up { .. } | PenEvent::Cancel) => {
                self.state = EraserState::Up;
                EventResult::ignored(PenProgress::Idle)
            }
            (EraserState::Up, PenEvent::Up { .. } | PenEvent::Cancel) => {
                EventResult::ignored(PenProgress::Idle)
            }
        };

        (event_result, widget_flags)
    }

    fn in_progress(&self) -> bool {
        matches!(self.state, EraserState::Down { .. })
    }
}

impl Eraser {
    fn erase(&mut self, element: Element, now: Instant, engine_view: &mut EngineViewMut) -> WidgetFlags {
        let EraserState::Down { style, .. } = self.state else {
            return WidgetFlags::default();
        };
        let eraser_config = &engine_view.config.eraser_config;

        match style {
            EraserStyle::WholeObject => eraser::erase_whole_objects(
                element.pos,
                eraser_config.tolerance,
                engine_view.viewport,
                engine_view.store,
                engine_view.oracle,
                now,
            ),
            EraserStyle::SplitStrokes => self.stroke_eraser.sample(
                element.pos,
                now,
                engine_view.viewport,
                eraser_config,
                engine_view.store,
            ),
        }
    }

    /// Commits what the current gesture erased.
    fn finish(&mut self, now: Instant, engine_view: &mut EngineViewMut) -> WidgetFlags {
        self.stroke_eraser.finish(
            now,
            engine_view.viewport,
            &engine_view.config.eraser_config,
            engine_view.store,
            engine_view.oracle,
        )
    }
}
