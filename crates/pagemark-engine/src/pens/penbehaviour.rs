// Imports
use super::PenStyle;
use crate::engine::EngineViewMut;
use crate::WidgetFlags;
use pagemark_compose::penevent::{PenEvent, PenProgress};
use pagemark_compose::EventResult;
use std::time::Instant;

/// Types that are pens.
pub trait PenBehaviour {
    // The pen style.
    fn style(&self) -> PenStyle;

    /// Deinit the pen.
    ///
    /// Finishes a gesture that is still in progress, so nothing already done is lost when switching tools.
    fn deinit(&mut self, now: Instant, engine_view: &mut EngineViewMut) -> WidgetFlags;

    /// Handle a pen event.
    fn handle_event(
        &mut self,
        event: PenEvent,
        now: Instant,
        engine_view: &mut EngineViewMut,
    ) -> (EventResult<PenProgress>, WidgetFlags);

    /// Whether a gesture is in progress.
    fn in_progress(&self) -> bool;
}
