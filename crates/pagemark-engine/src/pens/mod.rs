// Modules
pub mod eraser;
pub mod penbehaviour;
pub mod selector;

// Re-exports
pub use eraser::Eraser;
pub use penbehaviour::PenBehaviour;
pub use selector::Selector;

// Imports
use crate::engine::EngineViewMut;
use crate::WidgetFlags;
use core::fmt::Display;
use pagemark_compose::penevent::PenProgress;
use pagemark_compose::EventResult;
use pagemark_compose::PenEvent;
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Debug)]
pub enum Pen {
    Selector(Selector),
    Eraser(Eraser),
}

impl Default for Pen {
    fn default() -> Self {
        Self::Selector(Selector::default())
    }
}

impl PenBehaviour for Pen {
    fn style(&self) -> PenStyle {
        match self {
            Pen::Selector(selector) => selector.style(),
            Pen::Eraser(eraser) => eraser.style(),
        }
    }

    fn deinit(&mut self, now: Instant, engine_view: &mut EngineViewMut) -> WidgetFlags {
        match self {
            Pen::Selector(selector) => selector.deinit(now, engine_view),
            Pen::Eraser(eraser) => eraser.deinit(now, engine_view),
        }
    }

    fn handle_event(
        &mut self,
        event: PenEvent,
        now: Instant,
        engine_view: &mut EngineViewMut,
    ) -> (EventResult<PenProgress>, WidgetFlags) {
        match self {
            Pen::Selector(selector) => selector.handle_event(event, now, engine_view),
            Pen::Eraser(eraser) => eraser.handle_event(event, now, engine_view),
        }
    }

    fn in_progress(&self) -> bool {
        match self {
            Pen::Selector(selector) => selector.in_progress(),
            Pen::Eraser(eraser) => eraser.in_progress(),
        }
    }
}

impl Pen {
    /// A new pen with default state for the style.
    pub fn new(style: PenStyle) -> Self {
        match style {
            PenStyle::Selector => Self::Selector(Selector::default()),
            PenStyle::Eraser => Self::Eraser(Eraser::default()),
        }
    }
}

#[derive(
    Eq,
    PartialEq,
    Clone,
    Copy,
    Debug,
    Serialize,
    Deserialize,
    PartialOrd,
    Ord,
    Hash,
    num_derive::FromPrimitive,
    num_derive::ToPrimitive,
)]
#[serde(rename = "pen_style")]
pub enum PenStyle {
    #[serde(rename = "selector")]
    Selector,
    #[serde(rename = "eraser")]
    Eraser,
}

impl Default for PenStyle {
    fn default() -> Self {
        Self::Selector
    }
}

impl TryFrom<u32> for PenStyle {
    type Error = anyhow::Error;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        num_traits::FromPrimitive::from_u32(value)
            .ok_or_else(|| anyhow::anyhow!("PenStyle try_from::<u32>() for value {} failed", value))
    }
}

impl std::str::FromStr for PenStyle {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "selector" => Ok(Self::Selector),
            "eraser" => Ok(Self::Eraser),
            s => Err(anyhow::anyhow!(
                "Creating PenStyle from &str failed, invalid name {s}"
            )),
        }
    }
}

impl Display for PenStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PenStyle::Selector => write!(f, "selector"),
            PenStyle::Eraser => write!(f, "eraser"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pen_style_names() {
        for style in [PenStyle::Selector, PenStyle::Eraser] {
            assert_eq!(style.to_string().parse::<PenStyle>().unwrap(), style);
        }
        assert!("brush".parse::<PenStyle>().is_err());
        assert_eq!(PenStyle::try_from(1).unwrap(), PenStyle::Eraser);
    }
}
