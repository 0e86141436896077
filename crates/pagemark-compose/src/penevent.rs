// Imports
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A sampled pointer position, in page-local pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename = "element")]
pub struct Element {
    /// The position.
    #[serde(rename = "pos")]
    pub pos: na::Vector2<f64>,
}

impl Element {
    /// A new element.
    pub fn new(pos: na::Vector2<f64>) -> Self {
        Self { pos }
    }
}

/// A Pen Event.
///
/// There is no "motion" event, the events are stateless. Motion events would only be valid when preceded by a
/// down event, so instead down events are emitted repeatedly while the pen is pressed down and being moved.
/// The tools receiving the events hold the state.
#[derive(Debug, Clone)]
pub enum PenEvent {
    /// A pen down event. Is repeatedly emitted while the pen is pressed down and moved.
    Down {
        /// The element for the down event.
        element: Element,
        /// Modifier keys pressed during the event.
        modifier_keys: HashSet<ModifierKey>,
    },
    /// A pen up event.
    Up {
        /// The element for the up event.
        element: Element,
        /// Modifier keys pressed during the event.
        modifier_keys: HashSet<ModifierKey>,
    },
    /// A proximity event. Is repeatedly emitted while the pen is in proximity and moved.
    Proximity {
        /// The element for the proximity event.
        element: Element,
        /// Modifier keys pressed during the event.
        modifier_keys: HashSet<ModifierKey>,
    },
    /// Cancel event when the pen vanishes unexpectedly, for example when released outside of the drawing surface.
    ///
    /// Should finish all current actions and reset all state.
    Cancel,
}

/// A modifier key.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename = "modifier_key")]
pub enum ModifierKey {
    /// Shift.
    #[serde(rename = "keyboard_shift")]
    KeyboardShift,
    /// Ctrl.
    #[serde(rename = "keyboard_ctrl")]
    KeyboardCtrl,
    /// Alt.
    #[serde(rename = "keyboard_alt")]
    KeyboardAlt,
}

/// The pen progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PenProgress {
    /// In idle state.
    Idle,
    /// In progress state.
    InProgress,
    /// Pen is finished.
    Finished,
}
