// Imports
use std::fmt::Debug;

/// The result of a tool handling a pen event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventResult<T>
where
    T: Debug,
{
    /// Whether the event was handled, or ignored by the tool.
    pub handled: bool,
    /// The progress of the tool after the event.
    pub progress: T,
}

impl<T> EventResult<T>
where
    T: Debug,
{
    /// The event was handled.
    pub fn handled(progress: T) -> Self {
        Self {
            handled: true,
            progress,
        }
    }

    /// The event was ignored.
    pub fn ignored(progress: T) -> Self {
        Self {
            handled: false,
            progress,
        }
    }

    /// Maps the progress, keeping whether the event was handled.
    pub fn map<U: Debug>(self, f: impl FnOnce(T) -> U) -> EventResult<U> {
        EventResult {
            handled: self.handled,
            progress: f(self.progress),
        }
    }
}
