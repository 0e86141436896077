// Imports
use crate::annotation::{AnnotationId, AnnotationKind};

/// A comment thread item entered or left the live working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Attached(AnnotationId),
    Detached(AnnotationId),
}

/// Lifecycle hooks for the presentation layer, which owns the comment thread widgets.
///
/// Called synchronously by the engine whenever a comment or reply becomes live (inserted, merged, restored)
/// or stops being live (trashed).
pub trait CommentHooks: std::fmt::Debug {
    fn on_attach(&mut self, id: AnnotationId, kind: &AnnotationKind);

    fn on_detach(&mut self, id: AnnotationId);
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl CommentHooks for NoopHooks {
    fn on_attach(&mut self, _id: AnnotationId, _kind: &AnnotationKind) {}

    fn on_detach(&mut self, _id: AnnotationId) {}
}
