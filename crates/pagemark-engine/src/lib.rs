#![warn(missing_debug_implementations)]
#![allow(clippy::single_match)]
#![allow(clippy::derivable_impls)]

//! The pagemark-engine crate is the core of pagemark. It holds the annotation store, the selection, the eraser,
//! the tools and the undo/redo history.
//!
//! The main entry point is the [Engine] struct.

// Modules
pub mod annotation;
pub mod changelog;
pub mod config;
pub mod engine;
pub mod eraser;
pub mod hooks;
pub mod pens;
pub mod permissions;
pub mod selection;
pub mod store;
pub mod timestamp;
pub mod widgetflags;

// Re-exports
pub use annotation::{Annotation, AnnotationId, AnnotationKind};
pub use changelog::{Change, ChangeAction, ChangeLog, History};
pub use config::EngineConfig;
pub use engine::Engine;
pub use hooks::CommentHooks;
pub use permissions::PermissionOracle;
pub use selection::SelectionSet;
pub use store::AnnotationStore;
pub use timestamp::Timestamp;
pub use widgetflags::WidgetFlags;

// Renames
extern crate nalgebra as na;
extern crate parry2d_f64 as p2d;
