#![warn(missing_debug_implementations)]
#![warn(missing_docs)]
#![allow(clippy::single_match)]

//! The pagemark-compose crate provides the geometric building blocks of pagemark: the viewport, conversions
//! between normalized document coordinates and pixel coordinates, arrow head and eraser circle geometry
//! and pen events.

// Modules
/// colors
pub mod color;
/// conversions between normalized and pixel geometry
pub mod coordspace;
/// Event result.
pub mod eventresult;
/// module for extension traits for foreign types
pub mod ext;
/// module for pen events
pub mod penevent;
/// module for shapes
pub mod shapes;
/// the viewport
pub mod viewport;

// Re-exports
pub use color::Color;
pub use coordspace::{NormalizedPath, NormalizedPoint, NormalizedRect, PixelRect};
pub use eventresult::EventResult;
pub use penevent::PenEvent;
pub use viewport::Viewport;

// Renames
extern crate nalgebra as na;
extern crate parry2d_f64 as p2d;
