// Modules
mod arrow;
mod circle;

// Re-exports
pub use arrow::Arrow;
pub use circle::{Circle, Crossing, CrossingKind};
