//! Core geometry primitives.
//!
//! Small, dependency-free building blocks shared by the simulation:
//! float vectors for positions/velocities and rectangles for bounds.

pub mod rect;
pub mod vec2;

// Re-export core types
pub use rect::Rect;
pub use vec2::Vec2;
