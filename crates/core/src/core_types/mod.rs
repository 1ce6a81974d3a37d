//! Core types and utilities

pub mod color;
pub mod feature;
pub mod geometry;

pub use color::*;
pub use feature::*;
pub use geometry::{lerp, Vec2};
