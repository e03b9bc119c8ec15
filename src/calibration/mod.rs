//! Resolution-aware layout calibration.
//!
//! Selects a stored layout definition for the capture size and derives the
//! pixel boxes and grid geometry the scanner works with.

pub mod geometry;
pub mod layout;

pub use geometry::{CalibratedLayout, GridGeometry, PixelRect};
pub use layout::{LayoutDefinition, LayoutRepository};
