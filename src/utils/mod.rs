//! Utility modules for drone_gnc

pub mod grid_map;
pub mod visualization;

pub use grid_map::*;
pub use visualization::{colors, PathStyle, PointStyle, Visualizer};
