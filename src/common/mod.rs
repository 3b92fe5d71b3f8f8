//! Common types, traits, error and parameter definitions for drone_gnc
//!
//! This module provides the foundational building blocks used across
//! the planners, controllers, estimators and the simulation driver.

pub mod types;
pub mod traits;
pub mod error;
pub mod params;

pub use types::*;
pub use traits::*;
pub use error::*;
