pub mod config;
pub mod error;
pub mod gdml;
pub mod math;
pub mod operations;
pub mod registry;
pub mod subsystems;

pub use error::{GeometryError, Result};
