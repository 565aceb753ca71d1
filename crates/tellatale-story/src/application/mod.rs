//! Generation orchestration.

pub mod generator;
pub mod model_resolution;
