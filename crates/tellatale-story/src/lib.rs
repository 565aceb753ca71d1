//! TellaTale: story composition and generation.
//!
//! Responsible for validating a parent's topic, composing the full prompt,
//! and running it through a generation backend in buffered or streaming
//! mode.

pub mod application;
pub mod domain;
