//! TellaTale Core: shared abstractions.
//!
//! This crate defines the types and traits the story generator and its
//! backends agree on. It contains no infrastructure code.

pub mod backend;
pub mod credential;
pub mod error;
pub mod language;
pub mod outcome;
pub mod params;
pub mod safety;
