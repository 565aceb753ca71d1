//! Route modules.

pub mod health;
pub mod index;
pub mod tale;
