//! Request-scoped story types.

pub mod prompt;
pub mod request;
