//! Shared test fakes and utilities for TellaTale.

mod backend;

pub use backend::{FailingBackend, Script, ScriptedBackend};

use tellatale_core::credential::ApiKey;

/// A credential suitable for tests that need one to be configured.
#[must_use]
pub fn test_api_key() -> ApiKey {
    ApiKey::new("test-api-key").expect("literal key is non-empty")
}
