pub mod fixtures;
pub mod memory_origin;

use async_trait::async_trait;
pub use fixtures::*;
pub use memory_origin::MemoryOrigin;
pub use origin_source::StaticIdentity;
use origin_source::{IdentityError, IdentityProvider};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Install a test-writer subscriber once per test binary.
///
/// Honors `RUST_LOG`; defaults to `debug`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Identity provider whose every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingIdentity;

#[async_trait]
impl IdentityProvider for FailingIdentity {
    async fn current_user(&self) -> Result<Option<Uuid>, IdentityError> {
        Err(IdentityError::Unavailable("auth service unreachable".to_string()))
    }
}
