use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),
    #[error("Session rejected: {0}")]
    Rejected(String),
}

/// Supplies the signed-in user, if any.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_user(&self) -> Result<Option<Uuid>, IdentityError>;
}

pub type SharedIdentity = Arc<dyn IdentityProvider>;

/// Identity fixed at construction; switchable for sign-in/sign-out.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    user: Arc<RwLock<Option<Uuid>>>,
}

impl StaticIdentity {
    pub fn signed_in(user_id: Uuid) -> Self {
        Self {
            user: Arc::new(RwLock::new(Some(user_id))),
        }
    }

    pub fn anonymous() -> Self { Self::default() }

    pub fn set_user(&self, user_id: Option<Uuid>) {
        match self.user.write() {
            Ok(mut guard) => *guard = user_id,
            Err(poisoned) => *poisoned.into_inner() = user_id,
        }
    }

    pub fn shared(&self) -> SharedIdentity { Arc::new(self.clone()) }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_user(&self) -> Result<Option<Uuid>, IdentityError> {
        match self.user.read() {
            Ok(guard) => Ok(*guard),
            Err(poisoned) => Ok(*poisoned.into_inner()),
        }
    }
}
