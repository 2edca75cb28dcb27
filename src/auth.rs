//! Identity collaborator
//!
//! Token issuance is out of scope; a token is an opaque string stored on the
//! user record.

use crate::core::User;
use crate::error::{Result, ServiceDeskError};
use crate::storage::{Storage, UserRepository};
use std::sync::Arc;

/// Resolves a credential to an active user
#[cfg_attr(test, mockall::automock)]
pub trait Authenticator: Send + Sync {
    /// Fails with `Unauthenticated` when the token matches no active user
    fn authenticate(&self, token: &str) -> Result<User>;
}

/// Looks tokens up in the user repository
pub struct TokenAuthenticator {
    storage: Arc<dyn Storage>,
}

impl TokenAuthenticator {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }
}

impl Authenticator for TokenAuthenticator {
    fn authenticate(&self, token: &str) -> Result<User> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ServiceDeskError::Unauthenticated);
        }
        self.storage
            .find_by_token(token)?
            .ok_or(ServiceDeskError::Unauthenticated)
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value
#[must_use]
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
