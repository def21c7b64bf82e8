//! Boundary to the external identity service.
//!
//! Credentials are opaque here: the provider is authoritative for the user
//! id and admin flag, and the core never parses token contents itself.

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};

use crate::domain::{Caller, UserId};

pub trait IdentityProvider: Send + Sync {
    /// Resolve a bearer credential to the calling principal.
    fn authenticate(&self, bearer: &str) -> Result<Caller, IdentityError>;

    /// When the account confirmed its e-mail address, if ever.
    fn confirmed_at(&self, user: UserId) -> Result<Option<DateTime<Utc>>, IdentityError>;

    /// Remove the account from the identity service.
    fn delete_account(&self, user: UserId) -> Result<(), IdentityError>;
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("invalid or expired credential")]
    InvalidCredential,
    #[error("account not found")]
    UnknownAccount,
    #[error("identity service unavailable: {0}")]
    Unavailable(String),
}

/// Extract the bearer token from request headers, if present.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authenticate a request against the provider.
pub fn authenticate(
    identity: &dyn IdentityProvider,
    headers: &HeaderMap,
) -> Result<Caller, IdentityError> {
    let token = bearer_token(headers).ok_or(IdentityError::InvalidCredential)?;
    identity.authenticate(token)
}
