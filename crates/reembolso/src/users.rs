//! Profile records mirrored from the identity service.
//!
//! The core keeps the slice it needs for the admin surface and the
//! unconfirmed-account purge; authentication itself stays external.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::UserId;
use crate::store::{Page, PageRequest, RepositoryError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Field-wise profile update; absent fields stay untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub is_admin: Option<bool>,
}

pub trait UserRepository: Send + Sync {
    fn insert(&self, user: UserProfile) -> Result<UserProfile, RepositoryError>;
    fn update(&self, user: UserProfile) -> Result<(), RepositoryError>;
    fn fetch(&self, id: UserId) -> Result<Option<UserProfile>, RepositoryError>;
    /// Newest-first listing with an optional case-insensitive name/e-mail search.
    fn list(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<UserProfile>, RepositoryError>;
    fn list_all(&self) -> Result<Vec<UserProfile>, RepositoryError>;
    /// Profiles created strictly before the cutoff, for the housekeeping sweep.
    fn created_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<UserProfile>, RepositoryError>;
    fn delete(&self, id: UserId) -> Result<(), RepositoryError>;
}
