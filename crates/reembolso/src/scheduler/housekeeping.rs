//! Daily cleanup of accounts that never confirmed their e-mail address.
//!
//! Best-effort: a user confirming in the narrow window between the check
//! and the delete may still be purged — the reference behavior carries the
//! same race and it is documented rather than locked (DESIGN.md).

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::identity::{IdentityError, IdentityProvider};
use crate::users::{UserProfile, UserRepository};

pub struct AccountPurge {
    users: Arc<dyn UserRepository>,
    identity: Arc<dyn IdentityProvider>,
    grace: Duration,
}

/// Outcome counters for one purge run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PurgeSummary {
    pub examined: usize,
    pub purged: usize,
    pub retained: usize,
    pub failed: usize,
}

impl AccountPurge {
    pub fn new(
        users: Arc<dyn UserRepository>,
        identity: Arc<dyn IdentityProvider>,
        grace: Duration,
    ) -> Self {
        Self {
            users,
            identity,
            grace,
        }
    }

    pub fn run(&self, now: DateTime<Utc>) -> PurgeSummary {
        let cutoff = now - self.grace;
        let candidates = match self.users.created_before(cutoff) {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(error = %err, "housekeeping sweep could not read stale profiles");
                return PurgeSummary::default();
            }
        };

        let mut summary = PurgeSummary::default();
        for user in candidates {
            summary.examined += 1;

            match self.identity.confirmed_at(user.id) {
                Ok(Some(_)) => summary.retained += 1,
                Ok(None) => match self.purge(&user) {
                    Ok(()) => {
                        info!(user_id = %user.id, email = %user.email, "purged unconfirmed account");
                        summary.purged += 1;
                    }
                    Err(err) => {
                        warn!(user_id = %user.id, error = %err, "failed to purge unconfirmed account");
                        summary.failed += 1;
                    }
                },
                // Identity record already gone; clean up the orphaned profile.
                Err(IdentityError::UnknownAccount) => match self.users.delete(user.id) {
                    Ok(()) => summary.purged += 1,
                    Err(err) => {
                        warn!(user_id = %user.id, error = %err, "failed to remove orphaned profile");
                        summary.failed += 1;
                    }
                },
                Err(err) => {
                    warn!(user_id = %user.id, error = %err, "could not check confirmation state");
                    summary.failed += 1;
                }
            }
        }

        summary
    }

    fn purge(&self, user: &UserProfile) -> Result<(), Box<dyn std::error::Error>> {
        self.identity.delete_account(user.id)?;
        self.users.delete(user.id)?;
        Ok(())
    }
}
