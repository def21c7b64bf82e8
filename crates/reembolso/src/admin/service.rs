use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

use crate::documents::repository::DocumentRepository;
use crate::domain::{Caller, UserId};
use crate::identity::IdentityProvider;
use crate::plans::repository::{DependentRepository, PlanRepository};
use crate::reimbursements::domain::{ReimbursementRequest, RequestFilter, RequestStatus};
use crate::reimbursements::repository::RequestRepository;
use crate::reports::admin::{admin_dashboard, AdminDashboard};
use crate::storage::FileStore;
use crate::store::{Page, PageRequest, RepositoryError};
use crate::users::{UserProfile, UserRepository, UserUpdate};

/// Administrative surface: platform aggregates and user management.
///
/// Every operation requires the admin flag from the identity service; a
/// non-admin caller is refused outright rather than shown a filtered view.
pub struct AdminService {
    users: Arc<dyn UserRepository>,
    plans: Arc<dyn PlanRepository>,
    dependents: Arc<dyn DependentRepository>,
    requests: Arc<dyn RequestRepository>,
    documents: Arc<dyn DocumentRepository>,
    files: Arc<dyn FileStore>,
    identity: Arc<dyn IdentityProvider>,
}

/// Per-account usage numbers shown on the admin user detail view.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserAccountStats {
    pub total_plans: usize,
    pub total_requests: usize,
    pub total_paid: Decimal,
    pub total_reimbursed: Decimal,
    pub by_status: BTreeMap<&'static str, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminUserDetail {
    #[serde(flatten)]
    pub user: UserProfile,
    pub stats: UserAccountStats,
}

impl AdminService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        plans: Arc<dyn PlanRepository>,
        dependents: Arc<dyn DependentRepository>,
        requests: Arc<dyn RequestRepository>,
        documents: Arc<dyn DocumentRepository>,
        files: Arc<dyn FileStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            users,
            plans,
            dependents,
            requests,
            documents,
            files,
            identity,
        }
    }

    pub fn dashboard(
        &self,
        caller: Caller,
        now: DateTime<Utc>,
    ) -> Result<AdminDashboard, AdminServiceError> {
        self.ensure_admin(caller)?;

        let users = self.users.list_all()?;
        let plans = self.plans.all()?;
        let requests = self.requests.all()?;
        let documents = self.documents.all()?;

        Ok(admin_dashboard(&users, &plans, &requests, &documents, now))
    }

    pub fn list_users(
        &self,
        caller: Caller,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<UserProfile>, AdminServiceError> {
        self.ensure_admin(caller)?;
        Ok(self.users.list(search, page)?)
    }

    pub fn get_user(
        &self,
        caller: Caller,
        id: UserId,
    ) -> Result<AdminUserDetail, AdminServiceError> {
        self.ensure_admin(caller)?;

        let user = self.users.fetch(id)?.ok_or(AdminServiceError::NotFound)?;
        let plan_ids: Vec<_> = self
            .plans
            .list_by_owner(id)?
            .into_iter()
            .map(|plan| plan.id)
            .collect();
        let requests = self
            .requests
            .list_all(&plan_ids, &RequestFilter::default())?;

        let mut stats = UserAccountStats {
            total_plans: plan_ids.len(),
            total_requests: requests.len(),
            ..UserAccountStats::default()
        };
        for request in &requests {
            stats.total_paid += request.amount_paid.unwrap_or(Decimal::ZERO);
            stats.total_reimbursed += request.amount_reimbursed.unwrap_or(Decimal::ZERO);
            *stats.by_status.entry(request.status.code()).or_default() += 1;
        }

        Ok(AdminUserDetail { user, stats })
    }

    pub fn update_user(
        &self,
        caller: Caller,
        id: UserId,
        update: UserUpdate,
    ) -> Result<UserProfile, AdminServiceError> {
        self.ensure_admin(caller)?;

        let mut user = self.users.fetch(id)?.ok_or(AdminServiceError::NotFound)?;
        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(is_admin) = update.is_admin {
            user.is_admin = is_admin;
        }

        self.users.update(user.clone())?;
        Ok(user)
    }

    /// Remove an account and everything it owns: documents with their blobs,
    /// requests, dependents, plans, the profile, and the identity record.
    pub fn delete_user(&self, caller: Caller, id: UserId) -> Result<(), AdminServiceError> {
        self.ensure_admin(caller)?;

        if caller.user_id == id {
            return Err(AdminServiceError::Validation(
                "you cannot delete your own account".to_string(),
            ));
        }
        let user = self.users.fetch(id)?.ok_or(AdminServiceError::NotFound)?;

        for plan in self.plans.list_by_owner(user.id)? {
            for request in self
                .requests
                .list_all(&[plan.id], &RequestFilter::default())?
            {
                for document in self.documents.list_by_request(request.id)? {
                    self.documents.delete(document.id)?;
                    self.remove_blob(&document.stored_name);
                }
                self.documents.unlink_request(request.id)?;
                self.requests.delete(request.id)?;
            }
            for dependent in self.dependents.list_by_plans(&[plan.id])? {
                self.dependents.delete(dependent.id)?;
            }
            self.plans.delete(plan.id)?;
        }

        for document in self.documents.list_recurrent(user.id, None)? {
            self.documents.unlink_document(document.id)?;
            self.documents.delete(document.id)?;
            self.remove_blob(&document.stored_name);
        }

        if let Err(err) = self.identity.delete_account(user.id) {
            warn!(user_id = %user.id, error = %err, "identity record removal failed");
        }
        self.users.delete(user.id)?;
        Ok(())
    }

    pub fn list_requests(
        &self,
        caller: Caller,
        status: Option<RequestStatus>,
        owner: Option<UserId>,
        page: PageRequest,
    ) -> Result<Page<ReimbursementRequest>, AdminServiceError> {
        self.ensure_admin(caller)?;

        let mut requests = self.requests.all()?;
        if let Some(status) = status {
            requests.retain(|request| request.status == status);
        }
        if let Some(owner) = owner {
            let plan_ids: Vec<_> = self
                .plans
                .list_by_owner(owner)?
                .into_iter()
                .map(|plan| plan.id)
                .collect();
            requests.retain(|request| plan_ids.contains(&request.plan_id));
        }
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(page.paginate(requests))
    }

    fn remove_blob(&self, stored_name: &str) {
        if let Err(err) = self.files.delete(stored_name) {
            warn!(%stored_name, error = %err, "failed to remove stored blob");
        }
    }

    fn ensure_admin(&self, caller: Caller) -> Result<(), AdminServiceError> {
        if caller.is_admin {
            Ok(())
        } else {
            Err(AdminServiceError::Forbidden)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AdminServiceError {
    #[error("administrative privilege required")]
    Forbidden,
    #[error("record not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl AdminServiceError {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Validation(_) => "validation_error",
            Self::Repository(_) => "repository_error",
        }
    }
}
