use chrono::{DateTime, Utc};

use crate::domain::{DependentId, PlanId, RequestId};
use crate::store::{Page, PageRequest, RepositoryError};

use super::domain::{ReimbursementRequest, RequestFilter};

/// Storage abstraction for reimbursement requests.
///
/// Listings are scoped to the caller's plan set resolved by the service
/// layer; `advance_reminder` is the conditional write backing the reminder
/// sweep's overlap guard.
pub trait RequestRepository: Send + Sync {
    fn insert(
        &self,
        request: ReimbursementRequest,
    ) -> Result<ReimbursementRequest, RepositoryError>;
    fn update(&self, request: ReimbursementRequest) -> Result<(), RepositoryError>;
    fn fetch(&self, id: RequestId) -> Result<Option<ReimbursementRequest>, RepositoryError>;
    /// Newest-first page of matching requests across the given plans.
    fn list(
        &self,
        plans: &[PlanId],
        filter: &RequestFilter,
        page: PageRequest,
    ) -> Result<Page<ReimbursementRequest>, RepositoryError>;
    /// Full matching set across the given plans, for reporting.
    fn list_all(
        &self,
        plans: &[PlanId],
        filter: &RequestFilter,
    ) -> Result<Vec<ReimbursementRequest>, RepositoryError>;
    fn exists_for_plan(&self, plan: PlanId) -> Result<bool, RepositoryError>;
    fn exists_for_dependent(&self, dependent: DependentId) -> Result<bool, RepositoryError>;
    /// Requests awaiting supplemental documentation with a seeded reminder
    /// clock — the reminder sweep's working set.
    fn pending_supplemental(&self) -> Result<Vec<ReimbursementRequest>, RepositoryError>;
    /// Compare-and-set on `last_reminder_at`: advances to `to` only while the
    /// stored value still equals `expected`. Returns whether the write won.
    fn advance_reminder(
        &self,
        id: RequestId,
        expected: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;
    fn delete(&self, id: RequestId) -> Result<(), RepositoryError>;
    fn all(&self) -> Result<Vec<ReimbursementRequest>, RepositoryError>;
}
