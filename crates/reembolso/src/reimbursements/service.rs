use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::catalog::DocumentKind;
use crate::documents::domain::Document;
use crate::documents::repository::{active_documents_for_request, DocumentRepository};
use crate::domain::{Caller, PlanId, RequestId};
use crate::notify::{DocumentPackageNotice, NotificationSender, NotifyError};
use crate::plans::domain::Plan;
use crate::plans::repository::{DependentRepository, PlanRepository};
use crate::storage::FileStore;
use crate::store::{Page, PageRequest, RepositoryError};

use super::completeness::{self, CompletenessView};
use super::domain::{
    NewRequest, ReimbursementRequest, RequestFilter, RequestStatus, RequestUpdate,
};
use super::lifecycle;
use super::repository::RequestRepository;

/// Service owning the reimbursement lifecycle: creation, edits, status
/// transitions, deletion cascade, and the insurer send.
pub struct RequestService {
    requests: Arc<dyn RequestRepository>,
    plans: Arc<dyn PlanRepository>,
    dependents: Arc<dyn DependentRepository>,
    documents: Arc<dyn DocumentRepository>,
    files: Arc<dyn FileStore>,
    notifier: Arc<dyn NotificationSender>,
    default_reminder_interval_days: i64,
}

/// Request plus its active documents and completeness snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct RequestDetail {
    #[serde(flatten)]
    pub request: ReimbursementRequest,
    pub documents: Vec<Document>,
    pub completeness: CompletenessView,
}

impl RequestService {
    pub fn new(
        requests: Arc<dyn RequestRepository>,
        plans: Arc<dyn PlanRepository>,
        dependents: Arc<dyn DependentRepository>,
        documents: Arc<dyn DocumentRepository>,
        files: Arc<dyn FileStore>,
        notifier: Arc<dyn NotificationSender>,
        default_reminder_interval_days: i64,
    ) -> Self {
        Self {
            requests,
            plans,
            dependents,
            documents,
            files,
            notifier,
            default_reminder_interval_days,
        }
    }

    pub fn create(
        &self,
        caller: Caller,
        new_request: NewRequest,
        now: DateTime<Utc>,
    ) -> Result<ReimbursementRequest, RequestServiceError> {
        let plan = self.owned_plan(caller, new_request.plan_id)?;

        let dependent = self
            .dependents
            .fetch(new_request.dependent_id)?
            .ok_or(RequestServiceError::NotFound)?;
        if dependent.plan_id != plan.id {
            return Err(RequestServiceError::InvalidAssociation(
                "dependent does not belong to the selected plan",
            ));
        }

        let request = ReimbursementRequest {
            id: RequestId::generate(),
            plan_id: plan.id,
            dependent_id: dependent.id,
            attendance_type: new_request.attendance_type,
            specialty: new_request.specialty,
            physician: new_request.physician,
            facility: new_request.facility,
            attendance_date: new_request.attendance_date,
            attendance_end_date: new_request.attendance_end_date,
            amount_paid: new_request.amount_paid,
            amount_reimbursed: None,
            protocol_number: None,
            status: RequestStatus::Started,
            notes: new_request.notes,
            pending_docs_description: None,
            reminder_interval_days: self.default_reminder_interval_days,
            last_reminder_at: None,
            created_at: now,
            updated_at: now,
        };

        Ok(self.requests.insert(request)?)
    }

    pub fn get(&self, caller: Caller, id: RequestId) -> Result<RequestDetail, RequestServiceError> {
        let (request, _) = self.owned_request(caller, id)?;
        self.detail(request)
    }

    pub fn list(
        &self,
        caller: Caller,
        filter: &RequestFilter,
        page: PageRequest,
    ) -> Result<Page<ReimbursementRequest>, RequestServiceError> {
        let plan_ids = self.owned_plan_ids(caller)?;
        Ok(self.requests.list(&plan_ids, filter, page)?)
    }

    /// Full matching set for the read-only reporting surface.
    pub fn list_for_reports(
        &self,
        caller: Caller,
        filter: &RequestFilter,
    ) -> Result<Vec<ReimbursementRequest>, RequestServiceError> {
        let plan_ids = self.owned_plan_ids(caller)?;
        Ok(self.requests.list_all(&plan_ids, filter)?)
    }

    /// Concurrent edits follow last-write-wins semantics at field-update
    /// granularity; there is no optimistic-concurrency token.
    pub fn update(
        &self,
        caller: Caller,
        id: RequestId,
        update: RequestUpdate,
        now: DateTime<Utc>,
    ) -> Result<ReimbursementRequest, RequestServiceError> {
        if let Some(days) = update.reminder_interval_days {
            if days < 1 {
                return Err(RequestServiceError::Validation(
                    "reminder interval must be at least one day".to_string(),
                ));
            }
        }

        let (mut request, _) = self.owned_request(caller, id)?;
        lifecycle::apply_update(&mut request, update, now);
        self.requests.update(request.clone())?;
        Ok(request)
    }

    /// Delete a request, cascading to its attachments first: non-recurring
    /// document rows go away with their blobs, recurring documents are only
    /// detached and survive for reuse.
    pub fn delete(&self, caller: Caller, id: RequestId) -> Result<(), RequestServiceError> {
        let (request, _) = self.owned_request(caller, id)?;

        for document in self.documents.list_by_request(request.id)? {
            self.documents.delete(document.id)?;
            if let Err(err) = self.files.delete(&document.stored_name) {
                warn!(stored_name = %document.stored_name, error = %err, "failed to remove stored blob");
            }
        }
        self.documents.unlink_request(request.id)?;

        self.requests.delete(request.id)?;
        Ok(())
    }

    /// E-mail the document package toward the insurer and, when the request
    /// was sitting in `ready_to_send`, advance it to `protocol_open`.
    pub fn send_to_insurer(
        &self,
        caller: Caller,
        id: RequestId,
        now: DateTime<Utc>,
    ) -> Result<ReimbursementRequest, RequestServiceError> {
        let (mut request, plan) = self.owned_request(caller, id)?;
        let dependent = self
            .dependents
            .fetch(request.dependent_id)?
            .ok_or(RequestServiceError::NotFound)?;

        self.notifier.send_document_package(
            plan.owner,
            DocumentPackageNotice {
                request_id: request.id,
                protocol_number: request.protocol_number.clone(),
                attendance_type: request.attendance_type,
                attendance_date: request.attendance_date,
                dependent_name: dependent.name,
                physician: request.physician.clone(),
                facility: request.facility.clone(),
                amount_paid: request.amount_paid,
                insurer_email: plan.insurer_email,
            },
        )?;

        if request.status == RequestStatus::ReadyToSend {
            lifecycle::apply_status(&mut request, RequestStatus::ProtocolOpen, None, now);
            self.requests.update(request.clone())?;
        }

        Ok(request)
    }

    /// Kinds currently satisfied on a request, for completeness evaluation.
    pub fn active_kinds(
        &self,
        request: &ReimbursementRequest,
    ) -> Result<Vec<DocumentKind>, RequestServiceError> {
        Ok(active_documents_for_request(&*self.documents, request.id)?
            .into_iter()
            .map(|document| document.kind)
            .collect())
    }

    pub fn detail(
        &self,
        request: ReimbursementRequest,
    ) -> Result<RequestDetail, RequestServiceError> {
        let documents = active_documents_for_request(&*self.documents, request.id)?;
        let kinds: Vec<DocumentKind> = documents.iter().map(|document| document.kind).collect();
        let completeness = completeness::evaluate(request.attendance_type, &kinds).view();
        Ok(RequestDetail {
            request,
            documents,
            completeness,
        })
    }

    fn owned_plan_ids(&self, caller: Caller) -> Result<Vec<PlanId>, RequestServiceError> {
        Ok(self
            .plans
            .list_by_owner(caller.user_id)?
            .into_iter()
            .map(|plan| plan.id)
            .collect())
    }

    fn owned_plan(&self, caller: Caller, id: PlanId) -> Result<Plan, RequestServiceError> {
        match self.plans.fetch(id)? {
            Some(plan) if plan.owner == caller.user_id => Ok(plan),
            // Existence of other tenants' records must not leak.
            _ => Err(RequestServiceError::NotFound),
        }
    }

    fn owned_request(
        &self,
        caller: Caller,
        id: RequestId,
    ) -> Result<(ReimbursementRequest, Plan), RequestServiceError> {
        let request = self
            .requests
            .fetch(id)?
            .ok_or(RequestServiceError::NotFound)?;
        let plan = self.owned_plan(caller, request.plan_id)?;
        Ok((request, plan))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RequestServiceError {
    #[error("record not found")]
    NotFound,
    #[error("{0}")]
    InvalidAssociation(&'static str),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Notify(#[from] NotifyError),
}

impl RequestServiceError {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::InvalidAssociation(_) => "invalid_association",
            Self::Validation(_) => "validation_error",
            Self::Repository(_) => "repository_error",
            Self::Notify(_) => "notification_error",
        }
    }
}
