use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::catalog::{AttendanceType, DocumentKind};
use crate::documents::compression::{CompressionError, ImageCodec};
use crate::documents::domain::{Document, RecurrentLink};
use crate::documents::repository::DocumentRepository;
use crate::documents::service::DocumentService;
use crate::domain::{Caller, DependentId, DocumentId, PlanId, RequestId, UserId};
use crate::identity::{IdentityError, IdentityProvider};
use crate::notify::{DocumentPackageNotice, NotificationSender, NotifyError, ReminderNotice};
use crate::plans::domain::{Dependent, NewDependent, NewPlan, Plan, Relation};
use crate::plans::repository::{DependentRepository, PlanRepository};
use crate::plans::service::PlanService;
use crate::reimbursements::domain::{NewRequest, ReimbursementRequest, RequestFilter};
use crate::reimbursements::repository::RequestRepository;
use crate::reimbursements::service::RequestService;
use crate::storage::{FileStore, StorageError};
use crate::store::{Page, PageRequest, RepositoryError};

pub(super) const MAX_TEST_DOCUMENT_BYTES: usize = 1024;

pub(super) fn owner() -> Caller {
    Caller::user(UserId(Uuid::from_u128(0xA1)))
}

pub(super) fn stranger() -> Caller {
    Caller::user(UserId(Uuid::from_u128(0xB2)))
}

#[derive(Default, Clone)]
pub(super) struct MemoryPlans {
    records: Arc<Mutex<HashMap<PlanId, Plan>>>,
}

impl PlanRepository for MemoryPlans {
    fn insert(&self, plan: Plan) -> Result<Plan, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&plan.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(plan.id, plan.clone());
        Ok(plan)
    }

    fn update(&self, plan: Plan) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&plan.id) {
            guard.insert(plan.id, plan);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: PlanId) -> Result<Option<Plan>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(&id).cloned())
    }

    fn list_by_owner(&self, owner: UserId) -> Result<Vec<Plan>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut plans: Vec<Plan> = guard
            .values()
            .filter(|plan| plan.owner == owner)
            .cloned()
            .collect();
        plans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(plans)
    }

    fn delete(&self, id: PlanId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.remove(&id);
        Ok(())
    }

    fn all(&self) -> Result<Vec<Plan>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryDependents {
    records: Arc<Mutex<HashMap<DependentId, Dependent>>>,
}

impl DependentRepository for MemoryDependents {
    fn insert(&self, dependent: Dependent) -> Result<Dependent, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&dependent.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(dependent.id, dependent.clone());
        Ok(dependent)
    }

    fn update(&self, dependent: Dependent) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&dependent.id) {
            guard.insert(dependent.id, dependent);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: DependentId) -> Result<Option<Dependent>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(&id).cloned())
    }

    fn list_by_plans(&self, plans: &[PlanId]) -> Result<Vec<Dependent>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut dependents: Vec<Dependent> = guard
            .values()
            .filter(|dependent| plans.contains(&dependent.plan_id))
            .cloned()
            .collect();
        dependents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(dependents)
    }

    fn exists_for_plan(&self, plan: PlanId) -> Result<bool, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.values().any(|dependent| dependent.plan_id == plan))
    }

    fn delete(&self, id: DependentId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.remove(&id);
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryRequests {
    records: Arc<Mutex<HashMap<RequestId, ReimbursementRequest>>>,
}

impl RequestRepository for MemoryRequests {
    fn insert(
        &self,
        request: ReimbursementRequest,
    ) -> Result<ReimbursementRequest, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&request.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(request.id, request.clone());
        Ok(request)
    }

    fn update(&self, request: ReimbursementRequest) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&request.id) {
            guard.insert(request.id, request);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: RequestId) -> Result<Option<ReimbursementRequest>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(&id).cloned())
    }

    fn list(
        &self,
        plans: &[PlanId],
        filter: &RequestFilter,
        page: PageRequest,
    ) -> Result<Page<ReimbursementRequest>, RepositoryError> {
        Ok(page.paginate(self.list_all(plans, filter)?))
    }

    fn list_all(
        &self,
        plans: &[PlanId],
        filter: &RequestFilter,
    ) -> Result<Vec<ReimbursementRequest>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut requests: Vec<ReimbursementRequest> = guard
            .values()
            .filter(|request| plans.contains(&request.plan_id) && filter.matches(request))
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    fn exists_for_plan(&self, plan: PlanId) -> Result<bool, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.values().any(|request| request.plan_id == plan))
    }

    fn exists_for_dependent(&self, dependent: DependentId) -> Result<bool, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.values().any(|request| request.dependent_id == dependent))
    }

    fn pending_supplemental(&self) -> Result<Vec<ReimbursementRequest>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|request| {
                request.status == crate::reimbursements::domain::RequestStatus::AwaitingSupplementalDocs
                    && request.last_reminder_at.is_some()
            })
            .cloned()
            .collect())
    }

    fn advance_reminder(
        &self,
        id: RequestId,
        expected: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        match guard.get_mut(&id) {
            Some(request) if request.last_reminder_at == Some(expected) => {
                request.last_reminder_at = Some(to);
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(RepositoryError::NotFound),
        }
    }

    fn delete(&self, id: RequestId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.remove(&id);
        Ok(())
    }

    fn all(&self) -> Result<Vec<ReimbursementRequest>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryDocuments {
    records: Arc<Mutex<HashMap<DocumentId, Document>>>,
    links: Arc<Mutex<Vec<RecurrentLink>>>,
}

impl DocumentRepository for MemoryDocuments {
    fn insert(&self, document: Document) -> Result<Document, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&document.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(document.id, document.clone());
        Ok(document)
    }

    fn fetch(&self, id: DocumentId) -> Result<Option<Document>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(&id).cloned())
    }

    fn mark_expired(&self, id: DocumentId, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let document = guard.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        document.is_expired = true;
        document.expired_at = Some(at);
        Ok(())
    }

    fn delete(&self, id: DocumentId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.remove(&id);
        Ok(())
    }

    fn list_by_request(&self, request: RequestId) -> Result<Vec<Document>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut documents: Vec<Document> = guard
            .values()
            .filter(|document| document.request_id == Some(request))
            .cloned()
            .collect();
        documents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(documents)
    }

    fn list_recurrent(
        &self,
        owner: UserId,
        kind: Option<DocumentKind>,
    ) -> Result<Vec<Document>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut documents: Vec<Document> = guard
            .values()
            .filter(|document| {
                document.owner == owner
                    && document.is_recurrent
                    && kind.map_or(true, |kind| document.kind == kind)
            })
            .cloned()
            .collect();
        documents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(documents)
    }

    fn replacement_of(&self, id: DocumentId) -> Result<Option<Document>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .find(|document| document.replaces_document_id == Some(id))
            .cloned())
    }

    fn link(&self, link: RecurrentLink) -> Result<(), RepositoryError> {
        let mut guard = self.links.lock().expect("link mutex poisoned");
        guard.push(link);
        Ok(())
    }

    fn links_for_request(&self, request: RequestId) -> Result<Vec<RecurrentLink>, RepositoryError> {
        let guard = self.links.lock().expect("link mutex poisoned");
        Ok(guard
            .iter()
            .filter(|link| link.request_id == request)
            .cloned()
            .collect())
    }

    fn unlink_document(&self, document: DocumentId) -> Result<(), RepositoryError> {
        let mut guard = self.links.lock().expect("link mutex poisoned");
        guard.retain(|link| link.document_id != document);
        Ok(())
    }

    fn unlink_request(&self, request: RequestId) -> Result<(), RepositoryError> {
        let mut guard = self.links.lock().expect("link mutex poisoned");
        guard.retain(|link| link.request_id != request);
        Ok(())
    }

    fn all(&self) -> Result<Vec<Document>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryFiles {
    blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryFiles {
    pub(super) fn contains(&self, name: &str) -> bool {
        self.blobs.lock().expect("blob mutex poisoned").contains_key(name)
    }
}

impl FileStore for MemoryFiles {
    fn put(&self, name: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        self.blobs
            .lock()
            .expect("blob mutex poisoned")
            .insert(name.to_string(), bytes);
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        self.blobs
            .lock()
            .expect("blob mutex poisoned")
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::Missing(name.to_string()))
    }

    fn delete(&self, name: &str) -> Result<(), StorageError> {
        self.blobs.lock().expect("blob mutex poisoned").remove(name);
        Ok(())
    }
}

/// Codec double that never shrinks anything.
pub(super) struct PassthroughCodec;

impl ImageCodec for PassthroughCodec {
    fn shrink_to(&self, bytes: &[u8], _target_bytes: usize) -> Result<Vec<u8>, CompressionError> {
        Ok(bytes.to_vec())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifier {
    reminders: Arc<Mutex<Vec<(UserId, ReminderNotice)>>>,
    packages: Arc<Mutex<Vec<(UserId, DocumentPackageNotice)>>>,
    pub(super) fail_sends: Arc<Mutex<bool>>,
}

impl MemoryNotifier {
    pub(super) fn packages(&self) -> Vec<(UserId, DocumentPackageNotice)> {
        self.packages.lock().expect("notifier mutex poisoned").clone()
    }

    pub(super) fn reminders(&self) -> Vec<(UserId, ReminderNotice)> {
        self.reminders.lock().expect("notifier mutex poisoned").clone()
    }

    fn check_failure(&self) -> Result<(), NotifyError> {
        if *self.fail_sends.lock().expect("notifier mutex poisoned") {
            Err(NotifyError::Transport("smtp relay offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl NotificationSender for MemoryNotifier {
    fn send_reminder(&self, user: UserId, notice: ReminderNotice) -> Result<(), NotifyError> {
        self.check_failure()?;
        self.reminders
            .lock()
            .expect("notifier mutex poisoned")
            .push((user, notice));
        Ok(())
    }

    fn send_document_package(
        &self,
        user: UserId,
        notice: DocumentPackageNotice,
    ) -> Result<(), NotifyError> {
        self.check_failure()?;
        self.packages
            .lock()
            .expect("notifier mutex poisoned")
            .push((user, notice));
        Ok(())
    }
}

/// Token-table identity double.
#[derive(Default, Clone)]
pub(super) struct StaticIdentity {
    tokens: Arc<Mutex<HashMap<String, Caller>>>,
}

impl StaticIdentity {
    pub(super) fn grant(&self, token: &str, caller: Caller) {
        self.tokens
            .lock()
            .expect("identity mutex poisoned")
            .insert(token.to_string(), caller);
    }
}

impl IdentityProvider for StaticIdentity {
    fn authenticate(&self, bearer: &str) -> Result<Caller, IdentityError> {
        self.tokens
            .lock()
            .expect("identity mutex poisoned")
            .get(bearer)
            .copied()
            .ok_or(IdentityError::InvalidCredential)
    }

    fn confirmed_at(&self, _user: UserId) -> Result<Option<DateTime<Utc>>, IdentityError> {
        Ok(Some(Utc::now()))
    }

    fn delete_account(&self, _user: UserId) -> Result<(), IdentityError> {
        Ok(())
    }
}

pub(super) struct Harness {
    pub(super) plans: Arc<MemoryPlans>,
    pub(super) requests: Arc<MemoryRequests>,
    pub(super) documents: Arc<MemoryDocuments>,
    pub(super) files: Arc<MemoryFiles>,
    pub(super) notifier: Arc<MemoryNotifier>,
    pub(super) identity: Arc<StaticIdentity>,
    pub(super) request_service: Arc<RequestService>,
    pub(super) plan_service: Arc<PlanService>,
    pub(super) document_service: Arc<DocumentService>,
}

pub(super) fn harness() -> Harness {
    let plans = Arc::new(MemoryPlans::default());
    let dependents = Arc::new(MemoryDependents::default());
    let requests = Arc::new(MemoryRequests::default());
    let documents = Arc::new(MemoryDocuments::default());
    let files = Arc::new(MemoryFiles::default());
    let notifier = Arc::new(MemoryNotifier::default());
    let identity = Arc::new(StaticIdentity::default());

    let request_service = Arc::new(RequestService::new(
        requests.clone(),
        plans.clone(),
        dependents.clone(),
        documents.clone(),
        files.clone(),
        notifier.clone(),
        3,
    ));
    let plan_service = Arc::new(PlanService::new(
        plans.clone(),
        dependents.clone(),
        requests.clone(),
    ));
    let document_service = Arc::new(DocumentService::new(
        documents.clone(),
        requests.clone(),
        plans.clone(),
        files.clone(),
        Arc::new(PassthroughCodec),
        MAX_TEST_DOCUMENT_BYTES,
    ));

    Harness {
        plans,
        requests,
        documents,
        files,
        notifier,
        identity,
        request_service,
        plan_service,
        document_service,
    }
}

impl Harness {
    pub(super) fn seed_plan(&self, caller: Caller) -> Plan {
        self.plan_service
            .create_plan(
                caller,
                NewPlan {
                    name: "Amparo Saúde".to_string(),
                    icon_url: None,
                    insurer_email: Some("reembolso@amparo.example".to_string()),
                    insurer_phone: None,
                    notes: None,
                },
                Utc::now(),
            )
            .expect("plan seeds")
    }

    pub(super) fn seed_dependent(&self, caller: Caller, plan: &Plan) -> Dependent {
        self.plan_service
            .create_dependent(
                caller,
                NewDependent {
                    plan_id: plan.id,
                    name: "Marina Alves".to_string(),
                    relation: Relation::Filho,
                    birth_date: NaiveDate::from_ymd_opt(2015, 3, 2),
                    national_id: None,
                    notes: None,
                },
                Utc::now(),
            )
            .expect("dependent seeds")
    }
}

pub(super) fn new_request(plan: &Plan, dependent: &Dependent) -> NewRequest {
    NewRequest {
        plan_id: plan.id,
        dependent_id: dependent.id,
        attendance_type: AttendanceType::Consulta,
        attendance_date: NaiveDate::from_ymd_opt(2024, 1, 10).expect("valid date"),
        attendance_end_date: None,
        specialty: Some("Pediatria".to_string()),
        physician: Some("Dr. Rafael Lima".to_string()),
        facility: Some("Clínica Vida".to_string()),
        amount_paid: Some(rust_decimal::Decimal::new(25_000, 2)),
        notes: None,
    }
}
