use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

use reembolso::catalog::DocumentKind;
use reembolso::documents::compression::{CompressionError, ImageCodec};
use reembolso::documents::domain::{Document, RecurrentLink};
use reembolso::documents::repository::DocumentRepository;
use reembolso::domain::{Caller, DependentId, DocumentId, PlanId, RequestId, UserId};
use reembolso::identity::{IdentityError, IdentityProvider};
use reembolso::notify::{DocumentPackageNotice, NotificationSender, NotifyError, ReminderNotice};
use reembolso::plans::domain::{Dependent, Plan};
use reembolso::plans::repository::{DependentRepository, PlanRepository};
use reembolso::reimbursements::domain::{ReimbursementRequest, RequestFilter, RequestStatus};
use reembolso::reimbursements::repository::RequestRepository;
use reembolso::storage::{FileStore, StorageError};
use reembolso::store::{Page, PageRequest, RepositoryError};
use reembolso::users::{UserProfile, UserRepository};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryPlanRepository {
    records: Arc<Mutex<HashMap<PlanId, Plan>>>,
}

impl PlanRepository for InMemoryPlanRepository {
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
pub(crate) struct InMemoryDependentRepository {
    records: Arc<Mutex<HashMap<DependentId, Dependent>>>,
}

impl DependentRepository for InMemoryDependentRepository {
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
pub(crate) struct InMemoryRequestRepository {
    records: Arc<Mutex<HashMap<RequestId, ReimbursementRequest>>>,
}

impl RequestRepository for InMemoryRequestRepository {
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
                request.status == RequestStatus::AwaitingSupplementalDocs
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
pub(crate) struct InMemoryDocumentRepository {
    records: Arc<Mutex<HashMap<DocumentId, Document>>>,
    links: Arc<Mutex<Vec<RecurrentLink>>>,
}

impl DocumentRepository for InMemoryDocumentRepository {
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
pub(crate) struct InMemoryUserRepository {
    records: Arc<Mutex<HashMap<UserId, UserProfile>>>,
}

impl UserRepository for InMemoryUserRepository {
    fn insert(&self, user: UserProfile) -> Result<UserProfile, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&user.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(user.id, user.clone());
        Ok(user)
    }

    fn update(&self, user: UserProfile) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&user.id) {
            guard.insert(user.id, user);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: UserId) -> Result<Option<UserProfile>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(&id).cloned())
    }

    fn list(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<UserProfile>, RepositoryError> {
        let mut users = self.list_all()?;
        if let Some(term) = search {
            let needle = term.to_lowercase();
            users.retain(|user| {
                user.name.to_lowercase().contains(&needle)
                    || user.email.to_lowercase().contains(&needle)
            });
        }
        Ok(page.paginate(users))
    }

    fn list_all(&self) -> Result<Vec<UserProfile>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut users: Vec<UserProfile> = guard.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    fn created_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<UserProfile>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|user| user.created_at < cutoff)
            .cloned()
            .collect())
    }

    fn delete(&self, id: UserId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.remove(&id);
        Ok(())
    }
}

/// Blob store writing uuid-named files under the configured upload directory.
#[derive(Clone)]
pub(crate) struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub(crate) fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl FileStore for LocalFileStore {
    fn put(&self, name: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root).map_err(|err| StorageError::Backend(err.to_string()))?;
        fs::write(self.root.join(name), bytes)
            .map_err(|err| StorageError::Backend(err.to_string()))
    }

    fn get(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        fs::read(self.root.join(name)).map_err(|err| match err.kind() {
            ErrorKind::NotFound => StorageError::Missing(name.to_string()),
            _ => StorageError::Backend(err.to_string()),
        })
    }

    fn delete(&self, name: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.root.join(name)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(StorageError::Missing(name.to_string()))
            }
            Err(err) => Err(StorageError::Backend(err.to_string())),
        }
    }
}

/// Stand-in for the external image compressor: passes bytes through, so the
/// size-cap policy still rejects oversized images. A deployment swaps in a
/// real codec adapter to get re-encoding.
pub(crate) struct NoopImageCodec;

impl ImageCodec for NoopImageCodec {
    fn shrink_to(&self, bytes: &[u8], _target_bytes: usize) -> Result<Vec<u8>, CompressionError> {
        Ok(bytes.to_vec())
    }
}

/// Stand-in for the external mail service: logs the addressed message.
#[derive(Default, Clone)]
pub(crate) struct LoggingNotifier;

impl NotificationSender for LoggingNotifier {
    fn send_reminder(&self, user: UserId, notice: ReminderNotice) -> Result<(), NotifyError> {
        info!(
            user_id = %user,
            request_id = %notice.request_id,
            dependent = %notice.dependent_name,
            "reminder: supplemental documentation still outstanding"
        );
        Ok(())
    }

    fn send_document_package(
        &self,
        user: UserId,
        notice: DocumentPackageNotice,
    ) -> Result<(), NotifyError> {
        info!(
            user_id = %user,
            request_id = %notice.request_id,
            insurer_email = notice.insurer_email.as_deref().unwrap_or("-"),
            "document package dispatched"
        );
        Ok(())
    }
}

/// Token-table identity provider for local runs; a deployment replaces this
/// with the real identity-service adapter.
#[derive(Default, Clone)]
pub(crate) struct StaticIdentityProvider {
    tokens: Arc<Mutex<HashMap<String, Caller>>>,
    confirmations: Arc<Mutex<HashMap<UserId, DateTime<Utc>>>>,
}

impl StaticIdentityProvider {
    pub(crate) fn grant(&self, token: &str, caller: Caller) {
        self.tokens
            .lock()
            .expect("identity mutex poisoned")
            .insert(token.to_string(), caller);
    }

    pub(crate) fn confirm(&self, user: UserId, at: DateTime<Utc>) {
        self.confirmations
            .lock()
            .expect("identity mutex poisoned")
            .insert(user, at);
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn authenticate(&self, bearer: &str) -> Result<Caller, IdentityError> {
        self.tokens
            .lock()
            .expect("identity mutex poisoned")
            .get(bearer)
            .copied()
            .ok_or(IdentityError::InvalidCredential)
    }

    fn confirmed_at(&self, user: UserId) -> Result<Option<DateTime<Utc>>, IdentityError> {
        Ok(self
            .confirmations
            .lock()
            .expect("identity mutex poisoned")
            .get(&user)
            .copied())
    }

    fn delete_account(&self, user: UserId) -> Result<(), IdentityError> {
        let mut tokens = self.tokens.lock().expect("identity mutex poisoned");
        tokens.retain(|_, caller| caller.user_id != user);
        self.confirmations
            .lock()
            .expect("identity mutex poisoned")
            .remove(&user);
        Ok(())
    }
}
