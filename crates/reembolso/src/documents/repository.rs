use chrono::{DateTime, Utc};

use crate::catalog::DocumentKind;
use crate::domain::{DocumentId, RequestId, UserId};
use crate::store::RepositoryError;

use super::domain::{Document, RecurrentLink};

pub trait DocumentRepository: Send + Sync {
    fn insert(&self, document: Document) -> Result<Document, RepositoryError>;
    fn fetch(&self, id: DocumentId) -> Result<Option<Document>, RepositoryError>;
    /// Flag a recurring document as superseded.
    fn mark_expired(&self, id: DocumentId, at: DateTime<Utc>) -> Result<(), RepositoryError>;
    fn delete(&self, id: DocumentId) -> Result<(), RepositoryError>;
    /// Documents attached directly (non-recurring) to a request, newest first.
    fn list_by_request(&self, request: RequestId) -> Result<Vec<Document>, RepositoryError>;
    /// Recurring documents owned by a user, optionally narrowed by kind.
    fn list_recurrent(
        &self,
        owner: UserId,
        kind: Option<DocumentKind>,
    ) -> Result<Vec<Document>, RepositoryError>;
    /// The row whose `replaces_document_id` points at the given document.
    fn replacement_of(&self, id: DocumentId) -> Result<Option<Document>, RepositoryError>;
    fn link(&self, link: RecurrentLink) -> Result<(), RepositoryError>;
    fn links_for_request(&self, request: RequestId) -> Result<Vec<RecurrentLink>, RepositoryError>;
    fn unlink_document(&self, document: DocumentId) -> Result<(), RepositoryError>;
    fn unlink_request(&self, request: RequestId) -> Result<(), RepositoryError>;
    fn all(&self) -> Result<Vec<Document>, RepositoryError>;
}

/// Walk a recurring document's replacement chain to its non-expired tail.
pub fn resolve_active(
    repo: &dyn DocumentRepository,
    document: Document,
) -> Result<Option<Document>, RepositoryError> {
    let mut current = document;
    while current.is_expired {
        match repo.replacement_of(current.id)? {
            Some(next) => current = next,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

/// Every active document visible on a request: direct attachments plus the
/// active tails of linked recurring chains.
pub fn active_documents_for_request(
    repo: &dyn DocumentRepository,
    request: RequestId,
) -> Result<Vec<Document>, RepositoryError> {
    let mut documents: Vec<Document> = repo
        .list_by_request(request)?
        .into_iter()
        .filter(|document| !document.is_expired)
        .collect();

    for link in repo.links_for_request(request)? {
        if let Some(linked) = repo.fetch(link.document_id)? {
            if let Some(active) = resolve_active(repo, linked)? {
                documents.push(active);
            }
        }
    }

    Ok(documents)
}
