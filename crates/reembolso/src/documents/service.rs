use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::domain::{Caller, DocumentId, RequestId};
use crate::plans::repository::PlanRepository;
use crate::reimbursements::repository::RequestRepository;
use crate::storage::{FileStore, StorageError};
use crate::store::RepositoryError;

use super::compression::{prepare_for_storage, CompressionError, ImageCodec};
use super::domain::{Document, DocumentUpload, MimeCategory, RecurrentLink, RecurrentRevision};
use super::repository::{active_documents_for_request, DocumentRepository};
use crate::catalog::DocumentKind;

/// Upload, linking, and replacement of supporting documents.
///
/// Compression runs synchronously inside the calling request; there is no
/// background job queue.
pub struct DocumentService {
    documents: Arc<dyn DocumentRepository>,
    requests: Arc<dyn RequestRepository>,
    plans: Arc<dyn PlanRepository>,
    store: Arc<dyn FileStore>,
    codec: Arc<dyn ImageCodec>,
    max_document_bytes: usize,
}

impl DocumentService {
    pub fn new(
        documents: Arc<dyn DocumentRepository>,
        requests: Arc<dyn RequestRepository>,
        plans: Arc<dyn PlanRepository>,
        store: Arc<dyn FileStore>,
        codec: Arc<dyn ImageCodec>,
        max_document_bytes: usize,
    ) -> Self {
        Self {
            documents,
            requests,
            plans,
            store,
            codec,
            max_document_bytes,
        }
    }

    pub fn upload(
        &self,
        caller: Caller,
        upload: DocumentUpload,
        now: DateTime<Utc>,
    ) -> Result<Document, DocumentServiceError> {
        if !upload.is_recurrent && upload.request_id.is_none() {
            return Err(DocumentServiceError::Validation(
                "a request id is required for non-recurring documents".to_string(),
            ));
        }
        if let Some(request_id) = upload.request_id {
            self.owned_request(caller, request_id)?;
        }

        let category = MimeCategory::from_mime(&upload.mime).ok_or_else(|| {
            DocumentServiceError::Validation(
                "unsupported file type; use JPG, PNG or PDF".to_string(),
            )
        })?;

        let original_bytes = upload.bytes.len() as u64;
        let stored_bytes =
            prepare_for_storage(&*self.codec, category, upload.bytes, self.max_document_bytes)?;
        let compressed_bytes = stored_bytes.len() as u64;

        let stored_name = format!("{}{}", Uuid::new_v4(), category.extension());
        self.store.put(&stored_name, stored_bytes)?;

        let document = Document {
            id: DocumentId::generate(),
            owner: caller.user_id,
            kind: upload.kind,
            request_id: if upload.is_recurrent {
                None
            } else {
                upload.request_id
            },
            original_name: upload.original_name,
            stored_name: stored_name.clone(),
            original_bytes,
            compressed_bytes,
            mime: category,
            is_recurrent: upload.is_recurrent,
            is_expired: false,
            expired_at: None,
            replaces_document_id: None,
            created_at: now,
        };

        match self.documents.insert(document) {
            Ok(inserted) => Ok(inserted),
            Err(err) => {
                // The blob is orphaned if the record write failed.
                if let Err(cleanup) = self.store.delete(&stored_name) {
                    warn!(%stored_name, error = %cleanup, "failed to remove orphaned upload");
                }
                Err(err.into())
            }
        }
    }

    pub fn get(&self, caller: Caller, id: DocumentId) -> Result<Document, DocumentServiceError> {
        self.owned_document(caller, id)
    }

    pub fn download(
        &self,
        caller: Caller,
        id: DocumentId,
    ) -> Result<(Document, Vec<u8>), DocumentServiceError> {
        let document = self.owned_document(caller, id)?;
        let bytes = self.store.get(&document.stored_name)?;
        Ok((document, bytes))
    }

    /// Active documents visible on a request: direct attachments plus linked
    /// recurring chains resolved to their live tails.
    pub fn list_for_request(
        &self,
        caller: Caller,
        request_id: RequestId,
    ) -> Result<Vec<Document>, DocumentServiceError> {
        self.owned_request(caller, request_id)?;
        Ok(active_documents_for_request(&*self.documents, request_id)?)
    }

    pub fn list_recurrent(
        &self,
        caller: Caller,
        kind: Option<DocumentKind>,
    ) -> Result<Vec<Document>, DocumentServiceError> {
        Ok(self.documents.list_recurrent(caller.user_id, kind)?)
    }

    pub fn link_recurrent(
        &self,
        caller: Caller,
        document_id: DocumentId,
        request_id: RequestId,
        now: DateTime<Utc>,
    ) -> Result<RecurrentLink, DocumentServiceError> {
        let document = self.owned_document(caller, document_id)?;
        if !document.is_recurrent {
            return Err(DocumentServiceError::NotFound);
        }
        self.owned_request(caller, request_id)?;

        let link = RecurrentLink {
            document_id: document.id,
            request_id,
            created_at: now,
        };
        self.documents.link(link.clone())?;
        Ok(link)
    }

    /// Replace a recurring document: the old row is expired, the new one
    /// points back through `replaces_document_id`.
    pub fn update_recurrent(
        &self,
        caller: Caller,
        id: DocumentId,
        revision: RecurrentRevision,
        now: DateTime<Utc>,
    ) -> Result<Document, DocumentServiceError> {
        let old = self.owned_document(caller, id)?;
        if !old.is_recurrent {
            return Err(DocumentServiceError::NotFound);
        }

        let category = MimeCategory::from_mime(&revision.mime).ok_or_else(|| {
            DocumentServiceError::Validation(
                "unsupported file type; use JPG, PNG or PDF".to_string(),
            )
        })?;

        let original_bytes = revision.bytes.len() as u64;
        let stored_bytes = prepare_for_storage(
            &*self.codec,
            category,
            revision.bytes,
            self.max_document_bytes,
        )?;
        let compressed_bytes = stored_bytes.len() as u64;

        let stored_name = format!("{}{}", Uuid::new_v4(), category.extension());
        self.store.put(&stored_name, stored_bytes)?;
        self.documents.mark_expired(old.id, now)?;

        let replacement = Document {
            id: DocumentId::generate(),
            owner: caller.user_id,
            kind: old.kind,
            request_id: None,
            original_name: revision.original_name,
            stored_name: stored_name.clone(),
            original_bytes,
            compressed_bytes,
            mime: category,
            is_recurrent: true,
            is_expired: false,
            expired_at: None,
            replaces_document_id: Some(old.id),
            created_at: now,
        };

        match self.documents.insert(replacement) {
            Ok(inserted) => Ok(inserted),
            Err(err) => {
                if let Err(cleanup) = self.store.delete(&stored_name) {
                    warn!(%stored_name, error = %cleanup, "failed to remove orphaned upload");
                }
                Err(err.into())
            }
        }
    }

    pub fn delete(&self, caller: Caller, id: DocumentId) -> Result<(), DocumentServiceError> {
        let document = self.owned_document(caller, id)?;

        if document.is_recurrent {
            self.documents.unlink_document(document.id)?;
        }
        self.documents.delete(document.id)?;

        if let Err(err) = self.store.delete(&document.stored_name) {
            warn!(stored_name = %document.stored_name, error = %err, "failed to remove stored blob");
        }
        Ok(())
    }

    fn owned_document(
        &self,
        caller: Caller,
        id: DocumentId,
    ) -> Result<Document, DocumentServiceError> {
        match self.documents.fetch(id)? {
            Some(document) if document.owner == caller.user_id => Ok(document),
            // Existence of other tenants' records must not leak.
            _ => Err(DocumentServiceError::NotFound),
        }
    }

    fn owned_request(
        &self,
        caller: Caller,
        request_id: RequestId,
    ) -> Result<(), DocumentServiceError> {
        let request = self
            .requests
            .fetch(request_id)?
            .ok_or(DocumentServiceError::NotFound)?;
        match self.plans.fetch(request.plan_id)? {
            Some(plan) if plan.owner == caller.user_id => Ok(()),
            _ => Err(DocumentServiceError::NotFound),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentServiceError {
    #[error("record not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Compression(#[from] CompressionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl DocumentServiceError {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Validation(_) => "validation_error",
            Self::Compression(inner) => inner.kind(),
            Self::Repository(_) => "repository_error",
            Self::Storage(_) => "storage_error",
        }
    }
}
