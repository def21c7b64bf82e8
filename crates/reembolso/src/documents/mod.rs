//! Supporting-document handling: upload with size-cap compression, the
//! recurring expire-and-replace chain, and request linking.

pub mod compression;
pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use compression::{prepare_for_storage, CompressionError, ImageCodec};
pub use domain::{Document, DocumentUpload, MimeCategory, RecurrentLink, RecurrentRevision};
pub use repository::{active_documents_for_request, resolve_active, DocumentRepository};
pub use router::{document_router, DocumentRoutes};
pub use service::{DocumentService, DocumentServiceError};
