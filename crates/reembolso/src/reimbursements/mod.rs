//! Reimbursement requests and their lifecycle.

pub mod completeness;
pub mod domain;
pub mod lifecycle;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use completeness::{evaluate, CompletenessView, DocumentCompleteness};
pub use domain::{
    NewRequest, ReimbursementRequest, RequestFilter, RequestStatus, RequestUpdate,
};
pub use repository::RequestRepository;
pub use router::{reimbursement_router, ReimbursementRoutes};
pub use service::{RequestDetail, RequestService, RequestServiceError};
