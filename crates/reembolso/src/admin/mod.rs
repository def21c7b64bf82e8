//! Admin surface: platform aggregates and user management.

pub mod router;
pub mod service;

pub use router::{admin_router, AdminRoutes};
pub use service::{AdminService, AdminServiceError, AdminUserDetail, UserAccountStats};
