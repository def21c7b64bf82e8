//! Read-side aggregation and reporting. Never mutates stored state.

pub mod admin;
pub mod router;
pub mod summary;

pub use admin::{admin_dashboard, AdminDashboard};
pub use router::{report_router, ReportRoutes};
pub use summary::{
    dashboard, efficiency, entity_stats, kanban, pending_documents, DashboardSummary,
    EfficiencySummary, EntityStats, KanbanBoard, MoneyBreakdown, PendingDocumentsReport,
};
