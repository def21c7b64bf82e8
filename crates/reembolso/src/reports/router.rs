use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::AttendanceType;
use crate::domain::{DependentId, PlanId};
use crate::error::AppError;
use crate::identity::{authenticate, IdentityProvider};
use crate::plans::service::PlanService;
use crate::reimbursements::domain::{ReimbursementRequest, RequestFilter};
use crate::reimbursements::service::RequestService;

use super::summary::{
    self, DashboardSummary, EfficiencySummary, EntityStats, PendingDocumentsReport,
};

#[derive(Clone)]
pub struct ReportRoutes {
    pub requests: Arc<RequestService>,
    pub plans: Arc<PlanService>,
    pub identity: Arc<dyn IdentityProvider>,
}

/// Router builder for the read-only reporting surface.
pub fn report_router(state: ReportRoutes) -> Router {
    Router::new()
        .route("/api/v1/reports/dashboard", get(dashboard_handler))
        .route("/api/v1/reports/period", get(period_handler))
        .route("/api/v1/reports/efficiency", get(efficiency_handler))
        .route(
            "/api/v1/reports/pending-documents",
            get(pending_documents_handler),
        )
        .route("/api/v1/plans/:plan_id/stats", get(plan_stats_handler))
        .route(
            "/api/v1/dependents/:dependent_id/stats",
            get(dependent_stats_handler),
        )
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct DashboardQuery {
    months: Option<u32>,
}

#[derive(Debug, Serialize)]
struct DashboardResponse {
    period_months: u32,
    summary: DashboardSummary,
}

async fn dashboard_handler(
    State(state): State<ReportRoutes>,
    Query(query): Query<DashboardQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let caller = authenticate(&*state.identity, &headers)?;
    let now = Utc::now();
    let months = query.months.filter(|months| *months >= 1).unwrap_or(12);

    let filter = RequestFilter {
        from: now.date_naive().checked_sub_months(Months::new(months)),
        ..RequestFilter::default()
    };
    let requests = state.requests.list_for_reports(caller, &filter)?;

    Ok(Json(DashboardResponse {
        period_months: months,
        summary: summary::dashboard(&requests, now),
    }))
}

#[derive(Debug, Deserialize)]
struct PeriodQuery {
    start_date: NaiveDate,
    end_date: NaiveDate,
    plan_id: Option<PlanId>,
    dependent_id: Option<DependentId>,
    attendance_type: Option<AttendanceType>,
}

#[derive(Debug, Serialize)]
struct PeriodResponse {
    start_date: NaiveDate,
    end_date: NaiveDate,
    summary: DashboardSummary,
    requests: Vec<ReimbursementRequest>,
}

async fn period_handler(
    State(state): State<ReportRoutes>,
    Query(query): Query<PeriodQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let caller = authenticate(&*state.identity, &headers)?;

    let filter = RequestFilter {
        plan_id: query.plan_id,
        dependent_id: query.dependent_id,
        attendance_type: query.attendance_type,
        from: Some(query.start_date),
        to: Some(query.end_date),
        ..RequestFilter::default()
    };
    let requests = state.requests.list_for_reports(caller, &filter)?;

    Ok(Json(PeriodResponse {
        start_date: query.start_date,
        end_date: query.end_date,
        summary: summary::dashboard(&requests, Utc::now()),
        requests,
    }))
}

#[derive(Debug, Serialize)]
struct EfficiencyResponse {
    #[serde(flatten)]
    summary: EfficiencySummary,
}

async fn efficiency_handler(
    State(state): State<ReportRoutes>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let caller = authenticate(&*state.identity, &headers)?;
    let requests = state
        .requests
        .list_for_reports(caller, &RequestFilter::default())?;

    Ok(Json(EfficiencyResponse {
        summary: summary::efficiency(&requests),
    }))
}

async fn pending_documents_handler(
    State(state): State<ReportRoutes>,
    headers: HeaderMap,
) -> Result<Json<PendingDocumentsReport>, AppError> {
    let caller = authenticate(&*state.identity, &headers)?;
    let requests = state
        .requests
        .list_for_reports(caller, &RequestFilter::default())?;

    let mut entries = Vec::with_capacity(requests.len());
    for request in requests {
        let kinds = state.requests.active_kinds(&request)?;
        entries.push((request, kinds));
    }

    Ok(Json(summary::pending_documents(entries, Utc::now())))
}

async fn plan_stats_handler(
    State(state): State<ReportRoutes>,
    Path(plan_id): Path<PlanId>,
    headers: HeaderMap,
) -> Result<Json<EntityStats>, AppError> {
    let caller = authenticate(&*state.identity, &headers)?;
    state.plans.get_plan(caller, plan_id)?;

    let filter = RequestFilter {
        plan_id: Some(plan_id),
        ..RequestFilter::default()
    };
    let requests = state.requests.list_for_reports(caller, &filter)?;
    Ok(Json(summary::entity_stats(&requests)))
}

async fn dependent_stats_handler(
    State(state): State<ReportRoutes>,
    Path(dependent_id): Path<DependentId>,
    headers: HeaderMap,
) -> Result<Json<EntityStats>, AppError> {
    let caller = authenticate(&*state.identity, &headers)?;
    state.plans.get_dependent(caller, dependent_id)?;

    let filter = RequestFilter {
        dependent_id: Some(dependent_id),
        ..RequestFilter::default()
    };
    let requests = state.requests.list_for_reports(caller, &filter)?;
    Ok(Json(summary::entity_stats(&requests)))
}
