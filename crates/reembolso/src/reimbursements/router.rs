use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::catalog::AttendanceType;
use crate::domain::{DependentId, PlanId, RequestId};
use crate::error::AppError;
use crate::identity::{authenticate, IdentityProvider};
use crate::reports;
use crate::store::PageRequest;

use super::domain::{NewRequest, RequestFilter, RequestStatus, RequestUpdate};
use super::service::RequestService;

#[derive(Clone)]
pub struct ReimbursementRoutes {
    pub service: Arc<RequestService>,
    pub identity: Arc<dyn IdentityProvider>,
}

/// Router builder exposing the reimbursement lifecycle endpoints.
pub fn reimbursement_router(state: ReimbursementRoutes) -> Router {
    Router::new()
        .route(
            "/api/v1/reimbursements",
            get(list_handler).post(create_handler),
        )
        .route("/api/v1/reimbursements/board", get(board_handler))
        .route(
            "/api/v1/reimbursements/:request_id",
            get(get_handler).put(update_handler).delete(delete_handler),
        )
        .route(
            "/api/v1/reimbursements/:request_id/send",
            post(send_handler),
        )
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    status: Option<RequestStatus>,
    plan_id: Option<PlanId>,
    dependent_id: Option<DependentId>,
    attendance_type: Option<AttendanceType>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    page: Option<usize>,
    limit: Option<usize>,
}

impl ListQuery {
    fn filter(&self) -> RequestFilter {
        RequestFilter {
            status: self.status,
            plan_id: self.plan_id,
            dependent_id: self.dependent_id,
            attendance_type: self.attendance_type,
            from: self.from,
            to: self.to,
        }
    }

    fn page(&self) -> PageRequest {
        let defaults = PageRequest::default();
        PageRequest {
            page: self.page.unwrap_or(defaults.page),
            limit: self.limit.unwrap_or(defaults.limit),
        }
    }
}

async fn list_handler(
    State(state): State<ReimbursementRoutes>,
    Query(query): Query<ListQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let caller = authenticate(&*state.identity, &headers)?;
    let page = state.service.list(caller, &query.filter(), query.page())?;
    Ok(Json(page))
}

async fn create_handler(
    State(state): State<ReimbursementRoutes>,
    headers: HeaderMap,
    Json(new_request): Json<NewRequest>,
) -> Result<impl IntoResponse, AppError> {
    let caller = authenticate(&*state.identity, &headers)?;
    let request = state.service.create(caller, new_request, Utc::now())?;
    Ok((StatusCode::CREATED, Json(request)))
}

async fn board_handler(
    State(state): State<ReimbursementRoutes>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let caller = authenticate(&*state.identity, &headers)?;
    let requests = state
        .service
        .list_for_reports(caller, &RequestFilter::default())?;
    Ok(Json(reports::kanban(requests)))
}

async fn get_handler(
    State(state): State<ReimbursementRoutes>,
    Path(request_id): Path<RequestId>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let caller = authenticate(&*state.identity, &headers)?;
    let detail = state.service.get(caller, request_id)?;
    Ok(Json(detail))
}

async fn update_handler(
    State(state): State<ReimbursementRoutes>,
    Path(request_id): Path<RequestId>,
    headers: HeaderMap,
    Json(update): Json<RequestUpdate>,
) -> Result<impl IntoResponse, AppError> {
    let caller = authenticate(&*state.identity, &headers)?;
    let request = state.service.update(caller, request_id, update, Utc::now())?;
    Ok(Json(request))
}

async fn delete_handler(
    State(state): State<ReimbursementRoutes>,
    Path(request_id): Path<RequestId>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let caller = authenticate(&*state.identity, &headers)?;
    state.service.delete(caller, request_id)?;
    Ok(Json(serde_json::json!({ "deleted": request_id })))
}

async fn send_handler(
    State(state): State<ReimbursementRoutes>,
    Path(request_id): Path<RequestId>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let caller = authenticate(&*state.identity, &headers)?;
    let request = state.service.send_to_insurer(caller, request_id, Utc::now())?;
    Ok(Json(request))
}
