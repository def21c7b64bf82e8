use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;

use crate::domain::UserId;
use crate::error::AppError;
use crate::identity::{authenticate, IdentityProvider};
use crate::reimbursements::domain::RequestStatus;
use crate::store::PageRequest;
use crate::users::UserUpdate;

use super::service::AdminService;

#[derive(Clone)]
pub struct AdminRoutes {
    pub service: Arc<AdminService>,
    pub identity: Arc<dyn IdentityProvider>,
}

/// Router builder for the admin surface.
pub fn admin_router(state: AdminRoutes) -> Router {
    Router::new()
        .route("/api/v1/admin/dashboard", get(dashboard_handler))
        .route("/api/v1/admin/users", get(list_users_handler))
        .route(
            "/api/v1/admin/users/:user_id",
            get(get_user_handler)
                .put(update_user_handler)
                .delete(delete_user_handler),
        )
        .route("/api/v1/admin/reimbursements", get(list_requests_handler))
        .with_state(state)
}

async fn dashboard_handler(
    State(state): State<AdminRoutes>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let caller = authenticate(&*state.identity, &headers)?;
    let dashboard = state.service.dashboard(caller, Utc::now())?;
    Ok(Json(dashboard))
}

#[derive(Debug, Deserialize)]
struct UserListQuery {
    search: Option<String>,
    page: Option<usize>,
    limit: Option<usize>,
}

fn page_from(page: Option<usize>, limit: Option<usize>) -> PageRequest {
    let defaults = PageRequest::default();
    PageRequest {
        page: page.unwrap_or(defaults.page),
        limit: limit.unwrap_or(defaults.limit),
    }
}

async fn list_users_handler(
    State(state): State<AdminRoutes>,
    Query(query): Query<UserListQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let caller = authenticate(&*state.identity, &headers)?;
    let page = state.service.list_users(
        caller,
        query.search.as_deref(),
        page_from(query.page, query.limit),
    )?;
    Ok(Json(page))
}

async fn get_user_handler(
    State(state): State<AdminRoutes>,
    Path(user_id): Path<UserId>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let caller = authenticate(&*state.identity, &headers)?;
    let detail = state.service.get_user(caller, user_id)?;
    Ok(Json(detail))
}

async fn update_user_handler(
    State(state): State<AdminRoutes>,
    Path(user_id): Path<UserId>,
    headers: HeaderMap,
    Json(update): Json<UserUpdate>,
) -> Result<impl IntoResponse, AppError> {
    let caller = authenticate(&*state.identity, &headers)?;
    let user = state.service.update_user(caller, user_id, update)?;
    Ok(Json(user))
}

async fn delete_user_handler(
    State(state): State<AdminRoutes>,
    Path(user_id): Path<UserId>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let caller = authenticate(&*state.identity, &headers)?;
    state.service.delete_user(caller, user_id)?;
    Ok(Json(serde_json::json!({ "deleted": user_id })))
}

#[derive(Debug, Deserialize)]
struct RequestListQuery {
    status: Option<RequestStatus>,
    user_id: Option<UserId>,
    page: Option<usize>,
    limit: Option<usize>,
}

async fn list_requests_handler(
    State(state): State<AdminRoutes>,
    Query(query): Query<RequestListQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let caller = authenticate(&*state.identity, &headers)?;
    let page = state.service.list_requests(
        caller,
        query.status,
        query.user_id,
        page_from(query.page, query.limit),
    )?;
    Ok(Json(page))
}
