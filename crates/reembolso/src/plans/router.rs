use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::domain::{DependentId, PlanId};
use crate::error::AppError;
use crate::identity::{authenticate, IdentityProvider};

use super::domain::{DependentUpdate, NewDependent, NewPlan, PlanUpdate, Relation};
use super::service::PlanService;

#[derive(Clone)]
pub struct PlanRoutes {
    pub service: Arc<PlanService>,
    pub identity: Arc<dyn IdentityProvider>,
}

/// Router builder for plan and dependent management.
pub fn plan_router(state: PlanRoutes) -> Router {
    Router::new()
        .route("/api/v1/plans", get(list_plans_handler).post(create_plan_handler))
        .route(
            "/api/v1/plans/:plan_id",
            get(get_plan_handler)
                .put(update_plan_handler)
                .delete(delete_plan_handler),
        )
        .route(
            "/api/v1/dependents",
            get(list_dependents_handler).post(create_dependent_handler),
        )
        .route(
            "/api/v1/dependents/relations/available",
            get(relations_handler),
        )
        .route(
            "/api/v1/dependents/:dependent_id",
            get(get_dependent_handler)
                .put(update_dependent_handler)
                .delete(delete_dependent_handler),
        )
        .with_state(state)
}

async fn list_plans_handler(
    State(state): State<PlanRoutes>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let caller = authenticate(&*state.identity, &headers)?;
    let plans = state.service.list_plans(caller)?;
    Ok(Json(plans))
}

async fn create_plan_handler(
    State(state): State<PlanRoutes>,
    headers: HeaderMap,
    Json(new_plan): Json<NewPlan>,
) -> Result<impl IntoResponse, AppError> {
    let caller = authenticate(&*state.identity, &headers)?;
    let plan = state.service.create_plan(caller, new_plan, Utc::now())?;
    Ok((StatusCode::CREATED, Json(plan)))
}

async fn get_plan_handler(
    State(state): State<PlanRoutes>,
    Path(plan_id): Path<PlanId>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let caller = authenticate(&*state.identity, &headers)?;
    let plan = state.service.get_plan(caller, plan_id)?;
    Ok(Json(plan))
}

async fn update_plan_handler(
    State(state): State<PlanRoutes>,
    Path(plan_id): Path<PlanId>,
    headers: HeaderMap,
    Json(update): Json<PlanUpdate>,
) -> Result<impl IntoResponse, AppError> {
    let caller = authenticate(&*state.identity, &headers)?;
    let plan = state.service.update_plan(caller, plan_id, update, Utc::now())?;
    Ok(Json(plan))
}

async fn delete_plan_handler(
    State(state): State<PlanRoutes>,
    Path(plan_id): Path<PlanId>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let caller = authenticate(&*state.identity, &headers)?;
    state.service.delete_plan(caller, plan_id)?;
    Ok(Json(serde_json::json!({ "deleted": plan_id })))
}

#[derive(Debug, Deserialize)]
struct DependentListQuery {
    plan_id: Option<PlanId>,
}

async fn list_dependents_handler(
    State(state): State<PlanRoutes>,
    Query(query): Query<DependentListQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let caller = authenticate(&*state.identity, &headers)?;
    let dependents = state.service.list_dependents(caller, query.plan_id)?;
    Ok(Json(dependents))
}

async fn create_dependent_handler(
    State(state): State<PlanRoutes>,
    headers: HeaderMap,
    Json(new_dependent): Json<NewDependent>,
) -> Result<impl IntoResponse, AppError> {
    let caller = authenticate(&*state.identity, &headers)?;
    let dependent = state
        .service
        .create_dependent(caller, new_dependent, Utc::now())?;
    Ok((StatusCode::CREATED, Json(dependent)))
}

async fn get_dependent_handler(
    State(state): State<PlanRoutes>,
    Path(dependent_id): Path<DependentId>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let caller = authenticate(&*state.identity, &headers)?;
    let dependent = state.service.get_dependent(caller, dependent_id)?;
    Ok(Json(dependent))
}

async fn update_dependent_handler(
    State(state): State<PlanRoutes>,
    Path(dependent_id): Path<DependentId>,
    headers: HeaderMap,
    Json(update): Json<DependentUpdate>,
) -> Result<impl IntoResponse, AppError> {
    let caller = authenticate(&*state.identity, &headers)?;
    let dependent = state
        .service
        .update_dependent(caller, dependent_id, update, Utc::now())?;
    Ok(Json(dependent))
}

async fn delete_dependent_handler(
    State(state): State<PlanRoutes>,
    Path(dependent_id): Path<DependentId>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let caller = authenticate(&*state.identity, &headers)?;
    state.service.delete_dependent(caller, dependent_id)?;
    Ok(Json(serde_json::json!({ "deleted": dependent_id })))
}

#[derive(Debug, Serialize)]
struct RelationEntry {
    id: &'static str,
    name: &'static str,
}

async fn relations_handler() -> Json<Vec<RelationEntry>> {
    Json(
        Relation::ordered()
            .into_iter()
            .map(|relation| RelationEntry {
                id: relation.code(),
                name: relation.label(),
            })
            .collect(),
    )
}
