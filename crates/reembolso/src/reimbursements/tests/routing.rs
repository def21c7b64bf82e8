use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::reimbursements::domain::{RequestStatus, RequestUpdate};
use crate::reimbursements::router::{reimbursement_router, ReimbursementRoutes};

const TOKEN: &str = "token-titular";

fn build_router(harness: &Harness) -> axum::Router {
    harness.identity.grant(TOKEN, owner());
    reimbursement_router(ReimbursementRoutes {
        service: harness.request_service.clone(),
        identity: harness.identity.clone(),
    })
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

fn authorized(request: Request<Body>) -> Request<Body> {
    let (mut parts, body) = request.into_parts();
    parts.headers.insert(
        axum::http::header::AUTHORIZATION,
        format!("Bearer {TOKEN}").parse().unwrap(),
    );
    Request::from_parts(parts, body)
}

#[tokio::test]
async fn post_creates_a_started_request() {
    let harness = harness();
    let plan = harness.seed_plan(owner());
    let dependent = harness.seed_dependent(owner(), &plan);
    let router = build_router(&harness);

    let payload = json!({
        "plan_id": plan.id,
        "dependent_id": dependent.id,
        "attendance_type": "consulta",
        "attendance_date": "2024-01-10",
        "amount_paid": "250.00",
    });

    let response = router
        .oneshot(authorized(
            Request::builder()
                .method("POST")
                .uri("/api/v1/reimbursements")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .expect("request builds"),
        ))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    assert_eq!(body.get("status"), Some(&json!("started")));
    assert_eq!(body.get("reminder_interval_days"), Some(&json!(3)));
}

#[tokio::test]
async fn detail_includes_missing_document_kinds() {
    let harness = harness();
    let plan = harness.seed_plan(owner());
    let dependent = harness.seed_dependent(owner(), &plan);
    let request = harness
        .request_service
        .create(owner(), new_request(&plan, &dependent), Utc::now())
        .expect("request creates");
    let router = build_router(&harness);

    let response = router
        .oneshot(authorized(
            Request::builder()
                .uri(format!("/api/v1/reimbursements/{}", request.id))
                .body(Body::empty())
                .expect("request builds"),
        ))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let completeness = body.get("completeness").expect("completeness present");
    assert_eq!(
        completeness.get("missing_kinds"),
        Some(&json!(["nota_fiscal", "comprovante_pagamento"]))
    );
    assert_eq!(completeness.get("ratio"), Some(&json!(0.0)));
}

#[tokio::test]
async fn put_transition_clears_reminder_state_on_finalize() {
    let harness = harness();
    let plan = harness.seed_plan(owner());
    let dependent = harness.seed_dependent(owner(), &plan);
    let request = harness
        .request_service
        .create(owner(), new_request(&plan, &dependent), Utc::now())
        .expect("request creates");
    harness
        .request_service
        .update(
            owner(),
            request.id,
            RequestUpdate {
                status: Some(RequestStatus::AwaitingSupplementalDocs),
                pending_docs_description: Some("missing invoice".to_string()),
                ..RequestUpdate::default()
            },
            Utc::now(),
        )
        .expect("moves to supplemental docs");
    let router = build_router(&harness);

    let response = router
        .oneshot(authorized(
            Request::builder()
                .method("PUT")
                .uri(format!("/api/v1/reimbursements/{}", request.id))
                .header("content-type", "application/json")
                .body(Body::from(json!({ "status": "finalized" }).to_string()))
                .expect("request builds"),
        ))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body.get("status"), Some(&json!("finalized")));
    assert_eq!(body.get("last_reminder_at"), Some(&Value::Null));
    assert_eq!(body.get("pending_docs_description"), Some(&Value::Null));
}

#[tokio::test]
async fn unknown_status_strings_are_rejected_at_the_boundary() {
    let harness = harness();
    let plan = harness.seed_plan(owner());
    let dependent = harness.seed_dependent(owner(), &plan);
    let request = harness
        .request_service
        .create(owner(), new_request(&plan, &dependent), Utc::now())
        .expect("request creates");
    let router = build_router(&harness);

    let response = router
        .oneshot(authorized(
            Request::builder()
                .method("PUT")
                .uri(format!("/api/v1/reimbursements/{}", request.id))
                .header("content-type", "application/json")
                .body(Body::from(json!({ "status": "arquivado" }).to_string()))
                .expect("request builds"),
        ))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn requests_without_credentials_are_unauthorized() {
    let harness = harness();
    let router = build_router(&harness);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/v1/reimbursements")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = read_json(response).await;
    assert_eq!(body.get("kind"), Some(&json!("unauthorized")));
}

#[tokio::test]
async fn foreign_requests_read_as_not_found() {
    let harness = harness();
    let plan = harness.seed_plan(owner());
    let dependent = harness.seed_dependent(owner(), &plan);
    let request = harness
        .request_service
        .create(owner(), new_request(&plan, &dependent), Utc::now())
        .expect("request creates");

    harness.identity.grant("token-intruso", stranger());
    let router = reimbursement_router(ReimbursementRoutes {
        service: harness.request_service.clone(),
        identity: harness.identity.clone(),
    });

    let response = router
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/reimbursements/{}", request.id))
                .header(
                    axum::http::header::AUTHORIZATION,
                    "Bearer token-intruso",
                )
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json(response).await;
    assert_eq!(body.get("kind"), Some(&json!("not_found")));
}

#[tokio::test]
async fn board_groups_requests_by_status_column() {
    let harness = harness();
    let plan = harness.seed_plan(owner());
    let dependent = harness.seed_dependent(owner(), &plan);
    harness
        .request_service
        .create(owner(), new_request(&plan, &dependent), Utc::now())
        .expect("request creates");
    let router = build_router(&harness);

    let response = router
        .oneshot(authorized(
            Request::builder()
                .uri("/api/v1/reimbursements/board")
                .body(Body::empty())
                .expect("request builds"),
        ))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let columns = body
        .get("columns")
        .and_then(Value::as_array)
        .expect("columns present");
    assert_eq!(columns.len(), 6);
    assert_eq!(columns[0].get("status"), Some(&json!("started")));
    assert_eq!(
        columns[0]
            .get("requests")
            .and_then(Value::as_array)
            .map(Vec::len),
        Some(1)
    );
}
