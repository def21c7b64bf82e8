use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;

use crate::infra::AppState;
use reembolso::catalog;

/// Routes that need no authentication: liveness, readiness, metrics, and the
/// static catalogs the request form is built from.
pub(crate) fn base_router() -> axum::Router {
    axum::Router::new()
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/catalog/attendance-types",
            axum::routing::get(attendance_types_endpoint),
        )
        .route(
            "/api/v1/catalog/document-kinds",
            axum::routing::get(document_kinds_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn attendance_types_endpoint() -> Json<Vec<catalog::AttendanceTypeEntry>> {
    Json(catalog::attendance_catalog())
}

pub(crate) async fn document_kinds_endpoint() -> Json<Vec<catalog::DocumentKindEntry>> {
    Json(catalog::document_catalog())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn attendance_catalog_lists_every_type_with_documents() {
        let Json(entries) = attendance_types_endpoint().await;
        assert_eq!(entries.len(), 8);
        assert!(entries.iter().all(|entry| !entry.documents.is_empty()));
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body.get("status"), Some(&serde_json::json!("ok")));
    }
}
