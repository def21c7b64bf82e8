use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use mime::Mime;
use serde::Deserialize;

use crate::catalog::DocumentKind;
use crate::domain::{DocumentId, RequestId};
use crate::error::AppError;
use crate::identity::{authenticate, IdentityProvider};

use super::domain::{DocumentUpload, RecurrentRevision};
use super::service::{DocumentService, DocumentServiceError};

#[derive(Clone)]
pub struct DocumentRoutes {
    pub service: Arc<DocumentService>,
    pub identity: Arc<dyn IdentityProvider>,
}

/// Router builder exposing document upload, linking, and retrieval.
pub fn document_router(state: DocumentRoutes) -> Router {
    Router::new()
        .route("/api/v1/documents", post(upload_handler))
        .route(
            "/api/v1/documents/recurrent",
            get(list_recurrent_handler),
        )
        .route(
            "/api/v1/documents/recurrent/:document_id",
            post(update_recurrent_handler),
        )
        .route("/api/v1/documents/links", post(link_handler))
        .route(
            "/api/v1/documents/request/:request_id",
            get(list_for_request_handler),
        )
        .route(
            "/api/v1/documents/:document_id",
            get(get_handler).delete(delete_handler),
        )
        .route(
            "/api/v1/documents/:document_id/content",
            get(download_handler),
        )
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct UploadQuery {
    kind: DocumentKind,
    request_id: Option<RequestId>,
    #[serde(default)]
    recurrent: bool,
    file_name: String,
}

fn resolve_mime(headers: &HeaderMap, file_name: &str) -> Result<Mime, AppError> {
    if let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    {
        return content_type.parse::<Mime>().map_err(|_| {
            DocumentServiceError::Validation(format!("malformed content type '{content_type}'"))
                .into()
        });
    }

    mime_guess::from_path(file_name).first().ok_or_else(|| {
        DocumentServiceError::Validation(
            "content-type header missing and file extension unrecognized".to_string(),
        )
        .into()
    })
}

async fn upload_handler(
    State(state): State<DocumentRoutes>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let caller = authenticate(&*state.identity, &headers)?;
    let mime = resolve_mime(&headers, &query.file_name)?;

    let document = state.service.upload(
        caller,
        DocumentUpload {
            kind: query.kind,
            request_id: query.request_id,
            is_recurrent: query.recurrent,
            original_name: query.file_name,
            mime,
            bytes: body.to_vec(),
        },
        Utc::now(),
    )?;

    Ok((StatusCode::CREATED, Json(document)))
}

#[derive(Debug, Deserialize)]
struct RecurrentQuery {
    kind: Option<DocumentKind>,
}

async fn list_recurrent_handler(
    State(state): State<DocumentRoutes>,
    Query(query): Query<RecurrentQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let caller = authenticate(&*state.identity, &headers)?;
    let documents = state.service.list_recurrent(caller, query.kind)?;
    Ok(Json(documents))
}

#[derive(Debug, Deserialize)]
struct RevisionQuery {
    file_name: String,
}

async fn update_recurrent_handler(
    State(state): State<DocumentRoutes>,
    Path(document_id): Path<DocumentId>,
    Query(query): Query<RevisionQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let caller = authenticate(&*state.identity, &headers)?;
    let mime = resolve_mime(&headers, &query.file_name)?;

    let replacement = state.service.update_recurrent(
        caller,
        document_id,
        RecurrentRevision {
            original_name: query.file_name,
            mime,
            bytes: body.to_vec(),
        },
        Utc::now(),
    )?;

    Ok((StatusCode::CREATED, Json(replacement)))
}

#[derive(Debug, Deserialize)]
struct LinkBody {
    document_id: DocumentId,
    request_id: RequestId,
}

async fn link_handler(
    State(state): State<DocumentRoutes>,
    headers: HeaderMap,
    Json(body): Json<LinkBody>,
) -> Result<impl IntoResponse, AppError> {
    let caller = authenticate(&*state.identity, &headers)?;
    let link =
        state
            .service
            .link_recurrent(caller, body.document_id, body.request_id, Utc::now())?;
    Ok((StatusCode::CREATED, Json(link)))
}

async fn list_for_request_handler(
    State(state): State<DocumentRoutes>,
    Path(request_id): Path<RequestId>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let caller = authenticate(&*state.identity, &headers)?;
    let documents = state.service.list_for_request(caller, request_id)?;
    Ok(Json(documents))
}

async fn get_handler(
    State(state): State<DocumentRoutes>,
    Path(document_id): Path<DocumentId>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let caller = authenticate(&*state.identity, &headers)?;
    let document = state.service.get(caller, document_id)?;
    Ok(Json(document))
}

async fn download_handler(
    State(state): State<DocumentRoutes>,
    Path(document_id): Path<DocumentId>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let caller = authenticate(&*state.identity, &headers)?;
    let (document, bytes) = state.service.download(caller, document_id)?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, document.mime.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", document.original_name),
            ),
        ],
        bytes,
    ))
}

async fn delete_handler(
    State(state): State<DocumentRoutes>,
    Path(document_id): Path<DocumentId>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let caller = authenticate(&*state.identity, &headers)?;
    state.service.delete(caller, document_id)?;
    Ok(Json(serde_json::json!({ "deleted": document_id })))
}
