use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

use crate::admin::service::AdminServiceError;
use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::documents::compression::CompressionError;
use crate::documents::service::DocumentServiceError;
use crate::identity::IdentityError;
use crate::plans::service::PlanServiceError;
use crate::reimbursements::service::RequestServiceError;
use crate::telemetry::TelemetryError;

/// Boundary error for the API surface.
///
/// Every variant maps to a stable machine-readable `kind` plus a human
/// message in the JSON body; none is fatal to the process.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Auth(IdentityError),
    Catalog(CatalogError),
    Plan(PlanServiceError),
    Request(RequestServiceError),
    Document(DocumentServiceError),
    Admin(AdminServiceError),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config_error",
            AppError::Telemetry(_) => "telemetry_error",
            AppError::Io(_) => "io_error",
            AppError::Server(_) => "server_error",
            AppError::Auth(_) => "unauthorized",
            AppError::Catalog(err) => err.kind(),
            AppError::Plan(err) => err.kind(),
            AppError::Request(err) => err.kind(),
            AppError::Document(err) => err.kind(),
            AppError::Admin(err) => err.kind(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Auth(IdentityError::Unavailable(_)) => StatusCode::BAD_GATEWAY,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Catalog(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Plan(err) => match err {
                PlanServiceError::NotFound => StatusCode::NOT_FOUND,
                PlanServiceError::HasDependentRecords(_) => StatusCode::CONFLICT,
                PlanServiceError::Validation(_) => StatusCode::BAD_REQUEST,
                PlanServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Request(err) => match err {
                RequestServiceError::NotFound => StatusCode::NOT_FOUND,
                RequestServiceError::InvalidAssociation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                RequestServiceError::Validation(_) => StatusCode::BAD_REQUEST,
                RequestServiceError::Notify(_) => StatusCode::BAD_GATEWAY,
                RequestServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Document(err) => match err {
                DocumentServiceError::NotFound => StatusCode::NOT_FOUND,
                DocumentServiceError::Validation(_) => StatusCode::BAD_REQUEST,
                DocumentServiceError::Compression(CompressionError::LimitExceeded { .. }) => {
                    StatusCode::PAYLOAD_TOO_LARGE
                }
                DocumentServiceError::Compression(_)
                | DocumentServiceError::Repository(_)
                | DocumentServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Admin(err) => match err {
                AdminServiceError::Forbidden => StatusCode::FORBIDDEN,
                AdminServiceError::NotFound => StatusCode::NOT_FOUND,
                AdminServiceError::Validation(_) => StatusCode::BAD_REQUEST,
                AdminServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Config(_) | AppError::Telemetry(_) | AppError::Io(_) | AppError::Server(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Auth(err) => write!(f, "authentication error: {}", err),
            AppError::Catalog(err) => write!(f, "{}", err),
            AppError::Plan(err) => write!(f, "{}", err),
            AppError::Request(err) => write!(f, "{}", err),
            AppError::Document(err) => write!(f, "{}", err),
            AppError::Admin(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Auth(err) => Some(err),
            AppError::Catalog(err) => Some(err),
            AppError::Plan(err) => Some(err),
            AppError::Request(err) => Some(err),
            AppError::Document(err) => Some(err),
            AppError::Admin(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": self.to_string(),
            "kind": self.kind(),
        }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<IdentityError> for AppError {
    fn from(value: IdentityError) -> Self {
        Self::Auth(value)
    }
}

impl From<CatalogError> for AppError {
    fn from(value: CatalogError) -> Self {
        Self::Catalog(value)
    }
}

impl From<PlanServiceError> for AppError {
    fn from(value: PlanServiceError) -> Self {
        Self::Plan(value)
    }
}

impl From<RequestServiceError> for AppError {
    fn from(value: RequestServiceError) -> Self {
        Self::Request(value)
    }
}

impl From<DocumentServiceError> for AppError {
    fn from(value: DocumentServiceError) -> Self {
        Self::Document(value)
    }
}

impl From<AdminServiceError> for AppError {
    fn from(value: AdminServiceError) -> Self {
        Self::Admin(value)
    }
}
