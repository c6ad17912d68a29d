//! HTTP error mapping.
//!
//! Every non-2xx response carries `{"error": {"code", "message", "field"?}}`.

use crate::generator::GeneratorError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{error, warn};
use okr_core::{EntityKind, OkrServiceError, RepoError, ValidationError};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug)]
pub enum ApiError {
    /// Malformed body or path parameter.
    BadRequest {
        message: String,
        field: Option<&'static str>,
    },
    Validation(ValidationError),
    NotFound(EntityKind, Uuid),
    GeneratorUnavailable,
    Upstream(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: ErrorDetail<'a>,
}

#[derive(Serialize)]
struct ErrorDetail<'a> {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'a str>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(..) => StatusCode::NOT_FOUND,
            Self::GeneratorUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "bad_request",
            Self::Validation(_) => "validation_error",
            Self::NotFound(..) => "not_found",
            Self::GeneratorUnavailable => "generator_unavailable",
            Self::Upstream(_) => "upstream_error",
            Self::Internal(_) => "internal_error",
        }
    }

    fn field(&self) -> Option<&'static str> {
        match self {
            Self::BadRequest { field, .. } => *field,
            Self::Validation(err) => Some(err.field()),
            _ => None,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::BadRequest { message, .. } => message.clone(),
            Self::Validation(err) => err.to_string(),
            Self::NotFound(kind, id) => format!("{kind} not found: {id}"),
            Self::GeneratorUnavailable => GeneratorError::Unavailable.to_string(),
            Self::Upstream(message) => message.clone(),
            // Storage details stay in the log.
            Self::Internal(_) => "internal storage error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Internal(detail) => {
                error!("event=http_error module=server status=error code=internal_error detail={detail}")
            }
            other => warn!(
                "event=http_error module=server status=rejected code={} http_status={}",
                other.code(),
                status.as_u16()
            ),
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code(),
                message: self.message(),
                field: self.field(),
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<OkrServiceError> for ApiError {
    fn from(value: OkrServiceError) -> Self {
        match value {
            OkrServiceError::Validation(err) => Self::Validation(err),
            OkrServiceError::NotFound(kind, id) => Self::NotFound(kind, id),
            OkrServiceError::Repo(err) => Self::Internal(err.to_string()),
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(value: RepoError) -> Self {
        OkrServiceError::from(value).into()
    }
}

impl From<ValidationError> for ApiError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self::BadRequest {
            message: value.body_text(),
            field: None,
        }
    }
}

impl From<GeneratorError> for ApiError {
    fn from(value: GeneratorError) -> Self {
        match value {
            GeneratorError::Unavailable => Self::GeneratorUnavailable,
            other => Self::Upstream(other.to_string()),
        }
    }
}
