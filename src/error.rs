use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use ts_rs::TS;
use utoipa::ToSchema;

/// FieldError
///
/// A single failed validation rule, naming the offending field. Body
/// validation accumulates these so the client receives every violation in one
/// response instead of discovering them one request at a time.
#[derive(Debug, Clone, Serialize, TS, ToSchema)]
#[ts(export)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

/// StoreError
///
/// An unanticipated failure inside the persistence layer. Carried opaquely up
/// to the response mapping, where it becomes a generic 500; the underlying
/// database error is logged, never echoed to the client.
#[derive(Debug, thiserror::Error)]
#[error("storage error: {0}")]
pub struct StoreError(#[from] pub sqlx::Error);

/// ApiError
///
/// The full failure taxonomy of the API. The first four variants are
/// client-caused and map directly onto their response status; `Internal`
/// covers everything the client did not cause.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing, malformed, expired, or otherwise unusable credential.
    #[error("Authentication required")]
    Unauthenticated,

    /// Valid credential, insufficient role for the attempted action.
    #[error("Insufficient permissions")]
    Forbidden,

    /// Malformed input with a single, specific message.
    #[error("{0}")]
    BadRequest(String),

    /// Accumulated field-level validation failures.
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    /// The referenced record does not exist.
    #[error("{0}")]
    NotFound(&'static str),

    #[error(transparent)]
    Internal(#[from] StoreError),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error envelope rendering.
///
/// Single-message failures serialize as `{status, error}`; accumulated
/// validation failures as `{status, errors: [{field, message}]}`.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            ApiError::Validation(errors) => json!({
                "status": status.as_u16(),
                "errors": errors,
            }),
            ApiError::Internal(err) => {
                // Internal details are logged, never echoed to the client.
                tracing::error!("internal failure: {err:?}");
                json!({
                    "status": status.as_u16(),
                    "error": "Internal server error",
                })
            }
            other => json!({
                "status": status.as_u16(),
                "error": other.to_string(),
            }),
        };

        (status, Json(body)).into_response()
    }
}
