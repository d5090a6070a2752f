use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::query::PageMeta;

/// ApiResponse
///
/// The uniform success envelope: `{status, message, data?, pagination?}`.
/// Every successful handler returns one of these; the embedded status code
/// also drives the HTTP status of the response, so a 201 payload and a 201
/// status line cannot drift apart.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PageMeta>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 envelope carrying a payload.
    pub fn ok(message: &str, data: T) -> Self {
        Self {
            status: StatusCode::OK.as_u16(),
            message: message.to_string(),
            data: Some(data),
            pagination: None,
        }
    }

    /// 201 envelope for newly created records.
    pub fn created(message: &str, data: T) -> Self {
        Self {
            status: StatusCode::CREATED.as_u16(),
            message: message.to_string(),
            data: Some(data),
            pagination: None,
        }
    }

    /// 200 envelope with no payload (e.g., delete confirmations).
    pub fn message_only(message: &str) -> Self {
        Self {
            status: StatusCode::OK.as_u16(),
            message: message.to_string(),
            data: None,
            pagination: None,
        }
    }

    /// Attaches page metadata to a list envelope.
    pub fn with_pagination(mut self, meta: PageMeta) -> Self {
        self.pagination = Some(meta);
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let code = StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK);
        (code, Json(self)).into_response()
    }
}
