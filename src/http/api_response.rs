use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct StatusBody {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub struct ResponseBuilder;

impl ResponseBuilder {
    /// 202 with `{"status": ...}`.
    pub fn accepted(status: &'static str) -> Response {
        (StatusCode::ACCEPTED, Json(StatusBody { status })).into_response()
    }

    /// Any status with `{"error": ...}`.
    pub fn error(status_code: StatusCode, message: impl Into<String>) -> Response {
        (
            status_code,
            Json(ErrorBody {
                error: message.into(),
            }),
        )
            .into_response()
    }
}
