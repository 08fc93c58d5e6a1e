use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorBody>);

pub type ApiResponse<T> = Result<Json<T>, ApiError>;

pub fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

pub fn internal_error<E>(err: E) -> ApiError
where
    E: std::error::Error,
{
    error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}
