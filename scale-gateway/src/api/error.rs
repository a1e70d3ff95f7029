//! Management-API error type and its `IntoResponse` mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::directory::DirectoryError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("no free scale slot")]
    NoFreeSlot,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::NoFreeSlot => ApiError::NoFreeSlot,
            DirectoryError::Store(e) => ApiError::Store(e),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::NoFreeSlot => (StatusCode::BAD_REQUEST, "no_free_slot"),
            ApiError::Store(StoreError::Unavailable(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable")
            }
            ApiError::Store(StoreError::ConstraintConflict(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "constraint_conflict")
            }
        };

        (
            status,
            Json(ErrorBody {
                error: kind,
                detail: self.to_string(),
            }),
        )
            .into_response()
    }
}
