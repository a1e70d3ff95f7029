//! The three endpoints the scale itself talks to. None of these ever return
//! a non-2xx for a decode or validation problem -- the scale has no
//! retry-with-backoff logic, it just loops.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use super::state::AppState;
use crate::store::StoreError;
use crate::tracing::prelude::*;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(validate))
        .routes(routes!(register))
        .routes(routes!(upload))
}

/// Stateless liveness check the scale polls before attempting to upload.
#[utoipa::path(
    get,
    path = "/scale/validate",
    tag = "scale",
    responses(
        (status = OK, description = "Server is reachable", body = String, content_type = "text/plain"),
    ),
)]
async fn validate() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain")], "T")
}

/// Registration ping. Observed firmware sends this before its first upload;
/// a MAC in the query string (if present) is not required to record
/// anything beyond the no-op acknowledgment the scale expects.
#[utoipa::path(
    get,
    path = "/scale/register",
    tag = "scale",
    responses(
        (status = OK, description = "Registration acknowledged", body = String, content_type = "text/plain"),
    ),
)]
async fn register() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain")], "S\n")
}

/// The upload endpoint: binary frame in, binary frame out. Only a store
/// outage produces a non-2xx; everything else is absorbed into a
/// byte-exact response body.
#[utoipa::path(
    post,
    path = "/scale/upload",
    tag = "scale",
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = OK, description = "Response frame", body = Vec<u8>, content_type = "application/octet-stream"),
        (status = 503, description = "Store unavailable, upload rolled back"),
    ),
)]
async fn upload(State(state): State<AppState>, body: Bytes) -> Response {
    let now = time::OffsetDateTime::now_utc();
    match state.ingest.process_upload(&body, now, state.weight_unit).await {
        Ok(response_bytes) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/octet-stream")],
            response_bytes,
        )
            .into_response(),
        Err(StoreError::Unavailable(err)) => {
            error!(error = %err, "store unavailable during upload, transaction rolled back");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
        Err(StoreError::ConstraintConflict(detail)) => {
            error!(detail, "unexpected constraint conflict surfaced to the HTTP adapter");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}
