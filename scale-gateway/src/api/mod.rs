//! HTTP adapter: wires the scale-facing and management routes onto a single
//! `axum::Router`, with `utoipa`-generated OpenAPI docs served at
//! `/swagger-ui`.

pub mod dto;
pub mod error;
pub mod management;
pub mod scale;
pub mod state;

use axum::Router;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

pub use state::AppState;

#[derive(OpenApi)]
#[openapi(tags(
    (name = "scale", description = "Endpoints the scale firmware talks to"),
    (name = "management", description = "Read-through JSON views for operators"),
))]
struct ApiDoc;

/// Build the full router: scale endpoints, management endpoints, Swagger UI,
/// and request tracing.
pub fn router(state: AppState) -> Router {
    let (router, openapi) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(scale::routes())
        .merge(management::routes())
        .split_for_parts();

    router
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::codec::WeightUnit;
    use crate::store::fake::FakeStore;

    fn test_router() -> Router {
        let state = AppState::new(Arc::new(FakeStore::default()), WeightUnit::Kg);
        router(state)
    }

    #[tokio::test]
    async fn validate_endpoint_answers_t() {
        let response = test_router()
            .oneshot(Request::builder().uri("/scale/validate").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"T");
    }

    #[tokio::test]
    async fn health_endpoint_reports_ok_against_an_empty_store() {
        let response = test_router()
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["db"], "ok");
    }

    #[tokio::test]
    async fn empty_upload_body_still_gets_a_response_frame_back() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/scale/upload")
                    .body(Body::from(vec![0u8; 5]))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(!body.is_empty());
    }

    #[tokio::test]
    async fn create_user_then_list_users_round_trips_over_http() {
        let router = test_router();

        let create = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/users?name=Alice&height_cm=165&age=30&gender=female")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(create.status(), StatusCode::OK);

        let list = router
            .oneshot(Request::builder().uri("/api/users").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(list.status(), StatusCode::OK);
        let body = list.into_body().collect().await.unwrap().to_bytes();
        let users: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0]["display_name"], "Alice");
    }

    #[tokio::test]
    async fn unknown_gender_is_rejected_as_bad_request() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/users?name=Alice&height_cm=165&age=30&gender=nonbinary")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
