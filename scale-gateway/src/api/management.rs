//! Read-through management API over the same entities the ingestion
//! pipeline writes: scales, measurements, users, raw uploads.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use super::dto::{
    CreateUserQuery, HealthDto, LatestMeasurementQuery, MeasurementDto, MeasurementQuery,
    RawUploadDto, RawUploadQuery, ScaleDto, UserDto,
};
use super::error::ApiError;
use super::state::AppState;
use crate::domain::user::{Gender, NewUserProfile};
use crate::store::MeasurementFilter;
use crate::validator::MAX_WEIGHT_GRAMS;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(health))
        .routes(routes!(list_scales))
        .routes(routes!(list_measurements))
        .routes(routes!(latest_measurement))
        .routes(routes!(list_users, create_user))
        .routes(routes!(delete_user))
        .routes(routes!(list_raw_uploads))
}

/// Liveness plus a lightweight database probe.
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "management",
    responses((status = OK, description = "Server and database status", body = HealthDto)),
)]
async fn health(State(state): State<AppState>) -> Json<HealthDto> {
    let db = match state.store.list_scales().await {
        Ok(_) => "ok",
        Err(_) => "error",
    };
    Json(HealthDto { status: "ok", db })
}

#[utoipa::path(
    get,
    path = "/api/scales",
    tag = "management",
    responses((status = OK, description = "Known scales", body = Vec<ScaleDto>)),
)]
async fn list_scales(State(state): State<AppState>) -> Result<Json<Vec<ScaleDto>>, ApiError> {
    let scales = state.registry.list().await?;
    Ok(Json(scales.into_iter().map(ScaleDto::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/measurements",
    tag = "management",
    params(MeasurementQuery),
    responses((status = OK, description = "Measurements, newest first", body = Vec<MeasurementDto>)),
)]
async fn list_measurements(
    State(state): State<AppState>,
    Query(query): Query<MeasurementQuery>,
) -> Result<Json<Vec<MeasurementDto>>, ApiError> {
    let filter = MeasurementFilter {
        user_id: query.user_id,
        scale_mac: query.scale_mac,
        limit: query.limit.unwrap_or(50),
        offset: query.offset.unwrap_or(0),
    };
    let measurements = state.store.list_measurements(filter).await?;
    Ok(Json(
        measurements
            .into_iter()
            .map(|m| MeasurementDto::from_domain(m, state.weight_unit))
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/measurements/latest",
    tag = "management",
    params(LatestMeasurementQuery),
    responses(
        (status = OK, description = "Most recent measurement for the user", body = MeasurementDto),
        (status = NOT_FOUND, description = "User has no measurements"),
    ),
)]
async fn latest_measurement(
    State(state): State<AppState>,
    Query(query): Query<LatestMeasurementQuery>,
) -> Result<Json<MeasurementDto>, ApiError> {
    let measurement = state
        .store
        .latest_measurement(query.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no measurements for user {}", query.user_id)))?;
    Ok(Json(MeasurementDto::from_domain(measurement, state.weight_unit)))
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "management",
    responses((status = OK, description = "Active user profiles", body = Vec<UserDto>)),
)]
async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserDto>>, ApiError> {
    let users = state.store.list_users_by_slot().await?;
    Ok(Json(users.into_iter().map(UserDto::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "management",
    params(CreateUserQuery),
    responses(
        (status = OK, description = "Created user profile", body = UserDto),
        (status = 400, description = "Unknown gender or no free slot"),
    ),
)]
async fn create_user(
    State(state): State<AppState>,
    Query(query): Query<CreateUserQuery>,
) -> Result<Json<UserDto>, ApiError> {
    let gender = match query.gender.to_ascii_lowercase().as_str() {
        "female" | "f" => Gender::Female,
        "male" | "m" => Gender::Male,
        other => return Err(ApiError::BadRequest(format!("unknown gender {other:?}"))),
    };

    let profile = NewUserProfile {
        display_name: query.name,
        height_mm: (query.height_cm * 10.0).round() as u16,
        age: query.age,
        gender,
        min_weight_grams: query
            .min_kg
            .map(|kg| (kg * 1000.0).round() as u32)
            .unwrap_or(0),
        max_weight_grams: query
            .max_kg
            .map(|kg| (kg * 1000.0).round() as u32)
            .unwrap_or(MAX_WEIGHT_GRAMS),
    };

    let created = state.directory.create(profile).await?;
    Ok(Json(UserDto::from(created)))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "management",
    params(("id" = i64, Path, description = "User profile ID")),
    responses((status = 204, description = "User deleted (or was already gone)")),
)]
async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.directory.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/raw-uploads",
    tag = "management",
    params(RawUploadQuery),
    responses((status = OK, description = "Raw upload debug log", body = Vec<RawUploadDto>)),
)]
async fn list_raw_uploads(
    State(state): State<AppState>,
    Query(query): Query<RawUploadQuery>,
) -> Result<Json<Vec<RawUploadDto>>, ApiError> {
    let uploads = state.store.list_raw_uploads(query.errors_only).await?;
    Ok(Json(uploads.into_iter().map(RawUploadDto::from).collect()))
}
