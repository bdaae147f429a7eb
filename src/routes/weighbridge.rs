use anyhow::Context;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppJson, AppPath, ErrorBody},
    app_state::AppState,
    models::WeighbridgeReadingEntity,
    storage::weighbridge::{self, NewWeighbridgeReading, WeighbridgeReadingWithDelivery},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(get_readings, create_reading))
        .routes(routes!(get_reading))
}

/// Readings with their deliveries, latest first.
#[utoipa::path(
    get,
    path = "/weighbridge-readings",
    tags = ["Weighbridge"],
    security(("session" = [])),
    responses(
        (status = 200, description = "List readings", body = Vec<WeighbridgeReadingWithDelivery>)
    )
)]
async fn get_readings(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    Ok(Json(weighbridge::list_with_delivery(conn).await?))
}

/// Weigh a truck. The net weight is computed and the delivery is approved in
/// the same transaction.
#[utoipa::path(
    post,
    path = "/weighbridge-readings",
    tags = ["Weighbridge"],
    security(("session" = [])),
    request_body = NewWeighbridgeReading,
    responses(
        (status = 201, description = "Reading recorded", body = WeighbridgeReadingEntity),
        (status = 400, description = "Invalid weights or unknown delivery", body = ErrorBody)
    )
)]
async fn create_reading(
    State(state): State<AppState>,
    AppJson(input): AppJson<NewWeighbridgeReading>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let reading = weighbridge::create(conn, input).await?;
    Ok((StatusCode::CREATED, Json(reading)))
}

#[utoipa::path(
    get,
    path = "/weighbridge-readings/{id}",
    tags = ["Weighbridge"],
    security(("session" = [])),
    params(("id" = Uuid, Path, description = "Reading ID")),
    responses(
        (status = 200, description = "Reading with its delivery", body = WeighbridgeReadingWithDelivery),
        (status = 404, description = "No such reading", body = ErrorBody)
    )
)]
async fn get_reading(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let reading = weighbridge::get_with_delivery(conn, id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(reading))
}
