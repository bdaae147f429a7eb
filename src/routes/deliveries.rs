use anyhow::Context;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppJson, AppPath, ErrorBody},
    app_state::AppState,
    models::{DeliveryEntity, WeighbridgeReadingEntity},
    storage::{
        deliveries::{self, NewDelivery},
        weighbridge,
    },
    workflow::DeliveryStatus,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(get_deliveries, create_delivery))
        .routes(routes!(get_pending_weighbridge))
        .routes(routes!(get_delivery))
        .routes(routes!(update_delivery_status))
        .routes(routes!(get_delivery_reading))
}

#[derive(Deserialize, ToSchema)]
struct DeliveryStatusReq {
    status: DeliveryStatus,
}

/// All deliveries, most recent delivery date first.
#[utoipa::path(
    get,
    path = "/deliveries",
    tags = ["Deliveries"],
    security(("session" = [])),
    responses(
        (status = 200, description = "List deliveries", body = Vec<DeliveryEntity>)
    )
)]
async fn get_deliveries(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    Ok(Json(deliveries::list(conn).await?))
}

/// Register an arriving truck. Status defaults to `pending`.
#[utoipa::path(
    post,
    path = "/deliveries",
    tags = ["Deliveries"],
    security(("session" = [])),
    request_body = NewDelivery,
    responses(
        (status = 201, description = "Delivery registered", body = DeliveryEntity),
        (status = 400, description = "Invalid input or unknown supplier", body = ErrorBody)
    )
)]
async fn create_delivery(
    State(state): State<AppState>,
    AppJson(input): AppJson<NewDelivery>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let delivery = deliveries::create(conn, input).await?;
    Ok((StatusCode::CREATED, Json(delivery)))
}

/// Deliveries waiting to be weighed.
#[utoipa::path(
    get,
    path = "/deliveries/pending-weighbridge",
    tags = ["Deliveries"],
    security(("session" = [])),
    responses(
        (status = 200, description = "Pending deliveries", body = Vec<DeliveryEntity>)
    )
)]
async fn get_pending_weighbridge(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    Ok(Json(deliveries::pending_weighbridge(conn).await?))
}

#[utoipa::path(
    get,
    path = "/deliveries/{id}",
    tags = ["Deliveries"],
    security(("session" = [])),
    params(("id" = Uuid, Path, description = "Delivery ID")),
    responses(
        (status = 200, description = "Delivery", body = DeliveryEntity),
        (status = 404, description = "No such delivery", body = ErrorBody)
    )
)]
async fn get_delivery(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let delivery = deliveries::get_by_id(conn, id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(delivery))
}

/// Move a delivery along its workflow.
#[utoipa::path(
    patch,
    path = "/deliveries/{id}/status",
    tags = ["Deliveries"],
    security(("session" = [])),
    params(("id" = Uuid, Path, description = "Delivery ID")),
    request_body = DeliveryStatusReq,
    responses(
        (status = 200, description = "Status updated", body = DeliveryEntity),
        (status = 404, description = "No such delivery", body = ErrorBody),
        (status = 409, description = "Transition not allowed", body = ErrorBody)
    )
)]
async fn update_delivery_status(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<DeliveryStatusReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    Ok(Json(deliveries::update_status(conn, id, req.status).await?))
}

/// Latest weighbridge reading taken for a delivery.
#[utoipa::path(
    get,
    path = "/deliveries/{id}/weighbridge-reading",
    tags = ["Deliveries"],
    security(("session" = [])),
    params(("id" = Uuid, Path, description = "Delivery ID")),
    responses(
        (status = 200, description = "Reading", body = WeighbridgeReadingEntity),
        (status = 404, description = "Delivery not weighed yet", body = ErrorBody)
    )
)]
async fn get_delivery_reading(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let reading = weighbridge::get_by_delivery_id(conn, id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(reading))
}
