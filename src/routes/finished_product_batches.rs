use anyhow::Context;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppJson, AppPath, ErrorBody},
    app_state::AppState,
    models::FinishedProductBatchEntity,
    storage::finished_batches::{self, NewFinishedProductBatch},
    workflow::QualityStatus,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(get_batches, create_batch))
        .routes(routes!(get_batch))
        .routes(routes!(update_quality_status))
}

#[derive(Deserialize, ToSchema)]
struct QualityStatusReq {
    status: QualityStatus,
}

#[utoipa::path(
    get,
    path = "/finished-product-batches",
    tags = ["Finished Product Batches"],
    security(("session" = [])),
    responses(
        (status = 200, description = "List finished batches", body = Vec<FinishedProductBatchEntity>)
    )
)]
async fn get_batches(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    Ok(Json(finished_batches::list(conn).await?))
}

#[utoipa::path(
    post,
    path = "/finished-product-batches",
    tags = ["Finished Product Batches"],
    security(("session" = [])),
    request_body = NewFinishedProductBatch,
    responses(
        (status = 201, description = "Batch recorded", body = FinishedProductBatchEntity),
        (status = 400, description = "Invalid input or unknown production order", body = ErrorBody)
    )
)]
async fn create_batch(
    State(state): State<AppState>,
    AppJson(input): AppJson<NewFinishedProductBatch>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let batch = finished_batches::create(conn, input).await?;
    Ok((StatusCode::CREATED, Json(batch)))
}

#[utoipa::path(
    get,
    path = "/finished-product-batches/{id}",
    tags = ["Finished Product Batches"],
    security(("session" = [])),
    params(("id" = Uuid, Path, description = "Batch ID")),
    responses(
        (status = 200, description = "Finished product batch", body = FinishedProductBatchEntity),
        (status = 404, description = "No such batch", body = ErrorBody)
    )
)]
async fn get_batch(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let batch = finished_batches::get_by_id(conn, id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(batch))
}

#[utoipa::path(
    patch,
    path = "/finished-product-batches/{id}/quality-status",
    tags = ["Finished Product Batches"],
    security(("session" = [])),
    params(("id" = Uuid, Path, description = "Batch ID")),
    request_body = QualityStatusReq,
    responses(
        (status = 200, description = "Quality status updated", body = FinishedProductBatchEntity),
        (status = 404, description = "No such batch", body = ErrorBody),
        (status = 409, description = "Transition not allowed", body = ErrorBody)
    )
)]
async fn update_quality_status(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<QualityStatusReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    Ok(Json(
        finished_batches::update_quality_status(conn, id, req.status).await?,
    ))
}
