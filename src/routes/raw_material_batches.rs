use anyhow::Context;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppJson, AppPath, ErrorBody},
    app_state::AppState,
    models::{QualityCheckEntity, RawMaterialBatchEntity},
    storage::{
        quality_checks,
        raw_batches::{self, NewRawMaterialBatch},
    },
    workflow::QualityStatus,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(get_batches, create_batch))
        .routes(routes!(get_batch))
        .routes(routes!(update_quality_status))
        .routes(routes!(get_batch_checks))
}

#[derive(Deserialize, ToSchema)]
struct QualityStatusReq {
    status: QualityStatus,
}

#[utoipa::path(
    get,
    path = "/raw-material-batches",
    tags = ["Raw Material Batches"],
    security(("session" = [])),
    responses(
        (status = 200, description = "List raw material batches", body = Vec<RawMaterialBatchEntity>)
    )
)]
async fn get_batches(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    Ok(Json(raw_batches::list(conn).await?))
}

#[utoipa::path(
    post,
    path = "/raw-material-batches",
    tags = ["Raw Material Batches"],
    security(("session" = [])),
    request_body = NewRawMaterialBatch,
    responses(
        (status = 201, description = "Batch created", body = RawMaterialBatchEntity),
        (status = 400, description = "Invalid input or duplicate batch number", body = ErrorBody)
    )
)]
async fn create_batch(
    State(state): State<AppState>,
    AppJson(input): AppJson<NewRawMaterialBatch>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let batch = raw_batches::create(conn, input).await?;
    Ok((StatusCode::CREATED, Json(batch)))
}

#[utoipa::path(
    get,
    path = "/raw-material-batches/{id}",
    tags = ["Raw Material Batches"],
    security(("session" = [])),
    params(("id" = Uuid, Path, description = "Batch ID")),
    responses(
        (status = 200, description = "Raw material batch", body = RawMaterialBatchEntity),
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

    let batch = raw_batches::get_by_id(conn, id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(batch))
}

/// Record the quality outcome on the batch itself.
#[utoipa::path(
    patch,
    path = "/raw-material-batches/{id}/quality-status",
    tags = ["Raw Material Batches"],
    security(("session" = [])),
    params(("id" = Uuid, Path, description = "Batch ID")),
    request_body = QualityStatusReq,
    responses(
        (status = 200, description = "Quality status updated", body = RawMaterialBatchEntity),
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
        raw_batches::update_quality_status(conn, id, req.status).await?,
    ))
}

/// Inspection history of a batch, most recent first.
#[utoipa::path(
    get,
    path = "/raw-material-batches/{id}/quality-checks",
    tags = ["Raw Material Batches"],
    security(("session" = [])),
    params(("id" = Uuid, Path, description = "Batch ID")),
    responses(
        (status = 200, description = "Checks for the batch", body = Vec<QualityCheckEntity>),
        (status = 404, description = "No such batch", body = ErrorBody)
    )
)]
async fn get_batch_checks(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    if raw_batches::get_by_id(conn, id).await?.is_none() {
        return Err(AppError::NotFound);
    }

    Ok(Json(quality_checks::list_for_batch(conn, id).await?))
}
