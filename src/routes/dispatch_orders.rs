use anyhow::Context;
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppJson, AppPath, ErrorBody},
    app_state::AppState,
    auth::AuthUser,
    models::DispatchOrderEntity,
    storage::dispatch::{self, DispatchOrderWithItems, NewDispatchOrder},
    workflow::DispatchStatus,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(get_orders, create_order))
        .routes(routes!(get_order))
        .routes(routes!(update_order_status))
}

#[derive(Deserialize, ToSchema)]
struct DispatchStatusReq {
    status: DispatchStatus,
}

#[utoipa::path(
    get,
    path = "/dispatch-orders",
    tags = ["Dispatch Orders"],
    security(("session" = [])),
    responses(
        (status = 200, description = "List dispatch orders", body = Vec<DispatchOrderEntity>)
    )
)]
async fn get_orders(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    Ok(Json(dispatch::list(conn).await?))
}

/// Create a dispatch order together with its line items.
#[utoipa::path(
    post,
    path = "/dispatch-orders",
    tags = ["Dispatch Orders"],
    security(("session" = [])),
    request_body = NewDispatchOrder,
    responses(
        (status = 201, description = "Dispatch order created", body = DispatchOrderWithItems),
        (status = 400, description = "Invalid input or unknown batch", body = ErrorBody)
    )
)]
async fn create_order(
    State(state): State<AppState>,
    Extension(creator): Extension<AuthUser>,
    AppJson(input): AppJson<NewDispatchOrder>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let order = dispatch::create(conn, &creator, input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

#[utoipa::path(
    get,
    path = "/dispatch-orders/{id}",
    tags = ["Dispatch Orders"],
    security(("session" = [])),
    params(("id" = Uuid, Path, description = "Dispatch order ID")),
    responses(
        (status = 200, description = "Dispatch order with items", body = DispatchOrderWithItems),
        (status = 404, description = "No such order", body = ErrorBody)
    )
)]
async fn get_order(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let order = dispatch::get_with_items(conn, id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(order))
}

#[utoipa::path(
    patch,
    path = "/dispatch-orders/{id}/status",
    tags = ["Dispatch Orders"],
    security(("session" = [])),
    params(("id" = Uuid, Path, description = "Dispatch order ID")),
    request_body = DispatchStatusReq,
    responses(
        (status = 200, description = "Status updated", body = DispatchOrderEntity),
        (status = 404, description = "No such order", body = ErrorBody),
        (status = 409, description = "Transition not allowed", body = ErrorBody)
    )
)]
async fn update_order_status(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<DispatchStatusReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    Ok(Json(dispatch::update_status(conn, id, req.status).await?))
}
