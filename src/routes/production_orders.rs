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
    models::ProductionRunMaterialEntity,
    storage::production::{self, NewProductionOrder, NewRunMaterial, ProductionOrderView},
    workflow::ProductionStatus,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(get_orders, create_order))
        .routes(routes!(get_order))
        .routes(routes!(update_order_status))
        .routes(routes!(update_order_progress))
        .routes(routes!(get_order_materials, record_order_material))
}

#[derive(Deserialize, ToSchema)]
struct ProductionStatusReq {
    status: ProductionStatus,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct ProgressReq {
    completed_quantity: i32,
}

/// All production orders with their completion, newest first.
#[utoipa::path(
    get,
    path = "/production-orders",
    tags = ["Production Orders"],
    security(("session" = [])),
    responses(
        (status = 200, description = "List production orders", body = Vec<ProductionOrderView>)
    )
)]
async fn get_orders(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    Ok(Json(production::list(conn).await?))
}

/// Schedule a production run. The signed-in user is recorded as creator.
#[utoipa::path(
    post,
    path = "/production-orders",
    tags = ["Production Orders"],
    security(("session" = [])),
    request_body = NewProductionOrder,
    responses(
        (status = 201, description = "Order scheduled", body = ProductionOrderView),
        (status = 400, description = "Invalid input or duplicate order number", body = ErrorBody)
    )
)]
async fn create_order(
    State(state): State<AppState>,
    Extension(creator): Extension<AuthUser>,
    AppJson(input): AppJson<NewProductionOrder>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let order = production::create(conn, &creator, input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

#[utoipa::path(
    get,
    path = "/production-orders/{id}",
    tags = ["Production Orders"],
    security(("session" = [])),
    params(("id" = Uuid, Path, description = "Production order ID")),
    responses(
        (status = 200, description = "Production order", body = ProductionOrderView),
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

    let order = production::get_by_id(conn, id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(order))
}

#[utoipa::path(
    patch,
    path = "/production-orders/{id}/status",
    tags = ["Production Orders"],
    security(("session" = [])),
    params(("id" = Uuid, Path, description = "Production order ID")),
    request_body = ProductionStatusReq,
    responses(
        (status = 200, description = "Status updated", body = ProductionOrderView),
        (status = 404, description = "No such order", body = ErrorBody),
        (status = 409, description = "Transition not allowed", body = ErrorBody)
    )
)]
async fn update_order_status(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<ProductionStatusReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    Ok(Json(production::update_status(conn, id, req.status).await?))
}

/// Report how many units are done. The count may only grow, up to the target.
#[utoipa::path(
    patch,
    path = "/production-orders/{id}/progress",
    tags = ["Production Orders"],
    security(("session" = [])),
    params(("id" = Uuid, Path, description = "Production order ID")),
    request_body = ProgressReq,
    responses(
        (status = 200, description = "Progress updated", body = ProductionOrderView),
        (status = 400, description = "Quantity out of range", body = ErrorBody),
        (status = 404, description = "No such order", body = ErrorBody)
    )
)]
async fn update_order_progress(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<ProgressReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    Ok(Json(
        production::update_progress(conn, id, req.completed_quantity).await?,
    ))
}

/// Raw material consumed by the order.
#[utoipa::path(
    get,
    path = "/production-orders/{id}/materials",
    tags = ["Production Orders"],
    security(("session" = [])),
    params(("id" = Uuid, Path, description = "Production order ID")),
    responses(
        (status = 200, description = "Materials used", body = Vec<ProductionRunMaterialEntity>),
        (status = 404, description = "No such order", body = ErrorBody)
    )
)]
async fn get_order_materials(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    if production::get_by_id(conn, id).await?.is_none() {
        return Err(AppError::NotFound);
    }

    Ok(Json(production::list_materials(conn, id).await?))
}

#[utoipa::path(
    post,
    path = "/production-orders/{id}/materials",
    tags = ["Production Orders"],
    security(("session" = [])),
    params(("id" = Uuid, Path, description = "Production order ID")),
    request_body = NewRunMaterial,
    responses(
        (status = 201, description = "Consumption recorded", body = ProductionRunMaterialEntity),
        (status = 400, description = "Invalid quantity or unknown batch", body = ErrorBody),
        (status = 404, description = "No such production order", body = ErrorBody)
    )
)]
async fn record_order_material(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(input): AppJson<NewRunMaterial>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    if production::get_by_id(conn, id).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let material = production::record_material(conn, id, input).await?;
    Ok((StatusCode::CREATED, Json(material)))
}
