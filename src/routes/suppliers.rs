use anyhow::Context;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppJson, AppPath, ErrorBody},
    app_state::AppState,
    models::SupplierEntity,
    storage::suppliers::{self, NewSupplier},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(get_suppliers, create_supplier))
        .routes(routes!(get_supplier))
}

/// All suppliers, newest first.
#[utoipa::path(
    get,
    path = "/suppliers",
    tags = ["Suppliers"],
    security(("session" = [])),
    responses(
        (status = 200, description = "List suppliers", body = Vec<SupplierEntity>)
    )
)]
async fn get_suppliers(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    Ok(Json(suppliers::list(conn).await?))
}

#[utoipa::path(
    post,
    path = "/suppliers",
    tags = ["Suppliers"],
    security(("session" = [])),
    request_body = NewSupplier,
    responses(
        (status = 201, description = "Supplier created", body = SupplierEntity),
        (status = 400, description = "Invalid input", body = ErrorBody)
    )
)]
async fn create_supplier(
    State(state): State<AppState>,
    AppJson(input): AppJson<NewSupplier>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let supplier = suppliers::create(conn, input).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

#[utoipa::path(
    get,
    path = "/suppliers/{id}",
    tags = ["Suppliers"],
    security(("session" = [])),
    params(("id" = Uuid, Path, description = "Supplier ID")),
    responses(
        (status = 200, description = "Supplier", body = SupplierEntity),
        (status = 404, description = "No such supplier", body = ErrorBody)
    )
)]
async fn get_supplier(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let supplier = suppliers::get_by_id(conn, id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(supplier))
}
