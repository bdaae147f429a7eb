use anyhow::Context;
use axum::{Json, extract::State, response::IntoResponse};
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::{
    app_error::{AppError, AppJson, ErrorBody},
    app_state::AppState,
    models::WarehouseStockEntity,
    storage::warehouse::{self, StockLevel},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(get_stock, put_stock))
}

/// Stock rows, most recently updated first.
#[utoipa::path(
    get,
    path = "/warehouse/stock",
    tags = ["Warehouse"],
    security(("session" = [])),
    responses(
        (status = 200, description = "List stock", body = Vec<WarehouseStockEntity>)
    )
)]
async fn get_stock(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    Ok(Json(warehouse::list(conn).await?))
}

/// Set the stock held for an item type and batch, creating the row if needed.
#[utoipa::path(
    put,
    path = "/warehouse/stock",
    tags = ["Warehouse"],
    security(("session" = [])),
    request_body = StockLevel,
    responses(
        (status = 200, description = "Stock row after the update", body = WarehouseStockEntity),
        (status = 400, description = "Invalid quantities", body = ErrorBody)
    )
)]
async fn put_stock(
    State(state): State<AppState>,
    AppJson(input): AppJson<StockLevel>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    Ok(Json(warehouse::upsert(conn, input).await?))
}
