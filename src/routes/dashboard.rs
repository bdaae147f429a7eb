use anyhow::Context;
use axum::{Json, extract::State, response::IntoResponse};
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::{
    app_error::{AppError, ErrorBody},
    app_state::AppState,
    storage::dashboard::{self, DashboardMetrics},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(get_metrics))
}

/// Today's production, quality score, scheduled orders and inventory.
#[utoipa::path(
    get,
    path = "/dashboard/metrics",
    tags = ["Dashboard"],
    security(("session" = [])),
    responses(
        (status = 200, description = "Current metrics", body = DashboardMetrics),
        (status = 401, description = "No live session", body = ErrorBody)
    )
)]
async fn get_metrics(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    Ok(Json(dashboard::metrics(conn).await?))
}
