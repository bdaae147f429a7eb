use anyhow::Context;
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::{
    app_error::{AppError, ErrorBody},
    app_state::AppState,
    auth::AuthUser,
    storage::seed::{self, SeedSummary},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(seed_demo_data))
}

/// Load the demo data set. Can only be done once per database.
#[utoipa::path(
    post,
    path = "/seed-demo-data",
    tags = ["Demo Data"],
    security(("session" = [])),
    responses(
        (status = 201, description = "Rows inserted per table", body = SeedSummary),
        (status = 400, description = "Demo data already loaded", body = ErrorBody)
    )
)]
async fn seed_demo_data(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let summary = seed::load_demo_data(conn, &principal).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}
