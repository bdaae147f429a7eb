use anyhow::Context;
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppJson, AppPath, ErrorBody},
    app_state::AppState,
    auth::AuthUser,
    models::QualityCheckEntity,
    storage::quality_checks::{self, NewQualityCheck},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(get_checks, create_check))
        .routes(routes!(get_check))
}

#[utoipa::path(
    get,
    path = "/quality-checks",
    tags = ["Quality Checks"],
    security(("session" = [])),
    responses(
        (status = 200, description = "All checks, most recent first", body = Vec<QualityCheckEntity>)
    )
)]
async fn get_checks(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    Ok(Json(quality_checks::list(conn).await?))
}

#[utoipa::path(
    get,
    path = "/quality-checks/{id}",
    tags = ["Quality Checks"],
    security(("session" = [])),
    params(("id" = Uuid, Path, description = "Quality check ID")),
    responses(
        (status = 200, description = "Quality check", body = QualityCheckEntity),
        (status = 404, description = "No such check", body = ErrorBody)
    )
)]
async fn get_check(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let check = quality_checks::get_by_id(conn, id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(check))
}

/// Record an inspection. The signed-in user is the checker.
#[utoipa::path(
    post,
    path = "/quality-checks",
    tags = ["Quality Checks"],
    security(("session" = [])),
    request_body = NewQualityCheck,
    responses(
        (status = 201, description = "Check recorded", body = QualityCheckEntity),
        (status = 400, description = "Invalid input or unknown batch", body = ErrorBody)
    )
)]
async fn create_check(
    State(state): State<AppState>,
    Extension(checker): Extension<AuthUser>,
    AppJson(input): AppJson<NewQualityCheck>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let check = quality_checks::create(conn, &checker, input).await?;
    Ok((StatusCode::CREATED, Json(check)))
}
