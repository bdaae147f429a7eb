use anyhow::Context;
use axum::{
    Extension, Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::{
    app_error::{AppError, AppJson, ErrorBody},
    app_state::AppState,
    auth::{self, AuthUser, SessionToken},
    models::UserEntity,
    storage::users::{self, Credentials, NewUser},
};

/// Registration and login; reachable without a session.
pub fn public_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(register))
        .routes(routes!(login))
}

pub fn session_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(logout))
        .routes(routes!(current_user))
}

#[derive(Serialize, ToSchema)]
struct SessionRes {
    user: UserEntity,
    /// Send back as `Authorization: Bearer <token>`; also set as the `sid` cookie.
    token: String,
}

async fn open_session(
    state: &AppState,
    user: UserEntity,
    status: StatusCode,
) -> Result<Response, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let ttl_hours = state.config.auth.session_ttl_hours;
    let token = auth::create_session(conn, user.id, ttl_hours).await?;

    Ok((
        status,
        [(header::SET_COOKIE, auth::session_cookie(&token, ttl_hours))],
        Json(SessionRes { user, token }),
    )
        .into_response())
}

/// Create an account and sign in.
#[utoipa::path(
    post,
    path = "/register",
    tags = ["Auth"],
    request_body = NewUser,
    responses(
        (status = 201, description = "Registered and signed in", body = SessionRes),
        (status = 400, description = "Invalid input or email taken", body = ErrorBody)
    )
)]
async fn register(
    State(state): State<AppState>,
    AppJson(input): AppJson<NewUser>,
) -> Result<impl IntoResponse, AppError> {
    let user = {
        let conn = &mut state
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;
        users::register(conn, input).await?
    };

    open_session(&state, user, StatusCode::CREATED).await
}

/// Sign in with email and password.
#[utoipa::path(
    post,
    path = "/login",
    tags = ["Auth"],
    request_body = Credentials,
    responses(
        (status = 200, description = "Signed in", body = SessionRes),
        (status = 401, description = "Invalid email or password", body = ErrorBody)
    )
)]
async fn login(
    State(state): State<AppState>,
    AppJson(credentials): AppJson<Credentials>,
) -> Result<impl IntoResponse, AppError> {
    let user = {
        let conn = &mut state
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;
        users::authenticate(conn, credentials).await?
    };

    tracing::info!("User {} signed in", user.email);

    open_session(&state, user, StatusCode::OK).await
}

/// End the current session.
#[utoipa::path(
    post,
    path = "/logout",
    tags = ["Auth"],
    security(("session" = [])),
    responses(
        (status = 204, description = "Signed out"),
        (status = 401, description = "No live session", body = ErrorBody)
    )
)]
async fn logout(
    State(state): State<AppState>,
    Extension(SessionToken(token)): Extension<SessionToken>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    auth::delete_session(conn, &token).await?;

    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, auth::session_cookie("", 0))],
    ))
}

/// Profile of the signed-in user.
#[utoipa::path(
    get,
    path = "/auth/user",
    tags = ["Auth"],
    security(("session" = [])),
    responses(
        (status = 200, description = "Current user", body = UserEntity),
        (status = 401, description = "No live session", body = ErrorBody)
    )
)]
async fn current_user(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let user = users::get_by_id(conn, principal.id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(user))
}
