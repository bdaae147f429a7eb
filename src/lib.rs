pub mod app_error;
pub mod app_state;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod db;
pub mod models;
pub mod routes;
pub mod schema;
pub mod storage;
pub mod swagger;
pub mod workflow;

mod sql_enum;

use axum::Router;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::{app_state::AppState, swagger::ApiDoc};

/// Builds the full application: `/api` routes behind the session check
/// (except register and login) plus the Swagger UI.
pub fn app(state: AppState) -> Router {
    let protected = routes::protected_routes().route_layer(
        axum::middleware::from_fn_with_state(state.clone(), auth::require_session),
    );

    let api = OpenApiRouter::new()
        .merge(routes::auth::public_routes())
        .merge(protected);

    let (router, openapi) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api", api)
        .split_for_parts();

    router
        .with_state(state)
        .merge(swagger::create_swagger_ui(openapi))
        .layer(TraceLayer::new_for_http())
}
