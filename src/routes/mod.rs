//! HTTP surface. Each module contributes an `OpenApiRouter` documented with
//! `#[utoipa::path]`; `crate::app` nests them under `/api`.

pub mod auth;
pub mod dashboard;
pub mod deliveries;
pub mod dispatch_orders;
pub mod finished_product_batches;
pub mod production_orders;
pub mod quality_checks;
pub mod raw_material_batches;
pub mod seed;
pub mod suppliers;
pub mod warehouse;
pub mod weighbridge;

use utoipa_axum::router::OpenApiRouter;

use crate::app_state::AppState;

/// Every route that requires a session.
pub fn protected_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(auth::session_routes())
        .merge(dashboard::routes_with_openapi())
        .merge(suppliers::routes_with_openapi())
        .merge(deliveries::routes_with_openapi())
        .merge(weighbridge::routes_with_openapi())
        .merge(raw_material_batches::routes_with_openapi())
        .merge(quality_checks::routes_with_openapi())
        .merge(production_orders::routes_with_openapi())
        .merge(finished_product_batches::routes_with_openapi())
        .merge(warehouse::routes_with_openapi())
        .merge(dispatch_orders::routes_with_openapi())
        .merge(seed::routes_with_openapi())
}
