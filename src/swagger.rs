use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        security::{Http, HttpAuthScheme, SecurityScheme},
    },
};
use utoipa_swagger_ui::SwaggerUi;

pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(title = "Maize Mill API", version = "1.0.0"),
    modifiers(&SessionAuth),
    tags(
        (name = "Auth", description = "Registration, login and the current user"),
        (name = "Dashboard", description = "Aggregated production metrics"),
        (name = "Suppliers"),
        (name = "Deliveries", description = "Truck deliveries and their workflow"),
        (name = "Weighbridge"),
        (name = "Raw Material Batches"),
        (name = "Quality Checks"),
        (name = "Production Orders"),
        (name = "Finished Product Batches"),
        (name = "Warehouse"),
        (name = "Dispatch Orders"),
        (name = "Demo Data"),
    )
)]
pub struct ApiDoc;

struct SessionAuth;

impl Modify for SessionAuth {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "session",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

pub fn create_swagger_ui(openapi: openapi::OpenApi) -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url(OPENAPI_JSON_PATH, openapi)
}
