use crate::{
    controller::health_check_controller, middleware::auth::require_auth, params, AppState,
};
use axum::{
    middleware::from_fn,
    routing::{delete, get, post},
    Router,
};

use crate::controller::{esp_key_controller, user_session_controller};

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Audience Platform API"
        ),
        paths(
            esp_key_controller::create,
            esp_key_controller::index,
            esp_key_controller::audiences,
            esp_key_controller::all_audiences,
            esp_key_controller::delete,
            user_session_controller::login,
            user_session_controller::delete,
            health_check_controller::health_check,
        ),
        components(
            schemas(
                domain::esp_keys::Model,
                domain::users::Model,
                domain::user::Credentials,
                params::esp_key::CreateEspKeyParams,
            )
        ),
        modifiers(&SecurityAddon),
        tags(
            (name = "audience_platform", description = "ESP key storage & audience aggregation API")
        )
    )]
struct ApiDoc;

struct SecurityAddon;

// Defines our cookie session based authentication requirement for gaining access to our
// API endpoints for OpenAPI.
impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "cookie_auth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "id",
                    "Session id value returned from successful login via Set-Cookie header",
                ))),
            )
        }
    }
}

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(esp_key_routes(app_state))
        .merge(user_session_routes())
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
}

fn esp_key_routes(app_state: AppState) -> Router {
    // Static segments ("esp", "lists") win over the parameterized siblings,
    // so the aggregate route never captures as a provider tag.
    Router::new()
        .route("/keys", get(esp_key_controller::index))
        .route("/keys/esp/lists", get(esp_key_controller::all_audiences))
        .route("/keys/:provider", post(esp_key_controller::create))
        .route(
            "/keys/:provider/:id/lists",
            get(esp_key_controller::audiences),
        )
        .route("/keys/:provider/:id", delete(esp_key_controller::delete))
        .route_layer(from_fn(require_auth))
        .with_state(app_state)
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn user_session_routes() -> Router {
    Router::new()
        .route("/login", post(user_session_controller::login))
        .route("/logout", delete(user_session_controller::delete))
}
