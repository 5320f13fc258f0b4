//! Application route configuration.

use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::health_handler::{health, root};
use super::handlers::{
    activation_routes, admin_submission_routes, auth_routes, enrollment_routes, form_routes,
    submission_routes,
};
use super::middleware::{auth_middleware, rate_limit_public_middleware};
use super::openapi::ApiDoc;
use super::AppState;

/// Create the application router with all routes configured
pub fn create_router(state: AppState) -> Router {
    let rate_limited =
        || middleware::from_fn_with_state(state.clone(), rate_limit_public_middleware);
    let authenticated = || middleware::from_fn_with_state(state.clone(), auth_middleware);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public, rate limited
        .nest("/auth", auth_routes().route_layer(rate_limited()))
        .nest("/activation", activation_routes().route_layer(rate_limited()))
        // Session required; admin checks live in the services
        .nest("/forms", form_routes().route_layer(authenticated()))
        .nest("/submissions", submission_routes().route_layer(authenticated()))
        .nest(
            "/admin",
            admin_submission_routes()
                .merge(enrollment_routes())
                .route_layer(authenticated()),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
