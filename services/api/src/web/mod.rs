pub mod middleware;
pub mod rest;
pub mod session;
pub mod state;

pub use middleware::require_identity;
pub use rest::ApiDoc;
pub use session::ClientSession;
pub use state::AppState;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderName, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use rest::{
    about_handler, add_category_handler, add_page_handler, goto_handler, index_handler,
    like_category_handler, restricted_handler, show_category_handler,
};

/// Builds the complete application router: public routes, identity-protected
/// routes and the Swagger UI.
pub fn router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(app_state.config.allowed_origin.clone())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            ACCEPT,
            HeaderName::from_static(middleware::USER_ID_HEADER),
        ]);

    // Public routes (no identity required)
    let public_routes = Router::new()
        .route("/", get(index_handler))
        .route("/about", get(about_handler))
        .route("/add_category", post(add_category_handler))
        .route("/category/{slug}", get(show_category_handler))
        .route("/category/{slug}/add_page", post(add_page_handler))
        .route("/category/{slug}/like", post(like_category_handler))
        .route("/goto", get(goto_handler));

    // Protected routes (identity required)
    let protected_routes = Router::new()
        .route("/restricted", get(restricted_handler))
        .layer(axum_middleware::from_fn(require_identity));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
