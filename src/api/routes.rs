//! Router configuration for the API.
//!
//! Every exposed route is registered here. Nothing is discovered at runtime.

use axum::{
    Router,
    http::{Method, StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::doc::ApiDoc;
use crate::api::dto::ErrorResponse;
use crate::api::handlers::{health, users};
use crate::api::middleware::{global_error_handler, logging_middleware, request_id_middleware};
use crate::config::ServerConfig;
use crate::state::AppState;

/// Creates the main application router with all routes and middleware.
///
/// # Middleware Order
/// Layers added later wrap the ones added earlier, so a request passes through:
/// 1. Request ID - generates/propagates `x-request-id`
/// 2. Logging - request/response span keyed by the request ID
/// 3. Compression
/// 4. CORS
/// 5. Error handler - attaches `request_id` to error bodies
/// 6. Timeout - `server.request_timeout` seconds
///
/// # Routes
/// - `POST /api/users`, `GET /api/users/{id}`
/// - `GET /health`, `/health/ready`, `/health/live`
/// - `GET /swagger-ui`, `/api-docs/openapi.json`
pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api/users", users::user_routes())
        .merge(health::health_routes())
        .split_for_parts();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    router
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api))
        .fallback(route_not_found)
        .layer(TimeoutLayer::new(server.request_timeout()))
        .layer(middleware::from_fn(global_error_handler))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

async fn route_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        axum::Json(ErrorResponse::new("NOT_FOUND", "Route not found")),
    )
        .into_response()
}
