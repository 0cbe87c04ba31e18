//! Router configuration for the API.

use std::time::Duration;

use axum::{
    Json, Router,
    http::{HeaderName, Method, header},
    middleware,
    routing::get,
};
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::api::ApiDoc;
use crate::api::handlers;
use crate::api::middleware::{
    global_error_handler, logging_middleware, request_id_middleware, timeout_middleware,
};
use crate::state::AppState;

pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

/// Builds the application router.
///
/// # Middleware Order
/// Outermost first: CORS, request id, logging, error normalization, timeout.
///
/// # Routes
/// - `/api/notifications/*` - dispatch and quota lookup
/// - `/health`, `/health/ready`, `/health/live`
/// - `/api-docs/openapi.json`
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    let (router, openapi) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest(
            "/api/notifications",
            handlers::notifications::notification_routes(),
        )
        .merge(handlers::health::health_routes())
        .split_for_parts();

    router
        .route(OPENAPI_PATH, get(move || async move { Json(openapi) }))
        .layer(middleware::from_fn_with_state(
            request_timeout,
            timeout_middleware,
        ))
        .layer(middleware::from_fn(global_error_handler))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors_layer())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ])
}
