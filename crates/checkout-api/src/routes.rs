//! # Routes
//!
//! Axum router configuration for the checkout API.

use crate::error::panic_response;
use crate::handlers;
use crate::state::AppState;
use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - POST /api/checkout/session       - Create checkout session (any price)
/// - POST /api/checkout/brand-session - Create checkout session (brand allow-list)
/// - POST /api/webhook/stripe         - Stripe webhook (raw body)
/// - GET  /health                     - Health check
///
/// Every other method on the POST routes answers 405, `OPTIONS` included.
/// CORS headers are added to POST responses only, so the CORS layer never
/// answers a preflight ahead of the 405 fallback.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST])
        .allow_headers(Any);

    let checkout_routes = Router::new()
        .route(
            "/session",
            post(handlers::create_session)
                .route_layer(cors.clone())
                .fallback(handlers::method_not_allowed),
        )
        .route(
            "/brand-session",
            post(handlers::create_brand_session)
                .route_layer(cors)
                .fallback(handlers::method_not_allowed),
        );

    // No CORS here, Stripe calls server-to-server
    let webhook_routes = Router::new().route(
        "/stripe",
        post(handlers::stripe_webhook).fallback(handlers::method_not_allowed),
    );

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .nest("/api/checkout", checkout_routes)
        .nest("/api/webhook", webhook_routes)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
