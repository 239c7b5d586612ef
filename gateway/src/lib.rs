//! StockArt gateway: the axum application serving the site and the
//! analysis relay.

pub mod api;
pub mod handlers;
pub mod security;

use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, get_service},
    Json, Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::error;

use stockart_core::{AppMode, ServerConfig, WebhookRelay};

use crate::api::BackstopError;

/// Largest request body accepted on any route.
pub const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

// Application State: the relay is the only shared component, and it holds no mutable state.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<WebhookRelay>,
    pub mode: AppMode,
}

impl AppState {
    pub fn new(relay: WebhookRelay, mode: AppMode) -> Self {
        Self {
            relay: Arc::new(relay),
            mode,
        }
    }
}

/// Full application: API routes, static assets with the SPA fallback, middleware.
///
/// Any `GET` that no route claims ends at `index.html`, including `GET /api/analyze`.
pub fn build_router(config: &ServerConfig, state: AppState) -> Router {
    let index = ServeFile::new(config.index_file());
    let assets = ServeDir::new(&config.public_dir)
        .fallback(ServeDir::new(&config.site_root).fallback(index.clone()));
    let site = Router::new()
        .fallback_service(assets)
        .layer(middleware::from_fn(security::hide_dotfiles));

    let routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/stocks/search", get(handlers::search_stocks))
        .route(
            "/api/analyze",
            get_service(index).post(handlers::analyze),
        )
        .fallback_service(site)
        .with_state(state.clone());

    with_middleware(routes, state.mode, &state.relay.config().webhook_origin())
}

/// Wraps `router` in the shared middleware stack, outermost last:
/// panic backstop, body limit, security headers, compression, tracing.
pub fn with_middleware(router: Router, mode: AppMode, connect_origin: &str) -> Router {
    let router = router
        .layer(CatchPanicLayer::custom(
            move |err: Box<dyn Any + Send + 'static>| panic_response(err, mode),
        ))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES));

    security::harden(router, connect_origin)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

fn panic_response(err: Box<dyn Any + Send + 'static>, mode: AppMode) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!("Handler panicked: {}", detail);

    let message = if mode.exposes_details() {
        detail
    } else {
        "Internal Server Error".to_string()
    };

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(BackstopError {
            error: "Something went wrong!",
            message,
        }),
    )
        .into_response()
}
