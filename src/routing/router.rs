//! Route table construction.
//!
//! # Responsibilities
//! - Register the series handlers enabled in configuration
//! - Send every other path to passthrough

use axum::{routing::any, Router};

use crate::config::RoutesConfig;
use crate::http::handlers;
use crate::http::server::AppState;
use crate::routing::{SERIES_V1_PATH, SERIES_V2_PATH};

/// Build the route table for the enabled handlers.
pub fn build_routes(routes: &RoutesConfig) -> Router<AppState> {
    let mut router = Router::new()
        .route("/", any(handlers::passthrough))
        .route("/{*path}", any(handlers::passthrough));

    if routes.series_v1 {
        router = router.route(SERIES_V1_PATH, any(handlers::series_v1));
    } else {
        tracing::info!(path = SERIES_V1_PATH, "Series route disabled, forwarding unfiltered");
    }
    if routes.series_v2 {
        router = router.route(SERIES_V2_PATH, any(handlers::series_v2));
    } else {
        tracing::info!(path = SERIES_V2_PATH, "Series route disabled, forwarding unfiltered");
    }
    router
}
