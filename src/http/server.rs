//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing)
//! - Serve on a bound listener until shutdown
//! - Drain in-flight requests within the grace period
//!
//! # Design Decisions
//! - The listener is bound by the caller so tests can use port 0
//! - Shutdown stops accepting immediately; the grace timer starts at the
//!   same signal
//! - Expiry of the grace period is reported as an error, never a panic

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, oneshot};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::filter::PrefixFilter;
use crate::http::request::UuidRequestId;
use crate::lifecycle::shutdown::{wait_for, ShutdownReason};
use crate::lifecycle::tracker::RequestTracker;
use crate::observability::MetricsSink;
use crate::proxy::Forwarder;
use crate::routing::build_routes;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Arc<Forwarder>,
    pub filter: Arc<PrefixFilter>,
    pub tags: Arc<Vec<String>>,
    pub sink: Arc<dyn MetricsSink>,
    pub tracker: RequestTracker,
    pub max_body_bytes: usize,
}

/// Server failure.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),

    #[error("shutdown grace period of {grace:?} expired with {in_flight} requests in flight")]
    ShutdownTimeout { grace: Duration, in_flight: u64 },
}

/// HTTP server for the filtering proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    tracker: RequestTracker,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig, sink: Arc<dyn MetricsSink>) -> Self {
        let tracker = RequestTracker::new();
        let filter = PrefixFilter::new(config.filter.name_prefix.clone())
            .with_max_decompressed_bytes(config.limits.max_decompressed_bytes);

        let state = AppState {
            forwarder: Arc::new(Forwarder::new(&config)),
            filter: Arc::new(filter),
            tags: Arc::new(config.filter.tags.clone()),
            sink,
            tracker: tracker.clone(),
            max_body_bytes: config.limits.max_body_bytes,
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            tracker,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        build_routes(&config.routes)
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// Serve on `listener` until `shutdown` fires, then drain.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<ShutdownReason>,
    ) -> Result<(), ServerError> {
        let HttpServer {
            router,
            config,
            tracker,
        } = self;
        let addr = listener.local_addr()?;
        let grace = Duration::from_secs(config.timeouts.shutdown_secs);

        tracing::info!(
            address = %addr,
            backend = %config.backend.base_url,
            prefix = %config.filter.name_prefix,
            series_v1 = config.routes.series_v1,
            series_v2 = config.routes.series_v2,
            "HTTP server starting"
        );

        let (drain_tx, drain_rx) = oneshot::channel::<()>();
        let serve = axum::serve(listener, router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = drain_rx.await;
            })
            .into_future();
        tokio::pin!(serve);

        tokio::select! {
            result = &mut serve => result?,
            reason = wait_for(&mut shutdown) => {
                let _ = drain_tx.send(());
                tracing::info!(
                    reason = %reason,
                    grace = ?grace,
                    in_flight = tracker.active_count(),
                    "Stopped accepting, draining in-flight requests"
                );
                match tokio::time::timeout(grace, &mut serve).await {
                    Ok(result) => result?,
                    Err(_) => {
                        let in_flight = tracker.active_count();
                        tracing::error!(grace = ?grace, in_flight, "Shutdown grace period expired");
                        return Err(ServerError::ShutdownTimeout { grace, in_flight });
                    }
                }
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
