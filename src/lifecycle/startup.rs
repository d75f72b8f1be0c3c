//! Startup orchestration.
//!
//! # Responsibilities
//! - Install the metrics exporter when enabled
//! - Build the drop-count sink selected in configuration
//! - Bind the listener and serve until a signal arrives
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listener binds last (traffic only when ready)

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::schema::SinkKind;
use crate::config::ProxyConfig;
use crate::http::server::{HttpServer, ServerError};
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals;
use crate::observability::metrics::init_metrics;
use crate::observability::{MetricsSink, RecorderSink, SinkError, StatsdSink};

/// Fatal startup failure.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),

    #[error("could not start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("could not create statsd sink: {0}")]
    Sink(#[from] SinkError),

    #[error("could not bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Everything the proxy needs to start serving.
pub struct AppContext {
    pub config: ProxyConfig,
    pub listener: TcpListener,
    pub sink: Arc<dyn MetricsSink>,
    pub shutdown: Shutdown,
}

impl AppContext {
    /// Bring up subsystems in order for an already validated config.
    pub async fn initialize(config: ProxyConfig) -> Result<Self, StartupError> {
        let observability = &config.observability;

        if observability.metrics_enabled {
            let addr: SocketAddr = observability
                .metrics_address
                .parse()
                .map_err(|_| StartupError::MetricsAddress(observability.metrics_address.clone()))?;
            init_metrics(addr)?;
        }

        let sink: Arc<dyn MetricsSink> = match observability.sink {
            SinkKind::Statsd => Arc::new(StatsdSink::connect(&observability.statsd_address).await?),
            SinkKind::Prometheus => {
                if !observability.metrics_enabled {
                    tracing::warn!("Prometheus sink selected without an exporter; drop counts are not exposed");
                }
                Arc::new(RecorderSink)
            }
        };

        let listener = TcpListener::bind(&config.listener.bind_address)
            .await
            .map_err(|source| StartupError::Bind {
                address: config.listener.bind_address.clone(),
                source,
            })?;

        tracing::info!(
            bind_address = %config.listener.bind_address,
            backend = %config.backend.base_url,
            prefix = %config.filter.name_prefix,
            tags = ?config.filter.tags,
            sink = ?config.observability.sink,
            "Configuration loaded"
        );

        Ok(Self {
            config,
            listener,
            sink,
            shutdown: Shutdown::new(),
        })
    }

    /// Serve until SIGINT/SIGTERM, then drain.
    pub async fn serve(self) -> Result<(), ServerError> {
        let AppContext {
            config,
            listener,
            sink,
            shutdown,
        } = self;

        let receiver = shutdown.subscribe();
        signals::spawn_listener(shutdown);

        HttpServer::new(config, sink).run(listener, receiver).await
    }
}
