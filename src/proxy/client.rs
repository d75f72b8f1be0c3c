//! Outbound HTTP client.
//!
//! # Design Decisions
//! - `http` and `https` backends share one pooled client
//! - TLS roots come from the OS store; bundled webpki roots are used when
//!   the host has none

use std::time::Duration;

use axum::body::Body;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::{TokioExecutor, TokioTimer},
};

use crate::config::{ClientConfig, TimeoutConfig};

/// Pooled client shared by every request.
pub type HttpClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Build the pooled backend client.
pub fn build_client(timeouts: &TimeoutConfig, client: &ClientConfig) -> HttpClient {
    // Already installed is fine; any other provider wins.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let idle = Duration::from_secs(timeouts.idle_secs);

    let mut connector = HttpConnector::new();
    connector.enforce_http(false);
    connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));
    connector.set_keepalive(Some(idle));
    connector.set_nodelay(true);

    let roots = match HttpsConnectorBuilder::new().with_native_roots() {
        Ok(builder) => builder,
        Err(e) => {
            tracing::warn!(error = %e, "No native TLS roots found, using bundled webpki roots");
            HttpsConnectorBuilder::new().with_webpki_roots()
        }
    };
    let https = roots
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .wrap_connector(connector);

    Client::builder(TokioExecutor::new())
        .pool_timer(TokioTimer::new())
        .pool_idle_timeout(idle)
        .pool_max_idle_per_host(client.max_idle_per_host)
        .build(https)
}
