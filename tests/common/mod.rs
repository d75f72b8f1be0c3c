//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    response::{AppendHeaders, IntoResponse, Response},
    Router,
};
use bytes::Bytes;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use proxy_filter::config::ProxyConfig;
use proxy_filter::http::{HttpServer, ServerError};
use proxy_filter::lifecycle::Shutdown;
use proxy_filter::observability::{MetricsSink, SinkError};

/// A request as seen by the mock backend.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Clone)]
struct BackendState {
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    delay: Duration,
}

/// Mock backend that records every request and answers 418.
pub struct Backend {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl Backend {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

pub const BACKEND_BODY: &str = "backend says hi";

/// Start a capturing backend on an ephemeral port.
pub async fn start_backend() -> Backend {
    start_backend_with_delay(Duration::ZERO).await
}

/// Start a capturing backend that waits `delay` before answering.
pub async fn start_backend_with_delay(delay: Duration) -> Backend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));

    let state = BackendState {
        requests: requests.clone(),
        delay,
    };
    let app = Router::new().fallback(capture).with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Backend { addr, requests }
}

async fn capture(State(state): State<BackendState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    state.requests.lock().unwrap().push(CapturedRequest {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        headers: parts.headers,
        body,
    });

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }

    (
        StatusCode::IM_A_TEAPOT,
        [("content-type", "application/test")],
        AppendHeaders([("x-backend", "first"), ("x-backend", "second")]),
        BACKEND_BODY,
    )
        .into_response()
}

/// One `count` call seen by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct CountCall {
    pub name: String,
    pub value: i64,
    pub tags: Vec<String>,
    pub rate: f64,
}

/// Sink that keeps every emitted count.
#[derive(Debug, Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<CountCall>>,
}

impl RecordingSink {
    pub fn calls(&self) -> Vec<CountCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl MetricsSink for RecordingSink {
    fn count(&self, name: &str, value: i64, tags: &[String], rate: f64) -> Result<(), SinkError> {
        self.calls.lock().unwrap().push(CountCall {
            name: name.to_string(),
            value,
            tags: tags.to_vec(),
            rate,
        });
        Ok(())
    }
}

/// A running proxy.
pub struct Proxy {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), ServerError>>,
}

impl Proxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Proxy configuration pointing at `backend_url`, tagged one/two/three.
pub fn proxy_config(backend_url: &str, prefix: &str) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.backend.base_url = backend_url.to_string();
    config.filter.name_prefix = prefix.to_string();
    config.filter.tags = vec!["one".into(), "two".into(), "three".into()];
    config
}

/// Bind an ephemeral port and serve the proxy on it.
pub async fn start_proxy(config: ProxyConfig, sink: Arc<dyn MetricsSink>) -> Proxy {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();

    let server = HttpServer::new(config, sink);
    let handle = tokio::spawn(server.run(listener, receiver));

    Proxy {
        addr,
        shutdown,
        handle,
    }
}

/// An address nothing listens on.
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
