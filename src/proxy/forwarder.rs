//! Single-backend request forwarding.
//!
//! # Responsibilities
//! - Rebuild the inbound request against `base_url + path?query`
//! - Copy request headers (duplicates kept) and stream the body through
//! - Return upstream status, headers and streaming body unchanged
//!
//! # Design Decisions
//! - Exactly one attempt; retries belong to the caller
//! - `Host` and `Transfer-Encoding` are connection-level and not copied
//! - Dropping an unread upstream body closes that connection instead of
//!   returning it to the pool

use std::time::{Duration, Instant};

use axum::{
    body::Body,
    http::{
        header::{CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, HOST, TRANSFER_ENCODING},
        HeaderMap, Request, Uri,
    },
    response::Response,
};

use crate::config::ProxyConfig;
use crate::http::request::RequestIdExt;
use crate::http::response::ProxyError;
use crate::observability::metrics;
use crate::proxy::client::{build_client, HttpClient};
use crate::routing::Route;

/// Forwards requests to the configured backend.
#[derive(Clone)]
pub struct Forwarder {
    client: HttpClient,
    base_url: String,
    upstream_timeout: Duration,
}

impl Forwarder {
    pub fn new(config: &ProxyConfig) -> Self {
        Self::with_client(
            build_client(&config.timeouts, &config.client),
            &config.backend.base_url,
            Duration::from_secs(config.timeouts.upstream_secs),
        )
    }

    pub fn with_client(client: HttpClient, base_url: &str, upstream_timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            upstream_timeout,
        }
    }

    /// Backend URL for an inbound request URI.
    pub fn target_url(&self, uri: &Uri) -> String {
        let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        format!("{}{}", self.base_url, path_and_query)
    }

    /// Issue `request` against the backend and stream its response back.
    pub async fn forward(&self, request: Request<Body>, route: Route) -> Result<Response, ProxyError> {
        let start = Instant::now();
        let (parts, body) = request.into_parts();
        let url = self.target_url(&parts.uri);
        let request_id = parts.headers.request_id().to_string();

        let mut builder = Request::builder().method(parts.method.clone()).uri(url.as_str());
        if let Some(headers) = builder.headers_mut() {
            copy_request_headers(&parts.headers, headers);
        }
        let outbound = builder.body(body).map_err(|e| {
            tracing::error!(request_id = %request_id, url = %url, error = %e, "Got an error creating new request");
            ProxyError::InvalidRequest(e.to_string())
        })?;

        let result = tokio::time::timeout(self.upstream_timeout, self.client.request(outbound)).await;
        let response = match result {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                tracing::error!(request_id = %request_id, url = %url, error = %e, "Got an error doing http request");
                metrics::record_request(parts.method.as_str(), 502, route.as_str(), start);
                return Err(ProxyError::UpstreamUnavailable(e.to_string()));
            }
            Err(_) => {
                tracing::error!(
                    request_id = %request_id,
                    url = %url,
                    timeout = ?self.upstream_timeout,
                    "Upstream request timed out"
                );
                metrics::record_request(parts.method.as_str(), 502, route.as_str(), start);
                return Err(ProxyError::UpstreamUnavailable(format!(
                    "no response within {:?}",
                    self.upstream_timeout
                )));
            }
        };

        let status = response.status();
        metrics::record_request(parts.method.as_str(), status.as_u16(), route.as_str(), start);
        tracing::info!(
            request_id = %request_id,
            route = route.as_str(),
            url = %url,
            method = %parts.method,
            status_code = status.as_u16(),
            request_content_length = header_str(&parts.headers, CONTENT_LENGTH.as_str()),
            content_encoding = header_str(&parts.headers, CONTENT_ENCODING.as_str()),
            content_type = header_str(&parts.headers, CONTENT_TYPE.as_str()),
            "Request handled"
        );

        let (parts, body) = response.into_parts();
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

/// Copy every header except the connection-level ones, keeping duplicates.
pub fn copy_request_headers(from: &HeaderMap, to: &mut HeaderMap) {
    for (name, value) in from {
        if name == HOST || name == TRANSFER_ENCODING {
            continue;
        }
        to.append(name.clone(), value.clone());
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}
