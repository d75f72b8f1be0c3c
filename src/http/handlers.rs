//! Request handlers.
//!
//! # Responsibilities
//! - Passthrough: forward any request untouched
//! - Series routes: buffer, filter by metric-name prefix, report the drop
//!   count, forward the rewritten body
//!
//! # Design Decisions
//! - Only POST bodies are filtered; other methods on series paths pass through
//! - An empty prefix disables filtering entirely (no buffering, no count)
//! - Decode failures answer 500 without contacting the backend
//! - Decompression and decoding run on the blocking pool, off the
//!   runtime workers
//! - A failed drop-count emission is logged and never fails the request

use axum::{
    body::Body,
    extract::State,
    http::{header::CONTENT_LENGTH, Method, Request},
    response::{IntoResponse, Response},
};

use std::sync::Arc;

use bytes::Bytes;

use crate::codec::ContentEncoding;
use crate::filter::{Filtered, PayloadFormat, PrefixFilter};
use crate::http::request::RequestIdExt;
use crate::http::response::ProxyError;
use crate::http::server::AppState;
use crate::observability::FILTERED_METRICS_COUNT;
use crate::routing::Route;

/// Forward any request to the backend untouched.
pub async fn passthrough(State(state): State<AppState>, request: Request<Body>) -> Response {
    let _in_flight = state.tracker.track();
    respond(state.forwarder.forward(request, Route::Passthrough).await)
}

/// `/api/v1/series`: JSON payloads.
pub async fn series_v1(State(state): State<AppState>, request: Request<Body>) -> Response {
    filter_series(state, request, Route::SeriesV1).await
}

/// `/api/v2/series`: protobuf payloads.
pub async fn series_v2(State(state): State<AppState>, request: Request<Body>) -> Response {
    filter_series(state, request, Route::SeriesV2).await
}

async fn filter_series(state: AppState, request: Request<Body>, route: Route) -> Response {
    let _in_flight = state.tracker.track();

    let format = match route.payload_format() {
        Some(format) if state.filter.is_enabled() && request.method() == Method::POST => format,
        _ => return respond(state.forwarder.forward(request, route).await),
    };

    let (mut parts, body) = request.into_parts();
    let request_id = parts.headers.request_id().to_string();
    let encoding = ContentEncoding::from_headers(&parts.headers);

    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(body) => body,
        Err(e) => {
            let err = ProxyError::BodyRead(e.to_string());
            tracing::error!(request_id = %request_id, route = route.as_str(), error = %err, "Could not read request body");
            return err.into_response();
        }
    };

    let request_bytes = body.len();
    let filtered = match filter_payload(Arc::clone(&state.filter), format, encoding, body).await {
        Ok(filtered) => filtered,
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                route = route.as_str(),
                format = format.as_str(),
                compression = %encoding,
                error = %e,
                "Could not filter metrics payload"
            );
            return e.into_response();
        }
    };

    tracing::info!(
        request_id = %request_id,
        route = route.as_str(),
        drop_count = filtered.dropped,
        compression = %encoding,
        request_bytes,
        forwarded_bytes = filtered.body.len(),
        "Parsed metrics"
    );

    if let Err(e) = state
        .sink
        .count(FILTERED_METRICS_COUNT, filtered.dropped, &state.tags, 1.0)
    {
        tracing::warn!(request_id = %request_id, error = %e, "Could not emit filtered metrics count");
    }

    // Length is recomputed from the rewritten body.
    parts.headers.remove(CONTENT_LENGTH);
    let request = Request::from_parts(parts, Body::from(filtered.body));
    respond(state.forwarder.forward(request, route).await)
}

/// Run the filter pipeline on the blocking pool.
async fn filter_payload(
    filter: Arc<PrefixFilter>,
    format: PayloadFormat,
    encoding: ContentEncoding,
    body: Bytes,
) -> Result<Filtered, ProxyError> {
    tokio::task::spawn_blocking(move || filter.apply(format, encoding, &body))
        .await
        .map_err(|e| ProxyError::FilterTask(e.to_string()))?
        .map_err(ProxyError::from)
}

fn respond(result: Result<Response, ProxyError>) -> Response {
    result.unwrap_or_else(IntoResponse::into_response)
}
