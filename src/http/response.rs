//! Error responses.
//!
//! # Responsibilities
//! - Define the errors a proxied request can end in
//! - Map each to its HTTP status code and body
//!
//! # Design Decisions
//! - Local failures (body read, decode, encode, request build) are 500
//!   with the error text as body
//! - Upstream failures are 502 with a fixed body; details stay in logs
//! - Successful upstream responses never pass through here

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::filter::FilterError;

/// Failure while handling one proxied request.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("could not read request body: {0}")]
    BodyRead(String),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("filter task failed: {0}")]
    FilterTask(String),

    #[error("could not build upstream request: {0}")]
    InvalidRequest(String),

    #[error("upstream request failed: {0}")]
    UpstreamUnavailable(String),
}

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            ProxyError::BodyRead(_)
            | ProxyError::Filter(_)
            | ProxyError::FilterTask(_)
            | ProxyError::InvalidRequest(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            ProxyError::UpstreamUnavailable(_) => (status, "Upstream request failed").into_response(),
            other => (status, other.to_string()).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ProxyError::BodyRead("reset".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ProxyError::Filter(FilterError::TooLarge { limit: 1 }).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ProxyError::FilterTask("panicked".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ProxyError::InvalidRequest("bad uri".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ProxyError::UpstreamUnavailable("refused".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[tokio::test]
    async fn test_bodies() {
        let response = ProxyError::UpstreamUnavailable("connection refused".into()).into_response();
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"Upstream request failed");

        let response = ProxyError::BodyRead("reset".into()).into_response();
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"could not read request body: reset");
    }
}
