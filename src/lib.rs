//! Metrics filtering reverse proxy.
//!
//! Sits in front of a metrics intake backend, drops series whose name
//! starts with a configured prefix from `/api/v1/series` (JSON) and
//! `/api/v2/series` (protobuf) uploads, reports how many were dropped,
//! and forwards everything else untouched.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ http::server ──▶ routing ──▶ http::handlers ──▶ proxy::Forwarder ──▶ Backend
//!                                                  │
//!                                                  ├─▶ codec (gzip/deflate, protobuf wire)
//!                                                  ├─▶ filter (JSON / protobuf prefix filter)
//!                                                  └─▶ observability::sink (drop count)
//!
//!     Cross-cutting: config, lifecycle (startup/shutdown), observability (logs, metrics)
//! ```

// Payload handling
pub mod codec;
pub mod filter;

// Core subsystems
pub mod config;
pub mod http;
pub mod proxy;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::ProxyConfig;
pub use filter::{PayloadFormat, PrefixFilter};
pub use http::HttpServer;
pub use lifecycle::{AppContext, Shutdown};
