//! Backend forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! Handler (passthrough or filtered body)
//!     → forwarder.rs (rebuild URL, copy headers, one attempt)
//!     → client.rs (pooled hyper client)
//!     → Backend
//! ```

pub mod client;
pub mod forwarder;

pub use client::{build_client, HttpClient};
pub use forwarder::Forwarder;
