//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (request counters, latency histograms)
//!
//! Filter routes additionally produce:
//!     → sink.rs (one drop count per filtered request)
//!
//! Consumers:
//!     → Log aggregation (stdout, text or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//!     → DogStatsD agent (UDP)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through logs and to the backend
//! - The drop-count sink is a trait object so tests can substitute it

pub mod logging;
pub mod metrics;
pub mod sink;

pub use sink::{MetricsSink, RecorderSink, SinkError, StatsdSink, FILTERED_METRICS_COUNT};
