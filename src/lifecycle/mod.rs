//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → Metrics exporter → Sink → Bind listener
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!
//! Shutdown (shutdown.rs, tracker.rs):
//!     Signal received → Stop accepting → Drain in-flight → Exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then observability, then listener
//! - Shutdown has timeout: an error is returned after the deadline

pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod tracker;

pub use shutdown::{Shutdown, ShutdownReason};
pub use startup::{AppContext, StartupError};
pub use tracker::{RequestGuard, RequestTracker};
