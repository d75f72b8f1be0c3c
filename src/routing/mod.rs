//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → router.rs (exact series paths, everything else catch-all)
//!     → Route::SeriesV1 / SeriesV2 → filter then forward
//!     → Route::Passthrough        → forward untouched
//! ```
//!
//! # Design Decisions
//! - Routes built once at startup, immutable at runtime
//! - Series paths match exactly; a trailing slash falls to passthrough
//! - A disabled series route is simply not registered

pub mod router;

use crate::filter::PayloadFormat;

pub use router::build_routes;

/// v1 series intake (JSON).
pub const SERIES_V1_PATH: &str = "/api/v1/series";
/// v2 series intake (protobuf).
pub const SERIES_V2_PATH: &str = "/api/v2/series";

/// Which handler served a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Passthrough,
    SeriesV1,
    SeriesV2,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Passthrough => "passthrough",
            Route::SeriesV1 => "series_v1",
            Route::SeriesV2 => "series_v2",
        }
    }

    /// Payload format filtered on this route, if any.
    pub fn payload_format(&self) -> Option<PayloadFormat> {
        match self {
            Route::Passthrough => None,
            Route::SeriesV1 => Some(PayloadFormat::Json),
            Route::SeriesV2 => Some(PayloadFormat::Protobuf),
        }
    }
}
