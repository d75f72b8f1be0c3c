//! Payload codecs.
//!
//! # Data Flow
//! ```text
//! request body bytes
//!     → compression.rs (gzip / deflate / identity decoder)
//!     → wire.rs (field-by-field protobuf walk) or serde_json
//!     → [filter engine drops matching series]
//!     → wire.rs writer (verbatim field copy)
//!     → compression.rs (same encoding, finished)
//! ```

pub mod compression;
pub mod wire;

pub use compression::ContentEncoding;
pub use wire::{Field, FieldReader, FieldValue, FieldWriter, WireError};
