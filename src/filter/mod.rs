//! Series filtering engine.
//!
//! # Data Flow
//! ```text
//! buffered request body + Content-Encoding
//!     → codec::compression decoder (bounded by max_decompressed_bytes)
//!     → json.rs | protobuf.rs (drop series whose name has the prefix)
//!     → codec::compression encoder (same encoding)
//!     → Filtered { body, dropped }
//! ```
//!
//! # Design Decisions
//! - The name predicate lives in `PrefixFilter` and is shared by both formats
//! - An empty prefix never matches, so filtering with it is the identity
//! - The drop count is returned, not emitted; callers own emission

pub mod json;
pub mod protobuf;

use std::io::{self, Read, Write};

use bytes::Bytes;
use thiserror::Error;

use crate::codec::{ContentEncoding, WireError};

/// Payload format of an ingestion endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    Json,
    Protobuf,
}

impl PayloadFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadFormat::Json => "json",
            PayloadFormat::Protobuf => "protobuf",
        }
    }
}

/// Failure while rewriting a payload.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("could not decompress {encoding} body: {source}")]
    Decompress {
        encoding: ContentEncoding,
        #[source]
        source: io::Error,
    },

    #[error("decompressed payload exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("could not decode json: {0}")]
    Json(#[source] serde_json::Error),

    #[error("could not parse protobuf message: {0}")]
    Wire(#[from] WireError),

    #[error("could not encode filtered payload: {0}")]
    Encode(#[source] io::Error),
}

impl FilterError {
    /// True when the inbound payload itself was bad.
    pub fn is_decode(&self) -> bool {
        !matches!(self, FilterError::Encode(_))
    }
}

/// Result of filtering one payload.
#[derive(Debug, Clone)]
pub struct Filtered {
    /// Re-encoded, re-compressed body.
    pub body: Bytes,
    /// Number of series removed.
    pub dropped: i64,
}

/// Metric name prefix filter.
#[derive(Debug, Clone)]
pub struct PrefixFilter {
    prefix: String,
    max_decompressed_bytes: usize,
}

impl PrefixFilter {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            max_decompressed_bytes: usize::MAX,
        }
    }

    /// Bound the size of a decompressed payload.
    pub fn with_max_decompressed_bytes(mut self, limit: usize) -> Self {
        self.max_decompressed_bytes = limit;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Filtering is disabled when no prefix is configured.
    pub fn is_enabled(&self) -> bool {
        !self.prefix.is_empty()
    }

    /// True if a series with this name should be dropped.
    pub fn matches(&self, name: &[u8]) -> bool {
        self.is_enabled() && name.starts_with(self.prefix.as_bytes())
    }

    /// Decompress, filter and re-compress a payload.
    pub fn apply(
        &self,
        format: PayloadFormat,
        encoding: ContentEncoding,
        body: &[u8],
    ) -> Result<Filtered, FilterError> {
        let decoded = self.decompress(encoding, body)?;

        let (payload, dropped) = match format {
            PayloadFormat::Json => json::filter_series(&decoded, self).map_err(FilterError::Json)?,
            PayloadFormat::Protobuf => protobuf::filter_series(&decoded, self)?,
        };

        let mut encoder = encoding.encoder(Vec::with_capacity(payload.len()));
        encoder.write_all(&payload).map_err(FilterError::Encode)?;
        let body = encoder.finish().map_err(FilterError::Encode)?;

        Ok(Filtered {
            body: Bytes::from(body),
            dropped,
        })
    }

    fn decompress(&self, encoding: ContentEncoding, body: &[u8]) -> Result<Vec<u8>, FilterError> {
        let limit = self.max_decompressed_bytes;
        let mut decoded = Vec::with_capacity(body.len().min(limit));
        encoding
            .decoder(body)
            .take(limit.saturating_add(1) as u64)
            .read_to_end(&mut decoded)
            .map_err(|source| FilterError::Decompress { encoding, source })?;

        if decoded.len() > limit {
            return Err(FilterError::TooLarge { limit });
        }
        Ok(decoded)
    }
}
