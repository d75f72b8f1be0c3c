//! Content-Encoding aware stream adapters.
//!
//! # Responsibilities
//! - Map a `Content-Encoding` header onto a supported algorithm
//! - Wrap a reader with the matching decompressor
//! - Wrap a writer with the matching compressor (finalized by `finish`)
//!
//! # Design Decisions
//! - Only `gzip` and `deflate` (zlib framing) are recognized
//! - Anything else, including an absent header, is identity
//! - No buffering beyond what the compression algorithm itself needs

use std::io::{self, Read, Write};

use axum::http::{header::CONTENT_ENCODING, HeaderMap};
use flate2::{
    read::{MultiGzDecoder, ZlibDecoder},
    write::{GzEncoder, ZlibEncoder},
    Compression,
};

/// Declared encoding of a request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentEncoding {
    Gzip,
    Deflate,
    #[default]
    Identity,
}

impl ContentEncoding {
    /// Parse a single encoding token. Unknown tokens are identity.
    pub fn from_token(token: &str) -> Self {
        let token = token.trim();
        if token.eq_ignore_ascii_case("gzip") {
            Self::Gzip
        } else if token.eq_ignore_ascii_case("deflate") {
            Self::Deflate
        } else {
            Self::Identity
        }
    }

    /// Read the first `Content-Encoding` header of a request.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .map(Self::from_token)
            .unwrap_or_default()
    }

    /// Header token for this encoding, `None` for identity.
    pub fn as_token(&self) -> Option<&'static str> {
        match self {
            Self::Gzip => Some("gzip"),
            Self::Deflate => Some("deflate"),
            Self::Identity => None,
        }
    }

    /// Wrap `source` with the matching decompressor.
    pub fn decoder<R: Read>(self, source: R) -> Decoder<R> {
        match self {
            Self::Gzip => Decoder::Gzip(MultiGzDecoder::new(source)),
            Self::Deflate => Decoder::Deflate(ZlibDecoder::new(source)),
            Self::Identity => Decoder::Identity(source),
        }
    }

    /// Wrap `sink` with the matching compressor.
    ///
    /// Output is incomplete until [`Encoder::finish`] is called.
    pub fn encoder<W: Write>(self, sink: W) -> Encoder<W> {
        match self {
            Self::Gzip => Encoder::Gzip(GzEncoder::new(sink, Compression::default())),
            Self::Deflate => Encoder::Deflate(ZlibEncoder::new(sink, Compression::default())),
            Self::Identity => Encoder::Identity(sink),
        }
    }
}

impl std::fmt::Display for ContentEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_token().unwrap_or("identity"))
    }
}

/// Decompressing reader.
pub enum Decoder<R: Read> {
    Gzip(MultiGzDecoder<R>),
    Deflate(ZlibDecoder<R>),
    Identity(R),
}

impl<R: Read> Read for Decoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Decoder::Gzip(r) => r.read(buf),
            Decoder::Deflate(r) => r.read(buf),
            Decoder::Identity(r) => r.read(buf),
        }
    }
}

/// Compressing writer.
pub enum Encoder<W: Write> {
    Gzip(GzEncoder<W>),
    Deflate(ZlibEncoder<W>),
    Identity(W),
}

impl<W: Write> Encoder<W> {
    /// Flush trailing compressed data and hand back the sink.
    pub fn finish(self) -> io::Result<W> {
        match self {
            Encoder::Gzip(w) => w.finish(),
            Encoder::Deflate(w) => w.finish(),
            Encoder::Identity(mut w) => {
                w.flush()?;
                Ok(w)
            }
        }
    }
}

impl<W: Write> Write for Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Encoder::Gzip(w) => w.write(buf),
            Encoder::Deflate(w) => w.write(buf),
            Encoder::Identity(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Encoder::Gzip(w) => w.flush(),
            Encoder::Deflate(w) => w.flush(),
            Encoder::Identity(w) => w.flush(),
        }
    }
}
