//! Counter sink used to report filtered series.
//!
//! # Responsibilities
//! - Define the narrow `count(name, value, tags, rate)` capability
//! - DogStatsD over UDP (`StatsdSink`)
//! - Bridge into the `metrics` facade (`RecorderSink`)
//!
//! # Design Decisions
//! - Emission is synchronous and non-blocking; a full socket buffer is an error
//! - Callers log failures and carry on

use std::io;
use std::net::SocketAddr;

use metrics::Label;
use thiserror::Error;
use tokio::net::{lookup_host, UdpSocket};

/// Name of the drop counter emitted once per filtered request.
pub const FILTERED_METRICS_COUNT: &str = "proxy_filter.filtered_metrics.count";

/// Sink failure.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("could not resolve statsd address {0}")]
    Resolve(String),

    #[error("statsd socket error: {0}")]
    Io(#[from] io::Error),
}

/// Something that accepts named counters.
pub trait MetricsSink: Send + Sync {
    fn count(&self, name: &str, value: i64, tags: &[String], rate: f64) -> Result<(), SinkError>;
}

/// DogStatsD client over a connected UDP socket.
#[derive(Debug)]
pub struct StatsdSink {
    socket: UdpSocket,
}

impl StatsdSink {
    /// Resolve `address` and connect a local UDP socket to it.
    pub async fn connect(address: &str) -> Result<Self, SinkError> {
        let target = lookup_host(address)
            .await?
            .next()
            .ok_or_else(|| SinkError::Resolve(address.to_string()))?;

        let bind: SocketAddr = if target.is_ipv4() {
            ([0u8; 4], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(bind).await?;
        socket.connect(target).await?;

        tracing::info!(address = %target, "Statsd sink connected");
        Ok(Self { socket })
    }
}

impl MetricsSink for StatsdSink {
    fn count(&self, name: &str, value: i64, tags: &[String], rate: f64) -> Result<(), SinkError> {
        let datagram = format_count(name, value, tags, rate);
        self.socket.try_send(datagram.as_bytes())?;
        Ok(())
    }
}

/// Render a DogStatsD count line.
pub fn format_count(name: &str, value: i64, tags: &[String], rate: f64) -> String {
    let mut line = format!("{name}:{value}|c");
    if rate < 1.0 {
        line.push_str(&format!("|@{rate}"));
    }
    if !tags.is_empty() {
        line.push_str("|#");
        line.push_str(&tags.join(","));
    }
    line
}

/// Forwards counts to the globally installed `metrics` recorder.
///
/// Tags of the form `key:value` become labels; bare tags get an empty value.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecorderSink;

impl MetricsSink for RecorderSink {
    fn count(&self, name: &str, value: i64, tags: &[String], _rate: f64) -> Result<(), SinkError> {
        let labels: Vec<Label> = tags.iter().map(|tag| tag_to_label(tag)).collect();
        metrics::counter!(name.to_string(), labels).increment(value.max(0) as u64);
        Ok(())
    }
}

fn tag_to_label(tag: &str) -> Label {
    match tag.split_once(':') {
        Some((key, value)) => Label::new(key.to_string(), value.to_string()),
        None => Label::new(tag.to_string(), String::new()),
    }
}
