//! Command-line and environment overrides.
//!
//! Flags take precedence over the config file; every flag can also be set
//! through its `PROXY_FILTER_*` environment variable.

use std::path::PathBuf;

use clap::Parser;

use crate::config::loader::{read_config, ConfigError};
use crate::config::schema::{LogFormat, ProxyConfig, SinkKind};
use crate::config::validation::validate_config;

#[derive(Parser, Debug)]
#[command(name = "proxy-filter", version, about = "Metrics filtering reverse proxy", long_about = None)]
pub struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "PROXY_FILTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// The base endpoint which to proxy all requests to
    #[arg(short, long, env = "PROXY_FILTER_BASE_ENDPOINT")]
    pub base_endpoint: Option<String>,

    /// The metric name prefix filter
    #[arg(short, long, env = "PROXY_FILTER_PREFIX")]
    pub prefix: Option<String>,

    /// Tags attached to the drop counter (comma separated)
    #[arg(long, env = "PROXY_FILTER_TAGS", value_delimiter = ',')]
    pub tags: Option<Vec<String>>,

    /// Address to listen on
    #[arg(short, long, env = "PROXY_FILTER_LISTEN")]
    pub listen: Option<String>,

    /// Address for DogStatsD endpoint
    #[arg(long, env = "PROXY_FILTER_STATS_ADDR")]
    pub stats_addr: Option<String>,

    /// Report drop counts to the Prometheus exporter instead of DogStatsD
    #[arg(long)]
    pub prometheus_sink: bool,

    /// Serve Prometheus metrics on this address
    #[arg(long, env = "PROXY_FILTER_METRICS_ADDR")]
    pub metrics_addr: Option<String>,

    /// Forward /api/v1/series without filtering
    #[arg(long)]
    pub disable_series_v1: bool,

    /// Forward /api/v2/series without filtering
    #[arg(long)]
    pub disable_series_v2: bool,

    /// Seconds in-flight requests get to finish on shutdown
    #[arg(long, env = "PROXY_FILTER_SHUTDOWN_TIMEOUT")]
    pub shutdown_timeout: Option<u64>,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,
}

impl Args {
    /// Overlay flags onto a configuration.
    pub fn apply(&self, config: &mut ProxyConfig) {
        if let Some(base) = &self.base_endpoint {
            config.backend.base_url = base.clone();
        }
        if let Some(prefix) = &self.prefix {
            config.filter.name_prefix = prefix.clone();
        }
        if let Some(tags) = &self.tags {
            config.filter.tags = tags.iter().map(|t| t.trim().to_string()).collect();
        }
        if let Some(listen) = &self.listen {
            config.listener.bind_address = listen.clone();
        }
        if let Some(addr) = &self.stats_addr {
            config.observability.statsd_address = addr.clone();
        }
        if self.prometheus_sink {
            config.observability.sink = SinkKind::Prometheus;
        }
        if let Some(addr) = &self.metrics_addr {
            config.observability.metrics_enabled = true;
            config.observability.metrics_address = addr.clone();
        }
        if self.disable_series_v1 {
            config.routes.series_v1 = false;
        }
        if self.disable_series_v2 {
            config.routes.series_v2 = false;
        }
        if let Some(secs) = self.shutdown_timeout {
            config.timeouts.shutdown_secs = secs;
        }
        if self.json_logs {
            config.observability.log_format = LogFormat::Json;
        }
    }

    /// Read the config file (if any), apply flags, validate.
    pub fn into_config(self) -> Result<ProxyConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => ProxyConfig::default(),
        };
        self.apply(&mut config);
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("proxy-filter").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_no_flags_keeps_defaults() {
        let config = parse(&[]).into_config().unwrap();
        assert_eq!(config, ProxyConfig::default());
    }

    #[test]
    fn test_flags_override() {
        let config = parse(&[
            "--base-endpoint",
            "http://10.0.0.1:8080",
            "--prefix",
            "some.metric",
            "--tags",
            "one, two,three",
            "--listen",
            "127.0.0.1:9999",
            "--disable-series-v2",
            "--shutdown-timeout",
            "3",
        ])
        .into_config()
        .unwrap();

        assert_eq!(config.backend.base_url, "http://10.0.0.1:8080");
        assert_eq!(config.filter.name_prefix, "some.metric");
        assert_eq!(config.filter.tags, vec!["one", "two", "three"]);
        assert_eq!(config.listener.bind_address, "127.0.0.1:9999");
        assert!(config.routes.series_v1);
        assert!(!config.routes.series_v2);
        assert_eq!(config.timeouts.shutdown_secs, 3);
    }

    #[test]
    fn test_invalid_override_fails_validation() {
        let err = parse(&["--base-endpoint", "ftp://backend"]).into_config().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_config_file_errors_reported_after_flags() {
        let path = std::env::temp_dir().join(format!("proxy-filter-{}-cli.toml", std::process::id()));
        std::fs::write(&path, "[timeouts]\nshutdown_secs = 0\n[filter]\nname_prefix = \"file.prefix\"\n").unwrap();
        let config_arg = path.to_string_lossy().to_string();

        let err = parse(&["--config", &config_arg]).into_config().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("timeouts.shutdown_secs"));

        let config = parse(&["--config", &config_arg, "--shutdown-timeout", "5", "--prefix", "flag.prefix"])
            .into_config()
            .unwrap();
        assert_eq!(config.timeouts.shutdown_secs, 5);
        assert_eq!(config.filter.name_prefix, "flag.prefix");
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_metrics_addr_enables_exporter() {
        let config = parse(&["--metrics-addr", "127.0.0.1:9191", "--prometheus-sink"])
            .into_config()
            .unwrap();
        assert!(config.observability.metrics_enabled);
        assert_eq!(config.observability.sink, SinkKind::Prometheus);
    }
}
