use clap::Parser;

use proxy_filter::config::Args;
use proxy_filter::http::ServerError;
use proxy_filter::lifecycle::AppContext;
use proxy_filter::observability::logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = args.into_config()?;

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "proxy-filter starting");

    let context = AppContext::initialize(config).await.map_err(|e| {
        tracing::error!(error = %e, "Startup failed");
        e
    })?;

    match context.serve().await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            Ok(())
        }
        Err(ServerError::ShutdownTimeout { grace, in_flight }) => {
            tracing::error!(grace = ?grace, in_flight, "Forced exit with requests still in flight");
            Err(ServerError::ShutdownTimeout { grace, in_flight }.into())
        }
        Err(e) => {
            tracing::error!(error = %e, "Server failed");
            Err(e.into())
        }
    }
}
