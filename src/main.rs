//! HTTP forwarding relay (v1)
//!
//! ```text
//!   Caller                         RELAY                              Upstream
//!   ──────                         ─────                              ────────
//!   POST / {method,url,...} ──▶ validate ──▶ outbound call ─────────▶ any host
//!                                              ▲  │  (each redirect
//!                                              └──┘   hop recorded)
//!   {urls,success,data}     ◀── classify  ◀── final response ◀────────
//!   or raw upstream error
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use http_relay::config::{load_config, validate_config, RelayConfig};
use http_relay::observability::{logging, metrics};
use http_relay::{RelayServer, Shutdown};

#[derive(Parser)]
#[command(name = "http-relay")]
#[command(about = "Relay JSON-described HTTP requests to arbitrary upstreams", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Skip TLS certificate verification for upstream hosts.
    #[arg(long)]
    insecure: bool,

    /// Override upstream.max_redirects.
    #[arg(long)]
    max_redirects: Option<usize>,
}

impl Cli {
    fn into_config(self) -> Result<RelayConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => RelayConfig::default(),
        };

        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        if self.insecure {
            config.upstream.accept_invalid_certs = true;
        }
        if let Some(max_redirects) = self.max_redirects {
            config.upstream.max_redirects = max_redirects;
        }

        validate_config(&config).map_err(|errors| {
            errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        })?;

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;

    logging::init_logging(&config.observability);

    tracing::info!("http-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        max_redirects = config.upstream.max_redirects,
        upstream_timeout_secs = config.timeouts.upstream_secs,
        accept_invalid_certs = config.upstream.accept_invalid_certs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    let server = RelayServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
