//! Gatehouse call gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client call (POST /pkg.Service/Method)
//!     ─────────▶ http server ──▶ ┌──────────────┐
//!                                │ rate limiter │  per-client fixed window
//!                                └──────┬───────┘
//!                                ┌──────▼───────┐
//!                                │response timer│  x-response-time
//!                                └──────┬───────┘
//!                                ┌──────▼───────┐      ┌────────────────┐
//!                                │authenticator │─────▶│revocation store│
//!                                └──────┬───────┘      └────────────────┘
//!                                ┌──────▼───────┐
//!                                │   registry   │  Logout, WhoAmI, ...
//!                                └──────────────┘
//! ```
//!
//! Login needs an account store and is registered by embedders that supply
//! a `CredentialVerifier`; this binary serves the token-only operations.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use gatehouse::config::{self, GatewayConfig};
use gatehouse::http::GatewayServer;
use gatehouse::lifecycle::{shutdown_on_signal, Shutdown};
use gatehouse::observability::{logging, metrics, ResponseTimer};
use gatehouse::pipeline::Chain;
use gatehouse::security::{Authenticator, RateLimiter, RevocationStore};
use gatehouse::service::{session, LogoutHandler, ServiceRegistry, WhoAmIHandler};

#[derive(Parser)]
#[command(name = "gatehouse")]
#[command(about = "Authenticating, rate-limiting call gateway", long_about = None)]
struct Args {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => config::finalize(GatewayConfig::default())?,
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "gatehouse starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        rate_limit_enabled = config.rate_limit.enabled,
        rate_limit = config.rate_limit.limit,
        window_secs = config.rate_limit.window_secs,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let revocations = RevocationStore::start(&config.revocation, shutdown.subscribe())?;

    let mut chain = Chain::new();
    if config.rate_limit.enabled {
        chain = chain.with(RateLimiter::start(&config.rate_limit, shutdown.subscribe())?);
    }
    let chain = chain
        .with(Arc::new(ResponseTimer::new()))
        .with(Arc::new(Authenticator::from_config(&config.auth, revocations.clone())));

    let registry = ServiceRegistry::new()
        .register(session::LOGOUT, LogoutHandler::new(revocations))
        .register(session::WHO_AM_I, WhoAmIHandler);
    tracing::info!(
        interceptors = chain.len(),
        methods = ?registry.methods().collect::<Vec<_>>(),
        "Pipeline assembled"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(shutdown_on_signal(shutdown));

    GatewayServer::new(config, chain.wrap(registry))
        .run(listener, server_shutdown)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
