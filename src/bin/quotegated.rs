//! quotegated: the quotegate daemon.
//!
//! Serves the [`Gateway`](quotegate::Gateway) over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use quotegate::server::config::{Config, Secrets, load_dotenv};
use quotegate::{Gateway, QuotegateError};

/// Quotegate daemon, a caching gateway for the quotable API.
#[derive(Parser)]
#[command(name = "quotegated")]
#[command(version = quotegate::PKG_VERSION)]
#[command(about = "Quotegate caching gateway daemon")]
#[command(
    after_help = "Credentials come from secrets.toml or FIREBASE_API_KEY, FIREBASE_USER_EMAIL and \
                  FIREBASE_USER_PASSWORD, which may be set in a .env file in the working directory."
)]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Address to bind to, overriding `server.address`.
    #[arg(short, long, env = "QUOTEGATE_ADDRESS")]
    address: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Before logging setup so RUST_LOG can come from .env
    let dotenv = load_dotenv()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if let Some(path) = dotenv {
        info!(path = %path.display(), "loaded environment file");
    }

    // Load configuration; missing credentials stop startup here
    let config = Config::load(args.config.as_deref())?;
    let secrets = Secrets::load()?;
    let gateway = build_gateway(&config, &secrets)?;

    let address = args.address.unwrap_or_else(|| config.server.address.clone());
    let addr: SocketAddr = address
        .parse()
        .map_err(|e| QuotegateError::Configuration(format!("Invalid address: {e}")))?;

    let app = quotegate::server::router(Arc::new(gateway), &config.server.cors_origins)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(version = quotegate::PKG_VERSION, %addr, upstream = %config.upstream.base_url, "quotegated starting");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("quotegated stopped");
    Ok(())
}

/// Build a [`Gateway`] from configuration.
fn build_gateway(config: &Config, secrets: &Secrets) -> Result<Gateway, QuotegateError> {
    let mut builder = Gateway::builder()
        .credentials(secrets.credentials()?)
        .upstream_url(&config.upstream.base_url)
        .timeout(config.upstream.timeout())
        .metrics_timeout(config.upstream.metrics_timeout())
        .response_ttl(Duration::from_secs(config.cache.response_ttl_secs))
        .metrics_ttl(Duration::from_secs(config.cache.metrics_ttl_secs))
        .identity_timeout(config.identity.timeout())
        .token_ttl(Duration::from_secs(config.cache.token_ttl_secs));

    if let Some(ref url) = config.identity.base_url {
        builder = builder.identity_url(url);
    }

    builder.build()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
