// src/main.rs
use anyhow::{Context, Result};
use clap::Parser;
use hyper::{Body, Request};
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

use siok::{
    agent::{AgentClient, CheckSource},
    config::{self, Config, ConfigOverrides},
    metrics::MetricsRegistry,
    proxy::HealthProxy,
    server::{bind_tcp, RequestHandler, ServerBuilder},
};

#[derive(Parser, Debug)]
#[command(name = "siok", version, about = "Service health aggregated from the local Consul agent")]
struct Args {
    /// siok listening port
    #[arg(short, long, env = "SIOK_PORT")]
    port: Option<u16>,

    /// Consul Agent IP:port
    #[arg(short, long, env = "SIOK_AGENT")]
    agent: Option<String>,

    /// Address to listen on
    #[arg(long, env = "SIOK_BIND")]
    bind: Option<IpAddr>,

    /// Seconds to wait for the Consul agent before reporting it unavailable
    #[arg(long, env = "SIOK_AGENT_TIMEOUT")]
    agent_timeout: Option<u64>,

    /// Serve Prometheus metrics on this port
    #[arg(long, env = "SIOK_METRICS_PORT")]
    metrics_port: Option<u16>,

    /// Optional YAML or JSON configuration file
    #[arg(short, long, env = "SIOK_CONFIG")]
    config: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            listen_address: self.bind,
            listen_port: self.port,
            agent_address: self.agent.clone(),
            agent_timeout_secs: self.agent_timeout,
            metrics_port: self.metrics_port,
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("siok=info,hyper=info")),
        )
        .init();

    if let Err(e) = run(args).await {
        error!("siok failed to start: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let config = config::resolve_config(args.config.as_deref(), args.overrides()).await?;

    let metrics_registry = if config.metrics.enabled {
        Some(Arc::new(MetricsRegistry::new().context("Failed to create metrics registry")?))
    } else {
        None
    };
    let metrics = metrics_registry.as_ref().map(|registry| registry.collector());

    let agent = AgentClient::new(&config, metrics.clone())?;
    info!("Using Consul agent at {}", agent.name());

    let proxy = Arc::new(HealthProxy::new(Arc::new(agent), metrics));

    if let Some(registry) = metrics_registry {
        start_metrics_server(&config, registry).await?;
    }

    info!("Running siok on port {}...", config.listen_port);
    ServerBuilder::new(config.listen_addr())
        .with_handler(RequestHandler::new(proxy))
        .serve_with_shutdown(shutdown_signal())
        .await?;

    info!("siok stopped");
    Ok(())
}

async fn start_metrics_server(config: &Config, registry: Arc<MetricsRegistry>) -> Result<()> {
    let addr: SocketAddr = config.metrics_addr();
    let path = Arc::new(config.metrics.path.clone());

    let make_service = hyper::service::make_service_fn(move |_| {
        let registry = registry.clone();
        let path = path.clone();

        async move {
            Ok::<_, Infallible>(hyper::service::service_fn(move |req: Request<Body>| {
                let response = registry.respond(&req, path.as_str());
                async move { Ok::<_, Infallible>(response) }
            }))
        }
    });

    let (listener, local) = bind_tcp(addr).await?;
    let server = hyper::Server::from_tcp(listener.into_std()?)
        .context("Failed to start metrics server")?
        .serve(make_service);

    info!("Metrics server listening on http://{}{}", local, config.metrics.path);

    tokio::spawn(async move {
        if let Err(e) = server.await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(())
}

// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
