// ────────────────────────────────
// src/server/builder.rs
// ────────────────────────────────
use crate::server::listener::bind_tcp;
use anyhow::{anyhow, Result};
use hyper::{server::conn::Http, Body, Request, Response};
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::Service;

/// Delay before accepting again after an accept error such as EMFILE.
pub const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Builder pattern so `main.rs` can inject its request handler.
pub struct ServerBuilder<H>
where
    H: Service<Request<Body>, Response = Response<Body>> + Send + Clone + 'static,
    H::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    H::Future: Send + 'static,
{
    addr: SocketAddr,
    handler: Option<H>,
}

impl<H> ServerBuilder<H>
where
    H: Service<Request<Body>, Response = Response<Body>> + Send + Clone + 'static,
    H::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    H::Future: Send + 'static,
{
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr, handler: None }
    }

    pub fn with_handler(mut self, handler: H) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Bind the TCP listener and serve until `shutdown` resolves.
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let handler = self
            .handler
            .ok_or_else(|| anyhow!("handler must be set via with_handler()"))?;

        let (listener, local) = bind_tcp(self.addr).await?;
        tracing::info!("HTTP server listening on {}", local);

        serve_listener(listener, handler, shutdown).await;
        Ok(())
    }
}

/// Accept connections on `listener`, one Tokio task per connection, until
/// `shutdown` resolves. Connections already accepted run to completion.
pub async fn serve_listener<H, F>(listener: TcpListener, handler: H, shutdown: F)
where
    H: Service<Request<Body>, Response = Response<Body>> + Send + Clone + 'static,
    H::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    H::Future: Send + 'static,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(conn) => conn,
                    Err(err) => {
                        accept_failed(err).await;
                        continue;
                    }
                };
                let svc = handler.clone();

                tokio::spawn(async move {
                    let http = Http::new();
                    if let Err(err) = http.serve_connection(stream, svc).await {
                        tracing::warn!(%peer, %err, "connection error");
                    }
                });
            }
            _ = &mut shutdown => {
                tracing::info!("HTTP server stopped accepting connections");
                break;
            }
        }
    }
}

async fn accept_failed(err: std::io::Error) {
    tracing::warn!(%err, "failed to accept connection");
    tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
}
