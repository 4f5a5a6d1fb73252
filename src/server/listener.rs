// ────────────────────────────────
// src/server/listener.rs
// TCP bind shared by the health and metrics listeners.
// ────────────────────────────────
use anyhow::{Context, Result};
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Bind `addr` and report the address actually bound (port 0 picks one).
pub async fn bind_tcp(addr: SocketAddr) -> Result<(TcpListener, SocketAddr)> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    let local = listener
        .local_addr()
        .context("Failed to read bound address")?;
    Ok((listener, local))
}
