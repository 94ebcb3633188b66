//! Liveness HTTP endpoint.
//!
//! Uptime monitors ping `GET /` and expect a 200 `OK`; that keeps
//! free-tier hosts from idling the process out.

use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;
use tracing::info;

pub fn router() -> Router {
    Router::new().route("/", get(|| async { "OK" }))
}

pub async fn serve(host: &str, port: u16) -> Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind liveness endpoint on {addr}"))?;

    info!(addr = %addr, "liveness endpoint listening");
    axum::serve(listener, router())
        .await
        .context("liveness server stopped unexpectedly")?;
    Ok(())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_root_returns_ok() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router()).await.unwrap();
        });

        let body = http_get(&format!("http://{addr}/")).await;
        assert_eq!(body, "OK");
    }

    /// Minimal GET over a raw TCP stream, to avoid pulling an HTTP client
    /// into the binary's dev-dependencies.
    async fn http_get(url: &str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let rest = url.strip_prefix("http://").unwrap();
        let (addr, path) = rest.split_once('/').unwrap();
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(
                format!("GET /{path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n")
                    .as_bytes(),
            )
            .await
            .unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200"));
        response
            .split("\r\n\r\n")
            .nth(1)
            .unwrap_or_default()
            .to_string()
    }
}
