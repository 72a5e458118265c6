//! Relay server listener
//!
//! Binds the TCP listener and serves the relay router on it.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::error::Result;
use crate::registry::{ApplicationRegistry, RegistryConfig};
use crate::server::config::ServerConfig;
use crate::server::routes;

/// Relay server
pub struct RelayServer {
    config: ServerConfig,
    registry: Arc<ApplicationRegistry>,
}

impl RelayServer {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        Self::with_registry_config(config, RegistryConfig::default())
    }

    /// Create a new server with custom registry configuration
    pub fn with_registry_config(config: ServerConfig, registry_config: RegistryConfig) -> Self {
        Self {
            config,
            registry: Arc::new(ApplicationRegistry::with_config(registry_config)),
        }
    }

    /// Get a reference to the application registry
    pub fn registry(&self) -> &Arc<ApplicationRegistry> {
        &self.registry
    }

    /// Build the HTTP router for this server
    pub fn router(&self) -> Router {
        routes::router(Arc::clone(&self.registry), &self.config)
    }

    /// Run the server
    ///
    /// This method blocks until the server fails.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Run the server until `shutdown` completes
    ///
    /// Open event streams are not waited for; they are dropped, and their
    /// subscribers detached, when the runtime shuts down.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;

        tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.serve(listener) => result,
        }
    }

    /// Serve on an already bound listener
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        tracing::info!(addr = %listener.local_addr()?, "Relay server listening");

        axum::serve(listener, self.router()).await?;
        Ok(())
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::time::timeout;

    use super::*;

    async fn request(addr: SocketAddr, raw: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(raw.as_bytes()).await.unwrap();

        let mut response = Vec::new();
        timeout(Duration::from_secs(2), stream.read_to_end(&mut response))
            .await
            .expect("timed out reading response")
            .unwrap();
        String::from_utf8(response).unwrap()
    }

    #[tokio::test]
    async fn test_serve_registration_over_tcp() {
        let server = Arc::new(RelayServer::new(ServerConfig::default()));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = {
            let server = Arc::clone(&server);
            tokio::spawn(async move { server.serve(listener).await })
        };

        let body = r#"{"userAgent":"X","host":"Y"}"#;
        let response = request(
            addr,
            &format!(
                "POST /clients HTTP/1.1\r\nHost: relay\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            ),
        )
        .await;

        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.ends_with(r#"{"id":"0"}"#));
        assert_eq!(server.registry().application_count().await, 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_run_until_returns_on_shutdown() {
        let config = ServerConfig::with_addr("127.0.0.1:0".parse().unwrap());
        let server = RelayServer::new(config);

        let result = timeout(Duration::from_secs(2), server.run_until(async {})).await;

        assert!(result.expect("run_until did not return").is_ok());
    }
}
