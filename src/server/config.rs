//! Server configuration

use std::net::SocketAddr;
use std::time::Duration;

/// Default listening port
pub const DEFAULT_PORT: u16 = 7117;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Interval of keep-alive comments on idle streams (None = never)
    ///
    /// A write is the only way a dead peer is noticed, so without keep-alives
    /// an idle stream whose client vanished stays attached until the next
    /// envelope.
    pub keep_alive: Option<Duration>,

    /// Add permissive CORS headers and answer preflight requests
    pub cors: bool,

    /// Maximum request body size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            keep_alive: Some(Duration::from_secs(15)),
            cors: true,
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the keep-alive interval; a zero duration disables keep-alives
    pub fn keep_alive(mut self, interval: Duration) -> Self {
        self.keep_alive = if interval.is_zero() {
            None
        } else {
            Some(interval)
        };
        self
    }

    /// Disable keep-alive comments
    pub fn disable_keep_alive(mut self) -> Self {
        self.keep_alive = None;
        self
    }

    /// Disable CORS headers
    pub fn disable_cors(mut self) -> Self {
        self.cors = false;
        self
    }

    /// Set maximum request body size
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.bind_addr.port(), DEFAULT_PORT);
        assert_eq!(config.keep_alive, Some(Duration::from_secs(15)));
        assert!(config.cors);
        assert_eq!(config.max_body_size, 2 * 1024 * 1024);
    }

    #[test]
    fn test_with_addr() {
        let addr: SocketAddr = "127.0.0.1:8080".parse().unwrap();
        let config = ServerConfig::with_addr(addr);

        assert_eq!(config.bind_addr, addr);
        assert!(config.cors);
    }

    #[test]
    fn test_builder_keep_alive_zero_disables() {
        let config = ServerConfig::default().keep_alive(Duration::ZERO);
        assert_eq!(config.keep_alive, None);

        let config = ServerConfig::default().keep_alive(Duration::from_secs(30));
        assert_eq!(config.keep_alive, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_builder_chaining() {
        let addr: SocketAddr = "127.0.0.1:7118".parse().unwrap();
        let config = ServerConfig::default()
            .bind(addr)
            .disable_keep_alive()
            .disable_cors()
            .max_body_size(1024);

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.keep_alive, None);
        assert!(!config.cors);
        assert_eq!(config.max_body_size, 1024);
    }
}
