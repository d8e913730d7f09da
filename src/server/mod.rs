pub mod builder;
pub mod handler;
pub mod listener;

pub use builder::ServerBuilder;
pub use handler::StatusHandler;

use crate::config::ServerConfig;
use anyhow::{Context, Result};
use std::net::SocketAddr;

/// Resolve the configured bind address and port.
pub fn socket_addr(config: &ServerConfig) -> Result<SocketAddr> {
    format!("{}:{}", config.bind, config.port)
        .parse()
        .with_context(|| format!("Invalid server address {}:{}", config.bind, config.port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_addr() {
        let addr = socket_addr(&ServerConfig::default()).unwrap();
        assert_eq!(addr.to_string(), "0.0.0.0:9090");

        let bad = ServerConfig {
            bind: "not-an-ip".to_string(),
            ..ServerConfig::default()
        };
        assert!(socket_addr(&bad).is_err());
    }
}
