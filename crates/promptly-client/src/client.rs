//! Shared HTTP client utilities

use crate::{ClientError, Result};
use promptly_core::config::HttpSettings;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout in seconds, covering the whole exchange
    pub timeout_secs: u64,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,

    /// Maximum number of idle connections per host
    pub pool_max_idle_per_host: usize,

    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::from(&HttpSettings::default())
    }
}

impl From<&HttpSettings> for HttpClientConfig {
    fn from(settings: &HttpSettings) -> Self {
        Self {
            timeout_secs: settings.timeout_secs,
            connect_timeout_secs: settings.connect_timeout_secs,
            pool_max_idle_per_host: settings.pool_max_idle_per_host,
            user_agent: format!("Promptly/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Create a configured HTTP client with connection pooling
pub fn create_client(config: &HttpClientConfig) -> Result<Client> {
    ClientBuilder::new()
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        // Expire idle connections before the API's load balancer drops them
        .pool_idle_timeout(Duration::from_secs(90))
        .user_agent(&config.user_agent)
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .map_err(|e| ClientError::InvalidRequest(format!("Failed to create HTTP client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HttpClientConfig::default();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.connect_timeout_secs, 10);
        assert_eq!(config.pool_max_idle_per_host, 8);
        assert!(config.user_agent.starts_with("Promptly/"));
    }

    #[test]
    fn test_create_client() {
        let config = HttpClientConfig::default();
        assert!(create_client(&config).is_ok());
    }

    #[test]
    fn test_client_with_custom_config() {
        let config = HttpClientConfig {
            timeout_secs: 5,
            connect_timeout_secs: 2,
            pool_max_idle_per_host: 1,
            user_agent: "Test/1.0".to_string(),
        };

        assert!(create_client(&config).is_ok());
    }
}
