//! HTTP server configuration.

use std::net::SocketAddr;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_MAX_BODY: usize = 50 * 1024 * 1024;

/// Settings for the HTTP surface; pipeline settings live in `WorkerConfig`.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// Allowed browser origins; `*` allows any
    pub cors_origins: Vec<String>,
    /// Upper bound on JSON request bodies
    pub max_body_size: usize,
    /// `production` hides internal error details
    pub environment: String,
    /// Expose Prometheus metrics at /metrics
    pub metrics_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            cors_origins: vec!["*".to_string()],
            max_body_size: DEFAULT_MAX_BODY,
            environment: "development".to_string(),
            metrics_enabled: true,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

impl ApiConfig {
    /// Read `API_HOST`, `API_PORT`, `CORS_ORIGINS`, `MAX_BODY_SIZE`,
    /// `ENVIRONMENT` and `METRICS_ENABLED`, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: env_parse("API_PORT").unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|list| {
                    list.split(',')
                        .map(str::trim)
                        .filter(|o| !o.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),
            max_body_size: env_parse("MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| matches!(v.trim(), "true" | "1"))
                .unwrap_or(defaults.metrics_enabled),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Socket address to listen on.
    pub fn bind_address(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.max_body_size, 50 * 1024 * 1024);
        assert!(!config.is_production());
        assert_eq!(config.bind_address().unwrap().port(), 8000);
    }

    #[test]
    fn test_bad_host_is_an_error() {
        let config = ApiConfig {
            host: "not a host".to_string(),
            ..Default::default()
        };
        assert!(config.bind_address().is_err());
    }
}
