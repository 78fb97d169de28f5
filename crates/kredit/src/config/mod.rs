//! Environment-driven service configuration. Every knob has a default
//! suitable for local development; a `.env` file is honored when present.

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

const ENV_VAR: &str = "APP_ENV";
const HOST_VAR: &str = "APP_HOST";
const PORT_VAR: &str = "APP_PORT";
const LOG_LEVEL_VAR: &str = "APP_LOG_LEVEL";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    /// Unrecognized values fall back to development rather than failing
    /// the boot.
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port_raw = env_or(PORT_VAR, "3000");
        let port = port_raw
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort { value: port_raw })?;

        Ok(Self {
            environment: AppEnvironment::parse(&env_or(ENV_VAR, "development")),
            server: ServerConfig {
                host: env_or(HOST_VAR, "127.0.0.1"),
                port,
            },
            telemetry: TelemetryConfig {
                log_level: env_or(LOG_LEVEL_VAR, "info"),
            },
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// HTTP listener binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// Resolve the configured host and port into a bindable address.
    /// `localhost` is accepted as an alias for the IPv4 loopback.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = if self.host.eq_ignore_ascii_case("localhost") {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        } else {
            self.host
                .parse()
                .map_err(|source| ConfigError::InvalidHost { source })?
        };
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Log filtering for the tracing subscriber.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{PORT_VAR} value '{value}' is not a valid port number")]
    InvalidPort { value: String },
    #[error("{HOST_VAR} must be an IP address or 'localhost'")]
    InvalidHost {
        #[source]
        source: std::net::AddrParseError,
    },
}
