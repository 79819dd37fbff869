use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::workflows::maintenance::{DEFAULT_BULK_LIMIT, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Deployment stage the desk is running in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Everything the desk reads from the environment at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub maintenance: MaintenanceConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::parse(&var_or("APP_ENV", "development"));
        let host = var_or("APP_HOST", "127.0.0.1");
        let port = var_or("APP_PORT", "3000")
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;
        let log_level = var_or("APP_LOG_LEVEL", "info");

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            maintenance: MaintenanceConfig::from_env()?,
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Limits applied by the maintenance service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaintenanceConfig {
    pub bulk_limit: usize,
    pub page_size: usize,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            bulk_limit: DEFAULT_BULK_LIMIT,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl MaintenanceConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let bulk_limit = match env::var("MAINTENANCE_BULK_LIMIT") {
            Ok(raw) => match raw.trim().parse::<usize>() {
                Ok(limit) if limit >= 1 => limit,
                _ => return Err(ConfigError::InvalidBulkLimit(raw)),
            },
            Err(_) => defaults.bulk_limit,
        };

        let page_size = match env::var("MAINTENANCE_PAGE_SIZE") {
            Ok(raw) => match raw.trim().parse::<usize>() {
                Ok(size) if (1..=MAX_PAGE_SIZE).contains(&size) => size,
                _ => return Err(ConfigError::InvalidPageSize(raw)),
            },
            Err(_) => defaults.page_size,
        };

        Ok(Self {
            bulk_limit,
            page_size,
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidBulkLimit(String),
    InvalidPageSize(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidBulkLimit(raw) => {
                write!(f, "MAINTENANCE_BULK_LIMIT must be a positive integer, got '{raw}'")
            }
            ConfigError::InvalidPageSize(raw) => write!(
                f,
                "MAINTENANCE_PAGE_SIZE must be between 1 and {MAX_PAGE_SIZE}, got '{raw}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}

/// Serialises tests that mutate process environment variables.
#[cfg(test)]
pub(crate) fn env_guard() -> &'static std::sync::Mutex<()> {
    static GUARD: std::sync::OnceLock<std::sync::Mutex<()>> = std::sync::OnceLock::new();
    GUARD.get_or_init(|| std::sync::Mutex::new(()))
}
