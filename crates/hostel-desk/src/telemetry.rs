use std::fmt;

use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

use crate::config::TelemetryConfig;

#[derive(Debug)]
pub enum TelemetryError {
    Filter { directive: String, source: ParseError },
    AlreadyInstalled(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::Filter { directive, .. } => {
                write!(f, "log filter '{directive}' is not a valid directive")
            }
            TelemetryError::AlreadyInstalled(err) => {
                write!(f, "tracing subscriber could not be installed: {err}")
            }
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::Filter { source, .. } => Some(source),
            TelemetryError::AlreadyInstalled(err) => Some(&**err),
        }
    }
}

/// `RUST_LOG` wins over the configured level when it parses.
pub fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    EnvFilter::try_new(&config.log_level).map_err(|source| TelemetryError::Filter {
        directive: config.log_level.clone(),
        source,
    })
}

pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = build_filter(config)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::AlreadyInstalled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::env_guard;

    #[test]
    fn rejects_malformed_directives() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        std::env::remove_var("RUST_LOG");
        let config = TelemetryConfig {
            log_level: "hostel_desk=loud".to_string(),
        };
        match build_filter(&config) {
            Err(TelemetryError::Filter { directive, .. }) => {
                assert_eq!(directive, "hostel_desk=loud")
            }
            other => panic!("expected filter error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_module_directives() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        std::env::remove_var("RUST_LOG");
        let config = TelemetryConfig {
            log_level: "info,hostel_desk=debug".to_string(),
        };
        assert!(build_filter(&config).is_ok());
    }
}
