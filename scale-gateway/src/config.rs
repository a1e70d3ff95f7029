//! Configuration loaded from environment variables.

use std::env;

use crate::codec::WeightUnit;

/// Recognized `LOG_LEVEL` values, mapped onto `tracing`'s filter directives
/// in `main`. `WARNING` (not `WARN`) is the spelling the configuration
/// contract uses, so it's accepted as its own variant rather than an alias
/// users have to know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// The `tracing_subscriber::EnvFilter` directive this level maps to.
    pub fn as_filter_directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("DATABASE_URL is not set")]
    MissingDatabaseUrl,

    #[error("WEIGHT_UNIT {0:?} is not one of kg, lbs, stones")]
    BadWeightUnit(String),

    #[error("LOG_LEVEL {0:?} is not one of DEBUG, INFO, WARNING, ERROR")]
    BadLogLevel(String),

    #[error("PORT {0:?} is not a valid port number")]
    BadPort(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub weight_unit: WeightUnit,
    pub log_level: LogLevel,
    pub port: u16,
}

impl Config {
    /// Load from the process environment, applying defaults of
    /// `WEIGHT_UNIT=kg`, `LOG_LEVEL=INFO`, and a `PORT` default of 80 --
    /// the protocol port the scale actually dials.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)?;

        let weight_unit = match env::var("WEIGHT_UNIT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::BadWeightUnit(raw.clone()))?,
            Err(_) => WeightUnit::Kg,
        };

        let log_level = match env::var("LOG_LEVEL") {
            Ok(raw) => parse_log_level(&raw).ok_or_else(|| ConfigError::BadLogLevel(raw.clone()))?,
            Err(_) => LogLevel::Info,
        };

        let port = match env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::BadPort(raw.clone()))?,
            Err(_) => 80,
        };

        Ok(Config {
            database_url,
            weight_unit,
            log_level,
            port,
        })
    }
}

fn parse_log_level(raw: &str) -> Option<LogLevel> {
    match raw.to_ascii_uppercase().as_str() {
        "DEBUG" => Some(LogLevel::Debug),
        "INFO" => Some(LogLevel::Info),
        "WARNING" => Some(LogLevel::Warning),
        "ERROR" => Some(LogLevel::Error),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("DEBUG", LogLevel::Debug; "debug")]
    #[test_case("info", LogLevel::Info; "info lowercase")]
    #[test_case("Warning", LogLevel::Warning; "warning mixed case")]
    #[test_case("ERROR", LogLevel::Error; "error")]
    fn parses_known_log_levels(raw: &str, expect: LogLevel) {
        assert_eq!(parse_log_level(raw), Some(expect));
    }

    #[test]
    fn rejects_unknown_log_level() {
        assert_eq!(parse_log_level("VERBOSE"), None);
    }
}
