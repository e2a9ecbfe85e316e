//! Process configuration read from the environment (and `.env` when present).

use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

const APP_ENV: &str = "APP_ENV";
const APP_HOST: &str = "APP_HOST";
const APP_PORT: &str = "APP_PORT";
const APP_LOG_LEVEL: &str = "APP_LOG_LEVEL";
const APP_LOG_FORMAT: &str = "APP_LOG_FORMAT";
const APP_LEDGER_PATH: &str = "APP_LEDGER_PATH";

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Deployment stage; only reported in logs.
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

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub ledger: LedgerConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            environment: AppEnvironment::parse(&var_or(APP_ENV, "development")),
            server: ServerConfig::from_env()?,
            telemetry: TelemetryConfig::from_env()?,
            ledger: LedgerConfig::from_env(),
        })
    }
}

/// Bind address of the HTTP service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let port = var_or(APP_PORT, "3000")
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        Ok(Self {
            host: var_or(APP_HOST, "127.0.0.1"),
            port,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = if self.host.eq_ignore_ascii_case("localhost") {
            IpAddr::from([127, 0, 0, 1])
        } else {
            self.host
                .parse()
                .map_err(|source| ConfigError::InvalidHost { source })?
        };
        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
}

impl LogFormat {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            other => Err(ConfigError::InvalidLogFormat {
                value: other.to_string(),
            }),
        }
    }
}

/// Filter directive and output format for the tracing subscriber.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub format: LogFormat,
}

impl TelemetryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            log_level: var_or(APP_LOG_LEVEL, "info"),
            format: LogFormat::parse(&var_or(APP_LOG_FORMAT, "compact"))?,
        })
    }
}

/// Where recorded results are kept. A blank path means in-memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerConfig {
    Memory,
    Csv(PathBuf),
}

impl LedgerConfig {
    fn from_env() -> Self {
        match env::var(APP_LEDGER_PATH) {
            Ok(path) if !path.trim().is_empty() => Self::Csv(PathBuf::from(path.trim())),
            _ => Self::Memory,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidLogFormat { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "{APP_PORT} must be a port number (0-65535)"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "{APP_HOST} must be 'localhost' or an IP address")
            }
            ConfigError::InvalidLogFormat { value } => {
                write!(f, "{APP_LOG_FORMAT} must be 'compact' or 'pretty', got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort | ConfigError::InvalidLogFormat { .. } => None,
        }
    }
}

/// Serializes tests that read or mutate process environment variables.
#[cfg(test)]
pub(crate) fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex, OnceLock};

    static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
    GUARD
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::MutexGuard;

    const KEYS: [&str; 6] = [
        APP_ENV,
        APP_HOST,
        APP_PORT,
        APP_LOG_LEVEL,
        APP_LOG_FORMAT,
        APP_LEDGER_PATH,
    ];

    /// Serializes env mutation and starts every test from a clean slate.
    fn clean_env(vars: &[(&str, &str)]) -> MutexGuard<'static, ()> {
        let lock = env_lock();
        for key in KEYS {
            env::remove_var(key);
        }
        for (key, value) in vars {
            env::set_var(key, value);
        }
        lock
    }

    #[test]
    fn defaults_give_a_local_server_and_memory_ledger() {
        let _env = clean_env(&[]);
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.telemetry.format, LogFormat::Compact);
        assert_eq!(config.ledger, LedgerConfig::Memory);
    }

    #[test]
    fn localhost_resolves_to_loopback() {
        let _env = clean_env(&[(APP_HOST, "localhost"), (APP_PORT, "8080")]);
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 8080));
    }

    #[test]
    fn hostnames_other_than_localhost_are_rejected() {
        let _env = clean_env(&[(APP_HOST, "lab.internal")]);
        let config = AppConfig::load().expect("host is only checked on bind");
        let error = config.server.socket_addr().expect_err("not an ip");
        assert!(matches!(error, ConfigError::InvalidHost { .. }));
    }

    #[test]
    fn non_numeric_port_fails_to_load() {
        let _env = clean_env(&[(APP_PORT, "http")]);
        let error = AppConfig::load().expect_err("port must be numeric");
        assert!(matches!(error, ConfigError::InvalidPort));
    }

    #[test]
    fn ledger_path_selects_the_csv_ledger() {
        let _env = clean_env(&[
            (APP_LEDGER_PATH, " var/results.csv "),
            (APP_LOG_FORMAT, "Pretty"),
            (APP_ENV, "ci"),
        ]);
        let config = AppConfig::load().expect("config loads");
        assert_eq!(
            config.ledger,
            LedgerConfig::Csv(PathBuf::from("var/results.csv"))
        );
        assert_eq!(config.telemetry.format, LogFormat::Pretty);
        assert_eq!(config.environment, AppEnvironment::Test);
    }

    #[test]
    fn blank_ledger_path_stays_in_memory() {
        let _env = clean_env(&[(APP_LEDGER_PATH, "   ")]);
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.ledger, LedgerConfig::Memory);
    }

    #[test]
    fn unknown_log_format_is_named_in_the_error() {
        let _env = clean_env(&[(APP_LOG_FORMAT, "json")]);
        let error = AppConfig::load().expect_err("json is not supported");
        assert!(error.to_string().contains("'json'"));
    }
}
