//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `pharos.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values, and an optional first command-line argument
//! takes precedence over both for the port.

use std::str::FromStr;

use serde::Deserialize;

use pharos_domain::state::LaserState;

/// Lowest port the daemon accepts; below it are privileged ports.
const MIN_PORT: u16 = 1024;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Simulated device settings.
    pub device: DeviceConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Simulated device configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// State reached at startup by walking the power-up path.
    pub initial_state: String,
    /// Capacity of the device event channel.
    pub event_capacity: usize,
}

impl Config {
    /// Load configuration from `pharos.toml` (if present), apply
    /// environment-variable overrides, then the optional port argument.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, if the
    /// port argument is not a number, or if validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("pharos.toml")?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.apply_args(std::env::args().skip(1))?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("PHAROS_HOST") {
            self.server.host = val;
        }
        if let Some(port) = var("PHAROS_PORT").and_then(|val| val.parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = var("PHAROS_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("PHAROS_INITIAL_STATE") {
            self.device.initial_state = val;
        }
        if let Some(val) = var("PHAROS_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    /// `pharosd [port]`
    fn apply_args(&mut self, mut args: impl Iterator<Item = String>) -> Result<(), ConfigError> {
        if let Some(arg) = args.next() {
            self.server.port = arg
                .parse()
                .map_err(|_| ConfigError::Validation(format!("invalid port argument '{arg}'")))?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port < MIN_PORT {
            return Err(ConfigError::Validation(format!(
                "port must be between {MIN_PORT} and {}",
                u16::MAX
            )));
        }
        if self.device.event_capacity == 0 {
            return Err(ConfigError::Validation(
                "event capacity must be non-zero".to_string(),
            ));
        }
        self.initial_state()?;
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Parse the configured start state.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for an unknown state name.
    pub fn initial_state(&self) -> Result<LaserState, ConfigError> {
        LaserState::from_str(&self.device.initial_state)
            .map_err(|err| ConfigError::Validation(err.to_string()))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 20020,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "pharosd=info,pharos=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            initial_state: "Operational".to_string(),
            event_capacity: 256,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
