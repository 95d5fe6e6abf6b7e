//! Server configuration.
//!
//! Process-level settings come from environment variables with sensible
//! defaults. The bridge itself (sources, redirect targets) is described by a
//! separate TOML file whose path is one of those settings.

use std::path::PathBuf;

use ssp_core::EnvironmentType;
use ssp_session::SessionTimeouts;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server host to bind to.
    pub host: String,

    /// Server port.
    pub port: u16,

    /// Path of the bridge configuration file.
    pub bridge_config_path: PathBuf,

    /// Runtime environment, used to pick an environment-specific default source.
    pub environment: EnvironmentType,

    /// Database connection URL. Users are kept in memory when unset.
    pub database_url: Option<String>,

    /// Minimum database connections.
    pub db_min_connections: u32,

    /// Maximum database connections.
    pub db_max_connections: u32,

    /// Whether session cookies carry the `Secure` attribute.
    pub secure_cookies: bool,

    /// Whether host pages attempt a silent login for anonymous visitors.
    pub passive_login: bool,

    /// Seconds a session may sit unused.
    pub session_idle_timeout_secs: i64,

    /// Seconds a session may live in total.
    pub session_max_lifespan_secs: i64,

    /// Seconds between sweeps of expired sessions.
    pub session_sweep_interval_secs: u64,
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `SSP_ENVIRONMENT` names an unknown environment.
    pub fn from_env() -> anyhow::Result<Self> {
        // A missing .env file is fine
        let _ = dotenvy::dotenv();

        let host = std::env::var("SSP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("SSP_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let bridge_config_path = std::env::var("SSP_CONFIG")
            .map_or_else(|_| PathBuf::from("ssp.toml"), PathBuf::from);

        let environment = match std::env::var("SSP_ENVIRONMENT") {
            Ok(value) => value.parse()?,
            Err(_) => EnvironmentType::default(),
        };

        let database_url = std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());

        let db_min_connections = std::env::var("SSP_DB_MIN_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1);

        let db_max_connections = std::env::var("SSP_DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        let secure_cookies = env_flag("SSP_SECURE_COOKIES", true);
        let passive_login = env_flag("SSP_PASSIVE_LOGIN", false);

        let session_idle_timeout_secs = env_number("SSP_SESSION_IDLE_TIMEOUT", 30 * 60);
        let session_max_lifespan_secs = env_number("SSP_SESSION_MAX_LIFESPAN", 10 * 60 * 60);
        let session_sweep_interval_secs = env_number("SSP_SESSION_SWEEP_INTERVAL", 60);

        Ok(Self {
            host,
            port,
            bridge_config_path,
            environment,
            database_url,
            db_min_connections,
            db_max_connections,
            secure_cookies,
            passive_login,
            session_idle_timeout_secs,
            session_max_lifespan_secs,
            session_sweep_interval_secs,
        })
    }

    /// Creates a configuration for testing.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: EnvironmentType::Dev,
            secure_cookies: false,
            ..Self::default()
        }
    }

    /// Enables passive login on host pages.
    #[must_use]
    pub const fn with_passive_login(mut self, enabled: bool) -> Self {
        self.passive_login = enabled;
        self
    }

    /// Returns the session timeouts.
    #[must_use]
    pub fn session_timeouts(&self) -> SessionTimeouts {
        SessionTimeouts::from_secs(self.session_idle_timeout_secs, self.session_max_lifespan_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            bridge_config_path: PathBuf::from("ssp.toml"),
            environment: EnvironmentType::default(),
            database_url: None,
            db_min_connections: 1,
            db_max_connections: 10,
            secure_cookies: true,
            passive_login: false,
            session_idle_timeout_secs: 30 * 60,
            session_max_lifespan_secs: 10 * 60 * 60,
            session_sweep_interval_secs: 60,
        }
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .map(|v| parse_flag(&v).unwrap_or(default))
        .unwrap_or(default)
}

fn env_number<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
