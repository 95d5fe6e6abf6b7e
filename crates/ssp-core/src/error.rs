//! Configuration error types.
//!
//! Every variant here is fatal: it signals a deployment misconfiguration that
//! must be fixed before the bridge can serve requests, so none of them are
//! retried.

use thiserror::Error;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Errors raised while loading, validating, or resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The `authenticators` list is missing or empty.
    #[error("configuration error: expected at least one authentication source in `authenticators`")]
    NoAuthenticators,

    /// The same source name appears twice in `authenticators`.
    #[error("configuration error: authentication source '{0}' is declared more than once")]
    DuplicateSource(String),

    /// A source name was requested that is not registered.
    #[error("configuration error: '{0}' does not exist in authenticators")]
    UnknownSource(String),

    /// A source maps to an implementation the registry does not know.
    #[error("configuration error: implementation '{implementation}' for source '{source_name}' does not exist")]
    UnknownImplementation {
        /// Source name from configuration.
        source_name: String,
        /// Implementation identifier from configuration.
        implementation: String,
    },

    /// The configuration could not be parsed.
    #[error("configuration error: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration file could not be read.
    #[error("configuration error: failed to read {path}: {source}")]
    Io {
        /// Path of the file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Any other invalid configuration value.
    #[error("configuration error: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Creates an invalid-value error.
    #[must_use]
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    /// Creates an unknown-source error.
    #[must_use]
    pub fn unknown_source(source_name: impl Into<String>) -> Self {
        Self::UnknownSource(source_name.into())
    }

    /// Checks if this error names a source or implementation that is not registered.
    #[must_use]
    pub const fn is_unresolvable(&self) -> bool {
        matches!(
            self,
            Self::UnknownSource(_) | Self::UnknownImplementation { .. }
        )
    }
}
