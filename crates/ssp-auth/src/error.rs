//! Authentication error types.

use std::fmt;

use ssp_core::ConfigError;
use ssp_session::SessionError;
use ssp_storage::StorageError;

/// Authentication operation errors.
#[derive(Debug)]
pub enum AuthError {
    /// The bridge is misconfigured. Fatal until the configuration is fixed.
    Configuration(ConfigError),
    /// An authenticator produced something that is not a valid local user.
    ContractViolation {
        /// Source whose authenticator misbehaved.
        source_name: String,
        /// What was wrong with the result.
        reason: String,
    },
    /// The identity provider did not release an attribute the bridge needs.
    MissingAttribute {
        /// Source that released the attributes.
        source_name: String,
        /// Local field that could not be populated.
        field: &'static str,
    },
    /// `authenticate` was called without an authenticated provider session.
    NotAuthenticated {
        /// Source that was asked.
        source_name: String,
    },
    /// The identity provider adapter failed.
    Provider {
        /// Source whose adapter failed.
        source_name: String,
        /// Error message.
        message: String,
    },
    /// User storage failed.
    Storage(StorageError),
    /// Session storage failed.
    Session(SessionError),
}

impl AuthError {
    /// Creates a provider adapter error.
    #[must_use]
    pub fn provider(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Creates a contract violation error.
    #[must_use]
    pub fn contract_violation(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ContractViolation {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Checks if this is a configuration error.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Checks if this is a contract violation.
    #[must_use]
    pub const fn is_contract_violation(&self) -> bool {
        matches!(self, Self::ContractViolation { .. })
    }

    /// Checks if the identity provider is at fault.
    #[must_use]
    pub const fn is_provider(&self) -> bool {
        matches!(
            self,
            Self::Provider { .. } | Self::MissingAttribute { .. } | Self::NotAuthenticated { .. }
        )
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(err) => write!(f, "{err}"),
            Self::ContractViolation {
                source_name,
                reason,
            } => write!(
                f,
                "authenticator for '{source_name}' does not return a valid local user: {reason}"
            ),
            Self::MissingAttribute { source_name, field } => {
                write!(f, "identity source '{source_name}' did not release a value for {field}")
            }
            Self::NotAuthenticated { source_name } => {
                write!(f, "identity source '{source_name}' has no authenticated session")
            }
            Self::Provider {
                source_name,
                message,
            } => write!(f, "identity provider '{source_name}' failed: {message}"),
            Self::Storage(err) => write!(f, "user storage error: {err}"),
            Self::Session(err) => write!(f, "session error: {err}"),
        }
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Configuration(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::Session(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for AuthError {
    fn from(err: ConfigError) -> Self {
        Self::Configuration(err)
    }
}

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err)
    }
}

impl From<SessionError> for AuthError {
    fn from(err: SessionError) -> Self {
        Self::Session(err)
    }
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;
