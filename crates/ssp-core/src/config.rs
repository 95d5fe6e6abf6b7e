//! Bridge configuration.
//!
//! Configuration is loaded from a TOML file. Identity sources are declared as
//! an ordered array so that the first entry is a well-defined fallback:
//!
//! ```toml
//! default_logged_in_url = "/admin"
//! default_logged_out_url = "/"
//! force_transport_security = true
//!
//! [[authenticators]]
//! source = "adfs"
//! implementation = "claims"
//!
//! [[authenticators]]
//! source = "ldap"
//! implementation = "directory"
//!
//! [default_authenticator]
//! dev = "ldap"
//! prod = "adfs"
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Runtime environment type, used to pick an environment-specific default source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentType {
    /// Development.
    Dev,
    /// Test / staging.
    Test,
    /// Production.
    #[default]
    #[serde(alias = "live")]
    Prod,
}

impl EnvironmentType {
    /// Returns the canonical name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Test => "test",
            Self::Prod => "prod",
        }
    }
}

impl fmt::Display for EnvironmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnvironmentType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" => Ok(Self::Dev),
            "test" => Ok(Self::Test),
            "prod" | "live" => Ok(Self::Prod),
            other => Err(ConfigError::invalid(format!(
                "unknown environment type '{other}' (expected dev, test, or prod)"
            ))),
        }
    }
}

/// One entry of the `authenticators` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatorDescriptor {
    /// Authentication source name as known to the identity provider.
    #[serde(alias = "source_name")]
    pub source: String,
    /// Identifier of the authenticator implementation (e.g. `claims`, `directory`).
    pub implementation: String,
}

impl AuthenticatorDescriptor {
    /// Creates a new descriptor.
    #[must_use]
    pub fn new(source: impl Into<String>, implementation: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            implementation: implementation.into(),
        }
    }
}

/// Default authenticator setting: one fixed source, or one per environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultAuthenticator {
    /// Same source in every environment.
    Fixed(String),
    /// Source keyed by environment type.
    PerEnvironment(HashMap<EnvironmentType, String>),
}

impl DefaultAuthenticator {
    /// Returns the source configured for the given environment, if any.
    #[must_use]
    pub fn source_for(&self, environment: EnvironmentType) -> Option<&str> {
        let source = match self {
            Self::Fixed(source) => Some(source.as_str()),
            Self::PerEnvironment(map) => map.get(&environment).map(String::as_str),
        };
        source.filter(|s| !s.is_empty())
    }
}

/// Bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Identity sources in declaration order.
    #[serde(default)]
    pub authenticators: Vec<AuthenticatorDescriptor>,

    /// Default source when the request does not name one.
    #[serde(default)]
    pub default_authenticator: Option<DefaultAuthenticator>,

    /// Redirect target after login when no back-URL was captured.
    #[serde(default = "default_redirect_url")]
    pub default_logged_in_url: String,

    /// Redirect target after logout when no back-URL was captured.
    #[serde(default = "default_redirect_url")]
    pub default_logged_out_url: String,

    /// Whether the bridge replaces the host's own authentication routes.
    #[serde(default = "default_true")]
    pub enable_auth: bool,

    /// Whether auth actions upgrade plain HTTP requests to HTTPS.
    #[serde(default = "default_true")]
    pub force_transport_security: bool,

    /// Public `host[:port]` of the site.
    ///
    /// Used for HTTPS upgrades instead of the request's `Host` header when set.
    #[serde(default)]
    pub canonical_host: Option<String>,

    /// Development identity provider used when no federation service is wired in.
    #[serde(default)]
    pub dev_provider: Option<DevProviderConfig>,
}

/// Settings for the in-process development identity provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevProviderConfig {
    /// Complete every login immediately with `attributes`.
    #[serde(default)]
    pub auto_authenticate: bool,

    /// Attributes released for every authenticated session.
    #[serde(default)]
    pub attributes: HashMap<String, Vec<String>>,

    /// Provider login page used when logins are not completed automatically.
    #[serde(default)]
    pub sso_url: Option<String>,

    /// Provider portal page.
    #[serde(default)]
    pub portal_url: Option<String>,
}

fn is_authority(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':' | '[' | ']'))
}

fn default_redirect_url() -> String {
    "/".to_string()
}

const fn default_true() -> bool {
    true
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            authenticators: Vec::new(),
            default_authenticator: None,
            default_logged_in_url: default_redirect_url(),
            default_logged_out_url: default_redirect_url(),
            enable_auth: true,
            force_transport_security: true,
            canonical_host: None,
            dev_provider: None,
        }
    }
}

impl BridgeConfig {
    /// Parses configuration from a TOML string and validates it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed TOML or wrongly typed values
    /// (a non-boolean `force_transport_security`, for instance), or any error
    /// from [`BridgeConfig::validate`].
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file and validates it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read, otherwise the
    /// same errors as [`BridgeConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let config = Self::from_toml_str(&content)?;
        tracing::debug!(
            path = %path.display(),
            sources = config.authenticators.len(),
            "Loaded bridge configuration"
        );
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// - `ConfigError::NoAuthenticators` if no source is declared
    /// - `ConfigError::DuplicateSource` if a source name repeats
    /// - `ConfigError::Invalid` for empty names or redirect URLs, or a
    ///   `canonical_host` that is not a bare `host[:port]`
    /// - `ConfigError::UnknownSource` if a default names an undeclared source
    pub fn validate(&self) -> ConfigResult<()> {
        if self.authenticators.is_empty() {
            return Err(ConfigError::NoAuthenticators);
        }

        let mut seen = HashSet::new();
        for descriptor in &self.authenticators {
            if descriptor.source.trim().is_empty() {
                return Err(ConfigError::invalid("authentication source name cannot be empty"));
            }
            if descriptor.implementation.trim().is_empty() {
                return Err(ConfigError::invalid(format!(
                    "authentication source '{}' has no implementation",
                    descriptor.source
                )));
            }
            if !seen.insert(descriptor.source.as_str()) {
                return Err(ConfigError::DuplicateSource(descriptor.source.clone()));
            }
        }

        if self.default_logged_in_url.is_empty() || self.default_logged_out_url.is_empty() {
            return Err(ConfigError::invalid("default redirect URLs cannot be empty"));
        }

        if let Some(host) = &self.canonical_host {
            if !is_authority(host) {
                return Err(ConfigError::invalid(format!(
                    "canonical_host '{host}' must be a bare host[:port]"
                )));
            }
        }

        match &self.default_authenticator {
            Some(DefaultAuthenticator::Fixed(source)) if !source.is_empty() => {
                self.require_source(source)?;
            }
            Some(DefaultAuthenticator::PerEnvironment(map)) => {
                for source in map.values().filter(|s| !s.is_empty()) {
                    self.require_source(source)?;
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Gets the descriptor for a source name.
    #[must_use]
    pub fn descriptor(&self, source: &str) -> Option<&AuthenticatorDescriptor> {
        self.authenticators.iter().find(|d| d.source == source)
    }

    /// Returns the first declared source.
    #[must_use]
    pub fn first_source(&self) -> Option<&str> {
        self.authenticators.first().map(|d| d.source.as_str())
    }

    /// Returns the configured default source for an environment.
    #[must_use]
    pub fn default_source(&self, environment: EnvironmentType) -> Option<&str> {
        self.default_authenticator
            .as_ref()
            .and_then(|d| d.source_for(environment))
    }

    fn require_source(&self, source: &str) -> ConfigResult<()> {
        if self.descriptor(source).is_some() {
            Ok(())
        } else {
            Err(ConfigError::unknown_source(source))
        }
    }
}
