//! Per-browser session state.
//!
//! The state is written when the identity provider hands a successfully
//! authenticated user back, and cleared on logout or when the bound
//! federation session turns out to have expired.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which authenticator governs this session.
///
/// Restoring a binding rebuilds the authenticator from these two names; the
/// live provider adapter is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatorBinding {
    /// Authentication source name.
    pub source_name: String,
    /// Implementation identifier that maps the source's attributes.
    pub implementation_id: String,
    /// When the binding was written.
    pub bound_at: DateTime<Utc>,
}

impl AuthenticatorBinding {
    /// Creates a binding stamped with the current time.
    #[must_use]
    pub fn new(source_name: impl Into<String>, implementation_id: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            implementation_id: implementation_id.into(),
            bound_at: Utc::now(),
        }
    }
}

/// Where the session is in the login/logout protocol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AuthState {
    /// No local user.
    #[default]
    Anonymous,
    /// Sent to the identity provider, waiting for it to call back.
    ProviderAuthenticating {
        /// Source the user was sent to.
        source: String,
    },
    /// A local user is logged in.
    LocallyAuthenticated,
    /// Sent to the identity provider's logout endpoint.
    LoggingOut,
}

/// Longest id accepted for a session.
pub const MAX_SESSION_ID_LEN: usize = 128;

/// How long a session may live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimeouts {
    /// Longest time between two writes.
    pub idle_timeout: Duration,
    /// Longest time since creation.
    pub max_lifespan: Duration,
}

impl SessionTimeouts {
    /// Creates timeouts from seconds.
    #[must_use]
    pub fn from_secs(idle_timeout: i64, max_lifespan: i64) -> Self {
        Self {
            idle_timeout: Duration::seconds(idle_timeout),
            max_lifespan: Duration::seconds(max_lifespan),
        }
    }
}

impl Default for SessionTimeouts {
    /// 30 minutes idle, 10 hours in total.
    fn default() -> Self {
        Self::from_secs(30 * 60, 10 * 60 * 60)
    }
}

/// Persisted key/value state of one browser session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Session identifier, carried in the session cookie.
    pub id: String,
    /// Current authenticator binding.
    pub binding: Option<AuthenticatorBinding>,
    /// Where to send the user once the current action completes.
    pub back_url: Option<String>,
    /// Whether a passive login was already tried in this session.
    pub passive_attempted: bool,
    /// Logged-in local user.
    pub user_id: Option<Uuid>,
    /// Protocol state.
    pub state: AuthState,
    /// Notes owned by the identity provider adapter.
    pub provider_notes: HashMap<String, String>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session was last written.
    pub updated_at: DateTime<Utc>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    /// Creates an empty session with a fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self::with_id(Self::generate_id())
    }

    /// Creates an empty session with the given id.
    #[must_use]
    pub fn with_id(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            binding: None,
            back_url: None,
            passive_attempted: false,
            user_id: None,
            state: AuthState::Anonymous,
            provider_notes: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Generates a new random session id.
    #[must_use]
    pub fn generate_id() -> String {
        Uuid::new_v4().simple().to_string()
    }

    /// Checks whether an id can name a session.
    ///
    /// Ids travel in a cookie, so only ASCII letters, digits, `-` and `_`
    /// are accepted, up to [`MAX_SESSION_ID_LEN`] characters.
    #[must_use]
    pub fn is_valid_id(id: &str) -> bool {
        !id.is_empty()
            && id.len() <= MAX_SESSION_ID_LEN
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }

    /// Checks if the session has outlived either timeout.
    #[must_use]
    pub fn is_expired(&self, timeouts: &SessionTimeouts) -> bool {
        let now = Utc::now();
        now - self.updated_at > timeouts.idle_timeout
            || now - self.created_at > timeouts.max_lifespan
    }

    // === Binding ===

    /// Stores an authenticator binding.
    pub fn bind(&mut self, binding: AuthenticatorBinding) {
        self.binding = Some(binding);
    }

    /// Drops the authenticator binding together with the provider's notes.
    ///
    /// Returns the binding that was removed.
    pub fn clear_binding(&mut self) -> Option<AuthenticatorBinding> {
        self.provider_notes.clear();
        self.binding.take()
    }

    // === Back URL ===

    /// Records where to go once the current action completes.
    pub fn set_back_url(&mut self, url: impl Into<String>) {
        self.back_url = Some(url.into());
    }

    /// Takes the back-URL, clearing it. Empty values count as unset.
    pub fn take_back_url(&mut self) -> Option<String> {
        self.back_url.take().filter(|url| !url.is_empty())
    }

    // === Local login ===

    /// Marks the given local user as logged in.
    pub fn log_in(&mut self, user_id: Uuid) {
        self.user_id = Some(user_id);
        self.state = AuthState::LocallyAuthenticated;
    }

    /// Ends the local login, returning the user that was logged in.
    pub fn log_out(&mut self) -> Option<Uuid> {
        self.state = AuthState::Anonymous;
        self.user_id.take()
    }

    /// Checks if a local user is logged in.
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.user_id.is_some() && matches!(self.state, AuthState::LocallyAuthenticated)
    }

    // === Passive login ===

    /// Marks a passive login attempt. Returns `false` if one was already made.
    pub fn mark_passive_attempt(&mut self) -> bool {
        !std::mem::replace(&mut self.passive_attempted, true)
    }

    // === Provider notes ===

    /// Gets a provider note.
    #[must_use]
    pub fn note(&self, key: &str) -> Option<&str> {
        self.provider_notes.get(key).map(String::as_str)
    }

    /// Sets a provider note.
    pub fn set_note(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.provider_notes.insert(key.into(), value.into());
    }

    /// Removes a provider note.
    pub fn remove_note(&mut self, key: &str) -> Option<String> {
        self.provider_notes.remove(key)
    }

    /// Updates the last-written timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_anonymous() {
        let session = SessionState::new();

        assert_eq!(session.id.len(), 32);
        assert!(session.binding.is_none());
        assert!(!session.is_logged_in());
        assert_eq!(session.state, AuthState::Anonymous);
    }

    #[test]
    fn clear_binding_drops_provider_notes() {
        let mut session = SessionState::new();
        session.bind(AuthenticatorBinding::new("directory", "directory"));
        session.set_note("provider.session", "abc");

        let removed = session.clear_binding();

        assert_eq!(removed.map(|b| b.source_name), Some("directory".to_string()));
        assert!(session.binding.is_none());
        assert!(session.note("provider.session").is_none());
    }

    #[test]
    fn back_url_is_taken_once() {
        let mut session = SessionState::new();
        session.set_back_url("/dashboard");

        assert_eq!(session.take_back_url().as_deref(), Some("/dashboard"));
        assert!(session.take_back_url().is_none());
    }

    #[test]
    fn empty_back_url_counts_as_unset() {
        let mut session = SessionState::new();
        session.set_back_url("");

        assert!(session.take_back_url().is_none());
        assert!(session.back_url.is_none());
    }

    #[test]
    fn log_in_and_out() {
        let mut session = SessionState::new();
        let user_id = Uuid::now_v7();

        session.log_in(user_id);
        assert!(session.is_logged_in());

        assert_eq!(session.log_out(), Some(user_id));
        assert!(!session.is_logged_in());
        assert_eq!(session.state, AuthState::Anonymous);
    }

    #[test]
    fn passive_attempt_is_marked_once() {
        let mut session = SessionState::new();

        assert!(session.mark_passive_attempt());
        assert!(!session.mark_passive_attempt());
        assert!(session.passive_attempted);
    }

    #[test]
    fn idle_session_expires() {
        let timeouts = SessionTimeouts::from_secs(60, 3600);
        let mut session = SessionState::new();
        assert!(!session.is_expired(&timeouts));

        session.updated_at = Utc::now() - Duration::seconds(120);
        assert!(session.is_expired(&timeouts));

        session.touch();
        assert!(!session.is_expired(&timeouts));
    }

    #[test]
    fn busy_session_still_expires_at_max_lifespan() {
        let timeouts = SessionTimeouts::from_secs(60, 3600);
        let mut session = SessionState::new();
        session.created_at = Utc::now() - Duration::hours(2);
        session.touch();

        assert!(session.is_expired(&timeouts));
    }

    #[test]
    fn id_alphabet() {
        assert!(SessionState::is_valid_id(&SessionState::generate_id()));
        assert!(SessionState::is_valid_id("_a1-B2"));
        assert!(!SessionState::is_valid_id(""));
        assert!(!SessionState::is_valid_id("a.b"));
        assert!(!SessionState::is_valid_id("a b"));
        assert!(!SessionState::is_valid_id(&"x".repeat(MAX_SESSION_ID_LEN + 1)));
    }

    #[test]
    fn state_serializes_with_tag() {
        let json = serde_json::to_value(AuthState::ProviderAuthenticating {
            source: "adfs".to_string(),
        })
        .unwrap();

        assert_eq!(json["state"], "provider_authenticating");
        assert_eq!(json["source"], "adfs");
    }
}
