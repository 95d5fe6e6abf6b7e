//! Audit events for the authentication bridge.
//!
//! Security-relevant events (logins, logouts, user provisioning, expired
//! federation sessions) are described by [`AuthEvent`] and written to the
//! `ssp::audit` tracing target so they can be routed separately from
//! diagnostic logs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tracing target for audit records.
pub const AUDIT_TARGET: &str = "ssp::audit";

/// Event type categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEventType {
    /// Local user logged in after federated authentication.
    Login,
    /// Login failed after the provider handed control back.
    LoginError,
    /// Local user was created from federated attributes.
    UserProvisioned,
    /// Logout was handed to the identity provider.
    LogoutStarted,
    /// Local session was ended after provider logout.
    Logout,
    /// A bound federation session was found expired and discarded.
    BindingExpired,
    /// A passive (silent) login attempt was started.
    PassiveLoginAttempt,
}

/// Outcome of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventOutcome {
    /// Operation succeeded.
    Success,
    /// Operation failed.
    Failure,
}

/// A security event for audit logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthEvent {
    /// Unique event identifier.
    pub id: Uuid,
    /// Timestamp of the event.
    pub timestamp: DateTime<Utc>,
    /// Type of event.
    pub event_type: AuthEventType,
    /// Outcome of the event.
    pub outcome: EventOutcome,
    /// Authentication source involved.
    pub source: Option<String>,
    /// Local user involved.
    pub user_id: Option<Uuid>,
    /// Local session identifier.
    pub session_id: Option<String>,
    /// Error message (for failure events).
    pub error: Option<String>,
}

impl AuthEvent {
    /// Creates a new event builder.
    #[must_use]
    pub const fn builder(event_type: AuthEventType) -> AuthEventBuilder {
        AuthEventBuilder::new(event_type)
    }

    /// Writes the event to the audit tracing target.
    pub fn emit(&self) {
        let event_type = serde_variant_name(self.event_type);
        match self.outcome {
            EventOutcome::Success => tracing::info!(
                target: AUDIT_TARGET,
                event_id = %self.id,
                event_type,
                source = self.source.as_deref(),
                user_id = self.user_id.map(|id| id.to_string()),
                session_id = self.session_id.as_deref(),
                "auth event"
            ),
            EventOutcome::Failure => tracing::warn!(
                target: AUDIT_TARGET,
                event_id = %self.id,
                event_type,
                source = self.source.as_deref(),
                user_id = self.user_id.map(|id| id.to_string()),
                session_id = self.session_id.as_deref(),
                error = self.error.as_deref(),
                "auth event failed"
            ),
        }
    }
}

const fn serde_variant_name(event_type: AuthEventType) -> &'static str {
    match event_type {
        AuthEventType::Login => "LOGIN",
        AuthEventType::LoginError => "LOGIN_ERROR",
        AuthEventType::UserProvisioned => "USER_PROVISIONED",
        AuthEventType::LogoutStarted => "LOGOUT_STARTED",
        AuthEventType::Logout => "LOGOUT",
        AuthEventType::BindingExpired => "BINDING_EXPIRED",
        AuthEventType::PassiveLoginAttempt => "PASSIVE_LOGIN_ATTEMPT",
    }
}

/// Builder for creating events.
#[derive(Debug)]
pub struct AuthEventBuilder {
    event_type: AuthEventType,
    outcome: EventOutcome,
    source: Option<String>,
    user_id: Option<Uuid>,
    session_id: Option<String>,
    error: Option<String>,
}

impl AuthEventBuilder {
    /// Creates a new event builder.
    #[must_use]
    pub const fn new(event_type: AuthEventType) -> Self {
        Self {
            event_type,
            outcome: EventOutcome::Success,
            source: None,
            user_id: None,
            session_id: None,
            error: None,
        }
    }

    /// Sets the outcome to failure with an error message.
    #[must_use]
    pub fn failure(mut self, error: impl Into<String>) -> Self {
        self.outcome = EventOutcome::Failure;
        self.error = Some(error.into());
        self
    }

    /// Sets the authentication source.
    #[must_use]
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the user ID.
    #[must_use]
    pub const fn user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Sets the session ID.
    #[must_use]
    pub fn session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Builds the event.
    #[must_use]
    pub fn build(self) -> AuthEvent {
        AuthEvent {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            event_type: self.event_type,
            outcome: self.outcome,
            source: self.source,
            user_id: self.user_id,
            session_id: self.session_id,
            error: self.error,
        }
    }

    /// Builds the event and writes it to the audit target.
    pub fn emit(self) -> AuthEvent {
        let event = self.build();
        event.emit();
        event
    }
}
