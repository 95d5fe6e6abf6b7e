//! Local user domain model.
//!
//! A local user is the application's own record of a person. Federated
//! identities are reconciled onto it by email, which is unique.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A local application user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalUser {
    // === Identity ===
    /// Unique identifier.
    pub id: Uuid,
    /// Account name released by the identity provider. Read-only locally.
    pub username: String,
    /// Email address. Unique across all local users.
    pub email: String,

    // === Profile ===
    /// First name.
    pub first_name: Option<String>,
    /// Surname.
    pub surname: Option<String>,

    // === Federation ===
    /// Authentication source that provisioned this user.
    pub source: Option<String>,

    // === Timestamps ===
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl LocalUser {
    /// Creates a new user with the given username and email.
    #[must_use]
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            username: username.into(),
            email: email.into(),
            first_name: None,
            surname: None,
            source: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the first name.
    #[must_use]
    pub fn with_first_name(mut self, name: impl Into<String>) -> Self {
        self.first_name = Some(name.into());
        self
    }

    /// Sets the surname.
    #[must_use]
    pub fn with_surname(mut self, name: impl Into<String>) -> Self {
        self.surname = Some(name.into());
        self
    }

    /// Sets the provisioning source.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Gets the user's full name.
    #[must_use]
    pub fn full_name(&self) -> Option<String> {
        match (&self.first_name, &self.surname) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            (Some(first), None) => Some(first.clone()),
            (None, Some(last)) => Some(last.clone()),
            (None, None) => None,
        }
    }

    /// Checks if this user was provisioned from a federated source.
    #[must_use]
    pub const fn is_federated(&self) -> bool {
        self.source.is_some()
    }

    /// Checks that the record satisfies the local user invariants.
    ///
    /// A valid user has a non-nil id, a non-empty username, and an email
    /// that looks like an address.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.id.is_nil()
            && !self.username.trim().is_empty()
            && self.email.contains('@')
            && !self.email.starts_with('@')
            && !self.email.ends_with('@')
    }

    /// Checks whether this user owns the given email (case-insensitive).
    #[must_use]
    pub fn has_email(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email)
    }
}
