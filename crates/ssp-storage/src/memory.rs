//! In-memory user storage.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use ssp_model::LocalUser;
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};
use crate::user::UserProvider;

/// Concurrent in-process user store.
///
/// Users are keyed by id with a secondary index on lowercased email. The
/// user is inserted while its email index entry is held, so two racing
/// creates for the same address resolve to exactly one winner and the loser
/// always finds the winner by email.
#[derive(Debug, Default)]
pub struct InMemoryUserProvider {
    users: DashMap<Uuid, LocalUser>,
    by_email: DashMap<String, Uuid>,
}

impl InMemoryUserProvider {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl UserProvider for InMemoryUserProvider {
    async fn create(&self, user: &LocalUser) -> StorageResult<()> {
        if !user.is_valid() {
            return Err(StorageError::InvalidData(format!(
                "user {} is missing a username or email",
                user.id
            )));
        }

        match self.by_email.entry(email_key(&user.email)) {
            Entry::Occupied(_) => {
                return Err(StorageError::duplicate("LocalUser", "email", &user.email));
            }
            Entry::Vacant(slot) => {
                self.users.insert(user.id, user.clone());
                slot.insert(user.id);
            }
        }

        tracing::debug!(user_id = %user.id, "Stored local user");
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> StorageResult<Option<LocalUser>> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn get_by_email(&self, email: &str) -> StorageResult<Option<LocalUser>> {
        let Some(id) = self.by_email.get(&email_key(email)).map(|e| *e.value()) else {
            return Ok(None);
        };
        self.get_by_id(id).await
    }

    async fn count(&self) -> StorageResult<u64> {
        Ok(self.users.len() as u64)
    }
}
