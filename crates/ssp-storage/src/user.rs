//! Local user storage provider trait.

use async_trait::async_trait;
use ssp_model::LocalUser;
use uuid::Uuid;

use crate::error::StorageResult;

/// Provider for local user storage operations.
///
/// Implementations must be thread-safe and support concurrent access.
/// Email is unique: at most one user may hold a given address, compared
/// case-insensitively.
#[async_trait]
pub trait UserProvider: Send + Sync {
    /// Creates a new user.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Duplicate` if a user with the same email exists.
    async fn create(&self, user: &LocalUser) -> StorageResult<()>;

    /// Gets a user by ID.
    async fn get_by_id(&self, id: Uuid) -> StorageResult<Option<LocalUser>>;

    /// Gets a user by email.
    async fn get_by_email(&self, email: &str) -> StorageResult<Option<LocalUser>>;

    /// Counts all stored users.
    async fn count(&self) -> StorageResult<u64>;
}
