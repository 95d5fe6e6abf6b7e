//! Database entity types for `SQLx`.
//!
//! These types map directly to database rows and are converted
//! to domain models.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row for local users.
#[derive(Debug, Clone, FromRow)]
pub struct LocalUserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub surname: Option<String>,
    pub source: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
