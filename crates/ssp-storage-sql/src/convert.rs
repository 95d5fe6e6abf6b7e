//! Conversion between database entities and domain models.

use ssp_model::LocalUser;

use crate::entities::LocalUserRow;

/// Convert a `LocalUserRow` to a `LocalUser` domain model.
pub fn user_from_row(row: LocalUserRow) -> LocalUser {
    LocalUser {
        id: row.id,
        username: row.username,
        email: row.email,
        first_name: row.first_name,
        surname: row.surname,
        source: row.source,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}
